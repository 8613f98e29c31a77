//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! Client request
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request id)
//!     → current snapshot (route match, cluster lookup)
//!     → round-robin destination → forward upstream
//!     → response to client
//! ```
//!
//! # Design Decisions
//! - The handler takes one snapshot reference per request and holds it for
//!   the request's whole duration; a publication mid-flight changes nothing
//!   for requests already routed
//! - No route matched is 404, no destination or upstream failure is 502
//! - `/health` answers the registry's probe; `/gateway/config` dumps the
//!   live snapshot for operators

pub mod request;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use server::GatewayServer;
