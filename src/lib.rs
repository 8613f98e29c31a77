//! Dynamic API gateway with a registry-driven control plane.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                    GATEWAY                        │
//!                    │                                                   │
//!   Consul ◀────────┼── registration (agent + address resolver)         │
//!     │              │                                                   │
//!     │  poll        │  ┌───────────┐   ┌────────────┐   ┌───────────┐  │
//!     └─────────────┼─▶│ discovery │──▶│ reconciler │──▶│ snapshot  │  │
//!                    │  │ (builder) │   │   (diff)   │   │  store    │  │
//!                    │  └───────────┘   └────────────┘   └─────┬─────┘  │
//!                    │                                         │        │
//!   Client ─────────┼──▶ http (route match, round robin) ◀────┘        │
//!     ◀──────────────┼─── forwarded response                            │
//!                    │                                                   │
//!                    │  Cross-cutting: config, lifecycle, observability  │
//!                    └──────────────────────────────────────────────────┘
//! ```
//!
//! The registry is the source of truth: this process registers itself on
//! startup, continuously derives `(routes, clusters)` snapshots from the
//! registry's healthy instances, and publishes them atomically to the data
//! plane through one-shot change tokens.

// Control plane
pub mod discovery;
pub mod reconciler;
pub mod registration;
pub mod registry;
pub mod snapshot;

// Forwarding configuration and data plane
pub mod forwarding;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use snapshot::{ConfigSnapshot, SnapshotStore};
