//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env overlay)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared by value/Arc into components at boot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there are no process-wide mutable singletons
//! - All fields have defaults so a bare invocation works against a local registry
//! - Validation separates syntactic (serde) from semantic checks
//! - Environment variables override file values (`CONSUL_ADDRESS` wins)

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ConsulConfig;
pub use schema::GatewayConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
