//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Registry (Consul HTTP API)
//!     → registry client (list names, list healthy instances)
//!     → instance.rs (normalize meta into typed fields)
//!     → map.rs (filter, sort, freeze as ServiceMap)
//!     → reconciler (diff against previous map)
//! ```
//!
//! # Design Decisions
//! - The builder is pure relative to registry responses: no caching, no side effects
//! - Instances sorted by service id so two builds over the same registry state compare equal
//! - The registry's own service ("consul") never appears in a ServiceMap
//! - Malformed instances are dropped by the registry client, not here

pub mod instance;
pub mod map;

pub use instance::{Protocol, Scheme, ServiceInstance};
pub use map::{ServiceMap, ServiceMapBuilder};
