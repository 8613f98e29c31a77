//! Registry access subsystem.
//!
//! # Data Flow
//! ```text
//! Write path (registration agent):
//!     ServiceRegistration → client.register / client.deregister
//!
//! Read path (discovery):
//!     client.list_service_names → client.list_healthy_instances
//!     → discovery::ServiceMapBuilder
//! ```
//!
//! # Design Decisions
//! - The capability trait is the seam: a fake registry satisfies every test
//! - The client never retries; callers own the retry policy
//! - Malformed instances are dropped with a log, the rest of a response kept
//! - One pooled HTTP client, per-call timeout bounded by the refresh interval

pub mod client;
pub mod consul;

pub use client::{HealthCheck, RegistryClient, RegistryError, ServiceRegistration};
pub use consul::ConsulClient;
