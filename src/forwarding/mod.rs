//! Forwarding configuration subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceMap (discovery)
//!     → translate.rs (one route + one cluster per service)
//!     → route.rs / cluster.rs (immutable value types)
//!     → snapshot store (published to the data plane)
//!
//! Request time:
//!     matched cluster → balance.rs (round-robin cursor) → destination
//! ```
//!
//! # Design Decisions
//! - Routes and clusters are plain values, immutable after translation
//! - One route and one cluster per service name; ids derive from the name
//! - Balancer cursors live outside the snapshot so snapshots stay immutable
//! - Single policy (round robin); a weighted variant is reserved, not wired

pub mod balance;
pub mod cluster;
pub mod route;
pub mod translate;

pub use balance::RoundRobinState;
pub use cluster::{Cluster, Destination, LoadBalancingPolicy};
pub use route::{Route, CATCH_ALL_SEGMENT};
pub use translate::{build_clusters, build_routes};
