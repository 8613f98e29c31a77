//! Config snapshot subsystem.
//!
//! # Data Flow
//! ```text
//! Reconciler publishes:
//!     (routes, clusters) → store.rs (build snapshot, atomic pointer swap)
//!     → previous snapshot's token flips stale (token.rs), waking waiters
//!
//! Data plane reads:
//!     store.get() → Arc<ConfigSnapshot> held for the request's duration
//!     token.changed().await → re-read after the next publication
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable after publication; readers never take a lock
//! - The token belongs to its snapshot and carries no back-reference,
//!   so consumers re-read the store after it fires (no reference cycle)
//! - Swap first, invalidate second: a reader subscribing before the swap
//!   sees the stale transition, one arriving after gets a fresh token

pub mod store;
pub mod token;

pub use store::{ConfigSnapshot, SnapshotStore};
pub use token::ChangeToken;
