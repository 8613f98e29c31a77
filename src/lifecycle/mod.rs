//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Bind listener → Start server
//!     → Register with the registry → Start reconciler
//!
//! Shutdown (shutdown.rs + signals.rs):
//!     SIGTERM/SIGINT → stop accepting → deregister
//!     → cancel reconciler → drain in-flight → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: the listener accepts before the registry learns of us
//! - Ordered shutdown: the registry forgets us before the last request drains
//! - Every long-running task subscribes to one broadcast shutdown channel

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
