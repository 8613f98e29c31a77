//! Self-registration subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (after the listener is accepting):
//!     bound address → resolver.rs (substitute wildcard/loopback hosts)
//!     → agent.rs (build registration record, PUT to the registry)
//!
//! Shutdown:
//!     agent.rs (deregister; errors logged, never block exit)
//! ```
//!
//! # States (agent.rs)
//! ```text
//! Idle → Registered: startup completed, record accepted by the registry
//! Registered → Deregistering → Terminal: shutdown signal
//! Idle → Terminal: shutdown before a successful registration
//! ```
//!
//! # Design Decisions
//! - Registration happens only after the listener is live, so the
//!   registry's first health probe can succeed
//! - A failed registration logs and stays Idle; no automatic retry
//! - The advertised host is never a loopback unless the machine has
//!   no other operational IPv4 interface

pub mod agent;
pub mod resolver;

pub use agent::{AgentState, RegistrationAgent};
pub use resolver::{AddressResolver, ResolvedAddress};
