//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging throughout; the request id flows through all subsystems
//! - Metrics are cheap (atomic increments) and safe to call before install
//! - The exporter is optional; nothing else changes when it is off

pub mod logging;
pub mod metrics;
