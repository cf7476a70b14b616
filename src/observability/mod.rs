//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Adapter produces:
//!     → logging.rs (structured log events keyed by request ID)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Handler error detail goes to logs only, never to the client
//! - Metrics are off by default

pub mod logging;
pub mod metrics;
