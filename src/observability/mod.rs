//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pool, resolver and transport produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (pool size, evictions, failures)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (address, host, error)
//! - Metrics are cheap (recorder no-ops when no exporter is installed)

pub mod logging;
pub mod metrics;
