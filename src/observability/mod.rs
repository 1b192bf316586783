//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! allowlist assembly, gatekeeper, server
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (decision counters, allowlist gauge)
//!
//! Consumers:
//!     → stderr (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
