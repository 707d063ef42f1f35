//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Session / server events
//!     → observer.rs (pluggable hook; default logs via tracing)
//!     → metrics.rs (counters, gauges)
//!
//! Process setup:
//!     → logging.rs (subscriber + env filter)
//!     → metrics.rs (optional Prometheus endpoint)
//! ```
//!
//! # Design Decisions
//! - Dropped frames and unmatched requests never reach the wire, only the observer
//! - Metrics are cheap (atomic increments) and off unless an exporter is installed

pub mod logging;
pub mod metrics;
pub mod observer;

pub use observer::{CloseReason, NoopObserver, Observer, TracingObserver};
