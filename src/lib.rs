//! In-process request monitoring for axum services.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → Monitor::instrument (times the wrapped handler)
//!         ok     → RequestLog + PerformanceTracker
//!         err    → ErrorTracker + RequestLog (500) + PerformanceTracker
//!
//! diagnostics endpoint
//!     → Monitor::snapshot (read-only)
//! ```
//!
//! All state is volatile and lives as long as the `Monitor` that owns it.

pub mod config;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod monitoring;
pub mod server;

pub use config::{ConfigError, MonitorConfig};
pub use middleware::{RequestMeta, RouteParams};
pub use monitoring::{
    ErrorContext, LatencySummary, Monitor, MonitoringSnapshot, RequestLogEntry, RingBuffer,
    RoutePerformanceMetrics, TrackedError,
};
