pub mod error_tracker;
pub mod percentiles;
pub mod performance;
pub mod request_log;
pub mod ring_buffer;
pub mod snapshot;
pub mod stream;

use std::time::Instant;

use axum::http::HeaderName;
use chrono::{DateTime, Utc};

use crate::config::{ConfigError, MonitorConfig};

pub use error_tracker::{ErrorContext, ErrorTracker, TrackedError};
pub use percentiles::LatencySummary;
pub use performance::{PerformanceTracker, RoutePerformanceMetrics, OVERFLOW_ROUTE};
pub use request_log::{RequestLog, RequestLogEntry};
pub use ring_buffer::RingBuffer;
pub use snapshot::{MonitoringSnapshot, PerformanceSection};

/// The in-process monitor: one per process, shared as `Arc<Monitor>`.
///
/// Owns the request log, the error tracker and the per-route performance
/// tracker. Each of those locks its own state independently; nothing here
/// ever holds two of those locks at once.
pub struct Monitor {
    config: MonitorConfig,
    actor_header: HeaderName,
    started_at: DateTime<Utc>,
    start: Instant,

    requests: RequestLog,
    errors: ErrorTracker,
    performance: PerformanceTracker,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let actor_header = config.actor_header_name()?;
        Ok(Self::build(config, actor_header))
    }

    fn build(config: MonitorConfig, actor_header: HeaderName) -> Self {
        Self {
            requests: RequestLog::new(config.request_log_capacity),
            errors: ErrorTracker::new(config.error_capacity),
            performance: PerformanceTracker::new(
                config.route_window_capacity,
                config.max_routes,
            ),
            actor_header,
            started_at: Utc::now(),
            start: Instant::now(),
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn actor_header(&self) -> &HeaderName {
        &self.actor_header
    }

    pub fn requests(&self) -> &RequestLog {
        &self.requests
    }

    pub fn errors(&self) -> &ErrorTracker {
        &self.errors
    }

    pub fn performance(&self) -> &PerformanceTracker {
        &self.performance
    }

    /// Read-only aggregate of every subsystem.
    pub fn snapshot(&self) -> MonitoringSnapshot {
        MonitoringSnapshot {
            started_at: self.started_at,
            uptime_seconds: self.start.elapsed().as_secs(),
            total_requests: self.requests.total_requests(),
            error_count: self.errors.total_errors(),
            recent_errors: self.errors.latest_errors(self.config.snapshot_error_limit),
            performance: PerformanceSection {
                routes: self.performance.performance_metrics(),
            },
        }
    }

    /// Empty every buffer and zero every counter. Meant for test isolation;
    /// the start time is kept.
    pub fn reset(&self) {
        self.requests.reset();
        self.errors.reset();
        self.performance.reset();
        tracing::debug!("monitoring state reset");
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::build(MonitorConfig::default(), HeaderName::from_static("x-actor-id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(status: u16) -> RequestLogEntry {
        RequestLogEntry {
            method: "GET".into(),
            path: "/api/items".into(),
            status,
            duration_ms: 2.0,
            actor_id: None,
            timestamp: Utc::now(),
        }
    }

    fn ctx() -> ErrorContext {
        ErrorContext {
            route: "/api/items".into(),
            method: "GET".into(),
            actor_id: None,
        }
    }

    #[test]
    fn snapshot_of_fresh_monitor_is_empty() {
        let monitor = Monitor::default();
        let snap = monitor.snapshot();

        assert_eq!(snap.total_requests, 0);
        assert_eq!(snap.error_count, 0);
        assert!(snap.recent_errors.is_empty());
        assert!(snap.performance.routes.is_empty());
    }

    #[test]
    fn snapshot_aggregates_every_subsystem() {
        let monitor = Monitor::default();
        monitor.requests().log_request(entry(200));
        monitor.requests().log_request(entry(500));
        monitor.performance().track_performance("/api/items", 3.0);
        monitor.performance().track_performance("/api/items", 5.0);
        monitor.performance().track_performance("/api/other", 1.0);
        let boom: Box<dyn std::error::Error + Send + Sync> = "boom".into();
        monitor.errors().track_error(boom.as_ref(), ctx());

        let snap = monitor.snapshot();
        assert_eq!(snap.total_requests, 2);
        assert_eq!(snap.error_count, 1);
        assert_eq!(snap.recent_errors[0].message, "boom");
        assert_eq!(snap.performance.routes.len(), 2);
        assert_eq!(snap.performance.routes[0].route, "/api/items");
        assert_eq!(snap.performance.routes[0].avg, 4.0);
    }

    #[test]
    fn snapshot_limits_recent_errors() {
        let config = MonitorConfig {
            snapshot_error_limit: 2,
            ..MonitorConfig::default()
        };
        let monitor = Monitor::new(config).unwrap();
        for msg in ["one", "two", "three"] {
            let err: Box<dyn std::error::Error + Send + Sync> = msg.into();
            monitor.errors().track_error(err.as_ref(), ctx());
        }

        let snap = monitor.snapshot();
        assert_eq!(snap.error_count, 3);
        let messages: Vec<&str> = snap.recent_errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["three", "two"]);
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let monitor = Monitor::default();
        monitor.requests().log_request(entry(200));
        let _ = monitor.snapshot();
        let _ = monitor.snapshot();

        assert_eq!(monitor.requests().total_requests(), 1);
    }

    #[test]
    fn reset_is_idempotent() {
        let monitor = Monitor::default();
        monitor.requests().log_request(entry(200));
        monitor.performance().track_performance("/api/items", 1.0);

        for _ in 0..2 {
            monitor.reset();
            let snap = monitor.snapshot();
            assert_eq!(snap.total_requests, 0);
            assert_eq!(snap.error_count, 0);
            assert!(snap.performance.routes.is_empty());
            assert!(monitor.requests().recent_requests().is_empty());
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = MonitorConfig {
            error_capacity: 0,
            ..MonitorConfig::default()
        };
        assert!(Monitor::new(config).is_err());
    }
}
