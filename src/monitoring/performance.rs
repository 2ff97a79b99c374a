use std::collections::HashMap;

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;

use super::percentiles::{self, nearest_rank, round2, LatencySummary};
use super::ring_buffer::RingBuffer;

/// Bucket that absorbs every route first seen after the route cap is reached.
pub const OVERFLOW_ROUTE: &str = "(other)";

/// Latency statistics for one route.
///
/// `p50` through `max` are computed on every read from the samples currently
/// retained in the route's sliding window, so once more than the window's
/// capacity of requests have been observed they approximate, but no longer
/// equal, lifetime percentiles. `request_count` is cumulative and can exceed
/// `sample_count`. `lifetime` is never truncated.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoutePerformanceMetrics {
    pub route: String,
    pub request_count: u64,
    pub sample_count: usize,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub lifetime: LatencySummary,
}

/// Per-route sliding windows of latency samples.
pub struct PerformanceTracker {
    window_capacity: usize,
    max_routes: usize,
    routes: Mutex<HashMap<String, RouteWindow>>,
}

struct RouteWindow {
    samples: RingBuffer<f64>,
    request_count: u64,
    lifetime: Histogram<u64>,
}

impl RouteWindow {
    fn new(capacity: usize) -> Self {
        Self {
            samples: RingBuffer::new(capacity),
            request_count: 0,
            lifetime: percentiles::new_histogram(),
        }
    }
}

impl PerformanceTracker {
    pub fn new(window_capacity: usize, max_routes: usize) -> Self {
        Self {
            window_capacity,
            max_routes,
            routes: Mutex::new(HashMap::new()),
        }
    }

    pub fn track_performance(&self, route: &str, duration_ms: f64) {
        let mut routes = self.routes.lock();

        let key = if routes.contains_key(route) || routes.len() < self.max_routes {
            route
        } else {
            if !routes.contains_key(OVERFLOW_ROUTE) {
                tracing::warn!(
                    max_routes = self.max_routes,
                    route,
                    "route cap reached, folding new routes into {OVERFLOW_ROUTE}"
                );
            }
            OVERFLOW_ROUTE
        };

        let window = routes
            .entry(key.to_owned())
            .or_insert_with(|| RouteWindow::new(self.window_capacity));
        window.samples.push(duration_ms);
        window.request_count += 1;
        percentiles::record_ms(&mut window.lifetime, duration_ms);
    }

    /// `None` when the route has no retained samples.
    pub fn route_metrics(&self, route: &str) -> Option<RoutePerformanceMetrics> {
        let copied = {
            let routes = self.routes.lock();
            routes.get(route).map(|w| WindowCopy::of(route, w))
        };
        copied.and_then(WindowCopy::into_metrics)
    }

    /// Every tracked route, busiest first.
    ///
    /// Windows are copied out under the lock. Sorting and ranking run after
    /// it is released.
    pub fn performance_metrics(&self) -> Vec<RoutePerformanceMetrics> {
        let copies: Vec<WindowCopy> = {
            let routes = self.routes.lock();
            routes.iter().map(|(route, w)| WindowCopy::of(route, w)).collect()
        };

        let mut metrics: Vec<RoutePerformanceMetrics> =
            copies.into_iter().filter_map(WindowCopy::into_metrics).collect();
        metrics.sort_by(|a, b| {
            b.request_count
                .cmp(&a.request_count)
                .then_with(|| a.route.cmp(&b.route))
        });
        metrics
    }

    pub fn route_count(&self) -> usize {
        self.routes.lock().len()
    }

    pub fn reset(&self) {
        self.routes.lock().clear();
    }
}

/// A route window detached from the tracker's lock.
struct WindowCopy {
    route: String,
    samples: Vec<f64>,
    request_count: u64,
    lifetime: LatencySummary,
}

impl WindowCopy {
    fn of(route: &str, window: &RouteWindow) -> Self {
        Self {
            route: route.to_owned(),
            samples: window.samples.to_vec(),
            request_count: window.request_count,
            lifetime: LatencySummary::from_histogram(&window.lifetime),
        }
    }

    fn into_metrics(self) -> Option<RoutePerformanceMetrics> {
        let mut sorted = self.samples;
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let sum: f64 = sorted.iter().sum();
        let pct = |p: f64| nearest_rank(&sorted, p).map(round2).unwrap_or_default();

        Some(RoutePerformanceMetrics {
            route: self.route,
            request_count: self.request_count,
            sample_count: n,
            p50: pct(50.0),
            p95: pct(95.0),
            p99: pct(99.0),
            avg: round2(sum / n as f64),
            min: round2(sorted[0]),
            max: round2(sorted[n - 1]),
            lifetime: self.lifetime,
        })
    }
}
