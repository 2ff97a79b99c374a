use hdrhistogram::Histogram;
use serde::Serialize;

/// HdrHistogram range: 1 μs → 60 s, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 60_000_000;
const HIST_SIGFIG: u8 = 3;

/// Round to two decimal places, the precision every reported latency uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Nearest-rank percentile over samples already sorted ascending.
///
/// `index = ceil(p/100 × n) − 1`, clamped to `[0, n − 1]`. No interpolation.
/// Returns `None` for an empty slice.
pub fn nearest_rank(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    let rank = (p * n as f64 / 100.0).ceil() as usize;
    let idx = rank.saturating_sub(1).min(n - 1);
    Some(sorted[idx])
}

/// Empty microsecond histogram covering the full tracked latency range.
pub fn new_histogram() -> Histogram<u64> {
    // Bounds are constants with low >= 1, high >= 2 * low and sigfig <= 5,
    // the only conditions under which construction fails.
    Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
        .expect("constant histogram bounds are valid")
}

/// Record a millisecond latency into a microsecond histogram.
/// Values are clamped into the histogram's range rather than dropped.
pub fn record_ms(hist: &mut Histogram<u64>, duration_ms: f64) {
    let us = (duration_ms.max(0.0) * 1000.0).round() as u64;
    let _ = hist.record(us.clamp(HIST_LOW, HIST_HIGH));
}

/// Percentile breakdown over every sample a route has ever seen.
///
/// Unlike the windowed figures on `RoutePerformanceMetrics`, these are never
/// truncated; HdrHistogram trades a bounded relative error (3 significant
/// figures) for constant memory. All values are milliseconds.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LatencySummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
}

impl LatencySummary {
    /// Returns zeroed values if the histogram is empty.
    pub fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.len() == 0 {
            return Self::empty();
        }

        let ms = |us: u64| round2(us as f64 / 1000.0);
        Self {
            count: hist.len(),
            min: ms(hist.min()),
            max: ms(hist.max()),
            mean: round2(hist.mean() / 1000.0),
            p50: ms(hist.value_at_percentile(50.0)),
            p95: ms(hist.value_at_percentile(95.0)),
            p99: ms(hist.value_at_percentile(99.0)),
            p999: ms(hist.value_at_percentile(99.9)),
        }
    }

    pub fn empty() -> Self {
        Self {
            count: 0,
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            p50: 0.0,
            p95: 0.0,
            p99: 0.0,
            p999: 0.0,
        }
    }
}
