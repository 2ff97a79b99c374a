use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use super::ring_buffer::RingBuffer;

/// Summary of one inbound request. Created once, never modified.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RequestLogEntry {
    pub method: String,
    /// Raw request path, dynamic segments included.
    pub path: String,
    pub status: u16,
    /// Wall time in milliseconds, rounded to two decimals.
    pub duration_ms: f64,
    pub actor_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Bounded log of recent requests plus a lifetime request counter.
pub struct RequestLog {
    inner: Mutex<Inner>,
}

struct Inner {
    entries: RingBuffer<RequestLogEntry>,
    total: u64,
}

impl RequestLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: RingBuffer::new(capacity),
                total: 0,
            }),
        }
    }

    pub fn log_request(&self, entry: RequestLogEntry) {
        let mut inner = self.inner.lock();
        inner.entries.push(entry);
        inner.total += 1;
    }

    /// Retained entries, oldest first.
    pub fn recent_requests(&self) -> Vec<RequestLogEntry> {
        self.inner.lock().entries.to_vec()
    }

    /// Every request ever logged, including those since evicted.
    pub fn total_requests(&self) -> u64 {
        self.inner.lock().total
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.total = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, status: u16) -> RequestLogEntry {
        RequestLogEntry {
            method: "GET".into(),
            path: path.into(),
            status,
            duration_ms: 1.5,
            actor_id: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn total_survives_truncation() {
        let log = RequestLog::new(1_000);
        for i in 0..1_500 {
            log.log_request(entry(&format!("/r/{i}"), 200));
        }

        assert_eq!(log.total_requests(), 1_500);
        let recent = log.recent_requests();
        assert_eq!(recent.len(), 1_000);
        assert_eq!(recent.first().map(|e| e.path.as_str()), Some("/r/500"));
        assert_eq!(recent.last().map(|e| e.path.as_str()), Some("/r/1499"));
    }

    #[test]
    fn recent_requests_are_oldest_first() {
        let log = RequestLog::new(10);
        log.log_request(entry("/first", 200));
        log.log_request(entry("/second", 404));

        let paths: Vec<String> = log.recent_requests().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["/first", "/second"]);
    }

    #[test]
    fn reset_clears_entries_and_total() {
        let log = RequestLog::new(10);
        log.log_request(entry("/a", 200));
        log.reset();

        assert_eq!(log.total_requests(), 0);
        assert!(log.recent_requests().is_empty());
    }
}
