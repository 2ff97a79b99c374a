use std::any::Any;
use std::error::Error;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use super::ring_buffer::RingBuffer;

/// Message recorded for panics whose payload is neither `&str` nor `String`.
const OPAQUE_PANIC_MESSAGE: &str = "handler panicked with a non-string payload";

/// Where a failure happened and on whose behalf.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    pub route: String,
    pub method: String,
    pub actor_id: Option<String>,
}

/// A captured handler failure. Created once, never modified.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrackedError {
    pub id: Uuid,
    pub route: String,
    pub method: String,
    pub actor_id: Option<String>,
    pub message: String,
    /// Cause chain, one `caused by:` line per source error.
    pub stack: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Bounded log of recent handler failures plus a lifetime error counter.
pub struct ErrorTracker {
    inner: Mutex<Inner>,
}

struct Inner {
    errors: RingBuffer<TrackedError>,
    total: u64,
}

impl ErrorTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                errors: RingBuffer::new(capacity),
                total: 0,
            }),
        }
    }

    /// Capture an error value returned by a handler.
    pub fn track_error(&self, error: &(dyn Error + 'static), context: ErrorContext) -> TrackedError {
        self.record(error.to_string(), cause_chain(error), context)
    }

    /// Capture a panic payload. Only string payloads carry a message.
    pub fn track_panic(&self, payload: &(dyn Any + Send), context: ErrorContext) -> TrackedError {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            OPAQUE_PANIC_MESSAGE.to_owned()
        };
        self.record(message, None, context)
    }

    fn record(&self, message: String, stack: Option<String>, context: ErrorContext) -> TrackedError {
        let tracked = TrackedError {
            id: Uuid::new_v4(),
            route: context.route,
            method: context.method,
            actor_id: context.actor_id,
            message,
            stack,
            timestamp: Utc::now(),
        };

        let mut inner = self.inner.lock();
        inner.errors.push(tracked.clone());
        inner.total += 1;
        tracked
    }

    /// Retained errors, newest first.
    pub fn recent_errors(&self) -> Vec<TrackedError> {
        self.inner.lock().errors.iter().rev().cloned().collect()
    }

    /// At most `limit` retained errors, newest first.
    pub fn latest_errors(&self, limit: usize) -> Vec<TrackedError> {
        self.inner
            .lock()
            .errors
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn total_errors(&self) -> u64 {
        self.inner.lock().total
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.errors.clear();
        inner.total = 0;
    }
}

fn cause_chain(error: &(dyn Error + 'static)) -> Option<String> {
    let mut lines = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {cause}"));
        source = cause.source();
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
