//! Request-scoped diagnostics: one timestamped record per upstream or
//! cache access. A `Tracer` lives for a single request and is discarded
//! with it; it is never shared across requests.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One recorded access.
#[derive(Debug, Clone, Serialize)]
pub struct CallRecord {
    pub url: String,
    pub duration_ms: u64,
    /// HTTP status, absent for cache-served results.
    pub status: Option<u16>,
    /// Payload size in bytes, when known.
    pub size: Option<usize>,
    /// Whether the result came from the cache instead of the network.
    pub cached: bool,
    pub at: DateTime<Utc>,
}

/// Lightweight event recorder for one request.
///
/// Interior mutability lets one tracer be shared by reference across the
/// async pipeline without threading `&mut` everywhere. Not essential to
/// correctness — purely diagnostic.
#[derive(Debug, Default)]
pub struct Tracer {
    calls: Mutex<Vec<CallRecord>>,
}

impl Tracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one access, stamping it with the current time.
    pub fn record_call(
        &self,
        url: &str,
        duration: Duration,
        status: Option<u16>,
        size: Option<usize>,
        cached: bool,
    ) {
        let record = CallRecord {
            url: url.to_string(),
            duration_ms: duration.as_millis() as u64,
            status,
            size,
            cached,
            at: Utc::now(),
        };
        self.calls.lock().unwrap().push(record);
    }

    /// All records so far, in call order.
    pub fn trace(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap().clone()
    }

    /// How many non-cached calls were recorded for a URL.
    pub fn network_calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.url == url && !c.cached)
            .count()
    }
}
