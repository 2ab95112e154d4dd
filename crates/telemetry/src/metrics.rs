//! In-process metrics registry rendered in the Prometheus text format.
//!
//! Every series is a set of atomics behind a `DashMap` entry, so concurrent
//! observations never lose updates and never take a global lock. Latencies
//! are accumulated as integer microseconds and converted to seconds only when
//! rendered.

use dashmap::DashMap;
use std::fmt::Write;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Content type of the `/metrics` response body.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Upper bounds of the latency histogram buckets, in seconds.
pub const LATENCY_BUCKETS_SECONDS: [f64; 11] =
    [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

// Same bounds as above, in microseconds.
const BUCKETS_MICROS: [u64; 11] = [
    5_000, 10_000, 25_000, 50_000, 100_000, 250_000, 500_000, 1_000_000, 2_500_000, 5_000_000,
    10_000_000,
];

const REQUESTS_TOTAL: &str = "http_requests_total";
const REQUEST_DURATION: &str = "http_request_duration_seconds";
const STORE_DURATION: &str = "db_query_duration_seconds";

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Label set shared by the request counter and the request histogram.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct RequestKey {
    method: String,
    path: String,
    status: u16,
}

impl RequestKey {
    fn labels(&self) -> String {
        format!(
            "method=\"{}\",path=\"{}\",status=\"{}\"",
            escape_label(&self.method),
            escape_label(&self.path),
            self.status
        )
    }
}

struct AtomicHistogram {
    count: AtomicU64,
    sum_micros: AtomicU64,
    buckets: [AtomicU64; BUCKETS_MICROS.len()],
}

impl Default for AtomicHistogram {
    fn default() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum_micros: AtomicU64::new(0),
            buckets: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }
}

impl AtomicHistogram {
    fn observe(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_micros.fetch_add(micros, Ordering::Relaxed);

        // Cumulative buckets: every bound at or above the value counts it.
        for (i, &bound) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    fn render(&self, name: &str, labels: &str, out: &mut String) {
        let prefix = if labels.is_empty() {
            String::new()
        } else {
            format!("{labels},")
        };
        for (i, le) in LATENCY_BUCKETS_SECONDS.iter().enumerate() {
            let count = self.buckets[i].load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"{le}\"}} {count}");
        }
        let count = self.count();
        let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"+Inf\"}} {count}");

        let sum = self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        if labels.is_empty() {
            let _ = writeln!(out, "{name}_sum {sum}");
            let _ = writeln!(out, "{name}_count {count}");
        } else {
            let _ = writeln!(out, "{name}_sum{{{labels}}} {sum}");
            let _ = writeln!(out, "{name}_count{{{labels}}} {count}");
        }
    }
}

/// The service's metrics registry.
///
/// Constructed once at startup and shared through an `Arc`; series are
/// created lazily on first observation and never reset.
#[derive(Default)]
pub struct Metrics {
    requests_total: DashMap<RequestKey, AtomicU64>,
    request_duration: DashMap<RequestKey, AtomicHistogram>,
    store_duration: AtomicHistogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished HTTP request.
    ///
    /// `path` is expected to be a route template, not the raw URI, so that
    /// label cardinality stays bounded.
    pub fn observe_request(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        let key = RequestKey {
            method: method.to_string(),
            path: path.to_string(),
            status,
        };

        self.request_duration
            .entry(key.clone())
            .or_insert_with(AtomicHistogram::default)
            .observe(elapsed);
        self.requests_total
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Records the latency of one store call.
    pub fn observe_store(&self, elapsed: Duration) {
        self.store_duration.observe(elapsed);
    }

    /// Awaits `fut` and records its wall-clock time as a store call,
    /// whatever the outcome.
    pub async fn time_store<F: Future>(&self, fut: F) -> F::Output {
        let start = Instant::now();
        let output = fut.await;
        self.observe_store(start.elapsed());
        output
    }

    /// Current value of `http_requests_total` for one label set.
    pub fn request_count(&self, method: &str, path: &str, status: u16) -> u64 {
        let key = RequestKey {
            method: method.to_string(),
            path: path.to_string(),
            status,
        };
        self.requests_total
            .get(&key)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Sum of `http_requests_total` across every label set.
    pub fn total_requests(&self) -> u64 {
        self.requests_total
            .iter()
            .map(|r| r.value().load(Ordering::Relaxed))
            .sum()
    }

    /// Number of store calls observed so far.
    pub fn store_observations(&self) -> u64 {
        self.store_duration.count()
    }

    /// Renders every series in Prometheus text exposition format.
    ///
    /// Label sets are emitted in sorted order so that scrapes are stable.
    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "# HELP {REQUESTS_TOTAL} Total HTTP requests");
        let _ = writeln!(out, "# TYPE {REQUESTS_TOTAL} counter");
        let mut counters: Vec<(RequestKey, u64)> = self
            .requests_total
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        counters.sort();
        for (key, value) in counters {
            let _ = writeln!(out, "{REQUESTS_TOTAL}{{{}}} {value}", key.labels());
        }

        let _ = writeln!(out, "# HELP {REQUEST_DURATION} HTTP request durations");
        let _ = writeln!(out, "# TYPE {REQUEST_DURATION} histogram");
        let mut keys: Vec<RequestKey> = self
            .request_duration
            .iter()
            .map(|r| r.key().clone())
            .collect();
        keys.sort();
        for key in keys {
            if let Some(hist) = self.request_duration.get(&key) {
                hist.render(REQUEST_DURATION, &key.labels(), &mut out);
            }
        }

        let _ = writeln!(out, "# HELP {STORE_DURATION} Database query durations");
        let _ = writeln!(out, "# TYPE {STORE_DURATION} histogram");
        self.store_duration.render(STORE_DURATION, "", &mut out);

        out
    }
}
