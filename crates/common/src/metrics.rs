//! Metrics collection for dishfeed.
//!
//! A single [`Metrics`] value is constructed at startup and handed to the
//! repositories, services and HTTP layer as an `Arc<Metrics>`. There is no
//! process-wide instance; tests build their own and assert on it.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Feed read operations tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOperation {
    /// Geo discovery around a point.
    Nearby,
    /// Engagement-ranked restaurant feed.
    Restaurant,
    /// Explicit ID lookup.
    ByIds,
    /// Media the viewer liked.
    Liked,
    /// Media the viewer saved.
    Saved,
}

impl FeedOperation {
    const ALL: [Self; 5] = [
        Self::Nearby,
        Self::Restaurant,
        Self::ByIds,
        Self::Liked,
        Self::Saved,
    ];

    const fn index(self) -> usize {
        match self {
            Self::Nearby => 0,
            Self::Restaurant => 1,
            Self::ByIds => 2,
            Self::Liked => 3,
            Self::Saved => 4,
        }
    }

    /// Label used in the Prometheus exposition.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Nearby => "nearby",
            Self::Restaurant => "restaurant",
            Self::ByIds => "by_ids",
            Self::Liked => "liked",
            Self::Saved => "saved",
        }
    }
}

/// Application metrics collector.
#[derive(Debug)]
pub struct Metrics {
    // === Request Metrics ===
    /// Total HTTP requests received
    pub http_requests_total: AtomicU64,
    /// HTTP requests by status code category
    pub http_requests_2xx: AtomicU64,
    /// Client error responses
    pub http_requests_4xx: AtomicU64,
    /// Server error responses
    pub http_requests_5xx: AtomicU64,
    /// Total request latency in microseconds
    pub http_request_latency_us_total: AtomicU64,

    // === Database Metrics ===
    /// Total database queries executed
    pub db_queries_total: AtomicU64,
    /// Database query errors
    pub db_errors_total: AtomicU64,
    /// Total database query time in microseconds
    pub db_query_time_us_total: AtomicU64,

    // === Feed Metrics ===
    /// Feed requests per [`FeedOperation`]
    feed_requests: [AtomicU64; 5],
    /// Entries returned across all feed requests
    pub feed_entries_returned: AtomicU64,
    /// IDs that no longer resolved at hydration time
    pub hydration_gaps: AtomicU64,
    /// Malformed cursors that were treated as "first page"
    pub cursors_recovered: AtomicU64,
    /// Reaction queries issued by the reaction aggregator
    pub aggregation_queries: AtomicU64,

    // === Reaction Metrics ===
    /// Likes, saves and seen marks written
    pub reactions_written: AtomicU64,
    /// Likes and saves removed
    pub reactions_removed: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            http_requests_total: AtomicU64::new(0),
            http_requests_2xx: AtomicU64::new(0),
            http_requests_4xx: AtomicU64::new(0),
            http_requests_5xx: AtomicU64::new(0),
            http_request_latency_us_total: AtomicU64::new(0),

            db_queries_total: AtomicU64::new(0),
            db_errors_total: AtomicU64::new(0),
            db_query_time_us_total: AtomicU64::new(0),

            feed_requests: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
            feed_entries_returned: AtomicU64::new(0),
            hydration_gaps: AtomicU64::new(0),
            cursors_recovered: AtomicU64::new(0),
            aggregation_queries: AtomicU64::new(0),

            reactions_written: AtomicU64::new(0),
            reactions_removed: AtomicU64::new(0),
        }
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, status_code: u16, latency: Duration) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);

        match status_code {
            200..=299 => self.http_requests_2xx.fetch_add(1, Ordering::Relaxed),
            400..=499 => self.http_requests_4xx.fetch_add(1, Ordering::Relaxed),
            500..=599 => self.http_requests_5xx.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };

        self.http_request_latency_us_total
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record a database query.
    pub fn record_db_query(&self, duration: Duration, is_error: bool) {
        self.db_queries_total.fetch_add(1, Ordering::Relaxed);
        self.db_query_time_us_total
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if is_error {
            self.db_errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a served feed request and the number of entries it returned.
    pub fn record_feed(&self, op: FeedOperation, entries: usize) {
        self.feed_requests[op.index()].fetch_add(1, Ordering::Relaxed);
        self.feed_entries_returned
            .fetch_add(entries as u64, Ordering::Relaxed);
    }

    /// Record IDs dropped because they no longer resolved.
    pub fn record_hydration_gaps(&self, count: usize) {
        self.hydration_gaps
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a malformed cursor that was ignored.
    pub fn record_cursor_recovered(&self) {
        self.cursors_recovered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reaction aggregator query.
    pub fn record_aggregation_query(&self) {
        self.aggregation_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reaction write (`added`) or removal.
    pub fn record_reaction(&self, added: bool) {
        if added {
            self.reactions_written.fetch_add(1, Ordering::Relaxed);
        } else {
            self.reactions_removed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Feed requests served for one operation.
    #[must_use]
    pub fn feed_requests(&self, op: FeedOperation) -> u64 {
        self.feed_requests[op.index()].load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            http_requests_total: self.http_requests_total.load(Ordering::Relaxed),
            http_requests_2xx: self.http_requests_2xx.load(Ordering::Relaxed),
            http_requests_4xx: self.http_requests_4xx.load(Ordering::Relaxed),
            http_requests_5xx: self.http_requests_5xx.load(Ordering::Relaxed),
            http_request_latency_avg_us: average(
                &self.http_request_latency_us_total,
                &self.http_requests_total,
            ),

            db_queries_total: self.db_queries_total.load(Ordering::Relaxed),
            db_errors_total: self.db_errors_total.load(Ordering::Relaxed),
            db_query_avg_time_us: average(&self.db_query_time_us_total, &self.db_queries_total),

            feed_requests_total: FeedOperation::ALL
                .iter()
                .map(|op| self.feed_requests(*op))
                .sum(),
            feed_entries_returned: self.feed_entries_returned.load(Ordering::Relaxed),
            hydration_gaps: self.hydration_gaps.load(Ordering::Relaxed),
            cursors_recovered: self.cursors_recovered.load(Ordering::Relaxed),
            aggregation_queries: self.aggregation_queries.load(Ordering::Relaxed),

            reactions_written: self.reactions_written.load(Ordering::Relaxed),
            reactions_removed: self.reactions_removed.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut output = String::new();

        push_metric(
            &mut output,
            "dishfeed_http_requests_total",
            "Total HTTP requests",
            "counter",
            snapshot.http_requests_total,
        );

        output.push_str("# HELP dishfeed_http_requests_by_status HTTP requests by status\n");
        output.push_str("# TYPE dishfeed_http_requests_by_status counter\n");
        for (status, value) in [
            ("2xx", snapshot.http_requests_2xx),
            ("4xx", snapshot.http_requests_4xx),
            ("5xx", snapshot.http_requests_5xx),
        ] {
            let _ = writeln!(
                output,
                "dishfeed_http_requests_by_status{{status=\"{status}\"}} {value}"
            );
        }

        push_metric(
            &mut output,
            "dishfeed_db_queries_total",
            "Total database queries",
            "counter",
            snapshot.db_queries_total,
        );
        push_metric(
            &mut output,
            "dishfeed_db_errors_total",
            "Database errors",
            "counter",
            snapshot.db_errors_total,
        );
        push_metric(
            &mut output,
            "dishfeed_db_query_avg_time_us",
            "Average database query time",
            "gauge",
            snapshot.db_query_avg_time_us,
        );

        output.push_str("# HELP dishfeed_feed_requests_total Feed requests by operation\n");
        output.push_str("# TYPE dishfeed_feed_requests_total counter\n");
        for op in FeedOperation::ALL {
            let _ = writeln!(
                output,
                "dishfeed_feed_requests_total{{operation=\"{}\"}} {}",
                op.label(),
                self.feed_requests(op)
            );
        }

        push_metric(
            &mut output,
            "dishfeed_feed_entries_returned",
            "Entries returned by feed requests",
            "counter",
            snapshot.feed_entries_returned,
        );
        push_metric(
            &mut output,
            "dishfeed_hydration_gaps_total",
            "Media IDs dropped because they no longer resolved",
            "counter",
            snapshot.hydration_gaps,
        );
        push_metric(
            &mut output,
            "dishfeed_cursors_recovered_total",
            "Malformed cursors treated as first page",
            "counter",
            snapshot.cursors_recovered,
        );
        push_metric(
            &mut output,
            "dishfeed_aggregation_queries_total",
            "Reaction aggregator queries",
            "counter",
            snapshot.aggregation_queries,
        );
        push_metric(
            &mut output,
            "dishfeed_reactions_written_total",
            "Likes, saves and seen marks written",
            "counter",
            snapshot.reactions_written,
        );
        push_metric(
            &mut output,
            "dishfeed_reactions_removed_total",
            "Likes and saves removed",
            "counter",
            snapshot.reactions_removed,
        );

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn average(total: &AtomicU64, count: &AtomicU64) -> u64 {
    let total = total.load(Ordering::Relaxed);
    let count = count.load(Ordering::Relaxed);
    if count > 0 { total / count } else { 0 }
}

fn push_metric(output: &mut String, name: &str, help: &str, kind: &str, value: u64) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} {kind}");
    let _ = writeln!(output, "{name} {value}");
}

/// Snapshot of all metrics at a point in time.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    // HTTP
    /// Total HTTP requests.
    pub http_requests_total: u64,
    /// Successful responses.
    pub http_requests_2xx: u64,
    /// Client error responses.
    pub http_requests_4xx: u64,
    /// Server error responses.
    pub http_requests_5xx: u64,
    /// Mean request latency in microseconds.
    pub http_request_latency_avg_us: u64,

    // Database
    /// Database statements issued.
    pub db_queries_total: u64,
    /// Database statements that failed.
    pub db_errors_total: u64,
    /// Mean statement time in microseconds.
    pub db_query_avg_time_us: u64,

    // Feed
    /// Feed requests served.
    pub feed_requests_total: u64,
    /// Entries returned across all feeds.
    pub feed_entries_returned: u64,
    /// Media IDs dropped during hydration.
    pub hydration_gaps: u64,
    /// Stale cursors recovered from.
    pub cursors_recovered: u64,
    /// Batch aggregation statements issued.
    pub aggregation_queries: u64,

    // Reactions
    /// Reactions recorded.
    pub reactions_written: u64,
    /// Reactions removed.
    pub reactions_removed: u64,
}

/// Timer guard for measuring operation duration.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.http_requests_total, 0);
        assert_eq!(snapshot.feed_requests_total, 0);
    }

    #[test]
    fn test_record_http_request() {
        let metrics = Metrics::new();
        metrics.record_http_request(200, Duration::from_millis(10));
        metrics.record_http_request(404, Duration::from_millis(5));
        metrics.record_http_request(500, Duration::from_millis(20));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.http_requests_total, 3);
        assert_eq!(snapshot.http_requests_2xx, 1);
        assert_eq!(snapshot.http_requests_4xx, 1);
        assert_eq!(snapshot.http_requests_5xx, 1);
        assert_eq!(snapshot.http_request_latency_avg_us, 11_666);
    }

    #[test]
    fn test_record_db_query() {
        let metrics = Metrics::new();
        metrics.record_db_query(Duration::from_micros(100), false);
        metrics.record_db_query(Duration::from_micros(300), true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.db_queries_total, 2);
        assert_eq!(snapshot.db_errors_total, 1);
        assert_eq!(snapshot.db_query_avg_time_us, 200);
    }

    #[test]
    fn test_feed_counters_are_per_operation() {
        let metrics = Metrics::new();
        metrics.record_feed(FeedOperation::Nearby, 3);
        metrics.record_feed(FeedOperation::Nearby, 2);
        metrics.record_feed(FeedOperation::Restaurant, 1);

        assert_eq!(metrics.feed_requests(FeedOperation::Nearby), 2);
        assert_eq!(metrics.feed_requests(FeedOperation::Restaurant), 1);
        assert_eq!(metrics.feed_requests(FeedOperation::Saved), 0);
        assert_eq!(metrics.snapshot().feed_entries_returned, 6);
    }

    #[test]
    fn test_instances_are_independent() {
        let a = Metrics::new();
        let b = Metrics::new();
        a.record_hydration_gaps(2);
        assert_eq!(a.snapshot().hydration_gaps, 2);
        assert_eq!(b.snapshot().hydration_gaps, 0);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();
        metrics.record_feed(FeedOperation::ByIds, 1);
        metrics.record_cursor_recovered();

        let output = metrics.to_prometheus();
        assert!(output.contains("# TYPE dishfeed_http_requests_total counter"));
        assert!(output.contains("dishfeed_feed_requests_total{operation=\"by_ids\"} 1"));
        assert!(output.contains("dishfeed_cursors_recovered_total 1"));
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.elapsed() >= Duration::from_millis(5));
    }
}
