//! Per-node protocol metrics
//!
//! Counters and gauges for quorum outcomes, plus a histogram of how many
//! ticks requests take to resolve. Rendered in the Prometheus text format.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Histogram bucket boundaries for resolution latency (in ticks)
const TICK_BUCKETS: [f64; 9] = [1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 20.0, 30.0, 50.0];

/// A simple histogram implementation for latency tracking
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<AtomicU64>,
    boundaries: Vec<f64>,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    /// Create a new histogram with default tick buckets
    pub fn new() -> Self {
        Self::with_buckets(&TICK_BUCKETS)
    }

    /// Create a histogram with custom bucket boundaries
    pub fn with_buckets(boundaries: &[f64]) -> Self {
        let buckets = (0..=boundaries.len()).map(|_| AtomicU64::new(0)).collect();
        Self {
            buckets,
            boundaries: boundaries.to_vec(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a whole-tick observation
    pub fn observe(&self, ticks: u64) {
        let value = ticks as f64;
        let bucket_idx = self
            .boundaries
            .iter()
            .position(|&boundary| value <= boundary)
            .unwrap_or(self.boundaries.len());

        self.buckets[bucket_idx].fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(ticks, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Cumulative bucket counts, ending with the +Inf bucket
    pub fn get_buckets(&self) -> Vec<(f64, u64)> {
        let mut cumulative = 0u64;
        let mut result = Vec::with_capacity(self.boundaries.len() + 1);

        for (i, &boundary) in self.boundaries.iter().enumerate() {
            cumulative += self.buckets[i].load(Ordering::Relaxed);
            result.push((boundary, cumulative));
        }

        cumulative += self.buckets[self.boundaries.len()].load(Ordering::Relaxed);
        result.push((f64::INFINITY, cumulative));

        result
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter for tracking event counts
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Gauge for tracking current values
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, v: u64) {
        self.value.store(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Metrics owned by one node
#[derive(Debug, Default)]
pub struct NodeMetrics {
    pub requests_issued: Counter,
    pub requests_unavailable: Counter,
    pub quorum_successes: Counter,
    pub quorum_failures: Counter,
    pub timeouts: Counter,
    pub stray_replies: Counter,
    pub replica_ops: Counter,
    pub replication_sent: Counter,
    pub ring_changes: Counter,
    pub pending_requests: Gauge,
    pub resolution_ticks: Histogram,
}

impl NodeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate Prometheus-compatible metrics output labelled with `node`
    pub fn to_prometheus(&self, node: &str) -> String {
        let mut out = String::new();

        let counters = [
            ("requests_issued_total", "Client operations fanned out", &self.requests_issued),
            (
                "requests_unavailable_total",
                "Client operations abandoned for lack of replicas",
                &self.requests_unavailable,
            ),
            ("quorum_successes_total", "Operations resolved as success", &self.quorum_successes),
            ("quorum_failures_total", "Operations resolved as failure, timeouts included", &self.quorum_failures),
            ("timeouts_total", "Operations failed by the reaper", &self.timeouts),
            ("stray_replies_total", "Replies with no pending request", &self.stray_replies),
            ("replica_ops_total", "Requests served as a replica", &self.replica_ops),
            ("replication_sent_total", "Internal replication messages sent", &self.replication_sent),
            ("ring_changes_total", "Observed membership changes", &self.ring_changes),
        ];
        for (name, help, counter) in counters {
            let _ = writeln!(out, "# HELP ringkv_{} {}", name, help);
            let _ = writeln!(out, "# TYPE ringkv_{} counter", name);
            let _ = writeln!(out, "ringkv_{}{{node=\"{}\"}} {}", name, node, counter.get());
        }

        out.push_str("# HELP ringkv_pending_requests Requests awaiting quorum\n");
        out.push_str("# TYPE ringkv_pending_requests gauge\n");
        let _ = writeln!(
            out,
            "ringkv_pending_requests{{node=\"{}\"}} {}",
            node,
            self.pending_requests.get()
        );

        out.push_str("# HELP ringkv_resolution_ticks Ticks from fan-out to outcome\n");
        out.push_str("# TYPE ringkv_resolution_ticks histogram\n");
        for (le, count) in self.resolution_ticks.get_buckets() {
            if le.is_infinite() {
                let _ = writeln!(
                    out,
                    "ringkv_resolution_ticks_bucket{{node=\"{}\",le=\"+Inf\"}} {}",
                    node, count
                );
            } else {
                let _ = writeln!(
                    out,
                    "ringkv_resolution_ticks_bucket{{node=\"{}\",le=\"{}\"}} {}",
                    node, le, count
                );
            }
        }
        let _ = writeln!(
            out,
            "ringkv_resolution_ticks_sum{{node=\"{}\"}} {}",
            node,
            self.resolution_ticks.sum()
        );
        let _ = writeln!(
            out,
            "ringkv_resolution_ticks_count{{node=\"{}\"}} {}",
            node,
            self.resolution_ticks.count()
        );

        out
    }
}
