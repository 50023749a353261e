//! In-process record of recent pipeline runs.
//!
//! [`SessionMetricsStore`] keeps the most recent results in a bounded ring
//! buffer and derives aggregate statistics from it. Nothing is persisted.
//!
//! ```rust
//! use std::sync::Arc;
//! use sift_core::{Document, Pipeline, SessionMetricsStore};
//!
//! let store = Arc::new(SessionMetricsStore::new());
//! let pipeline = Pipeline::new().with_metrics(store.clone());
//!
//! let doc = Document::parse("<html><body><p>Some text to extract.</p></body></html>", None).unwrap();
//! pipeline.execute(&doc, Default::default()).unwrap();
//!
//! assert_eq!(store.snapshot().total, 1);
//! ```

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use time::OffsetDateTime;

use crate::pipeline::{PipelineResult, serialize_millis};
use crate::quality::StageKind;

/// Default number of runs kept
pub const DEFAULT_CAPACITY: usize = 100;
/// Default lifetime of a cached snapshot
pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(60);

/// What is remembered about one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineMetric {
    pub stage: StageKind,
    pub score: u32,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub source: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<&PipelineResult> for PipelineMetric {
    fn from(result: &PipelineResult) -> Self {
        Self {
            stage: result.stage,
            score: result.quality_score,
            elapsed: result.elapsed,
            source: result.metadata.source.clone(),
            timestamp: result.metadata.timestamp,
        }
    }
}

/// Aggregates over the runs currently held
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total: usize,
    /// Runs won by each stage
    pub stage_counts: BTreeMap<StageKind, usize>,
    /// Share of runs won by each stage, 0.0 to 1.0
    pub success_rate: BTreeMap<StageKind, f64>,
    pub average_score: f64,
    pub average_latency_ms: f64,
}

/// Latency percentiles in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformancePercentiles {
    pub p50: f64,
    pub p95: f64,
}

#[derive(Debug)]
struct Inner {
    metrics: VecDeque<PipelineMetric>,
    cached: Option<(Instant, MetricsSnapshot)>,
}

/// Bounded, thread-safe window of recent [`PipelineMetric`]s
#[derive(Debug)]
pub struct SessionMetricsStore {
    inner: Mutex<Inner>,
    capacity: usize,
    snapshot_ttl: Duration,
}

impl Default for SessionMetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMetricsStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, DEFAULT_SNAPSHOT_TTL)
    }

    /// A store keeping at most `capacity` runs (at least one) and caching
    /// snapshots for `snapshot_ttl`
    pub fn with_capacity(capacity: usize, snapshot_ttl: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner { metrics: VecDeque::with_capacity(capacity), cached: None }),
            capacity,
            snapshot_ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a run, evicting the oldest once full
    pub fn record(&self, metric: PipelineMetric) {
        let mut inner = self.lock();
        while inner.metrics.len() >= self.capacity {
            inner.metrics.pop_front();
        }
        inner.metrics.push_back(metric);
        inner.cached = None;
    }

    pub fn len(&self) -> usize {
        self.lock().metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().metrics.is_empty()
    }

    /// Aggregate statistics, served from cache while it is fresh
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut inner = self.lock();
        if let Some((taken, snapshot)) = &inner.cached
            && taken.elapsed() < self.snapshot_ttl
        {
            return snapshot.clone();
        }

        let snapshot = compute_snapshot(&inner.metrics);
        inner.cached = Some((Instant::now(), snapshot.clone()));
        snapshot
    }

    /// Nearest-rank latency percentiles
    pub fn performance_percentiles(&self) -> PerformancePercentiles {
        let inner = self.lock();
        let mut latencies: Vec<f64> = inner.metrics.iter().map(|m| millis(m.elapsed)).collect();
        latencies.sort_by(f64::total_cmp);
        PerformancePercentiles { p50: nearest_rank(&latencies, 50.0), p95: nearest_rank(&latencies, 95.0) }
    }

    /// Runs recorded between `start` and `end`, both inclusive, oldest first
    pub fn metrics_in_range(&self, start: OffsetDateTime, end: OffsetDateTime) -> Vec<PipelineMetric> {
        self.lock()
            .metrics
            .iter()
            .filter(|m| m.timestamp >= start && m.timestamp <= end)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.metrics.clear();
        inner.cached = None;
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn compute_snapshot(metrics: &VecDeque<PipelineMetric>) -> MetricsSnapshot {
    let total = metrics.len();
    if total == 0 {
        return MetricsSnapshot::default();
    }

    let mut stage_counts: BTreeMap<StageKind, usize> = BTreeMap::new();
    for metric in metrics {
        *stage_counts.entry(metric.stage).or_default() += 1;
    }
    let success_rate = stage_counts
        .iter()
        .map(|(stage, count)| (*stage, *count as f64 / total as f64))
        .collect();

    MetricsSnapshot {
        total,
        stage_counts,
        success_rate,
        average_score: metrics.iter().map(|m| f64::from(m.score)).sum::<f64>() / total as f64,
        average_latency_ms: metrics.iter().map(|m| millis(m.elapsed)).sum::<f64>() / total as f64,
    }
}

/// Value at rank ceil(p/100 * n) of sorted `values`, or 0 when empty
fn nearest_rank(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let rank = ((percentile / 100.0) * values.len() as f64).ceil() as usize;
    values[rank.clamp(1, values.len()) - 1]
}
