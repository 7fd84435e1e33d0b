//! Throughput, latency and outcome statistics for the scoring service.

use crate::config::ScoreConfig;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Number of score histogram buckets across the configured range
const SCORE_BUCKETS: u32 = 6;

/// Equal-width buckets over `[min_score, max_score]`; the last one includes `max_score`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScoreBuckets {
    min_score: u32,
    max_score: u32,
    width: u32,
    count: usize,
}

impl ScoreBuckets {
    fn new(score: &ScoreConfig) -> Self {
        let min_score = score.min_score.min(score.max_score);
        let max_score = score.max_score.max(score.min_score);
        let width = (max_score - min_score).div_ceil(SCORE_BUCKETS).max(1);
        Self {
            min_score,
            max_score,
            width,
            count: ((max_score - min_score) / width + 1).min(SCORE_BUCKETS) as usize,
        }
    }

    fn index(&self, credit_score: u32) -> usize {
        let offset = credit_score.clamp(self.min_score, self.max_score) - self.min_score;
        ((offset / self.width) as usize).min(self.count - 1)
    }

    fn label(&self, index: usize) -> String {
        let low = self.min_score + index as u32 * self.width;
        let high = if index + 1 == self.count {
            self.max_score
        } else {
            low + self.width - 1
        };
        format!("{low}-{high}")
    }
}

/// Metrics collector for the scoring service
pub struct ScoringMetrics {
    /// Requests that produced a score
    pub requests_scored: AtomicU64,
    /// Requests rejected with an error
    pub requests_rejected: AtomicU64,
    /// Scored requests by rating label
    ratings: RwLock<HashMap<String, u64>>,
    /// Rejected requests by error kind
    rejections: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Bucket layout for the configured score range
    buckets: ScoreBuckets,
    /// Credit score distribution counts
    score_buckets: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ScoringMetrics {
    pub fn new(score: &ScoreConfig) -> Self {
        let buckets = ScoreBuckets::new(score);
        Self {
            requests_scored: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            ratings: RwLock::new(HashMap::new()),
            rejections: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new(vec![0; buckets.count]),
            buckets,
            start_time: Instant::now(),
        }
    }

    fn record_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Record a scored request
    pub fn record_scored(&self, processing_time: Duration, credit_score: u32, rating: &str) {
        self.requests_scored.fetch_add(1, Ordering::Relaxed);
        self.record_time(processing_time);

        let bucket = self.buckets.index(credit_score);
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }

        if let Ok(mut ratings) = self.ratings.write() {
            *ratings.entry(rating.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a rejected request
    pub fn record_rejected(&self, processing_time: Duration, kind: &str) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
        self.record_time(processing_time);

        if let Ok(mut rejections) = self.rejections.write() {
            *rejections.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let Ok(times) = self.processing_times.read() else {
            return ProcessingStats::default();
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();
        let percentile = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let total = self.requests_scored.load(Ordering::Relaxed)
            + self.requests_rejected.load(Ordering::Relaxed);
        if elapsed > 0.0 {
            total as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Score histogram as `(range label, count)` pairs in ascending order
    pub fn get_score_distribution(&self) -> Vec<(String, u64)> {
        let counts = self
            .score_buckets
            .read()
            .map(|b| b.clone())
            .unwrap_or_else(|_| vec![0; self.buckets.count]);
        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| (self.buckets.label(i), count))
            .collect()
    }

    pub fn get_ratings(&self) -> HashMap<String, u64> {
        self.ratings.read().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn get_rejections(&self) -> HashMap<String, u64> {
        self.rejections.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let scored = self.requests_scored.load(Ordering::Relaxed);
        let rejected = self.requests_rejected.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();

        info!(
            scored,
            rejected,
            throughput = format!("{:.1} req/s", self.get_throughput()),
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            max_us = processing.max_us,
            "Scoring metrics summary"
        );

        let mut ratings: Vec<(String, u64)> = self.get_ratings().into_iter().collect();
        ratings.sort();
        for (rating, count) in ratings {
            let pct = if scored > 0 {
                (count as f64 / scored as f64) * 100.0
            } else {
                0.0
            };
            info!(rating = %rating, count, share = format!("{:.1}%", pct), "Rating distribution");
        }

        for (kind, count) in self.get_rejections() {
            info!(kind = %kind, count, "Rejections");
        }

        for (bucket, count) in self.get_score_distribution() {
            info!(bucket = %bucket, count, "Score distribution");
        }
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Logs a metrics summary on a fixed interval
pub struct MetricsReporter {
    metrics: Arc<ScoringMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ScoringMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
