//! Concurrent statistics accumulator
//!
//! A [`Statistics`] aggregates a stream of non-negative values: running count,
//! running sum, running maximum and a fixed-width histogram. All updates go
//! through atomics so any number of workers can feed the same accumulator
//! without a global lock.
//!
//! The four fields are updated independently. A reader racing with writers
//! may observe `n` ahead of `sum`; once all writers are quiescent the
//! aggregate is exact and `n` equals the sum of all bucket counts.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Width of every histogram bucket
pub const BUCKET_WIDTH: u64 = 100;

/// A statistics accumulator safe for concurrent updates
#[derive(Debug, Default)]
pub struct Statistics {
    n: AtomicU64,
    sum: AtomicU64,
    max: AtomicU64,

    /// Bucket index -> count. Buckets are created lazily under the write
    /// lock; existing buckets are bumped under the read lock.
    histogram: RwLock<BTreeMap<u64, AtomicU64>>,
}

impl Statistics {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value to the accumulator
    pub fn add_value(&self, value: u64) {
        self.bump_bucket(value / BUCKET_WIDTH);
        self.n.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(value, Ordering::Relaxed);
        self.max.fetch_max(value, Ordering::Relaxed);
    }

    fn bump_bucket(&self, index: u64) {
        {
            let histogram = self.histogram.read();
            if let Some(count) = histogram.get(&index) {
                count.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        self.histogram
            .write()
            .entry(index)
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Number of values added
    pub fn n(&self) -> u64 {
        self.n.load(Ordering::Relaxed)
    }

    /// Sum of all values added
    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    /// Largest value added, 0 when empty
    pub fn max(&self) -> u64 {
        self.max.load(Ordering::Relaxed)
    }

    /// Arithmetic mean, `NaN` when no value has been added
    pub fn mean(&self) -> f64 {
        mean(self.sum(), self.n())
    }

    /// Visit every non-empty bucket in ascending order
    pub fn for_each_bucket<F>(&self, mut f: F)
    where
        F: FnMut(Bucket),
    {
        let histogram = self.histogram.read();
        for (&index, count) in histogram.iter() {
            let count = count.load(Ordering::Relaxed);
            if count > 0 {
                f(Bucket::new(index, count));
            }
        }
    }

    /// Take a point-in-time copy of the accumulator
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let mut buckets = Vec::new();
        self.for_each_bucket(|bucket| buckets.push(bucket));

        StatisticsSnapshot {
            n: self.n(),
            sum: self.sum(),
            max: self.max(),
            buckets,
        }
    }
}

fn mean(sum: u64, n: u64) -> f64 {
    sum as f64 / n as f64
}

/// One histogram bucket covering `[lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Inclusive lower bound
    pub lower: u64,

    /// Exclusive upper bound
    pub upper: u64,

    /// Number of values in the bucket
    pub count: u64,
}

impl Bucket {
    fn new(index: u64, count: u64) -> Self {
        Self {
            lower: index * BUCKET_WIDTH,
            upper: index.saturating_add(1).saturating_mul(BUCKET_WIDTH),
            count,
        }
    }
}

/// Immutable copy of a [`Statistics`] taken after the run has quiesced
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSnapshot {
    pub n: u64,
    pub sum: u64,
    pub max: u64,

    /// Non-empty buckets in ascending order
    pub buckets: Vec<Bucket>,
}

impl StatisticsSnapshot {
    /// Arithmetic mean, `NaN` when empty
    pub fn mean(&self) -> f64 {
        mean(self.sum, self.n)
    }

    /// Total of all bucket counts
    pub fn bucket_total(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }
}
