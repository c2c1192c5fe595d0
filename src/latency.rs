//! # Latency Sampler
//!
//! Bounded rolling window of raw latency observations per channel, used to
//! compute percentiles for the active hour. Recomputing from raw samples
//! instead of maintaining a sketch trades a little memory (at most 1000
//! floats per channel) for exact percentiles; channel cardinality is tens,
//! not millions, so the trade holds.

use dashmap::DashMap;
use std::collections::VecDeque;

use crate::constants::caps::MAX_LATENCY_SAMPLES_PER_CHANNEL;

/// Aggregate latency statistics over a channel's current sample window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySummary {
    /// Mean latency in milliseconds
    pub avg_ms: f64,
    /// 95th percentile latency in milliseconds
    pub p95_ms: f64,
    /// 99th percentile latency in milliseconds
    pub p99_ms: f64,
    /// Number of samples the summary was computed from
    pub sample_count: usize,
}

/// Per-channel bounded FIFO of raw latency samples
#[derive(Debug, Default)]
pub struct LatencySampler {
    samples: DashMap<String, VecDeque<f64>>,
}

impl LatencySampler {
    pub fn new() -> Self {
        Self {
            samples: DashMap::new(),
        }
    }

    /// Append a sample for the channel, evicting the oldest once the cap is hit
    pub fn record(&self, channel: &str, latency_ms: f64) {
        let mut entry = self
            .samples
            .entry(channel.to_string())
            .or_insert_with(VecDeque::new);
        entry.push_back(latency_ms);

        while entry.len() > MAX_LATENCY_SAMPLES_PER_CHANNEL {
            entry.pop_front();
        }
    }

    /// Compute average, p95, and p99 over the channel's current window
    ///
    /// Returns `None` when the channel has no samples.
    pub fn summarize(&self, channel: &str) -> Option<LatencySummary> {
        let entry = self.samples.get(channel)?;
        if entry.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = entry.iter().copied().collect();
        drop(entry);
        sorted.sort_by(f64::total_cmp);

        let avg_ms = sorted.iter().sum::<f64>() / sorted.len() as f64;

        Some(LatencySummary {
            avg_ms,
            p95_ms: percentile(&sorted, 95.0),
            p99_ms: percentile(&sorted, 99.0),
            sample_count: sorted.len(),
        })
    }

    /// Number of samples currently held for the channel
    pub fn sample_count(&self, channel: &str) -> usize {
        self.samples.get(channel).map_or(0, |entry| entry.len())
    }

    /// Channels with any sampler state
    pub fn channels(&self) -> Vec<String> {
        self.samples.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Drop all sampler state for a channel
    pub fn remove_channel(&self, channel: &str) {
        self.samples.remove(channel);
    }
}

/// Nearest-rank percentile over an ascending-sorted slice
///
/// Rank is `ceil(pct/100 * n)`, converted to a 0-based index and clamped to
/// `[0, n-1]`. For 20 samples, p95 selects index 18 (the 19th smallest value).
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}
