//! # Channel Metrics Collector
//!
//! The engine facade. Channel adapters push message, error, and connection
//! events through the `record_*` methods; dashboards read windowed queries and
//! derived health. All state lives in concurrent in-memory maps keyed by
//! channel name; a background sweeper prunes by the configured retention
//! windows.
//!
//! ## Concurrency
//!
//! Record calls arrive concurrently from independent channel adapters while
//! the sweeper runs on its own timer. Every store is a [`DashMap`] and the
//! configuration sits behind a read-mostly `RwLock`. Health evaluation clones
//! per-channel snapshots instead of locking across collections, so a record
//! racing an evaluation lands in the next projection rather than the current
//! one.

use chrono::{DateTime, Duration, DurationRound, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MonitoringConfig;
use crate::constants::caps;
use crate::error::Result;
use crate::events::{HealthEventPublisher, HealthTransition};
use crate::health::{derive_uptime_percent, evaluate_channel_health};
use crate::latency::LatencySampler;
use crate::sweeper::SweeperHandle;
use crate::types::{
    ChannelHealth, ChannelStatus, ConnectionEvent, ConnectionEventKind, ConnectionStatus,
    ErrorRecord, HealthSummary, MetricBucket,
};

/// In-memory observability engine for messaging channels
///
/// Owns every entity collection: hourly metric buckets, error records,
/// connection events, raw latency samples, and the cached health projections.
/// External callers only append (record) or read (query/health); existing
/// records are never mutated except to flip an error's resolution flag.
///
/// Share it as an `Arc` so the retention sweeper can hold a weak reference:
///
/// ```rust,ignore
/// let collector = Arc::new(ChannelMetricsCollector::new());
/// collector.start_retention_sweeper();
/// collector.record_message_received("whatsapp", None, 150.0, 0);
/// ```
#[derive(Debug)]
pub struct ChannelMetricsCollector {
    /// Hourly buckets per channel, insertion ordered
    buckets: DashMap<String, Vec<MetricBucket>>,
    /// Capped error log per channel
    errors: DashMap<String, VecDeque<ErrorRecord>>,
    /// Capped connection event log per channel
    connection_events: DashMap<String, VecDeque<ConnectionEvent>>,
    /// Rolling latency samples per channel
    latency: LatencySampler,
    /// Last computed health projection per channel
    health_cache: DashMap<String, ChannelHealth>,
    /// Shared read-mostly configuration
    config: RwLock<MonitoringConfig>,
    /// Health transition broadcast
    publisher: HealthEventPublisher,
    /// Retention sweeper lifecycle
    sweeper: SweeperHandle,
}

impl ChannelMetricsCollector {
    /// Create a collector with the default configuration
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
            errors: DashMap::new(),
            connection_events: DashMap::new(),
            latency: LatencySampler::new(),
            health_cache: DashMap::new(),
            config: RwLock::new(MonitoringConfig::default()),
            publisher: HealthEventPublisher::default(),
            sweeper: SweeperHandle::new(),
        }
    }

    /// Create a collector with a validated configuration
    pub fn with_config(config: MonitoringConfig) -> Result<Self> {
        config.validate()?;
        let collector = Self::new();
        *collector.config.write() = config;
        Ok(collector)
    }

    // ---- Recording -------------------------------------------------------

    /// Record an inbound message for the channel
    ///
    /// Locates or creates the current-hour bucket for the (channel, account)
    /// key and increments its counters. A positive `latency_ms` is forwarded
    /// to the latency sampler and the bucket's percentile fields are
    /// refreshed; a positive `media_size` increments the media counter.
    pub fn record_message_received(
        &self,
        channel: &str,
        account_id: Option<&str>,
        latency_ms: f64,
        media_size: u64,
    ) {
        let now = Utc::now();
        self.with_current_bucket(channel, account_id, now, |bucket| {
            bucket.messages_received += 1;
            if media_size > 0 {
                bucket.media_received += 1;
            }
        });

        if latency_ms > 0.0 {
            self.latency.record(channel, latency_ms);
            self.update_latency_metrics(channel);
        }
    }

    /// Record an outbound message for the channel
    pub fn record_message_sent(
        &self,
        channel: &str,
        account_id: Option<&str>,
        latency_ms: f64,
        media_size: u64,
    ) {
        let now = Utc::now();
        self.with_current_bucket(channel, account_id, now, |bucket| {
            bucket.messages_sent += 1;
            if media_size > 0 {
                bucket.media_sent += 1;
            }
        });

        if latency_ms > 0.0 {
            self.latency.record(channel, latency_ms);
            self.update_latency_metrics(channel);
        }
    }

    /// Record a failed message for the channel
    pub fn record_message_failed(&self, channel: &str, account_id: Option<&str>) {
        let now = Utc::now();
        self.with_current_bucket(channel, account_id, now, |bucket| {
            bucket.messages_failed += 1;
        });
    }

    /// Record a structured error for the channel
    ///
    /// The record lands in the channel's error log (capped at 1000, oldest
    /// evicted first) and, when a current-hour channel-level bucket already
    /// exists, in that bucket's embedded error list under the same cap.
    /// Errors never create buckets, so a channel that only ever errors still
    /// classifies as having no metrics.
    pub fn record_error(
        &self,
        channel: &str,
        code: &str,
        message: &str,
        context: Option<HashMap<String, serde_json::Value>>,
    ) {
        let record = ErrorRecord::new(code, message, context);

        warn!(
            channel = %channel,
            code = %code,
            error_id = %record.id,
            "Channel error recorded"
        );

        {
            let mut entry = self
                .errors
                .entry(channel.to_string())
                .or_insert_with(VecDeque::new);
            entry.push_back(record.clone());
            while entry.len() > caps::MAX_ERRORS_PER_CHANNEL {
                entry.pop_front();
            }
        }

        let bucket_start = record
            .timestamp
            .duration_trunc(Duration::hours(1))
            .unwrap_or(record.timestamp);
        if let Some(mut entry) = self.buckets.get_mut(channel) {
            if let Some(bucket) = entry
                .iter_mut()
                .find(|b| b.account_id.is_none() && b.bucket_start == bucket_start)
            {
                bucket.errors.push(record);
                while bucket.errors.len() > caps::MAX_ERRORS_PER_CHANNEL {
                    bucket.errors.remove(0);
                }
            }
        }
    }

    /// Record a connection lifecycle event for the channel
    ///
    /// `duration_ms` is how long the prior state lasted; for `disconnected`
    /// and `reconnecting` events it counts as downtime in the uptime
    /// derivation.
    pub fn record_connection_event(
        &self,
        channel: &str,
        kind: ConnectionEventKind,
        reason: Option<&str>,
        duration_ms: Option<u64>,
    ) {
        let event = ConnectionEvent {
            timestamp: Utc::now(),
            kind,
            reason: reason.map(str::to_string),
            duration_ms,
        };

        debug!(
            channel = %channel,
            event = %kind.as_str(),
            duration_ms = duration_ms,
            "Connection event recorded"
        );

        let mut entry = self
            .connection_events
            .entry(channel.to_string())
            .or_insert_with(VecDeque::new);
        entry.push_back(event);
        while entry.len() > caps::MAX_CONNECTION_EVENTS_PER_CHANNEL {
            entry.pop_front();
        }
    }

    // ---- Queries ---------------------------------------------------------

    /// Buckets for the channel newer than `hours_back`, in insertion order
    ///
    /// Unknown channels and non-positive windows yield an empty list.
    pub fn get_metrics(&self, channel: &str, hours_back: i64) -> Vec<MetricBucket> {
        let cutoff = window_start(Utc::now(), hours_back);
        self.buckets
            .get(channel)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|bucket| bucket.bucket_start >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Error records for the channel newer than `hours_back`
    pub fn get_errors(&self, channel: &str, hours_back: i64) -> Vec<ErrorRecord> {
        let cutoff = window_start(Utc::now(), hours_back);
        self.errors
            .get(channel)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|error| error.timestamp >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Connection events for the channel newer than `hours_back`
    pub fn get_connection_history(&self, channel: &str, hours_back: i64) -> Vec<ConnectionEvent> {
        let cutoff = window_start(Utc::now(), hours_back);
        self.connection_events
            .get(channel)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|event| event.timestamp >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Channels known to any store, sorted
    pub fn channels(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for entry in self.buckets.iter() {
            names.insert(entry.key().clone());
        }
        for entry in self.errors.iter() {
            names.insert(entry.key().clone());
        }
        for entry in self.connection_events.iter() {
            names.insert(entry.key().clone());
        }
        names.into_iter().collect()
    }

    // ---- Latency ---------------------------------------------------------

    /// Recompute the channel's latency statistics and write them into its
    /// most recent bucket
    ///
    /// The target bucket is the one with the greatest start time, preferring
    /// the latest-inserted on ties. A channel without samples or without
    /// buckets is left untouched.
    pub fn update_latency_metrics(&self, channel: &str) {
        let summary = match self.latency.summarize(channel) {
            Some(summary) => summary,
            None => return,
        };

        if let Some(mut entry) = self.buckets.get_mut(channel) {
            if let Some(bucket) = entry.iter_mut().max_by_key(|b| b.bucket_start) {
                bucket.avg_latency_ms = summary.avg_ms;
                bucket.p95_latency_ms = summary.p95_ms;
                bucket.p99_latency_ms = summary.p99_ms;
            }
        }
    }

    // ---- Health ----------------------------------------------------------

    /// Recompute the channel's health from the last 24 hours and cache it
    ///
    /// Publishes a [`HealthTransition`] when the derived status differs from
    /// the previously cached one (including the first evaluation).
    pub fn update_health(&self, channel: &str) -> ChannelHealth {
        let now = Utc::now();

        let buckets: Vec<MetricBucket> = self
            .buckets
            .get(channel)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        let errors: Vec<ErrorRecord> = self
            .errors
            .get(channel)
            .map(|entry| entry.iter().cloned().collect())
            .unwrap_or_default();
        let events: Vec<ConnectionEvent> = self
            .connection_events
            .get(channel)
            .map(|entry| entry.iter().cloned().collect())
            .unwrap_or_default();
        let thresholds = self.config.read().alert_thresholds;

        let health = evaluate_channel_health(channel, &buckets, &errors, &events, &thresholds, now);

        debug!(
            channel = %channel,
            status = %health.status.as_str(),
            error_rate = health.error_rate,
            latency_p95_ms = health.latency_p95_ms,
            uptime_percent = health.uptime_percent,
            issues = health.issues.len(),
            "Channel health evaluated"
        );

        let previous = self.health_cache.insert(channel.to_string(), health.clone());
        let previous_status = previous.map(|p| p.status);
        if previous_status != Some(health.status) {
            info!(
                channel = %channel,
                previous = ?previous_status,
                current = %health.status.as_str(),
                "Channel health transition"
            );
            self.publisher.publish(HealthTransition {
                channel: channel.to_string(),
                previous: previous_status,
                current: health.status,
                occurred_at: now,
            });
        }

        health
    }

    /// Last cached health for the channel, computing one lazily when absent
    pub fn get_health(&self, channel: &str) -> ChannelHealth {
        if let Some(cached) = self.health_cache.get(channel) {
            return cached.clone();
        }
        self.update_health(channel)
    }

    /// Refreshed health for every known channel, sorted by channel name
    pub fn get_all_health(&self) -> Vec<ChannelHealth> {
        self.channels()
            .iter()
            .map(|channel| self.update_health(channel))
            .collect()
    }

    /// Check whether any known channel is unhealthy or offline
    pub fn has_unhealthy_channels(&self) -> bool {
        self.get_all_health()
            .iter()
            .any(|health| health.status.is_alerting())
    }

    /// Status counts across all known channels
    pub fn summary(&self) -> HealthSummary {
        let mut summary = HealthSummary::default();
        for health in self.get_all_health() {
            summary.total_channels += 1;
            match health.status {
                ChannelStatus::Healthy => summary.healthy += 1,
                ChannelStatus::Degraded => summary.degraded += 1,
                ChannelStatus::Unhealthy => summary.unhealthy += 1,
                ChannelStatus::Offline => summary.offline += 1,
            }
        }
        summary
    }

    /// Subscribe to health status transitions
    pub fn subscribe_health_events(&self) -> broadcast::Receiver<HealthTransition> {
        self.publisher.subscribe()
    }

    /// Mark an error resolved, stamping its resolution time
    ///
    /// Returns `false` when the channel or id is unknown. Resolving twice is
    /// a no-op that keeps the original resolution timestamp.
    pub fn resolve_error(&self, channel: &str, error_id: Uuid) -> bool {
        let now = Utc::now();
        let mut found = false;

        if let Some(mut entry) = self.errors.get_mut(channel) {
            if let Some(record) = entry.iter_mut().find(|r| r.id == error_id) {
                if !record.resolved {
                    record.resolved = true;
                    record.resolved_at = Some(now);
                }
                found = true;
            }
        }

        if found {
            if let Some(mut entry) = self.buckets.get_mut(channel) {
                for bucket in entry.iter_mut() {
                    if let Some(record) = bucket.errors.iter_mut().find(|r| r.id == error_id) {
                        if !record.resolved {
                            record.resolved = true;
                            record.resolved_at = Some(now);
                        }
                    }
                }
            }
            debug!(channel = %channel, error_id = %error_id, "Error marked resolved");
        }

        found
    }

    // ---- Configuration ---------------------------------------------------

    /// Current configuration
    pub fn get_config(&self) -> MonitoringConfig {
        self.config.read().clone()
    }

    /// Replace the configuration wholesale after validation
    ///
    /// An invalid configuration is rejected and the current one stays in
    /// effect. The sweeper picks up a changed interval on its next cycle.
    pub fn update_config(&self, config: MonitoringConfig) -> Result<()> {
        config.validate()?;
        info!(
            sweep_interval_seconds = config.sweep_interval_seconds,
            metrics_retention_hours = config.retention.metrics_hours,
            "Monitoring configuration updated"
        );
        *self.config.write() = config;
        Ok(())
    }

    // ---- Retention -------------------------------------------------------

    /// Run one retention sweep synchronously
    ///
    /// Prunes buckets, errors, and connection events past their retention
    /// cutoffs, drops channel entries left empty, and garbage-collects
    /// sampler state for channels with no remaining buckets. Absent
    /// collections are simply nothing to prune.
    pub fn sweep_now(&self) {
        let now = Utc::now();
        let retention = self.config.read().retention;
        let metrics_cutoff = now - Duration::hours(retention.metrics_hours);
        let errors_cutoff = now - Duration::hours(retention.errors_hours);
        let events_cutoff = now - Duration::hours(retention.connection_events_hours);

        let mut buckets_removed = 0usize;
        self.buckets.retain(|_, list| {
            let before = list.len();
            list.retain(|bucket| bucket.bucket_start >= metrics_cutoff);
            buckets_removed += before - list.len();
            !list.is_empty()
        });

        let mut errors_removed = 0usize;
        self.errors.retain(|_, list| {
            let before = list.len();
            list.retain(|error| error.timestamp >= errors_cutoff);
            errors_removed += before - list.len();
            !list.is_empty()
        });

        let mut events_removed = 0usize;
        self.connection_events.retain(|_, list| {
            let before = list.len();
            list.retain(|event| event.timestamp >= events_cutoff);
            events_removed += before - list.len();
            !list.is_empty()
        });

        let mut samplers_removed = 0usize;
        for channel in self.latency.channels() {
            if !self.buckets.contains_key(&channel) {
                self.latency.remove_channel(&channel);
                samplers_removed += 1;
            }
        }

        debug!(
            buckets_removed = buckets_removed,
            errors_removed = errors_removed,
            events_removed = events_removed,
            samplers_removed = samplers_removed,
            "Retention sweep completed"
        );
    }

    /// Start the periodic retention sweeper
    ///
    /// Idempotent; a second call while the sweeper runs is ignored. The
    /// spawned task holds only a weak reference, so dropping the collector
    /// also ends the task.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_retention_sweeper(self: &Arc<Self>) {
        self.sweeper.start(Arc::downgrade(self));
    }

    /// Stop the retention sweeper
    ///
    /// Safe to call repeatedly and before the sweeper was ever started.
    /// Recording and query methods keep working afterwards.
    pub fn shutdown(&self) {
        self.sweeper.stop();
    }

    /// Check whether the retention sweeper task is running
    pub fn is_sweeper_running(&self) -> bool {
        self.sweeper.is_running()
    }

    // ---- Internals -------------------------------------------------------

    /// Apply `update` to the current-hour bucket for (channel, account),
    /// creating the bucket with a connection snapshot when absent
    fn with_current_bucket<F>(
        &self,
        channel: &str,
        account_id: Option<&str>,
        now: DateTime<Utc>,
        update: F,
    ) where
        F: FnOnce(&mut MetricBucket),
    {
        let bucket_start = now.duration_trunc(Duration::hours(1)).unwrap_or(now);

        // Lock order: buckets entry first, connection_events second; the
        // reverse nesting never occurs.
        let mut entry = self.buckets.entry(channel.to_string()).or_default();
        let position = entry.iter().position(|bucket| {
            bucket.account_id.as_deref() == account_id && bucket.bucket_start == bucket_start
        });

        let index = match position {
            Some(index) => index,
            None => {
                let (connection_status, uptime_percent) = self.connection_snapshot(channel, now);
                entry.push(MetricBucket::new(
                    channel,
                    account_id,
                    bucket_start,
                    connection_status,
                    uptime_percent,
                ));
                debug!(
                    channel = %channel,
                    account_id = account_id,
                    bucket_start = %bucket_start,
                    "Metric bucket created"
                );
                entry.len() - 1
            }
        };

        update(&mut entry[index]);
    }

    /// Latest known connection status and 24h uptime for bucket creation
    fn connection_snapshot(&self, channel: &str, now: DateTime<Utc>) -> (ConnectionStatus, f64) {
        match self.connection_events.get(channel) {
            Some(events) => {
                let status = events
                    .back()
                    .map(|event| ConnectionStatus::from(event.kind))
                    .unwrap_or(ConnectionStatus::Unknown);
                let snapshot: Vec<ConnectionEvent> = events.iter().cloned().collect();
                drop(events);
                (status, derive_uptime_percent(&snapshot, now))
            }
            None => (ConnectionStatus::Unknown, 100.0),
        }
    }
}

impl Default for ChannelMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChannelMetricsCollector {
    fn drop(&mut self) {
        self.sweeper.stop();
    }
}

/// Start of a query window, degrading gracefully on extreme inputs
///
/// A negative `hours_back` puts the cutoff in the future, so windowed reads
/// come back empty; an overflowing one clamps to the beginning of time.
fn window_start(now: DateTime<Utc>, hours_back: i64) -> DateTime<Utc> {
    Duration::try_hours(hours_back)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
