//! # Channel Observability Data Model
//!
//! Core entity types shared across the engine: hourly metric buckets, error
//! records, connection lifecycle events, and the derived per-channel health
//! projection.
//!
//! All timestamps are UTC. Buckets are keyed by (channel, optional account,
//! hour start); the remaining collections are keyed by channel alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Connection lifecycle event kinds reported by channel adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionEventKind {
    Connected,
    Disconnected,
    Reconnecting,
    Error,
    Authenticated,
}

impl ConnectionEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionEventKind::Connected => "connected",
            ConnectionEventKind::Disconnected => "disconnected",
            ConnectionEventKind::Reconnecting => "reconnecting",
            ConnectionEventKind::Error => "error",
            ConnectionEventKind::Authenticated => "authenticated",
        }
    }

    /// Check if this event kind represents downtime. The optional duration on
    /// these events feeds the uptime derivation.
    pub fn is_downtime(&self) -> bool {
        matches!(
            self,
            ConnectionEventKind::Disconnected | ConnectionEventKind::Reconnecting
        )
    }
}

/// Coarse connection state snapshotted into metric buckets at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
    Unknown,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Unknown => "unknown",
        }
    }
}

impl From<ConnectionEventKind> for ConnectionStatus {
    fn from(kind: ConnectionEventKind) -> Self {
        match kind {
            ConnectionEventKind::Connected | ConnectionEventKind::Authenticated => {
                ConnectionStatus::Connected
            }
            ConnectionEventKind::Disconnected | ConnectionEventKind::Error => {
                ConnectionStatus::Disconnected
            }
            ConnectionEventKind::Reconnecting => ConnectionStatus::Reconnecting,
        }
    }
}

/// Derived health classification for a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Offline,
}

impl ChannelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelStatus::Healthy => "healthy",
            ChannelStatus::Degraded => "degraded",
            ChannelStatus::Unhealthy => "unhealthy",
            ChannelStatus::Offline => "offline",
        }
    }

    /// Check if this status indicates normal operation
    pub fn is_operational(&self) -> bool {
        matches!(self, ChannelStatus::Healthy | ChannelStatus::Degraded)
    }

    /// Check if this status should trigger alerting
    pub fn is_alerting(&self) -> bool {
        matches!(self, ChannelStatus::Unhealthy | ChannelStatus::Offline)
    }
}

/// Severity attached to a health issue. Ordering follows escalation, so
/// sorting descending puts `Error` issues first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Info,
    Warning,
    Error,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Info => "info",
            IssueSeverity::Warning => "warning",
            IssueSeverity::Error => "error",
        }
    }
}

/// Hourly aggregate of message activity for one (channel, optional account) pair
///
/// At most one bucket exists per (channel, account, hour start) tuple. Counters
/// only grow while the bucket is inside the retention window; the sweeper
/// deletes whole buckets, never rewrites them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBucket {
    /// Channel identifier (e.g. "whatsapp", "telegram")
    pub channel: String,
    /// Account identifier when per-account granularity was requested
    pub account_id: Option<String>,
    /// Start of the hour this bucket aggregates, truncated to the hour boundary
    pub bucket_start: DateTime<Utc>,
    /// Messages received in this hour
    pub messages_received: u64,
    /// Messages sent in this hour
    pub messages_sent: u64,
    /// Messages that failed in this hour
    pub messages_failed: u64,
    /// Received messages that carried media
    pub media_received: u64,
    /// Sent messages that carried media
    pub media_sent: u64,
    /// Average latency over the sampler's current window, in milliseconds
    pub avg_latency_ms: f64,
    /// 95th percentile latency in milliseconds
    pub p95_latency_ms: f64,
    /// 99th percentile latency in milliseconds
    pub p99_latency_ms: f64,
    /// Connection state known when the bucket was created
    pub connection_status: ConnectionStatus,
    /// 24h uptime percentage known when the bucket was created
    pub uptime_percent: f64,
    /// Errors observed during this hour
    pub errors: Vec<ErrorRecord>,
}

impl MetricBucket {
    /// Create an empty bucket for the given key with a connection snapshot
    pub fn new(
        channel: impl Into<String>,
        account_id: Option<&str>,
        bucket_start: DateTime<Utc>,
        connection_status: ConnectionStatus,
        uptime_percent: f64,
    ) -> Self {
        Self {
            channel: channel.into(),
            account_id: account_id.map(str::to_string),
            bucket_start,
            messages_received: 0,
            messages_sent: 0,
            messages_failed: 0,
            media_received: 0,
            media_sent: 0,
            avg_latency_ms: 0.0,
            p95_latency_ms: 0.0,
            p99_latency_ms: 0.0,
            connection_status,
            uptime_percent,
            errors: Vec::new(),
        }
    }

    /// Total message events aggregated in this bucket
    pub fn total_messages(&self) -> u64 {
        self.messages_received + self.messages_sent + self.messages_failed
    }
}

/// Structured error reported by a channel adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Stable identifier, used to resolve the error later
    pub id: Uuid,
    /// When the error occurred
    pub timestamp: DateTime<Utc>,
    /// Machine-readable code (e.g. "RATE_LIMIT")
    pub code: String,
    /// Human-readable description
    pub message: String,
    /// Free-form context supplied by the adapter
    pub context: Option<HashMap<String, serde_json::Value>>,
    /// Whether an external workflow has resolved this error
    pub resolved: bool,
    /// When the error was resolved
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ErrorRecord {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        context: Option<HashMap<String, serde_json::Value>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            code: code.into(),
            message: message.into(),
            context,
            resolved: false,
            resolved_at: None,
        }
    }
}

/// Connection lifecycle event for a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    /// When the transition was reported
    pub timestamp: DateTime<Utc>,
    /// What happened
    pub kind: ConnectionEventKind,
    /// Optional human-readable reason (e.g. "socket closed by peer")
    pub reason: Option<String>,
    /// How long the prior state lasted, in milliseconds. Meaningful for
    /// `disconnected` and `reconnecting`, where it counts as downtime.
    pub duration_ms: Option<u64>,
}

/// One ranked finding contributing to a channel's health classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthIssue {
    /// How severe the finding is
    pub severity: IssueSeverity,
    /// Machine-readable code (see `constants::issue_codes`)
    pub code: String,
    /// Human-readable explanation carrying the measured value
    pub message: String,
    /// First time this finding was observed
    pub first_seen: DateTime<Utc>,
    /// Most recent time this finding was observed
    pub last_seen: DateTime<Utc>,
    /// How many times this finding was observed
    pub occurrences: u32,
}

impl HealthIssue {
    /// Create an issue observed once at the given instant
    pub fn observed_once(
        severity: IssueSeverity,
        code: impl Into<String>,
        message: impl Into<String>,
        seen_at: DateTime<Utc>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            first_seen: seen_at,
            last_seen: seen_at,
            occurrences: 1,
        }
    }
}

/// Derived health projection for one channel
///
/// Always recomputed from the last 24h of buckets, errors, and connection
/// events; never authored directly. The collector caches the latest evaluation
/// per channel, so readers see the most recent projection without recomputing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelHealth {
    /// Channel identifier
    pub channel: String,
    /// Derived classification
    pub status: ChannelStatus,
    /// Latest activity across buckets and connection events, if any
    pub last_seen: Option<DateTime<Utc>>,
    /// Failed messages over all messages in the window (0.0-1.0)
    pub error_rate: f64,
    /// Maximum bucket p95 latency in the window, in milliseconds
    pub latency_p95_ms: f64,
    /// Uptime percentage over the window
    pub uptime_percent: f64,
    /// Count of `reconnecting` events in the window
    pub reconnections: u64,
    /// Ranked findings, most severe first
    pub issues: Vec<HealthIssue>,
    /// When this projection was computed
    pub evaluated_at: DateTime<Utc>,
}

/// Aggregate status counts across all known channels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    /// Total channels known to any store
    pub total_channels: usize,
    /// Channels currently classified healthy
    pub healthy: usize,
    /// Channels currently classified degraded
    pub degraded: usize,
    /// Channels currently classified unhealthy
    pub unhealthy: usize,
    /// Channels currently classified offline
    pub offline: usize,
}

impl HealthSummary {
    /// Check if every known channel is operating normally
    pub fn all_operational(&self) -> bool {
        self.unhealthy == 0 && self.offline == 0
    }
}
