//! Builders for seeding collectors and constructing domain values in tests.

use chrono::{DateTime, Duration, Utc};
use pulse_core::{
    ChannelMetricsCollector, ConnectionEvent, ConnectionEventKind, ConnectionStatus, ErrorRecord,
    MetricBucket,
};

/// One recorded message operation, for generated sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOp {
    Received,
    Sent,
    Failed,
}

/// Apply a sequence of message operations to one channel
pub fn apply_message_ops(collector: &ChannelMetricsCollector, channel: &str, ops: &[MessageOp]) {
    for op in ops {
        match op {
            MessageOp::Received => collector.record_message_received(channel, None, 0.0, 0),
            MessageOp::Sent => collector.record_message_sent(channel, None, 0.0, 0),
            MessageOp::Failed => collector.record_message_failed(channel, None),
        }
    }
}

/// Record `count` inbound messages with a fixed latency
pub fn record_traffic(
    collector: &ChannelMetricsCollector,
    channel: &str,
    count: usize,
    latency_ms: f64,
) {
    for _ in 0..count {
        collector.record_message_received(channel, None, latency_ms, 0);
    }
}

/// Bucket with explicit message counters, for direct health evaluation
pub fn bucket_with_counts(
    channel: &str,
    bucket_start: DateTime<Utc>,
    received: u64,
    sent: u64,
    failed: u64,
) -> MetricBucket {
    let mut bucket = MetricBucket::new(
        channel,
        None,
        bucket_start,
        ConnectionStatus::Connected,
        100.0,
    );
    bucket.messages_received = received;
    bucket.messages_sent = sent;
    bucket.messages_failed = failed;
    bucket
}

/// Downtime-bearing disconnection some minutes in the past
pub fn downtime_event(now: DateTime<Utc>, minutes_back: i64, duration_ms: u64) -> ConnectionEvent {
    ConnectionEvent {
        timestamp: now - Duration::minutes(minutes_back),
        kind: ConnectionEventKind::Disconnected,
        reason: Some("connection lost".to_string()),
        duration_ms: Some(duration_ms),
    }
}

/// Unresolved error stamped a given number of minutes in the past
pub fn error_at(now: DateTime<Utc>, minutes_back: i64, code: &str) -> ErrorRecord {
    let mut record = ErrorRecord::new(code, "synthetic failure", None);
    record.timestamp = now - Duration::minutes(minutes_back);
    record
}
