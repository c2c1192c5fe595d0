//! # Channel Health Evaluation
//!
//! Derives a `healthy | degraded | unhealthy | offline` classification for a
//! channel from its last 24 hours of metric buckets, error records, and
//! connection events. Every evaluation recomputes from scratch; there is no
//! persisted previous state constraining the next one, so transient spikes can
//! oscillate the status between evaluations.
//!
//! ## Precedence
//!
//! 1. Channel has never produced a bucket: `offline` with `NO_METRICS`.
//! 2. No buckets inside the window, or uptime below the 50% floor: `offline`
//!    with `OFFLINE`.
//! 3. Any configured alert threshold breached: `unhealthy`, one issue per
//!    breach.
//! 4. Any degraded-band cutoff crossed: `degraded`.
//! 5. Otherwise `healthy`.
//!
//! Whatever branch wins, the five most recent unresolved errors inside the
//! window are appended as warning issues, and the final list is ordered most
//! severe first.

use chrono::{DateTime, Duration, Utc};

use crate::config::AlertThresholds;
use crate::constants::{health as cutoffs, issue_codes};
use crate::types::{
    ChannelHealth, ChannelStatus, ConnectionEvent, ConnectionEventKind, ErrorRecord, HealthIssue,
    IssueSeverity, MetricBucket,
};

/// Derive uptime over the fixed 24h evaluation window, as a percentage
///
/// Downtime is the sum of `duration_ms` across `disconnected` and
/// `reconnecting` events inside the window. The result is floored at 0; it is
/// only as accurate as the durations adapters report on each transition.
pub fn derive_uptime_percent(events: &[ConnectionEvent], now: DateTime<Utc>) -> f64 {
    let window = Duration::hours(cutoffs::EVALUATION_WINDOW_HOURS);
    let window_start = now - window;
    let window_ms = window.num_milliseconds() as f64;

    // Reported durations are unbounded; accumulate in f64 so the sum clamps
    // instead of overflowing.
    let downtime_ms: f64 = events
        .iter()
        .filter(|event| event.timestamp >= window_start && event.kind.is_downtime())
        .filter_map(|event| event.duration_ms)
        .map(|ms| ms as f64)
        .sum();

    let uptime = 100.0 - (downtime_ms / window_ms) * 100.0;
    uptime.max(0.0)
}

/// Evaluate a channel's health from its retained records
///
/// `buckets`, `errors`, and `events` are the channel's full retained
/// collections; windowing to the last 24h happens here. The caller supplies
/// `now` so evaluations are reproducible in tests.
pub fn evaluate_channel_health(
    channel: &str,
    buckets: &[MetricBucket],
    errors: &[ErrorRecord],
    events: &[ConnectionEvent],
    thresholds: &AlertThresholds,
    now: DateTime<Utc>,
) -> ChannelHealth {
    let window_start = now - Duration::hours(cutoffs::EVALUATION_WINDOW_HOURS);

    let recent_buckets: Vec<&MetricBucket> = buckets
        .iter()
        .filter(|bucket| bucket.bucket_start >= window_start)
        .collect();

    let received: u64 = recent_buckets.iter().map(|b| b.messages_received).sum();
    let sent: u64 = recent_buckets.iter().map(|b| b.messages_sent).sum();
    let failed: u64 = recent_buckets.iter().map(|b| b.messages_failed).sum();
    let total_messages = received + sent + failed;
    let error_rate = if total_messages > 0 {
        failed as f64 / total_messages as f64
    } else {
        0.0
    };

    let latency_p95_ms = recent_buckets
        .iter()
        .map(|b| b.p95_latency_ms)
        .fold(0.0, f64::max);

    let uptime_percent = derive_uptime_percent(events, now);

    let reconnections = events
        .iter()
        .filter(|event| {
            event.timestamp >= window_start && event.kind == ConnectionEventKind::Reconnecting
        })
        .count() as u64;

    let latest_bucket = buckets.iter().map(|b| b.bucket_start).max();
    let latest_event = events.iter().map(|e| e.timestamp).max();
    let last_seen = match (latest_bucket, latest_event) {
        (Some(bucket), Some(event)) => Some(bucket.max(event)),
        (bucket, event) => bucket.or(event),
    };

    let (status, mut issues) = classify(
        buckets,
        &recent_buckets,
        error_rate,
        latency_p95_ms,
        uptime_percent,
        thresholds,
        now,
    );

    append_unresolved_error_issues(&mut issues, errors, window_start);

    // Most severe first; order within a severity is retained
    issues.sort_by(|a, b| b.severity.cmp(&a.severity));

    ChannelHealth {
        channel: channel.to_string(),
        status,
        last_seen,
        error_rate,
        latency_p95_ms,
        uptime_percent,
        reconnections,
        issues,
        evaluated_at: now,
    }
}

fn classify(
    buckets: &[MetricBucket],
    recent_buckets: &[&MetricBucket],
    error_rate: f64,
    latency_p95_ms: f64,
    uptime_percent: f64,
    thresholds: &AlertThresholds,
    now: DateTime<Utc>,
) -> (ChannelStatus, Vec<HealthIssue>) {
    if buckets.is_empty() {
        let issue = HealthIssue::observed_once(
            IssueSeverity::Error,
            issue_codes::NO_METRICS,
            "No metrics recorded for this channel",
            now,
        );
        return (ChannelStatus::Offline, vec![issue]);
    }

    if recent_buckets.is_empty() || uptime_percent < cutoffs::OFFLINE_UPTIME_PERCENT {
        let message = if recent_buckets.is_empty() {
            format!(
                "No metric buckets in the last {} hours",
                cutoffs::EVALUATION_WINDOW_HOURS
            )
        } else {
            format!(
                "Uptime {uptime_percent:.1}% below the {:.0}% offline floor",
                cutoffs::OFFLINE_UPTIME_PERCENT
            )
        };
        let issue =
            HealthIssue::observed_once(IssueSeverity::Error, issue_codes::OFFLINE, message, now);
        return (ChannelStatus::Offline, vec![issue]);
    }

    let mut breaches = Vec::new();
    if error_rate > thresholds.error_rate_percent / 100.0 {
        breaches.push(HealthIssue::observed_once(
            IssueSeverity::Error,
            issue_codes::HIGH_ERROR_RATE,
            format!(
                "Error rate {:.1}% exceeds {:.1}% threshold",
                error_rate * 100.0,
                thresholds.error_rate_percent
            ),
            now,
        ));
    }
    if latency_p95_ms > thresholds.latency_p95_ms {
        breaches.push(HealthIssue::observed_once(
            IssueSeverity::Warning,
            issue_codes::HIGH_LATENCY,
            format!(
                "p95 latency {latency_p95_ms:.0}ms exceeds {:.0}ms threshold",
                thresholds.latency_p95_ms
            ),
            now,
        ));
    }
    if uptime_percent < thresholds.uptime_percent {
        breaches.push(HealthIssue::observed_once(
            IssueSeverity::Error,
            issue_codes::LOW_UPTIME,
            format!(
                "Uptime {uptime_percent:.1}% below {:.1}% threshold",
                thresholds.uptime_percent
            ),
            now,
        ));
    }
    if !breaches.is_empty() {
        return (ChannelStatus::Unhealthy, breaches);
    }

    let elevated_error_rate = error_rate > cutoffs::DEGRADED_ERROR_RATE;
    if elevated_error_rate
        || latency_p95_ms > cutoffs::DEGRADED_LATENCY_P95_MS
        || uptime_percent < cutoffs::DEGRADED_UPTIME_PERCENT
    {
        let mut issues = Vec::new();
        if elevated_error_rate {
            issues.push(HealthIssue::observed_once(
                IssueSeverity::Warning,
                issue_codes::MODERATE_ERROR_RATE,
                format!("Error rate {:.1}% is elevated", error_rate * 100.0),
                now,
            ));
        }
        return (ChannelStatus::Degraded, issues);
    }

    (ChannelStatus::Healthy, Vec::new())
}

/// Append the most recent unresolved errors in the window as warning issues,
/// newest first, capped at five
fn append_unresolved_error_issues(
    issues: &mut Vec<HealthIssue>,
    errors: &[ErrorRecord],
    window_start: DateTime<Utc>,
) {
    let mut unresolved: Vec<&ErrorRecord> = errors
        .iter()
        .filter(|error| !error.resolved && error.timestamp >= window_start)
        .collect();
    unresolved.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    for error in unresolved
        .into_iter()
        .take(cutoffs::MAX_UNRESOLVED_ERROR_ISSUES)
    {
        issues.push(HealthIssue::observed_once(
            IssueSeverity::Warning,
            error.code.clone(),
            error.message.clone(),
            error.timestamp,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConnectionEventKind, ConnectionStatus};
    use chrono::TimeZone;

    fn test_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn bucket_at(
        hours_ago: i64,
        received: u64,
        sent: u64,
        failed: u64,
        p95_ms: f64,
    ) -> MetricBucket {
        let mut bucket = MetricBucket::new(
            "whatsapp",
            None,
            test_now() - Duration::hours(hours_ago),
            ConnectionStatus::Connected,
            100.0,
        );
        bucket.messages_received = received;
        bucket.messages_sent = sent;
        bucket.messages_failed = failed;
        bucket.p95_latency_ms = p95_ms;
        bucket
    }

    fn downtime_event(hours_ago: i64, duration_ms: u64) -> ConnectionEvent {
        ConnectionEvent {
            timestamp: test_now() - Duration::hours(hours_ago),
            kind: ConnectionEventKind::Disconnected,
            reason: Some("socket closed".to_string()),
            duration_ms: Some(duration_ms),
        }
    }

    fn error_at(hours_ago: i64, code: &str, resolved: bool) -> ErrorRecord {
        let mut record = ErrorRecord::new(code, format!("{code} occurred"), None);
        record.timestamp = test_now() - Duration::hours(hours_ago);
        record.resolved = resolved;
        record
    }

    fn thresholds() -> AlertThresholds {
        AlertThresholds::default()
    }

    #[test]
    fn test_no_buckets_ever_is_offline_no_metrics() {
        let health =
            evaluate_channel_health("whatsapp", &[], &[], &[], &thresholds(), test_now());

        assert_eq!(health.status, ChannelStatus::Offline);
        assert_eq!(health.issues.len(), 1);
        assert_eq!(health.issues[0].code, issue_codes::NO_METRICS);
        assert_eq!(health.issues[0].severity, IssueSeverity::Error);
        assert!(health.last_seen.is_none());
        assert_eq!(health.error_rate, 0.0);
    }

    #[test]
    fn test_only_stale_buckets_is_offline() {
        let buckets = vec![bucket_at(30, 100, 0, 0, 120.0)];
        let health =
            evaluate_channel_health("whatsapp", &buckets, &[], &[], &thresholds(), test_now());

        assert_eq!(health.status, ChannelStatus::Offline);
        assert_eq!(health.issues[0].code, issue_codes::OFFLINE);
        // Stale activity still counts toward last_seen
        assert_eq!(
            health.last_seen,
            Some(test_now() - Duration::hours(30))
        );
    }

    #[test]
    fn test_uptime_below_floor_is_offline() {
        let buckets = vec![bucket_at(1, 100, 0, 0, 120.0)];
        // 13 of 24 hours down: uptime ~45.8%
        let events = vec![downtime_event(2, 13 * 3_600_000)];
        let health = evaluate_channel_health(
            "whatsapp",
            &buckets,
            &[],
            &events,
            &thresholds(),
            test_now(),
        );

        assert_eq!(health.status, ChannelStatus::Offline);
        assert_eq!(health.issues[0].code, issue_codes::OFFLINE);
        assert!(health.uptime_percent < 50.0);
    }

    #[test]
    fn test_clean_traffic_is_healthy() {
        let buckets = vec![bucket_at(1, 100, 50, 0, 150.0)];
        let health =
            evaluate_channel_health("whatsapp", &buckets, &[], &[], &thresholds(), test_now());

        assert_eq!(health.status, ChannelStatus::Healthy);
        assert!(health.issues.is_empty());
        assert_eq!(health.error_rate, 0.0);
        assert_eq!(health.uptime_percent, 100.0);
    }

    #[test]
    fn test_high_error_rate_is_unhealthy() {
        // 10 failed of 50 total: 20% error rate
        let buckets = vec![bucket_at(1, 40, 0, 10, 150.0)];
        let health =
            evaluate_channel_health("whatsapp", &buckets, &[], &[], &thresholds(), test_now());

        assert_eq!(health.status, ChannelStatus::Unhealthy);
        assert_eq!(health.issues[0].code, issue_codes::HIGH_ERROR_RATE);
        assert_eq!(health.issues[0].severity, IssueSeverity::Error);
        assert!(health.issues[0].message.contains("20.0%"));
    }

    #[test]
    fn test_high_latency_is_unhealthy() {
        let buckets = vec![bucket_at(1, 100, 0, 0, 6500.0)];
        let health =
            evaluate_channel_health("whatsapp", &buckets, &[], &[], &thresholds(), test_now());

        assert_eq!(health.status, ChannelStatus::Unhealthy);
        assert_eq!(health.issues[0].code, issue_codes::HIGH_LATENCY);
        assert_eq!(health.issues[0].severity, IssueSeverity::Warning);
    }

    #[test]
    fn test_low_uptime_is_unhealthy() {
        let buckets = vec![bucket_at(1, 100, 0, 0, 150.0)];
        // 2.4 of 24 hours down: uptime 90%, below the 95% threshold but
        // above the 50% offline floor
        let events = vec![downtime_event(3, 8_640_000)];
        let health = evaluate_channel_health(
            "whatsapp",
            &buckets,
            &[],
            &events,
            &thresholds(),
            test_now(),
        );

        assert_eq!(health.status, ChannelStatus::Unhealthy);
        assert_eq!(health.issues[0].code, issue_codes::LOW_UPTIME);
        assert!((health.uptime_percent - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_multiple_breaches_emit_one_issue_each() {
        let buckets = vec![bucket_at(1, 40, 0, 10, 6500.0)];
        let health =
            evaluate_channel_health("whatsapp", &buckets, &[], &[], &thresholds(), test_now());

        assert_eq!(health.status, ChannelStatus::Unhealthy);
        let codes: Vec<&str> = health.issues.iter().map(|i| i.code.as_str()).collect();
        assert!(codes.contains(&issue_codes::HIGH_ERROR_RATE));
        assert!(codes.contains(&issue_codes::HIGH_LATENCY));
    }

    #[test]
    fn test_moderate_error_rate_is_degraded() {
        // 2 failed of 100 total: 2%, above the 1% degraded cutoff but below
        // the 5% alert threshold
        let buckets = vec![bucket_at(1, 98, 0, 2, 150.0)];
        let health =
            evaluate_channel_health("whatsapp", &buckets, &[], &[], &thresholds(), test_now());

        assert_eq!(health.status, ChannelStatus::Degraded);
        assert_eq!(health.issues.len(), 1);
        assert_eq!(health.issues[0].code, issue_codes::MODERATE_ERROR_RATE);
    }

    #[test]
    fn test_elevated_latency_is_degraded_without_issue() {
        let buckets = vec![bucket_at(1, 100, 0, 0, 3000.0)];
        let health =
            evaluate_channel_health("whatsapp", &buckets, &[], &[], &thresholds(), test_now());

        assert_eq!(health.status, ChannelStatus::Degraded);
        assert!(health.issues.is_empty());
    }

    #[test]
    fn test_unresolved_errors_appended_newest_first_capped_at_five() {
        let buckets = vec![bucket_at(1, 100, 0, 0, 150.0)];
        let errors = vec![
            error_at(7, "E7", false),
            error_at(6, "E6", false),
            error_at(5, "E5", false),
            error_at(4, "E4", true),
            error_at(3, "E3", false),
            error_at(2, "E2", false),
            error_at(1, "E1", false),
            error_at(30, "STALE", false),
        ];
        let health = evaluate_channel_health(
            "whatsapp",
            &buckets,
            &errors,
            &[],
            &thresholds(),
            test_now(),
        );

        assert_eq!(health.status, ChannelStatus::Healthy);
        let codes: Vec<&str> = health.issues.iter().map(|i| i.code.as_str()).collect();
        // Five most recent unresolved, newest first; E4 is resolved and the
        // stale one is outside the window
        assert_eq!(codes, vec!["E1", "E2", "E3", "E5", "E6"]);
        assert!(health.issues.iter().all(|i| i.severity == IssueSeverity::Warning));
    }

    #[test]
    fn test_issue_ranking_errors_first() {
        // 10 failed of 50: unhealthy with an error-severity issue, plus an
        // unresolved error surfacing as a warning issue
        let buckets = vec![bucket_at(1, 40, 0, 10, 6500.0)];
        let errors = vec![error_at(1, "RATE_LIMIT", false)];
        let health = evaluate_channel_health(
            "whatsapp",
            &buckets,
            &errors,
            &[],
            &thresholds(),
            test_now(),
        );

        assert_eq!(health.issues[0].severity, IssueSeverity::Error);
        assert_eq!(health.issues[0].code, issue_codes::HIGH_ERROR_RATE);
        let last = health.issues.last().unwrap();
        assert_eq!(last.severity, IssueSeverity::Warning);
    }

    #[test]
    fn test_reconnection_count_windowed() {
        let buckets = vec![bucket_at(1, 100, 0, 0, 150.0)];
        let events = vec![
            ConnectionEvent {
                timestamp: test_now() - Duration::hours(2),
                kind: ConnectionEventKind::Reconnecting,
                reason: None,
                duration_ms: Some(10),
            },
            ConnectionEvent {
                timestamp: test_now() - Duration::hours(3),
                kind: ConnectionEventKind::Reconnecting,
                reason: None,
                duration_ms: Some(10),
            },
            ConnectionEvent {
                timestamp: test_now() - Duration::hours(48),
                kind: ConnectionEventKind::Reconnecting,
                reason: None,
                duration_ms: Some(10),
            },
        ];
        let health = evaluate_channel_health(
            "whatsapp",
            &buckets,
            &[],
            &events,
            &thresholds(),
            test_now(),
        );

        assert_eq!(health.reconnections, 2);
    }

    #[test]
    fn test_uptime_floors_at_zero() {
        // More reported downtime than the window holds
        let events = vec![downtime_event(1, 48 * 3_600_000)];
        let uptime = derive_uptime_percent(&events, test_now());
        assert_eq!(uptime, 0.0);
    }

    #[test]
    fn test_uptime_clamps_extreme_reported_durations() {
        // Duration reports large enough that their integer sum would wrap
        let events = vec![downtime_event(1, u64::MAX), downtime_event(2, u64::MAX)];
        let uptime = derive_uptime_percent(&events, test_now());
        assert_eq!(uptime, 0.0);
    }

    #[test]
    fn test_uptime_ignores_connected_durations() {
        let events = vec![ConnectionEvent {
            timestamp: test_now() - Duration::hours(1),
            kind: ConnectionEventKind::Connected,
            reason: None,
            duration_ms: Some(12 * 3_600_000),
        }];
        let uptime = derive_uptime_percent(&events, test_now());
        assert_eq!(uptime, 100.0);
    }

    #[test]
    fn test_last_seen_prefers_latest_timestamp() {
        let buckets = vec![bucket_at(5, 10, 0, 0, 100.0)];
        let events = vec![ConnectionEvent {
            timestamp: test_now() - Duration::hours(1),
            kind: ConnectionEventKind::Connected,
            reason: None,
            duration_ms: None,
        }];
        let health = evaluate_channel_health(
            "whatsapp",
            &buckets,
            &[],
            &events,
            &thresholds(),
            test_now(),
        );

        assert_eq!(health.last_seen, Some(test_now() - Duration::hours(1)));
    }
}
