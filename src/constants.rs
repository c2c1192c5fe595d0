//! # Engine Constants
//!
//! Fixed operational boundaries of the channel observability engine: per-channel
//! collection caps, the health evaluation window, and the degraded-band cutoffs
//! that sit below the configurable alert thresholds.

/// Hard caps on per-channel collections. Growth beyond a cap evicts the oldest
/// entry (FIFO), bounding memory independently of retention windows.
pub mod caps {
    /// Maximum error records retained per channel
    pub const MAX_ERRORS_PER_CHANNEL: usize = 1000;

    /// Maximum connection events retained per channel
    pub const MAX_CONNECTION_EVENTS_PER_CHANNEL: usize = 1000;

    /// Maximum raw latency samples retained per channel
    pub const MAX_LATENCY_SAMPLES_PER_CHANNEL: usize = 1000;
}

/// Health evaluation boundaries. The alert thresholds in `MonitoringConfig`
/// separate `unhealthy` from the rest; these fixed cutoffs separate `degraded`
/// from `healthy` and mark the uptime floor below which a channel is treated
/// as offline outright.
pub mod health {
    /// Evaluation window in hours. Health is always derived from the last 24h
    /// regardless of the `hours_back` used by query methods.
    pub const EVALUATION_WINDOW_HOURS: i64 = 24;

    /// Error rate (0.0-1.0) above which a channel is at least degraded
    pub const DEGRADED_ERROR_RATE: f64 = 0.01;

    /// p95 latency in milliseconds above which a channel is at least degraded
    pub const DEGRADED_LATENCY_P95_MS: f64 = 2000.0;

    /// Uptime percentage below which a channel is at least degraded
    pub const DEGRADED_UPTIME_PERCENT: f64 = 99.0;

    /// Uptime percentage below which a channel is classified offline
    pub const OFFLINE_UPTIME_PERCENT: f64 = 50.0;

    /// Maximum unresolved errors surfaced as issues per evaluation
    pub const MAX_UNRESOLVED_ERROR_ISSUES: usize = 5;
}

/// Machine-readable issue codes attached to health evaluations
pub mod issue_codes {
    /// Channel has never produced a metric bucket
    pub const NO_METRICS: &str = "NO_METRICS";

    /// No buckets inside the evaluation window, or uptime below the offline floor
    pub const OFFLINE: &str = "OFFLINE";

    /// Error rate breached the configured alert threshold
    pub const HIGH_ERROR_RATE: &str = "HIGH_ERROR_RATE";

    /// p95 latency breached the configured alert threshold
    pub const HIGH_LATENCY: &str = "HIGH_LATENCY";

    /// Uptime fell below the configured alert threshold
    pub const LOW_UPTIME: &str = "LOW_UPTIME";

    /// Error rate inside the degraded band but below the alert threshold
    pub const MODERATE_ERROR_RATE: &str = "MODERATE_ERROR_RATE";
}
