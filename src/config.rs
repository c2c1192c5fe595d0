//! # Monitoring Configuration
//!
//! Process-wide configuration for the observability engine: retention windows,
//! alert thresholds, and the sweep cadence. Constructed once at startup
//! (defaults or environment), replaced wholesale through
//! `ChannelMetricsCollector::update_config`, never merged.

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

/// How long each record kind survives before the sweeper prunes it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Metric buckets older than this are deleted
    pub metrics_hours: i64,
    /// Error records older than this are deleted
    pub errors_hours: i64,
    /// Connection events older than this are deleted
    pub connection_events_hours: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            metrics_hours: 24,
            errors_hours: 72,
            connection_events_hours: 24,
        }
    }
}

/// Thresholds separating `unhealthy` from the degraded/healthy band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Error rate in percent (0-100) above which a channel is unhealthy
    pub error_rate_percent: f64,
    /// p95 latency in milliseconds above which a channel is unhealthy
    pub latency_p95_ms: f64,
    /// Uptime percentage below which a channel is unhealthy
    pub uptime_percent: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            error_rate_percent: 5.0,
            latency_p95_ms: 5000.0,
            uptime_percent: 95.0,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Retention windows per record kind
    pub retention: RetentionConfig,
    /// Alert thresholds for health classification
    pub alert_thresholds: AlertThresholds,
    /// Seconds between retention sweeps
    pub sweep_interval_seconds: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            retention: RetentionConfig::default(),
            alert_thresholds: AlertThresholds::default(),
            sweep_interval_seconds: 60,
        }
    }
}

impl MonitoringConfig {
    /// Build a configuration from defaults with `PULSE_*` environment overrides
    ///
    /// Recognized variables: `PULSE_METRICS_RETENTION_HOURS`,
    /// `PULSE_ERROR_RETENTION_HOURS`, `PULSE_CONNECTION_EVENT_RETENTION_HOURS`,
    /// `PULSE_ERROR_RATE_PERCENT`, `PULSE_LATENCY_P95_MS`,
    /// `PULSE_UPTIME_PERCENT`, `PULSE_SWEEP_INTERVAL_SECONDS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(hours) = std::env::var("PULSE_METRICS_RETENTION_HOURS") {
            config.retention.metrics_hours = hours.parse().map_err(|e| {
                MonitorError::ConfigurationError(format!("Invalid metrics_hours: {e}"))
            })?;
        }

        if let Ok(hours) = std::env::var("PULSE_ERROR_RETENTION_HOURS") {
            config.retention.errors_hours = hours.parse().map_err(|e| {
                MonitorError::ConfigurationError(format!("Invalid errors_hours: {e}"))
            })?;
        }

        if let Ok(hours) = std::env::var("PULSE_CONNECTION_EVENT_RETENTION_HOURS") {
            config.retention.connection_events_hours = hours.parse().map_err(|e| {
                MonitorError::ConfigurationError(format!("Invalid connection_events_hours: {e}"))
            })?;
        }

        if let Ok(percent) = std::env::var("PULSE_ERROR_RATE_PERCENT") {
            config.alert_thresholds.error_rate_percent = percent.parse().map_err(|e| {
                MonitorError::ConfigurationError(format!("Invalid error_rate_percent: {e}"))
            })?;
        }

        if let Ok(ms) = std::env::var("PULSE_LATENCY_P95_MS") {
            config.alert_thresholds.latency_p95_ms = ms.parse().map_err(|e| {
                MonitorError::ConfigurationError(format!("Invalid latency_p95_ms: {e}"))
            })?;
        }

        if let Ok(percent) = std::env::var("PULSE_UPTIME_PERCENT") {
            config.alert_thresholds.uptime_percent = percent.parse().map_err(|e| {
                MonitorError::ConfigurationError(format!("Invalid uptime_percent: {e}"))
            })?;
        }

        if let Ok(seconds) = std::env::var("PULSE_SWEEP_INTERVAL_SECONDS") {
            config.sweep_interval_seconds = seconds.parse().map_err(|e| {
                MonitorError::ConfigurationError(format!("Invalid sweep_interval_seconds: {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration, rejecting values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.retention.metrics_hours < 1 {
            return Err(MonitorError::ConfigurationError(
                "retention.metrics_hours must be at least 1".to_string(),
            ));
        }
        if self.retention.errors_hours < 1 {
            return Err(MonitorError::ConfigurationError(
                "retention.errors_hours must be at least 1".to_string(),
            ));
        }
        if self.retention.connection_events_hours < 1 {
            return Err(MonitorError::ConfigurationError(
                "retention.connection_events_hours must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.alert_thresholds.error_rate_percent) {
            return Err(MonitorError::ConfigurationError(
                "alert_thresholds.error_rate_percent must be between 0 and 100".to_string(),
            ));
        }
        if self.alert_thresholds.latency_p95_ms <= 0.0 {
            return Err(MonitorError::ConfigurationError(
                "alert_thresholds.latency_p95_ms must be positive".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.alert_thresholds.uptime_percent) {
            return Err(MonitorError::ConfigurationError(
                "alert_thresholds.uptime_percent must be between 0 and 100".to_string(),
            ));
        }
        if self.sweep_interval_seconds == 0 {
            return Err(MonitorError::ConfigurationError(
                "sweep_interval_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
