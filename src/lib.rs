#![allow(clippy::doc_markdown)] // Allow technical terms like DashMap, VecDeque in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Pulse Core
//!
//! In-memory observability engine for multi-channel messaging gateways.
//!
//! ## Overview
//!
//! Pulse Core sits inside a gateway process and watches its messaging
//! channels (WhatsApp, Telegram, Signal, and whatever else the host speaks).
//! Channel adapters push message, error, and connection events into a shared
//! collector; dashboards and alerting read back hourly metric buckets,
//! latency percentiles, and a derived health status per channel. Everything
//! is held in memory with hard caps and retention windows, so the engine
//! never needs a database and never grows without bound.
//!
//! ## Architecture
//!
//! The [`collector::ChannelMetricsCollector`] is the single facade. It owns
//! concurrent per-channel stores (hourly buckets, capped error and
//! connection logs, rolling latency samples) and derives health through the
//! pure evaluator in [`health`]. A background sweeper prunes everything past
//! its retention window on a configurable interval.
//!
//! ## Key Features
//!
//! - **Bounded memory**: per-channel caps on errors, connection events, and
//!   latency samples plus time-based retention for buckets
//! - **Concurrent recording**: adapters record from any thread or task
//!   without coordinating with readers
//! - **Derived health**: four-state classification (healthy, degraded,
//!   unhealthy, offline) with ranked, human-readable issues
//! - **Transition events**: health status changes broadcast to subscribers
//! - **Zero I/O**: the engine only computes; persistence and transport stay
//!   with the host
//!
//! ## Module Organization
//!
//! - [`collector`] - The engine facade: recording, queries, lifecycle
//! - [`health`] - Health evaluation and uptime derivation
//! - [`latency`] - Rolling latency samples and percentile summaries
//! - [`events`] - Health transition broadcast
//! - [`types`] - Domain entities: buckets, errors, events, health
//! - [`config`] - Retention windows, alert thresholds, environment loading
//! - [`constants`] - Caps, health bands, issue codes
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pulse_core::{ChannelMetricsCollector, ConnectionEventKind};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     pulse_core::logging::init_structured_logging();
//!
//!     let collector = Arc::new(ChannelMetricsCollector::new());
//!     collector.start_retention_sweeper();
//!
//!     collector.record_connection_event(
//!         "whatsapp",
//!         ConnectionEventKind::Connected,
//!         None,
//!         None,
//!     );
//!     collector.record_message_received("whatsapp", Some("acct-1"), 142.5, 2048);
//!
//!     let health = collector.update_health("whatsapp");
//!     println!("whatsapp is {}", health.status.as_str());
//!
//!     collector.shutdown();
//! }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib                        # Unit tests
//! cargo test                              # All tests
//! cargo bench --features benchmarks       # Criterion benchmarks
//! ```

pub mod collector;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod health;
pub mod latency;
pub mod logging;
pub mod types;

mod sweeper;

pub use collector::ChannelMetricsCollector;
pub use config::{AlertThresholds, MonitoringConfig, RetentionConfig};
pub use error::{MonitorError, Result};
pub use events::{HealthEventPublisher, HealthTransition};
pub use health::{derive_uptime_percent, evaluate_channel_health};
pub use latency::{LatencySampler, LatencySummary};
pub use types::{
    ChannelHealth, ChannelStatus, ConnectionEvent, ConnectionEventKind, ConnectionStatus,
    ErrorRecord, HealthIssue, HealthSummary, IssueSeverity, MetricBucket,
};
