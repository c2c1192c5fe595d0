//! # Health Transition Events
//!
//! Broadcast notifications emitted when a channel's derived health status
//! changes between evaluations. Consumers subscribe for alerting or UI badge
//! updates; publishing never blocks the evaluation path.
//!
//! ## Usage
//!
//! ```rust
//! use pulse_core::{ChannelStatus, HealthEventPublisher, HealthTransition};
//! use chrono::Utc;
//!
//! # tokio_test::block_on(async {
//! let publisher = HealthEventPublisher::default();
//! let mut updates = publisher.subscribe();
//!
//! publisher.publish(HealthTransition {
//!     channel: "whatsapp".to_string(),
//!     previous: Some(ChannelStatus::Healthy),
//!     current: ChannelStatus::Degraded,
//!     occurred_at: Utc::now(),
//! });
//!
//! let transition = updates.recv().await.unwrap();
//! assert_eq!(transition.current, ChannelStatus::Degraded);
//! # });
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::ChannelStatus;

/// A change in a channel's derived health status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthTransition {
    /// Channel whose status changed
    pub channel: String,
    /// Status before this evaluation, `None` on the first evaluation
    pub previous: Option<ChannelStatus>,
    /// Status after this evaluation
    pub current: ChannelStatus,
    /// When the evaluation producing the change ran
    pub occurred_at: DateTime<Utc>,
}

/// Broadcast publisher for health transitions
#[derive(Debug, Clone)]
pub struct HealthEventPublisher {
    sender: broadcast::Sender<HealthTransition>,
}

impl HealthEventPublisher {
    /// Create a new publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a transition
    ///
    /// A broadcast send fails only when no subscribers exist, which is normal
    /// for an engine embedded in hosts that never subscribe, so that outcome
    /// is swallowed.
    pub fn publish(&self, transition: HealthTransition) {
        match self.sender.send(transition) {
            Ok(_) => {}
            Err(broadcast::error::SendError(_)) => {}
        }
    }

    /// Subscribe to future transitions
    pub fn subscribe(&self) -> broadcast::Receiver<HealthTransition> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for HealthEventPublisher {
    fn default() -> Self {
        Self::new(256) // Transitions are rare; a small buffer is plenty
    }
}
