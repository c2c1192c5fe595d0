//! Proptest strategies for engine domain values.

use proptest::prelude::*;

use pulse_core::ConnectionEventKind;

use super::builders::MessageOp;

/// Strategy for generating channel names
pub fn channel_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}"
}

/// Strategy for generating a single latency sample in milliseconds
pub fn latency_strategy() -> impl Strategy<Value = f64> {
    0.1f64..10_000.0
}

/// Strategy for generating a batch of latency samples
pub fn latency_batch_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(latency_strategy(), 1..200)
}

/// Strategy for generating error codes
pub fn error_code_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z_]{2,15}"
}

/// Strategy for generating one message operation
pub fn message_op_strategy() -> impl Strategy<Value = MessageOp> {
    prop_oneof![
        Just(MessageOp::Received),
        Just(MessageOp::Sent),
        Just(MessageOp::Failed),
    ]
}

/// Strategy for generating a sequence of message operations
pub fn message_ops_strategy() -> impl Strategy<Value = Vec<MessageOp>> {
    prop::collection::vec(message_op_strategy(), 1..100)
}

/// Strategy for generating connection event kinds
pub fn connection_event_kind_strategy() -> impl Strategy<Value = ConnectionEventKind> {
    prop_oneof![
        Just(ConnectionEventKind::Connected),
        Just(ConnectionEventKind::Disconnected),
        Just(ConnectionEventKind::Reconnecting),
        Just(ConnectionEventKind::Error),
        Just(ConnectionEventKind::Authenticated),
    ]
}

/// Strategy for generating (kind, duration_ms, minutes_back) event histories
pub fn connection_history_strategy(
) -> impl Strategy<Value = Vec<(ConnectionEventKind, Option<u64>, i64)>> {
    prop::collection::vec(
        (
            connection_event_kind_strategy(),
            prop::option::of(0u64..86_400_000),
            0i64..1440,
        ),
        0..50,
    )
}
