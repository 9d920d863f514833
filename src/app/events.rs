//! Outbound engine events.
//!
//! The [`AdapterEngine`](super::service::AdapterEngine) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Only announced changes
//! become events; silent updates (pulse edges, startup restoration) never do.

use crate::error::CommandError;

/// A confirmed input transition.  Identical whether it came from polling
/// or from an interrupt-mode report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent {
    pub channel: usize,
    pub value_old: bool,
    pub value_new: bool,
    /// Absent on the channel's first observed transition.
    pub elapsed_since_last_ms: Option<u64>,
    /// Wall-clock milliseconds since the Unix epoch.
    pub occurred_at: u64,
}

impl TransitionEvent {
    pub const fn is_rise(&self) -> bool {
        !self.value_old && self.value_new
    }
}

/// Structured events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoEvent {
    /// An output was applied (including redundant applies).
    OutputChanged { channel: usize, value: bool },

    /// An input's confirmed level; emitted alongside its transition.
    InputChanged { channel: usize, value: bool },

    /// Edge metadata for a confirmed input change.
    InputTransition(TransitionEvent),

    /// An input's pull-up setting was applied.
    PullupChanged { channel: usize, enabled: bool },

    /// An inbound command was dropped.
    CommandRejected {
        topic: Option<String>,
        error: CommandError,
    },
}
