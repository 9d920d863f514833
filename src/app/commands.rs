//! Inbound commands to the engine.
//!
//! Produced by the [`CommandRouter`](crate::router::CommandRouter) from bus
//! traffic, or built directly by embedding code.

use crate::io::pulse::PulsePattern;

/// Typed channel command, already validated against the channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCommand {
    /// Drive an output; cancels any pulse running on it.
    SetOutput { channel: usize, value: bool },

    /// Configure an input's pull-up.
    SetPullup { channel: usize, enabled: bool },

    /// Bind a pulse pattern to an output, preempting any running one.
    StartPulse { channel: usize, pattern: PulsePattern },
}

/// Whether an applied change is published and persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Publish the new state and flush the snapshot.
    Announce,
    /// Update in memory only; the next announced change persists it.
    Silent,
}
