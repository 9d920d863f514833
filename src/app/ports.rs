//! Port traits: the hexagonal boundary between the engine and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AdapterEngine (domain)
//! ```
//!
//! Driven adapters (pin banks, snapshot files, bus publishers, clocks)
//! implement these traits.  The [`AdapterEngine`](super::service::AdapterEngine)
//! consumes them via generics, so the engine never touches hardware directly.

use core::fmt;

use crate::error::{HardwareWriteFailed, StoreError};
use crate::io::state::Snapshot;

// ───────────────────────────────────────────────────────────────
// Hardware port (driven adapter: domain ↔ pins)
// ───────────────────────────────────────────────────────────────

/// Digital channel access, injected per deployment (simulator, GPIO bank).
///
/// Reads and writes are expected to return within microseconds.  A failed
/// write is reported once and never retried by the engine.
pub trait HardwareIo {
    /// Sample input `channel`.
    fn read(&mut self, channel: usize) -> bool;

    /// Drive output `channel` to `value`.
    fn write(&mut self, channel: usize, value: bool) -> Result<(), HardwareWriteFailed>;

    /// Enable or disable the pull-up on input `channel`.
    ///
    /// Banks without configurable pull-ups accept every request.
    fn set_pullup(&mut self, _channel: usize, _enabled: bool) -> Result<(), HardwareWriteFailed> {
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// State port (driven adapter: domain ↔ snapshot storage)
// ───────────────────────────────────────────────────────────────

/// Whole-image snapshot persistence.
///
/// `save` overwrites the complete image; there are no incremental writes.
/// Callers wrap this in [`StateStore`](crate::io::state::StateStore), which
/// turns every `load` failure into a fresh default snapshot.
pub trait StatePort {
    fn load(&self) -> Result<Snapshot, StoreError>;
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

impl<T: StatePort + ?Sized> StatePort for &T {
    fn load(&self) -> Result<Snapshot, StoreError> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        (**self).save(snapshot)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → bus / log)
// ───────────────────────────────────────────────────────────────

/// The engine emits [`IoEvent`](super::events::IoEvent)s through this port.
/// Adapters decide where they go (bus topics, log lines, a test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::IoEvent);
}

/// Fan out to two sinks, left first.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::IoEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Bus port (driven adapter: domain → pub/sub transport)
// ───────────────────────────────────────────────────────────────

/// Publish primitive of the bus transport.  Connection handling, QoS and
/// delivery guarantees belong to the implementation.
pub trait BusPort {
    fn publish(&mut self, topic: &str, payload: &[u8], retained: bool) -> Result<(), BusError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Both clocks read at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    /// Monotonic milliseconds; drives pulse timing.
    pub mono_ms: u64,
    /// Wall-clock milliseconds since the Unix epoch; stamps input transitions.
    pub wall_ms: u64,
}

pub trait Clock {
    /// Monotonic microseconds since an arbitrary origin.
    fn mono_us(&self) -> u64;

    /// Wall-clock milliseconds since the Unix epoch.
    fn wall_ms(&self) -> u64;

    fn now(&self) -> Timestamp {
        Timestamp {
            mono_ms: self.mono_us() / 1000,
            wall_ms: self.wall_ms(),
        }
    }
}

/// A stopped clock: always reads this instant.
impl Clock for Timestamp {
    fn mono_us(&self) -> u64 {
        self.mono_ms.saturating_mul(1000)
    }

    fn wall_ms(&self) -> u64 {
        self.wall_ms
    }

    fn now(&self) -> Timestamp {
        *self
    }
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`BusPort::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Transport is not connected; the message was dropped.
    Disconnected,
    /// Transport accepted the call but failed to send.
    IoError,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "bus disconnected"),
            Self::IoError => write!(f, "bus I/O error"),
        }
    }
}
