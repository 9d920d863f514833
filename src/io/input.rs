//! Digital input bank: transition detection with elapsed-time metadata.
//!
//! Two ways in, one event shape out:
//!
//! - **Polling**: [`InputBank::poll_all`] samples every channel through the
//!   [`HardwareIo`] collaborator and compares against the confirmed value.
//!   An optional software debounce window (`debounce_ms`) requires a new
//!   level to hold for that long across polls before it is confirmed.
//! - **Interrupt**: the collaborator debounces in hardware and calls
//!   [`InputBank::report_change`] directly; no software debounce applies.
//!
//! The bank performs no I/O beyond reading samples.  Publishing and
//! persisting confirmed transitions is the caller's job.

use log::{debug, warn};

use crate::app::events::TransitionEvent;
use crate::app::ports::HardwareIo;
use crate::error::{HardwareWriteFailed, ValidationError};
use crate::io::state::InputState;

/// Per-channel debounce bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Debounce {
    Stable,
    Pending { level: bool, since_ms: u64 },
}

pub struct InputBank {
    states: Vec<InputState>,
    debounce: Vec<Debounce>,
    debounce_ms: u64,
}

impl InputBank {
    /// Build the bank around restored (or fresh) channel states.
    pub fn new(states: Vec<InputState>, debounce_ms: u64) -> Self {
        let debounce = vec![Debounce::Stable; states.len()];
        Self {
            states,
            debounce,
            debounce_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, channel: usize) -> Option<&InputState> {
        self.states.get(channel)
    }

    pub fn states(&self) -> &[InputState] {
        &self.states
    }

    /// Sample every channel and return the confirmed transitions, in
    /// channel order.
    pub fn poll_all(&mut self, hw: &mut impl HardwareIo, now_ms: u64) -> Vec<TransitionEvent> {
        let mut events = Vec::new();
        for channel in 0..self.states.len() {
            let sample = hw.read(channel);
            if let Some(level) = self.debounced(channel, sample, now_ms) {
                if let Some(event) = self.confirm(channel, level, now_ms) {
                    events.push(event);
                }
            }
        }
        events
    }

    /// Interrupt-mode entry point: the collaborator has already debounced.
    ///
    /// Returns `None` when the value matches the confirmed state or the
    /// channel does not exist.
    pub fn report_change(
        &mut self,
        channel: usize,
        new_value: bool,
        now_ms: u64,
    ) -> Option<TransitionEvent> {
        if channel >= self.states.len() {
            warn!(
                "InputBank: change reported on channel {} but bank has {}",
                channel,
                self.states.len()
            );
            return None;
        }
        self.debounce[channel] = Debounce::Stable;
        self.confirm(channel, new_value, now_ms)
    }

    /// Apply a pull-up setting through the hardware and record it.
    pub fn set_pullup(
        &mut self,
        hw: &mut impl HardwareIo,
        channel: usize,
        enabled: bool,
    ) -> Result<(), crate::error::Error> {
        self.check_range(channel)?;
        hw.set_pullup(channel, enabled)?;
        self.states[channel].pullup_enabled = enabled;
        Ok(())
    }

    /// Re-apply every stored pull-up setting (startup restoration).
    pub fn restore_pullups(&self, hw: &mut impl HardwareIo) -> Vec<HardwareWriteFailed> {
        self.states
            .iter()
            .enumerate()
            .filter_map(|(channel, s)| hw.set_pullup(channel, s.pullup_enabled).err())
            .collect()
    }

    pub fn check_range(&self, channel: usize) -> Result<(), ValidationError> {
        if channel < self.states.len() {
            Ok(())
        } else {
            Err(ValidationError::ChannelOutOfRange {
                channel,
                count: self.states.len(),
            })
        }
    }

    /// Feed one raw sample through the debounce window.  Returns the level
    /// to confirm, if any.
    fn debounced(&mut self, channel: usize, sample: bool, now_ms: u64) -> Option<bool> {
        let confirmed = self.states[channel].value;
        if sample == confirmed {
            self.debounce[channel] = Debounce::Stable;
            return None;
        }
        if self.debounce_ms == 0 {
            return Some(sample);
        }

        match self.debounce[channel] {
            Debounce::Pending { level, since_ms } if level == sample => {
                if now_ms.saturating_sub(since_ms) >= self.debounce_ms {
                    self.debounce[channel] = Debounce::Stable;
                    Some(sample)
                } else {
                    None
                }
            }
            _ => {
                self.debounce[channel] = Debounce::Pending {
                    level: sample,
                    since_ms: now_ms,
                };
                None
            }
        }
    }

    fn confirm(&mut self, channel: usize, value: bool, now_ms: u64) -> Option<TransitionEvent> {
        let state = &mut self.states[channel];
        if state.value == value {
            return None;
        }

        let event = TransitionEvent {
            channel,
            value_old: state.value,
            value_new: value,
            elapsed_since_last_ms: state.last_change_at.map(|t| now_ms.saturating_sub(t)),
            occurred_at: now_ms,
        };
        state.value = value;
        state.last_change_at = Some(now_ms);

        debug!(
            "InputBank: ch{} {} -> {}",
            channel, event.value_old as u8, event.value_new as u8
        );
        Some(event)
    }
}
