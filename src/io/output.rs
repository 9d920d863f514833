//! Digital output bank.
//!
//! Validates requested levels, drives them through the hardware
//! collaborator, and owns one [`PulseSequencer`] per channel.
//!
//! Validation order for a set request:
//!
//! 1. channel index in range, else `ChannelOutOfRange`
//! 2. value token coerces to a level, else `InvalidValue`
//! 3. hardware write succeeds, else `HardwareWriteFailed`
//!
//! Only after all three does `OutputState.value` change.  Whether the
//! change is announced is decided by the caller from the returned
//! [`Applied`] record.
//!
//! The bank keeps two images: the live level of every line, and the level
//! last set with [`UpdateMode::Announce`].  Silent writes (pulse edges,
//! startup restoration) only move the live image.  The announced image is
//! what gets persisted, so a restart resumes what observers last saw.

use log::{debug, warn};

use crate::app::commands::UpdateMode;
use crate::app::ports::HardwareIo;
use crate::error::{Error, ValidationError};
use crate::io::pulse::{PulsePattern, PulsePhase, PulseSequencer};
use crate::io::state::OutputState;

/// Outcome of a successful set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub channel: usize,
    pub value: bool,
    /// For `Announce`, the level differs from the last announced one; for
    /// `Silent`, from the live one.
    pub changed: bool,
    pub mode: UpdateMode,
}

pub struct OutputBank {
    states: Vec<OutputState>,
    announced: Vec<OutputState>,
    pulses: Vec<PulseSequencer>,
}

impl OutputBank {
    /// `states` is the persisted image; it seeds both live and announced.
    pub fn new(states: Vec<OutputState>) -> Self {
        let pulses = vec![PulseSequencer::new(); states.len()];
        Self {
            announced: states.clone(),
            states,
            pulses,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, channel: usize) -> Option<&OutputState> {
        self.states.get(channel)
    }

    /// Live levels, including silent ones.
    pub fn states(&self) -> &[OutputState] {
        &self.states
    }

    /// Levels as last announced.  This is the image to persist.
    pub fn announced_states(&self) -> &[OutputState] {
        &self.announced
    }

    pub fn pulse_phase(&self, channel: usize) -> Option<PulsePhase> {
        self.pulses.get(channel).map(PulseSequencer::phase)
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

    /// Drive `channel` to `value`.  A redundant write still succeeds.
    pub fn set(
        &mut self,
        hw: &mut impl HardwareIo,
        channel: usize,
        value: bool,
        mode: UpdateMode,
    ) -> Result<Applied, Error> {
        self.check_range(channel)?;
        hw.write(channel, value)?;

        let changed = match mode {
            UpdateMode::Announce => {
                let announced = &mut self.announced[channel];
                let changed = announced.value != value;
                announced.value = value;
                changed
            }
            UpdateMode::Silent => self.states[channel].value != value,
        };
        self.states[channel].value = value;
        Ok(Applied {
            channel,
            value,
            changed,
            mode,
        })
    }

    /// Token form of [`set`](Self::set): range is checked before the token.
    pub fn set_token(
        &mut self,
        hw: &mut impl HardwareIo,
        channel: usize,
        token: &str,
        mode: UpdateMode,
    ) -> Result<Applied, Error> {
        self.check_range(channel)?;
        let value = parse_level(token)?;
        self.set(hw, channel, value, mode)
    }

    /// Parse `args` positionally and bind a fresh sequencer to `channel`,
    /// replacing any running one.
    pub fn start_pulse<S: AsRef<str>>(
        &mut self,
        channel: usize,
        args: &[S],
        now_ms: u64,
    ) -> Result<(), Error> {
        self.check_range(channel)?;
        let pattern = PulsePattern::from_args(args)?;
        self.bind_pulse(channel, pattern, now_ms)
    }

    /// Bind an already-parsed pattern to `channel`.
    pub fn bind_pulse(
        &mut self,
        channel: usize,
        pattern: PulsePattern,
        now_ms: u64,
    ) -> Result<(), Error> {
        self.check_range(channel)?;
        if self.pulses[channel].is_running() {
            debug!("OutputBank: ch{} pulse preempted", channel);
        }
        self.pulses[channel].start(pattern, now_ms);
        Ok(())
    }

    /// Stop a channel's sequencer without touching the output level.
    pub fn cancel_pulse(&mut self, channel: usize) -> bool {
        match self.pulses.get_mut(channel) {
            Some(seq) if seq.is_running() => {
                seq.cancel();
                true
            }
            _ => false,
        }
    }

    /// Advance one channel's sequencer and apply its edge, silently.
    pub fn tick_pulse(
        &mut self,
        hw: &mut impl HardwareIo,
        channel: usize,
        now_ms: u64,
    ) -> Option<Result<Applied, Error>> {
        let cmd = self.pulses.get_mut(channel)?.advance(now_ms)?;
        Some(self.set(hw, channel, cmd.level(), UpdateMode::Silent))
    }

    /// Advance every sequencer once.  Write failures are logged and the
    /// sequencer keeps running.
    pub fn tick_pulses(&mut self, hw: &mut impl HardwareIo, now_ms: u64) -> usize {
        let mut applied = 0;
        for channel in 0..self.pulses.len() {
            match self.tick_pulse(hw, channel, now_ms) {
                Some(Ok(_)) => applied += 1,
                Some(Err(e)) => warn!("OutputBank: pulse edge on ch{} failed: {}", channel, e),
                None => {}
            }
        }
        applied
    }
}

/// Coerce a boolean-like token, case-insensitively:
/// `on`/`high`/`1` are high, `off`/`low`/`0` are low.
pub fn parse_level(token: &str) -> Result<bool, ValidationError> {
    let token = token.trim();
    if ["on", "high", "1"].iter().any(|t| token.eq_ignore_ascii_case(t)) {
        Ok(true)
    } else if ["off", "low", "0"].iter().any(|t| token.eq_ignore_ascii_case(t)) {
        Ok(false)
    } else {
        Err(ValidationError::InvalidValue)
    }
}
