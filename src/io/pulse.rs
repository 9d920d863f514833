//! Timed pulse pattern generator for a single output channel.
//!
//! A pattern is "on for `on_time_ms`, off for `off_time_ms`, repeat
//! `rep_count` times, wait `inter_set_delay_ms`, repeat the whole set
//! `set_count` times".  Typical use is blink patterns on indicators or
//! timed relay pulses.
//!
//! ## Sentinels
//!
//! `-1` in any of the four trailing fields means "not specified":
//!
//! | Field                | `-1` (or `<= 0` for counts)                |
//! |----------------------|--------------------------------------------|
//! | `off_time_ms`        | single pulse: on, then off, then done      |
//! | `rep_count`          | repeat on/off forever                      |
//! | `inter_set_delay_ms` | no set gap: done once reps are exhausted   |
//! | `set_count`          | repeat sets forever                        |
//!
//! `off_time_ms == -1` ends the pattern after the first pulse regardless
//! of the other fields.
//!
//! ## Phases
//!
//! ```text
//!   start()          on > on_time                 off > off_time
//! Idle ──▶ InPulse ──────────────▶ InOffGap ─────────────────────▶ InPulse (rep++)
//!             │ off_time == -1        │ reps exhausted, delay >= 0
//!             ▼                       ▼
//!           Done ◀──── sets done ── InSetGap ── delay elapsed ──▶ InPulse (set++)
//! ```
//!
//! All durations compare strictly (`elapsed > configured`) against a
//! monotonic millisecond clock supplied by the caller.

use crate::error::PulseArgError;

/// Number of positional fields in a pulse argument list.
pub const PULSE_FIELDS: usize = 5;

/// Declarative pulse specification, in the positional order of the bus
/// payload: `on_time[,off_time[,rep_count[,inter_set_delay[,set_count]]]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulsePattern {
    pub on_time_ms: i64,
    pub off_time_ms: i64,
    pub rep_count: i64,
    pub inter_set_delay_ms: i64,
    pub set_count: i64,
}

impl PulsePattern {
    /// A single on-pulse of `on_time_ms`, everything else unspecified.
    pub const fn single(on_time_ms: i64) -> Self {
        Self {
            on_time_ms,
            off_time_ms: -1,
            rep_count: -1,
            inter_set_delay_ms: -1,
            set_count: -1,
        }
    }

    /// Parse a positional argument list.
    ///
    /// The on-time must be a positive integer.  The trailing fields accept
    /// any integer `>= -1`; missing fields default to `-1`.  Arguments past
    /// the fifth are ignored.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, PulseArgError> {
        if args.is_empty() {
            return Err(PulseArgError::MissingArguments);
        }

        let mut fields = [-1i64; PULSE_FIELDS];
        for (position, arg) in args.iter().take(PULSE_FIELDS).enumerate() {
            let value: i64 = arg
                .as_ref()
                .trim()
                .parse()
                .map_err(|_| PulseArgError::InvalidArgument {
                    position: position as u8,
                })?;
            let valid = if position == 0 { value > 0 } else { value >= -1 };
            if !valid {
                return Err(PulseArgError::InvalidArgument {
                    position: position as u8,
                });
            }
            fields[position] = value;
        }

        Ok(Self {
            on_time_ms: fields[0],
            off_time_ms: fields[1],
            rep_count: fields[2],
            inter_set_delay_ms: fields[3],
            set_count: fields[4],
        })
    }

    fn reps_unbounded(&self) -> bool {
        self.rep_count <= 0
    }

    fn sets_unbounded(&self) -> bool {
        self.set_count <= 0
    }
}

/// Output request produced by [`PulseSequencer::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCommand {
    TurnOn,
    TurnOff,
}

impl OutputCommand {
    /// Output level this command drives.
    pub const fn level(self) -> bool {
        matches!(self, Self::TurnOn)
    }
}

/// Externally visible sequencer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulsePhase {
    Idle,
    InPulse,
    InOffGap,
    InSetGap,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    InPulse { since_ms: u64 },
    InOffGap { since_ms: u64 },
    InSetGap { since_ms: u64 },
    Done,
}

/// Per-channel pulse state machine.  Exclusively owned by its output.
#[derive(Debug, Clone)]
pub struct PulseSequencer {
    pattern: Option<PulsePattern>,
    phase: Phase,
    current_rep: i64,
    current_set: i64,
    pending: Option<OutputCommand>,
}

impl Default for PulseSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseSequencer {
    pub const fn new() -> Self {
        Self {
            pattern: None,
            phase: Phase::Idle,
            current_rep: 0,
            current_set: 0,
            pending: None,
        }
    }

    /// Replace any running pattern and begin a new one at `now_ms`.
    ///
    /// The "turn on" request is queued and returned by the next
    /// [`advance`](Self::advance) call.  There is no drain of the previous
    /// pattern.
    pub fn start(&mut self, pattern: PulsePattern, now_ms: u64) {
        self.pattern = Some(pattern);
        self.current_rep = 1;
        self.current_set = 1;
        self.phase = Phase::InPulse { since_ms: now_ms };
        self.pending = Some(OutputCommand::TurnOn);
    }

    /// Abandon the running pattern without emitting anything.
    pub fn cancel(&mut self) {
        self.pattern = None;
        self.phase = Phase::Idle;
        self.pending = None;
    }

    /// Advance time.  Non-blocking; returns at most one command per call.
    pub fn advance(&mut self, now_ms: u64) -> Option<OutputCommand> {
        if let Some(cmd) = self.pending.take() {
            return Some(cmd);
        }
        let pattern = self.pattern?;

        match self.phase {
            Phase::Idle | Phase::Done => None,

            Phase::InPulse { since_ms } => {
                if elapsed(now_ms, since_ms) <= pattern.on_time_ms {
                    return None;
                }
                self.phase = if pattern.off_time_ms == -1 {
                    Phase::Done
                } else {
                    Phase::InOffGap { since_ms: now_ms }
                };
                Some(OutputCommand::TurnOff)
            }

            Phase::InOffGap { since_ms } => {
                if elapsed(now_ms, since_ms) <= pattern.off_time_ms {
                    return None;
                }
                if pattern.reps_unbounded() || self.current_rep < pattern.rep_count {
                    if !pattern.reps_unbounded() {
                        self.current_rep += 1;
                    }
                    self.phase = Phase::InPulse { since_ms: now_ms };
                    return Some(OutputCommand::TurnOn);
                }
                self.phase = if pattern.inter_set_delay_ms >= 0 {
                    Phase::InSetGap { since_ms: now_ms }
                } else {
                    Phase::Done
                };
                None
            }

            Phase::InSetGap { since_ms } => {
                if elapsed(now_ms, since_ms) <= pattern.inter_set_delay_ms {
                    return None;
                }
                if pattern.sets_unbounded() || self.current_set < pattern.set_count {
                    self.current_rep = 1;
                    self.current_set += 1;
                    self.phase = Phase::InPulse { since_ms: now_ms };
                    return Some(OutputCommand::TurnOn);
                }
                self.phase = Phase::Done;
                None
            }
        }
    }

    pub fn phase(&self) -> PulsePhase {
        match self.phase {
            Phase::Idle => PulsePhase::Idle,
            Phase::InPulse { .. } => PulsePhase::InPulse,
            Phase::InOffGap { .. } => PulsePhase::InOffGap,
            Phase::InSetGap { .. } => PulsePhase::InSetGap,
            Phase::Done => PulsePhase::Done,
        }
    }

    /// True while a pattern is mid-flight (or its first edge is pending).
    pub fn is_running(&self) -> bool {
        self.pending.is_some() || !matches!(self.phase, Phase::Idle | Phase::Done)
    }

    pub fn pattern(&self) -> Option<PulsePattern> {
        self.pattern
    }

    /// Current (repetition, set), both 1-based once started.
    pub fn progress(&self) -> (i64, i64) {
        (self.current_rep, self.current_set)
    }
}

fn elapsed(now_ms: u64, since_ms: u64) -> i64 {
    now_ms.saturating_sub(since_ms) as i64
}
