//! Adapter engine: the hexagonal core.
//!
//! [`AdapterEngine`] owns the input bank, the output bank (with one pulse
//! sequencer per output) and the snapshot store.  Hardware and the event
//! sink are injected at call sites, so the engine runs unchanged against
//! real pins, the simulator, or test mocks.
//!
//! ```text
//!  CommandRouter ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                    │        AdapterEngine          │
//!  HardwareIo   ◀──▶ │ InputBank · OutputBank · Store│ ──▶ StatePort
//!                    └──────────────────────────────┘
//! ```
//!
//! Every announced change is emitted *and* saved in the same call, so the
//! persisted snapshot always matches what was last published.  Silent
//! output changes (pulse edges, startup restoration) only move the live
//! level; snapshots carry the announced output levels, never silent ones.

use log::{debug, error, info, warn};

use crate::config::{AdapterConfig, InputMode};
use crate::error::{CommandError, Error};
use crate::io::input::InputBank;
use crate::io::output::{Applied, OutputBank};
use crate::io::pulse::{PulsePattern, PulsePhase};
use crate::io::state::{InputState, OutputState, Snapshot, StateStore};
use crate::router::CommandRouter;
use crate::topic::TopicScheme;

use super::commands::{ChannelCommand, UpdateMode};
use super::events::{IoEvent, TransitionEvent};
use super::ports::{Clock, EventSink, HardwareIo, StatePort, Timestamp};

// ───────────────────────────────────────────────────────────────
// AdapterEngine
// ───────────────────────────────────────────────────────────────

pub struct AdapterEngine<S: StatePort> {
    store: StateStore<S>,
    router: CommandRouter,
    inputs: InputBank,
    outputs: OutputBank,
    input_mode: InputMode,
    republish_unchanged: bool,
    started: bool,
    save_failures: u32,
}

impl<S: StatePort> AdapterEngine<S> {
    /// Load the persisted snapshot (or a fresh one) into the banks.
    ///
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: &AdapterConfig, state_port: S) -> Self {
        let layout = config.layout();
        let store = StateStore::new(state_port, layout);
        let snapshot = store.load();

        let router = CommandRouter::new(
            TopicScheme::new(&config.topic_root, &config.client_name),
            layout,
        );

        Self {
            store,
            router,
            inputs: InputBank::new(snapshot.inputs, config.input_debounce_ms),
            outputs: OutputBank::new(snapshot.outputs),
            input_mode: config.input_mode,
            republish_unchanged: config.republish_unchanged,
            started: false,
            save_failures: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive the restored image onto the hardware without announcing it,
    /// then save once.
    ///
    /// Outputs are rewritten silently and pull-ups re-applied.  Cached input
    /// levels are kept, so the first poll only reports genuine changes.
    pub fn start(&mut self, hw: &mut impl HardwareIo) {
        for channel in 0..self.outputs.len() {
            let value = self.outputs.states()[channel].value;
            if let Err(e) = self.outputs.set(hw, channel, value, UpdateMode::Silent) {
                warn!("AdapterEngine: restoring output {}: {}", channel, e);
            }
        }
        for failed in self.inputs.restore_pullups(hw) {
            warn!("AdapterEngine: restoring pull-up: {}", failed);
        }

        self.flush();
        self.started = true;
        info!(
            "AdapterEngine started ({} inputs, {} outputs, {:?})",
            self.inputs.len(),
            self.outputs.len(),
            self.input_mode
        );
    }

    /// Final save.  Call once when the loop stops.
    pub fn shutdown(&mut self) {
        let saved = self.flush();
        self.started = false;
        info!(
            "AdapterEngine stopped (final save {})",
            if saved { "ok" } else { "failed" }
        );
    }

    // ── Inbound commands ──────────────────────────────────────

    /// Parse and apply one bus message.
    ///
    /// Failures are logged, reported as [`IoEvent::CommandRejected`] and
    /// returned; none of them are fatal.
    pub fn route(
        &mut self,
        topic: &str,
        payload: &[u8],
        now: Timestamp,
        hw: &mut impl HardwareIo,
        sink: &mut impl EventSink,
    ) -> Result<(), CommandError> {
        let result = self
            .router
            .parse(topic, payload)
            .and_then(|cmd| {
                self.handle_command(cmd, now, hw, sink)
                    .map_err(CommandError::from)
            });

        if let Err(error) = result {
            match error {
                CommandError::HardwareWriteFailed { .. } => {
                    error!("AdapterEngine: {} on '{}'", error, topic)
                }
                _ => warn!("AdapterEngine: rejected '{}': {}", topic, error),
            }
            sink.emit(&IoEvent::CommandRejected {
                topic: Some(topic.to_string()),
                error,
            });
        }
        result
    }

    /// Apply an already-validated command.
    pub fn handle_command(
        &mut self,
        cmd: ChannelCommand,
        now: Timestamp,
        hw: &mut impl HardwareIo,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        match cmd {
            ChannelCommand::SetOutput { channel, value } => {
                self.set_output(channel, value, UpdateMode::Announce, hw, sink)?;
                if self.outputs.cancel_pulse(channel) {
                    debug!("AdapterEngine: ch{} pulse cancelled by explicit set", channel);
                }
                Ok(())
            }
            ChannelCommand::SetPullup { channel, enabled } => {
                self.set_pullup(channel, enabled, hw, sink)
            }
            ChannelCommand::StartPulse { channel, pattern } => {
                self.bind_pulse(channel, pattern, now, hw)
            }
        }
    }

    // ── Outputs ───────────────────────────────────────────────

    /// Drive an output.  `Announce` publishes and persists; `Silent` only
    /// updates memory.
    pub fn set_output(
        &mut self,
        channel: usize,
        value: bool,
        mode: UpdateMode,
        hw: &mut impl HardwareIo,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        let applied = self.outputs.set(hw, channel, value, mode)?;
        self.settle_output(applied, sink);
        Ok(())
    }

    /// Token form of [`set_output`](Self::set_output) (`on`/`off`/`high`/`low`/`1`/`0`).
    pub fn set_output_token(
        &mut self,
        channel: usize,
        token: &str,
        mode: UpdateMode,
        hw: &mut impl HardwareIo,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        let applied = self.outputs.set_token(hw, channel, token, mode)?;
        self.settle_output(applied, sink);
        Ok(())
    }

    /// Parse `args` into a pattern and start it; the first edge is driven
    /// immediately.
    pub fn start_pulse<T: AsRef<str>>(
        &mut self,
        channel: usize,
        args: &[T],
        now: Timestamp,
        hw: &mut impl HardwareIo,
    ) -> Result<(), Error> {
        self.outputs.check_range(channel)?;
        let pattern = PulsePattern::from_args(args)?;
        self.bind_pulse(channel, pattern, now, hw)
    }

    fn bind_pulse(
        &mut self,
        channel: usize,
        pattern: PulsePattern,
        now: Timestamp,
        hw: &mut impl HardwareIo,
    ) -> Result<(), Error> {
        self.outputs.bind_pulse(channel, pattern, now.mono_ms)?;
        debug!("AdapterEngine: ch{} pulse {:?}", channel, pattern);
        if let Some(Err(e)) = self.outputs.tick_pulse(hw, channel, now.mono_ms) {
            // A pattern whose first edge never reached the pin is not running.
            self.outputs.cancel_pulse(channel);
            return Err(e);
        }
        Ok(())
    }

    /// Advance every pulse sequencer once, applying edges silently.
    pub fn advance_pulses(&mut self, now: Timestamp, hw: &mut impl HardwareIo) -> usize {
        self.outputs.tick_pulses(hw, now.mono_ms)
    }

    fn settle_output(&mut self, applied: Applied, sink: &mut impl EventSink) {
        if applied.mode == UpdateMode::Silent {
            return;
        }
        if !applied.changed && !self.republish_unchanged {
            return;
        }
        sink.emit(&IoEvent::OutputChanged {
            channel: applied.channel,
            value: applied.value,
        });
        self.flush();
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Configure an input's pull-up, then publish and persist it.
    pub fn set_pullup(
        &mut self,
        channel: usize,
        enabled: bool,
        hw: &mut impl HardwareIo,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        self.inputs.set_pullup(hw, channel, enabled)?;
        sink.emit(&IoEvent::PullupChanged { channel, enabled });
        self.flush();
        Ok(())
    }

    /// Sample every input and announce confirmed transitions.
    pub fn poll_inputs(
        &mut self,
        now: Timestamp,
        hw: &mut impl HardwareIo,
        sink: &mut impl EventSink,
    ) -> usize {
        let events = self.inputs.poll_all(hw, now.wall_ms);
        for event in &events {
            announce_transition(event, sink);
        }
        if !events.is_empty() {
            self.flush();
        }
        events.len()
    }

    /// Interrupt-mode entry: a debounced level change from the hardware.
    pub fn report_input_change(
        &mut self,
        channel: usize,
        value: bool,
        wall_ms: u64,
        sink: &mut impl EventSink,
    ) -> Option<TransitionEvent> {
        let event = self.inputs.report_change(channel, value, wall_ms)?;
        announce_transition(&event, sink);
        self.flush();
        Some(event)
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One loop cycle: poll inputs (polling mode only), then advance
    /// every pulse sequencer.
    ///
    /// Returns how long the poll took in microseconds, or `None` when
    /// inputs are interrupt-driven.
    pub fn tick(
        &mut self,
        clock: &impl Clock,
        hw: &mut impl HardwareIo,
        sink: &mut impl EventSink,
    ) -> Option<u64> {
        let now = clock.now();
        let poll_us = if self.input_mode == InputMode::Polling {
            let t0 = clock.mono_us();
            self.poll_inputs(now, hw, sink);
            Some(clock.mono_us().saturating_sub(t0))
        } else {
            None
        };
        self.advance_pulses(now, hw);
        poll_us
    }

    // ── Persistence ───────────────────────────────────────────

    /// Save the full image.  A failed save is logged and swallowed; the
    /// in-memory state stays authoritative.
    pub fn flush(&mut self) -> bool {
        match self.store.save(&self.snapshot()) {
            Ok(()) => true,
            Err(e) => {
                self.save_failures = self.save_failures.saturating_add(1);
                error!(
                    "AdapterEngine: snapshot save failed ({}), {} so far",
                    e, self.save_failures
                );
                false
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            inputs: self.inputs.states().to_vec(),
            outputs: self.outputs.announced_states().to_vec(),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn input(&self, channel: usize) -> Option<&InputState> {
        self.inputs.state(channel)
    }

    pub fn output(&self, channel: usize) -> Option<&OutputState> {
        self.outputs.state(channel)
    }

    pub fn pulse_phase(&self, channel: usize) -> Option<PulsePhase> {
        self.outputs.pulse_phase(channel)
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn save_failures(&self) -> u32 {
        self.save_failures
    }

    pub fn topics(&self) -> &TopicScheme {
        self.router.scheme()
    }

    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }
}

fn announce_transition(event: &TransitionEvent, sink: &mut impl EventSink) {
    sink.emit(&IoEvent::InputChanged {
        channel: event.channel,
        value: event.value_new,
    });
    sink.emit(&IoEvent::InputTransition(*event));
}
