//! Adapter loop: the single owner thread of the engine.
//!
//! ```text
//!            ┌──────────────────── tick ─────────────────────┐
//!            │                                               │
//!  Running ──┤ drain inbox ─▶ poll inputs ─▶ advance pulses ─┤──▶ sleep(budget)
//!     │      │  (commands,      (polling       (silent        │
//!     │      │   interrupts)     mode only)     edges)        │
//!     │      └───────────────────────────────────────────────┘
//!     │ StopHandle::stop()
//!     ▼
//!  Stopped ──▶ AdapterEngine::shutdown()  (final save)
//! ```
//!
//! The period is nominally `tick_period_us`.  When input polling gets
//! expensive the period stretches so polling stays under
//! `max_poll_overhead_percent` of the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info};

use crate::app::ports::{Clock, EventSink, HardwareIo, StatePort, Timestamp};
use crate::app::service::AdapterEngine;
use crate::config::AdapterConfig;
use crate::inbox::{InboundMsg, Inbox};

// ═══════════════════════════════════════════════════════════════
//  Loop state and cancellation
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Cloneable stop signal, checked once per tick.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tick budget
// ═══════════════════════════════════════════════════════════════

/// Adaptive loop period driven by measured poll cost.
#[derive(Debug, Clone)]
pub struct TickBudget {
    nominal_us: u64,
    max_overhead_percent: u64,
    /// Smoothed poll cost; `None` until the first measurement.
    poll_cost_us: Option<u64>,
}

impl TickBudget {
    pub fn new(nominal_us: u64, max_overhead_percent: u8) -> Self {
        Self {
            nominal_us,
            max_overhead_percent: u64::from(max_overhead_percent.max(1)),
            poll_cost_us: None,
        }
    }

    /// Fold one poll measurement into the running average (1/8 weight).
    pub fn record_poll(&mut self, sample_us: u64) {
        self.poll_cost_us = Some(match self.poll_cost_us {
            None => {
                debug!("Loop: input poll takes {} us", sample_us);
                sample_us
            }
            Some(avg) => (avg * 7 + sample_us) / 8,
        });
    }

    pub fn poll_cost_us(&self) -> Option<u64> {
        self.poll_cost_us
    }

    /// Current loop period: the nominal period, or longer if polling would
    /// otherwise exceed its share.
    pub fn period_us(&self) -> u64 {
        let floor = self
            .poll_cost_us
            .map_or(0, |c| c.saturating_mul(100) / self.max_overhead_percent);
        self.nominal_us.max(floor)
    }

    /// Time left to sleep after `work_us` of tick work.
    pub fn sleep_us(&self, work_us: u64) -> u64 {
        self.period_us().saturating_sub(work_us)
    }
}

// ═══════════════════════════════════════════════════════════════
//  AdapterLoop
// ═══════════════════════════════════════════════════════════════

pub struct AdapterLoop<S: StatePort, H: HardwareIo, E: EventSink, C: Clock> {
    engine: AdapterEngine<S>,
    hw: H,
    sink: E,
    clock: C,
    inbox: Arc<Inbox>,
    stop: StopHandle,
    state: LoopState,
    budget: TickBudget,
    ticks: u64,
}

impl<S: StatePort, H: HardwareIo, E: EventSink, C: Clock> AdapterLoop<S, H, E, C> {
    pub fn new(
        config: &AdapterConfig,
        engine: AdapterEngine<S>,
        hw: H,
        sink: E,
        clock: C,
    ) -> Self {
        Self {
            engine,
            hw,
            sink,
            clock,
            inbox: Arc::new(Inbox::new()),
            stop: StopHandle::new(),
            state: LoopState::Running,
            budget: TickBudget::new(config.tick_period_us, config.max_poll_overhead_percent),
            ticks: 0,
        }
    }

    /// Producer side of the inbox, for transport and interrupt threads.
    pub fn inbox(&self) -> Arc<Inbox> {
        Arc::clone(&self.inbox)
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// One cycle.  Returns how long to sleep before the next one.
    pub fn tick(&mut self) -> Duration {
        let started_us = self.clock.mono_us();
        let now = self.clock.now();
        self.ticks += 1;

        let (engine, hw, sink) = (&mut self.engine, &mut self.hw, &mut self.sink);
        self.inbox.drain(|msg| dispatch(engine, msg, now, hw, sink));

        if let Some(poll_us) = self.engine.tick(&self.clock, &mut self.hw, &mut self.sink) {
            self.budget.record_poll(poll_us);
        }

        let work_us = self.clock.mono_us().saturating_sub(started_us);
        Duration::from_micros(self.budget.sleep_us(work_us))
    }

    /// Tick until the stop handle fires, then save once and stop.
    pub fn run(&mut self) {
        if !self.engine.is_started() {
            self.engine.start(&mut self.hw);
        }
        info!("Loop running (period {} us)", self.budget.period_us());

        while !self.stop.is_stopped() {
            let sleep = self.tick();
            if !sleep.is_zero() {
                std::thread::sleep(sleep);
            }
        }

        self.state = LoopState::Stopped;
        self.engine.shutdown();
        info!("Loop stopped after {} ticks", self.ticks);
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn budget(&self) -> &TickBudget {
        &self.budget
    }

    pub fn engine(&self) -> &AdapterEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut AdapterEngine<S> {
        &mut self.engine
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn into_parts(self) -> (AdapterEngine<S>, H, E) {
        (self.engine, self.hw, self.sink)
    }
}

fn dispatch<S: StatePort>(
    engine: &mut AdapterEngine<S>,
    msg: InboundMsg,
    now: Timestamp,
    hw: &mut impl HardwareIo,
    sink: &mut impl EventSink,
) {
    match msg {
        InboundMsg::Command { topic, payload } => {
            // Rejections are logged and reported by the engine.
            let _ = engine.route(topic.as_str(), &payload, now, hw, sink);
        }
        InboundMsg::InputChanged {
            channel,
            value,
            wall_ms,
        } => {
            engine.report_input_change(channel, value, wall_ms, sink);
        }
    }
}
