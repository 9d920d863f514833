//! In-memory simulated I/O bank.
//!
//! Inputs are driven from anywhere through a cloneable [`SimHandle`]; outputs
//! and pull-ups record the last value written.  The binary uses this when no
//! real pins are attached, and the integration tests use it as a
//! thread-safe stand-in for a GPIO bank.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::app::ports::HardwareIo;
use crate::error::HardwareWriteFailed;

struct Lines {
    inputs: Vec<AtomicBool>,
    pullups: Vec<AtomicBool>,
    outputs: Vec<AtomicBool>,
}

fn lines(n: usize) -> Vec<AtomicBool> {
    (0..n).map(|_| AtomicBool::new(false)).collect()
}

/// Shared view of a [`SimulatedIo`] bank.
#[derive(Clone)]
pub struct SimHandle(Arc<Lines>);

impl SimHandle {
    /// Drive simulated input `channel`.  Returns `false` if it does not exist.
    pub fn set_input(&self, channel: usize, value: bool) -> bool {
        match self.0.inputs.get(channel) {
            Some(line) => {
                line.store(value, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn output(&self, channel: usize) -> Option<bool> {
        self.0.outputs.get(channel).map(|l| l.load(Ordering::Relaxed))
    }

    pub fn pullup(&self, channel: usize) -> Option<bool> {
        self.0.pullups.get(channel).map(|l| l.load(Ordering::Relaxed))
    }

    pub fn num_inputs(&self) -> usize {
        self.0.inputs.len()
    }
}

pub struct SimulatedIo {
    lines: Arc<Lines>,
}

impl SimulatedIo {
    pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            lines: Arc::new(Lines {
                inputs: lines(num_inputs),
                pullups: lines(num_inputs),
                outputs: lines(num_outputs),
            }),
        }
    }

    pub fn handle(&self) -> SimHandle {
        SimHandle(Arc::clone(&self.lines))
    }
}

impl HardwareIo for SimulatedIo {
    fn read(&mut self, channel: usize) -> bool {
        self.lines
            .inputs
            .get(channel)
            .is_some_and(|l| l.load(Ordering::Relaxed))
    }

    fn write(&mut self, channel: usize, value: bool) -> Result<(), HardwareWriteFailed> {
        let line = self
            .lines
            .outputs
            .get(channel)
            .ok_or(HardwareWriteFailed { channel })?;
        line.store(value, Ordering::Relaxed);
        debug!("SimIO: out{} <- {}", channel, u8::from(value));
        Ok(())
    }

    fn set_pullup(&mut self, channel: usize, enabled: bool) -> Result<(), HardwareWriteFailed> {
        let line = self
            .lines
            .pullups
            .get(channel)
            .ok_or(HardwareWriteFailed { channel })?;
        line.store(enabled, Ordering::Relaxed);
        Ok(())
    }
}
