//! `embedded-hal` pin bank adapter.
//!
//! Maps a vector of [`InputPin`]s and a vector of [`OutputPin`]s onto
//! [`HardwareIo`], channel index = vector index.  Any board whose HAL
//! implements `embedded-hal` 1.0 digital traits plugs in here.
//!
//! `embedded-hal` has no pull-up control, so pull-up requests are accepted
//! and left to the board's pin configuration.

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use log::warn;

use crate::app::ports::HardwareIo;
use crate::error::HardwareWriteFailed;

pub struct HalBank<I: InputPin, O: OutputPin> {
    inputs: Vec<I>,
    outputs: Vec<O>,
}

impl<I: InputPin, O: OutputPin> HalBank<I, O> {
    pub fn new(inputs: Vec<I>, outputs: Vec<O>) -> Self {
        Self { inputs, outputs }
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Give the pins back.
    pub fn release(self) -> (Vec<I>, Vec<O>) {
        (self.inputs, self.outputs)
    }
}

impl<I: InputPin, O: OutputPin> HardwareIo for HalBank<I, O> {
    /// A pin that fails to read is reported low.
    fn read(&mut self, channel: usize) -> bool {
        let Some(pin) = self.inputs.get_mut(channel) else {
            return false;
        };
        pin.is_high().unwrap_or_else(|e| {
            warn!("HalBank: in{} read failed: {:?}", channel, e);
            false
        })
    }

    fn write(&mut self, channel: usize, value: bool) -> Result<(), HardwareWriteFailed> {
        let pin = self
            .outputs
            .get_mut(channel)
            .ok_or(HardwareWriteFailed { channel })?;
        pin.set_state(PinState::from(value)).map_err(|e| {
            warn!("HalBank: out{} write failed: {:?}", channel, e);
            HardwareWriteFailed { channel }
        })
    }
}
