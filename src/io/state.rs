//! Channel state image and its persistence wrapper.
//!
//! The [`Snapshot`] is the whole image: one record per input, one per
//! output, in channel order.  On disk it is a single JSON document:
//!
//! ```json
//! {
//!  "inputs": [ { "state": 0, "pullup": 1, "time_last_change": null } ],
//!  "outputs": [ { "state": 1 } ]
//! }
//! ```
//!
//! Levels are written as `0`/`1`; `true`/`false` are accepted on read.
//! `time_last_change` is wall-clock milliseconds since the Unix epoch.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::StatePort;
use crate::error::StoreError;

/// Channel counts fixed at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    pub inputs: usize,
    pub outputs: usize,
    /// Pull-up setting given to inputs in a fresh snapshot.
    pub default_pullup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    #[serde(rename = "state", with = "bit")]
    pub value: bool,
    #[serde(rename = "pullup", with = "bit")]
    pub pullup_enabled: bool,
    #[serde(rename = "time_last_change", default)]
    pub last_change_at: Option<u64>,
}

impl InputState {
    pub const fn new(pullup_enabled: bool) -> Self {
        Self {
            value: false,
            pullup_enabled,
            last_change_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputState {
    #[serde(rename = "state", with = "bit")]
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub inputs: Vec<InputState>,
    pub outputs: Vec<OutputState>,
}

impl Snapshot {
    /// Freshly initialised image: every level low, pull-ups at the layout
    /// default, no transition history.
    pub fn new(layout: ChannelLayout) -> Self {
        Self {
            inputs: vec![InputState::new(layout.default_pullup); layout.inputs],
            outputs: vec![OutputState::default(); layout.outputs],
        }
    }

    /// Fit a loaded image to the configured layout.  Extra channels are
    /// dropped; missing ones are filled with defaults.
    pub fn reconcile(mut self, layout: ChannelLayout) -> Self {
        if self.inputs.len() != layout.inputs || self.outputs.len() != layout.outputs {
            warn!(
                "Snapshot: stored layout {}in/{}out differs from configured {}in/{}out; reconciling",
                self.inputs.len(),
                self.outputs.len(),
                layout.inputs,
                layout.outputs
            );
        }
        self.inputs
            .resize(layout.inputs, InputState::new(layout.default_pullup));
        self.outputs.resize(layout.outputs, OutputState::default());
        self
    }
}

/// Snapshot persistence with a never-fail load.
pub struct StateStore<S: StatePort> {
    port: S,
    layout: ChannelLayout,
}

impl<S: StatePort> StateStore<S> {
    pub fn new(port: S, layout: ChannelLayout) -> Self {
        Self { port, layout }
    }

    /// Load the persisted image.  Any read or parse failure yields a fresh
    /// default snapshot; this never fails the caller.
    pub fn load(&self) -> Snapshot {
        match self.port.load() {
            Ok(snapshot) => {
                info!("StateStore: restored cached state");
                snapshot.reconcile(self.layout)
            }
            Err(StoreError::NotFound) => {
                info!("StateStore: no cached state, starting fresh");
                Snapshot::new(self.layout)
            }
            Err(e) => {
                warn!("StateStore: cached state unusable ({}), starting fresh", e);
                Snapshot::new(self.layout)
            }
        }
    }

    /// Overwrite the persisted image synchronously.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.port.save(snapshot)
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn port(&self) -> &S {
        &self.port
    }
}

/// `bool` <-> `0`/`1` on the wire.
mod bit {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(*value))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Bool(bool),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Int(0) | Raw::Bool(false) => Ok(false),
            Raw::Int(1) | Raw::Bool(true) => Ok(true),
            Raw::Int(other) => Err(de::Error::custom(format!(
                "level must be 0 or 1, got {other}"
            ))),
        }
    }
}
