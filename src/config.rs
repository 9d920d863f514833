//! Adapter configuration.
//!
//! Loaded once at startup from a JSON file and validated before use.
//! Channel counts are fixed for the lifetime of the process.  The
//! legacy camelCase keys (`mqttClientName`, `stateCacheFile`) are
//! accepted as aliases.

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::io::state::ChannelLayout;

/// Upper bound on channels per bank.
pub const MAX_CHANNELS: usize = 256;

/// How input changes reach the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// The loop samples every input once per tick.
    #[default]
    Polling,
    /// The hardware debounces and posts changes into the inbox.
    Interrupt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    // --- Addressing ---
    /// Client segment of every topic.
    #[serde(alias = "mqttClientName")]
    pub client_name: String,
    /// Leading topic segment, before the client name.
    pub topic_root: String,

    // --- Channels ---
    pub num_dio_inputs: usize,
    pub num_dio_outputs: usize,
    pub input_mode: InputMode,
    /// Polling-mode debounce window; 0 confirms on first sample.
    pub input_debounce_ms: u64,
    /// Pull-up setting for inputs in a fresh snapshot.
    pub default_pullup: bool,

    // --- Policy ---
    /// Publish and persist a set even when the level did not change.
    pub republish_unchanged: bool,

    // --- Timing ---
    /// Nominal loop period (microseconds).
    pub tick_period_us: u64,
    /// Upper bound on input polling as a share of the loop period.
    pub max_poll_overhead_percent: u8,

    // --- Persistence ---
    /// Snapshot file; defaults to `{config stem}.cache` beside the config.
    #[serde(alias = "stateCacheFile")]
    pub state_cache_file: Option<PathBuf>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            client_name: "distio".into(),
            topic_root: "io".into(),

            num_dio_inputs: 8,
            num_dio_outputs: 8,
            input_mode: InputMode::Polling,
            input_debounce_ms: 0,
            default_pullup: true,

            republish_unchanged: true,

            tick_period_us: 1000, // 1 ms
            max_poll_overhead_percent: 50,

            state_cache_file: None,
        }
    }
}

impl AdapterConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::Unreadable,
        })?;
        let cfg = Self::from_json_str(&json)?;
        info!(
            "Config: loaded {} ({} inputs, {} outputs)",
            path.display(),
            cfg.num_dio_inputs,
            cfg.num_dio_outputs
        );
        Ok(cfg)
    }

    /// Reject values outside their documented ranges.  Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_name.is_empty() {
            return Err(ConfigError::ValidationFailed("client_name must not be empty"));
        }
        if self.client_name.contains(['/', '+', '#']) {
            return Err(ConfigError::ValidationFailed(
                "client_name must not contain '/', '+' or '#'",
            ));
        }
        if self.topic_root.contains(['+', '#']) {
            return Err(ConfigError::ValidationFailed(
                "topic_root must not contain wildcards",
            ));
        }
        if self.num_dio_inputs > MAX_CHANNELS {
            return Err(ConfigError::ValidationFailed("num_dio_inputs must be 0–256"));
        }
        if self.num_dio_outputs > MAX_CHANNELS {
            return Err(ConfigError::ValidationFailed("num_dio_outputs must be 0–256"));
        }
        if !(100..=1_000_000).contains(&self.tick_period_us) {
            return Err(ConfigError::ValidationFailed(
                "tick_period_us must be 100–1000000",
            ));
        }
        if !(1..=100).contains(&self.max_poll_overhead_percent) {
            return Err(ConfigError::ValidationFailed(
                "max_poll_overhead_percent must be 1–100",
            ));
        }
        Ok(())
    }

    pub fn layout(&self) -> ChannelLayout {
        ChannelLayout {
            inputs: self.num_dio_inputs,
            outputs: self.num_dio_outputs,
            default_pullup: self.default_pullup,
        }
    }

    /// Snapshot file location.  A relative `state_cache_file` resolves
    /// against the config file's directory.
    pub fn state_cache_path(&self, config_path: &Path) -> PathBuf {
        let dir = config_path.parent().unwrap_or_else(|| Path::new(""));
        match &self.state_cache_file {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => dir.join(p),
            None => config_path.with_extension("cache"),
        }
    }
}
