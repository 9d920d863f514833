//! Unified error types for the distio engine.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! loop's error handling uniform.  All variants are `Copy` so they can be
//! passed through the router and emitted as events without allocation.
//!
//! Nothing in here is fatal to the process.  Callers recover locally, log,
//! and carry on with the in-memory state as the authority.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level engine error
// ---------------------------------------------------------------------------

/// Every fallible engine operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A channel index or value token was rejected.
    Validation(ValidationError),
    /// The hardware collaborator refused a write.
    Hardware(HardwareWriteFailed),
    /// A pulse argument list could not be turned into a pattern.
    Pulse(PulseArgError),
    /// The snapshot store could not be read or written.
    Store(StoreError),
    /// An inbound bus command was malformed.
    Command(CommandError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "validation: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Pulse(e) => write!(f, "pulse: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Channel index is not within `0..count`.
    ChannelOutOfRange { channel: usize, count: usize },
    /// Value token is not one of on/off/high/low/1/0.
    InvalidValue,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelOutOfRange { channel, count } if *count == 0 => {
                write!(f, "channel {channel} out of range (bank is empty)")
            }
            Self::ChannelOutOfRange { channel, count } => {
                write!(f, "channel {channel} out of range 0-{}", count - 1)
            }
            Self::InvalidValue => write!(f, "value must be 0 or 1 (on/off/high/low)"),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

/// Raised by a [`HardwareIo`](crate::app::ports::HardwareIo) write.  Never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareWriteFailed {
    pub channel: usize,
}

impl fmt::Display for HardwareWriteFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "write to channel {} failed", self.channel)
    }
}

impl From<HardwareWriteFailed> for Error {
    fn from(e: HardwareWriteFailed) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Pulse argument errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseArgError {
    /// The argument list was empty.
    MissingArguments,
    /// Argument at `position` (0-based) is not an acceptable integer.
    InvalidArgument { position: u8 },
}

impl fmt::Display for PulseArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArguments => write!(f, "pulse requires at least an on-time"),
            Self::InvalidArgument { position } => {
                write!(f, "pulse argument {position} is not a valid integer")
            }
        }
    }
}

impl From<PulseArgError> for Error {
    fn from(e: PulseArgError) -> Self {
        Self::Pulse(e)
    }
}

// ---------------------------------------------------------------------------
// Snapshot store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// No snapshot has been written yet (first boot).
    NotFound,
    /// Stored snapshot failed to deserialize.
    Corrupted,
    /// Generic I/O error from the storage backend.
    Io,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "snapshot not found"),
            Self::Corrupted => write!(f, "snapshot corrupted"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No configuration file at the given path.
    NotFound,
    /// The file exists but could not be read.
    Unreadable,
    /// The file is not valid JSON for [`AdapterConfig`](crate::config::AdapterConfig).
    Corrupted,
    /// A field failed range validation.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Unreadable => write!(f, "config unreadable"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Inbound command errors
// ---------------------------------------------------------------------------

/// Why an inbound `(topic, payload)` pair was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The topic does not follow the addressing grammar for this client.
    UnrecognizedTopic,
    /// The topic is well formed but names an unknown parameter.
    UnrecognizedCommand,
    ChannelOutOfRange { channel: usize, count: usize },
    InvalidValue,
    MissingPulseArguments,
    InvalidPulseArgument { position: u8 },
    HardwareWriteFailed { channel: usize },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedTopic => write!(f, "unrecognized topic"),
            Self::UnrecognizedCommand => write!(f, "unrecognized command"),
            Self::ChannelOutOfRange {
                channel: usize::MAX,
                ..
            } => write!(f, "channel index is not a number"),
            Self::ChannelOutOfRange { channel, count } => {
                ValidationError::ChannelOutOfRange {
                    channel: *channel,
                    count: *count,
                }
                .fmt(f)
            }
            Self::InvalidValue => ValidationError::InvalidValue.fmt(f),
            Self::MissingPulseArguments => PulseArgError::MissingArguments.fmt(f),
            Self::InvalidPulseArgument { position } => {
                PulseArgError::InvalidArgument {
                    position: *position,
                }
                .fmt(f)
            }
            Self::HardwareWriteFailed { channel } => {
                HardwareWriteFailed { channel: *channel }.fmt(f)
            }
        }
    }
}

impl From<ValidationError> for CommandError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::ChannelOutOfRange { channel, count } => {
                Self::ChannelOutOfRange { channel, count }
            }
            ValidationError::InvalidValue => Self::InvalidValue,
        }
    }
}

impl From<PulseArgError> for CommandError {
    fn from(e: PulseArgError) -> Self {
        match e {
            PulseArgError::MissingArguments => Self::MissingPulseArguments,
            PulseArgError::InvalidArgument { position } => Self::InvalidPulseArgument { position },
        }
    }
}

impl From<HardwareWriteFailed> for CommandError {
    fn from(e: HardwareWriteFailed) -> Self {
        Self::HardwareWriteFailed { channel: e.channel }
    }
}

impl From<Error> for CommandError {
    fn from(e: Error) -> Self {
        match e {
            Error::Validation(v) => v.into(),
            Error::Hardware(h) => h.into(),
            Error::Pulse(p) => p.into(),
            Error::Command(c) => c,
            // Store and config failures never reach the command path; the
            // command itself was fine.
            Error::Store(_) | Error::Config(_) => Self::UnrecognizedCommand,
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Inbox errors
// ---------------------------------------------------------------------------

/// Why a message could not be posted into the loop's inbox.  The message
/// is dropped; producers never block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxError {
    Full,
    TopicTooLong,
    PayloadTooLong,
}

impl fmt::Display for InboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "inbox full"),
            Self::TopicTooLong => write!(f, "topic too long"),
            Self::PayloadTooLong => write!(f, "payload too long"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Engine-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
