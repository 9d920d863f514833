//! Inbound command routing: `(topic, payload)` → [`ChannelCommand`].
//!
//! Check order for every command:
//!
//! 1. topic grammar and io-class (`UnrecognizedTopic`)
//! 2. channel index parses and is in range (`ChannelOutOfRange`)
//! 3. parameter is valid for the io-class (`UnrecognizedCommand`)
//! 4. payload coerces (`InvalidValue`, `MissingPulseArguments`,
//!    `InvalidPulseArgument`)
//!
//! The router is pure: it never touches banks or hardware.  Dispatching a
//! parsed command is the [`AdapterEngine`](crate::app::service::AdapterEngine)'s job.

use crate::app::commands::ChannelCommand;
use crate::error::CommandError;
use crate::io::output::parse_level;
use crate::io::pulse::{PULSE_FIELDS, PulsePattern};
use crate::io::state::ChannelLayout;
use crate::topic::{IoClass, Parameter, TopicScheme};

/// Reported as the channel of a `ChannelOutOfRange` whose index segment
/// is not a number.
pub const UNPARSEABLE_CHANNEL: usize = usize::MAX;

pub struct CommandRouter {
    scheme: TopicScheme,
    layout: ChannelLayout,
}

impl CommandRouter {
    pub fn new(scheme: TopicScheme, layout: ChannelLayout) -> Self {
        Self { scheme, layout }
    }

    pub fn scheme(&self) -> &TopicScheme {
        &self.scheme
    }

    /// Parse and validate one inbound message.
    pub fn parse(&self, topic: &str, payload: &[u8]) -> Result<ChannelCommand, CommandError> {
        let address = self.scheme.parse(topic)?;

        let count = match address.class {
            IoClass::DigitalInput => self.layout.inputs,
            IoClass::DigitalOutput => self.layout.outputs,
        };
        let channel = parse_channel(address.channel, count)?;

        // Payloads that are not UTF-8 cannot hold any valid token.
        let text = core::str::from_utf8(payload).map_err(|_| CommandError::InvalidValue);

        match (address.class, address.parameter) {
            (IoClass::DigitalOutput, Parameter::State) => Ok(ChannelCommand::SetOutput {
                channel,
                value: parse_level(text?)?,
            }),
            (IoClass::DigitalOutput, Parameter::Pulse) => {
                let text = text.map_err(|_| CommandError::InvalidPulseArgument { position: 0 })?;
                Ok(ChannelCommand::StartPulse {
                    channel,
                    pattern: parse_pulse_payload(text)?,
                })
            }
            (IoClass::DigitalInput, Parameter::Pullup) => Ok(ChannelCommand::SetPullup {
                channel,
                enabled: parse_level(text?)?,
            }),
            _ => Err(CommandError::UnrecognizedCommand),
        }
    }
}

/// Plain decimal digits only; `usize::from_str` would also take a sign.
fn parse_channel(segment: &str, count: usize) -> Result<usize, CommandError> {
    let channel = if segment.bytes().all(|b| b.is_ascii_digit()) {
        segment.parse::<usize>().unwrap_or(UNPARSEABLE_CHANNEL)
    } else {
        UNPARSEABLE_CHANNEL
    };
    if channel < count {
        Ok(channel)
    } else {
        Err(CommandError::ChannelOutOfRange { channel, count })
    }
}

/// Comma-separated pulse arguments.  A blank payload carries no arguments.
pub fn parse_pulse_payload(text: &str) -> Result<PulsePattern, CommandError> {
    if text.trim().is_empty() {
        return Err(CommandError::MissingPulseArguments);
    }
    // Arguments past the last field are ignored.
    let args: heapless::Vec<&str, PULSE_FIELDS> = text.split(',').take(PULSE_FIELDS).collect();
    Ok(PulsePattern::from_args(args.as_slice())?)
}
