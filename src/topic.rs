//! Bus address grammar.
//!
//! Every channel topic lives under `{root}/{client}`:
//!
//! ```text
//!   in   {prefix}/dio-output/{n}/set/state             on|off|high|low|1|0
//!   in   {prefix}/dio-output/{n}/set/pulse             on[,off[,reps[,delay[,sets]]]]
//!   in   {prefix}/dio-input/{n}/pullup/set/pullup      0|1
//!   in   {prefix}/dio-input/{n}/set/pullup             0|1
//!   out  {prefix}/dio-output/{n}/state                 0|1 (retained)
//!   out  {prefix}/dio-input/{n}/state                  0|1 (retained)
//!   out  {prefix}/dio-input/{n}/pullup                 0|1 (retained)
//!   out  {prefix}/dio-input/{n}/event/transition/{rise|fall}
//!   out  {prefix}/status                               online|offline (retained)
//!   out  log/{client}/{level}
//! ```
//!
//! Parsing only splits and classifies segments.  Range checks and payload
//! coercion belong to the [`CommandRouter`](crate::router::CommandRouter).

use crate::error::CommandError;

pub const DIO_INPUT: &str = "dio-input";
pub const DIO_OUTPUT: &str = "dio-output";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoClass {
    DigitalInput,
    DigitalOutput,
}

impl IoClass {
    fn parse(segment: &str) -> Option<Self> {
        match segment {
            DIO_INPUT => Some(Self::DigitalInput),
            DIO_OUTPUT => Some(Self::DigitalOutput),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    State,
    Pullup,
    Pulse,
    /// Well-formed but not a parameter this engine knows.
    Unknown,
}

impl Parameter {
    fn parse(segment: &str) -> Self {
        if segment.eq_ignore_ascii_case("state") {
            Self::State
        } else if segment.eq_ignore_ascii_case("pullup") {
            Self::Pullup
        } else if segment.eq_ignore_ascii_case("pulse") {
            Self::Pulse
        } else {
            Self::Unknown
        }
    }
}

/// A split inbound topic.  The channel segment is left unparsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandAddress<'a> {
    pub class: IoClass,
    pub channel: &'a str,
    pub parameter: Parameter,
}

/// Topic prefix of one adapter instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    client: String,
    prefix: String,
}

impl TopicScheme {
    pub fn new(root: &str, client: &str) -> Self {
        let prefix = if root.is_empty() {
            client.to_string()
        } else {
            format!("{root}/{client}")
        };
        Self {
            client: client.to_string(),
            prefix,
        }
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Split an inbound command topic addressed to this client.
    pub fn parse<'a>(&self, topic: &'a str) -> Result<CommandAddress<'a>, CommandError> {
        let rest = topic
            .strip_prefix(self.prefix.as_str())
            .and_then(|r| r.strip_prefix('/'))
            .ok_or(CommandError::UnrecognizedTopic)?;

        let segments: heapless::Vec<&str, 6> = rest.split('/').take(6).collect();

        let (class, channel, parameter, long_form) = match segments.as_slice() {
            [class, channel, "set", parameter] => (*class, *channel, *parameter, false),
            [class, channel, "pullup", "set", parameter] => (*class, *channel, *parameter, true),
            _ => return Err(CommandError::UnrecognizedTopic),
        };

        let address = CommandAddress {
            class: IoClass::parse(class).ok_or(CommandError::UnrecognizedTopic)?,
            channel,
            parameter: Parameter::parse(parameter),
        };
        // The `{n}/pullup/set/...` form only ever addresses an input pull-up.
        if long_form
            && (address.class, address.parameter) != (IoClass::DigitalInput, Parameter::Pullup)
        {
            return Err(CommandError::UnrecognizedTopic);
        }
        Ok(address)
    }

    pub fn output_state(&self, channel: usize) -> String {
        format!("{}/{DIO_OUTPUT}/{channel}/state", self.prefix)
    }

    pub fn input_state(&self, channel: usize) -> String {
        format!("{}/{DIO_INPUT}/{channel}/state", self.prefix)
    }

    pub fn input_pullup(&self, channel: usize) -> String {
        format!("{}/{DIO_INPUT}/{channel}/pullup", self.prefix)
    }

    pub fn input_transition(&self, channel: usize, rise: bool) -> String {
        let edge = if rise { "rise" } else { "fall" };
        format!("{}/{DIO_INPUT}/{channel}/event/transition/{edge}", self.prefix)
    }

    pub fn status(&self) -> String {
        format!("{}/status", self.prefix)
    }

    pub fn log(&self, level: &str) -> String {
        format!("log/{}/{level}", self.client)
    }
}
