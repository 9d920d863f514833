//! Line-oriented console bus.
//!
//! Stands in for a pub/sub transport when the binary runs without one:
//! every publish becomes one line on a writer, and inbound traffic is read
//! as lines of the form
//!
//! ```text
//! io/distio/dio-output/2/set/state on     bus command: <topic> <payload>
//! sim/dio-input/3 1                       drive simulated input 3 high
//! # comment
//! ```

use std::io::Write;

use log::warn;

use crate::app::ports::{BusError, BusPort};

pub struct ConsoleBus<W: Write> {
    out: W,
}

impl<W: Write> ConsoleBus<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> BusPort for ConsoleBus<W> {
    fn publish(&mut self, topic: &str, payload: &[u8], retained: bool) -> Result<(), BusError> {
        let marker = if retained { " (retained)" } else { "" };
        writeln!(
            self.out,
            "{} {}{}",
            topic,
            String::from_utf8_lossy(payload),
            marker
        )
        .and_then(|()| self.out.flush())
        .map_err(|e| {
            warn!("ConsoleBus: {}", e);
            BusError::IoError
        })
    }
}

/// One parsed console input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine<'a> {
    Command { topic: &'a str, payload: &'a str },
    SimInput { channel: usize, value: bool },
}

/// Parse a console line.  Blank lines, comments and malformed `sim/`
/// lines yield `None`.
pub fn parse_console_line(line: &str) -> Option<ConsoleLine<'_>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (topic, payload) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(t, p)| (t, p.trim()));

    if let Some(channel) = topic.strip_prefix("sim/dio-input/") {
        let channel = channel.parse().ok()?;
        let value = crate::io::output::parse_level(payload).ok()?;
        return Some(ConsoleLine::SimInput { channel, value });
    }
    Some(ConsoleLine::Command { topic, payload })
}
