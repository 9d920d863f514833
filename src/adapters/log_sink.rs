//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each engine event as one log line.
//! Useful alongside a bus sink, or on its own when no bus is attached.

use log::{info, warn};

use crate::app::events::IoEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`IoEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &IoEvent) {
        match event {
            IoEvent::OutputChanged { channel, value } => {
                info!("DO    | ch{} = {}", channel, u8::from(*value));
            }
            IoEvent::InputChanged { channel, value } => {
                info!("DI    | ch{} = {}", channel, u8::from(*value));
            }
            IoEvent::InputTransition(t) => {
                info!(
                    "EDGE  | ch{} {} | elapsed={} | at={}",
                    t.channel,
                    if t.is_rise() { "rise" } else { "fall" },
                    t.elapsed_since_last_ms
                        .map_or_else(|| "-".to_string(), |ms| format!("{ms}ms")),
                    t.occurred_at,
                );
            }
            IoEvent::PullupChanged { channel, enabled } => {
                info!("PULL  | ch{} = {}", channel, u8::from(*enabled));
            }
            IoEvent::CommandRejected { topic, error } => {
                warn!(
                    "REJECT| {} | {}",
                    topic.as_deref().unwrap_or("<direct>"),
                    error
                );
            }
        }
    }
}
