//! Bus event sink adapter.
//!
//! Turns engine events into topic/payload publishes on any [`BusPort`]:
//!
//! | Event              | Topic                                         | Retained |
//! |--------------------|-----------------------------------------------|----------|
//! | `OutputChanged`    | `{prefix}/dio-output/{n}/state`               | yes      |
//! | `InputChanged`     | `{prefix}/dio-input/{n}/state`                | yes      |
//! | `InputTransition`  | `{prefix}/dio-input/{n}/event/transition/...` | no       |
//! | `PullupChanged`    | `{prefix}/dio-input/{n}/pullup`               | yes      |
//! | `CommandRejected`  | `log/{client}/error`                          | no       |
//!
//! Levels are published as `0`/`1`.  Transition payloads are JSON with the
//! event time in fractional epoch seconds and the elapsed time in whole
//! milliseconds (omitted on a channel's first transition).

use log::warn;
use serde::Serialize;

use crate::app::events::{IoEvent, TransitionEvent};
use crate::app::ports::{BusPort, EventSink};
use crate::topic::TopicScheme;

/// Wire shape of a transition event.
#[derive(Debug, Serialize)]
pub struct TransitionPayload {
    pub value_old: u8,
    pub value_new: u8,
    /// Seconds since the Unix epoch.
    pub time_event: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_elapsed: Option<u64>,
}

impl From<&TransitionEvent> for TransitionPayload {
    fn from(e: &TransitionEvent) -> Self {
        Self {
            value_old: u8::from(e.value_old),
            value_new: u8::from(e.value_new),
            time_event: e.occurred_at as f64 / 1000.0,
            time_elapsed: e.elapsed_since_last_ms,
        }
    }
}

pub struct BusEventSink<B: BusPort> {
    bus: B,
    topics: TopicScheme,
    dropped: u32,
}

impl<B: BusPort> BusEventSink<B> {
    pub fn new(bus: B, topics: TopicScheme) -> Self {
        Self {
            bus,
            topics,
            dropped: 0,
        }
    }

    /// Presence: `online` once ready, `offline` on clean shutdown.
    pub fn publish_status(&mut self, online: bool) {
        let topic = self.topics.status();
        let payload: &[u8] = if online { b"online" } else { b"offline" };
        self.publish(&topic, payload, true);
    }

    /// Publishes that the bus refused.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retained: bool) {
        if let Err(e) = self.bus.publish(topic, payload, retained) {
            self.dropped = self.dropped.saturating_add(1);
            warn!("BusEventSink: publish to '{}' failed: {}", topic, e);
        }
    }
}

fn level(value: bool) -> &'static [u8] {
    if value { b"1" } else { b"0" }
}

impl<B: BusPort> EventSink for BusEventSink<B> {
    fn emit(&mut self, event: &IoEvent) {
        match event {
            IoEvent::OutputChanged { channel, value } => {
                let topic = self.topics.output_state(*channel);
                self.publish(&topic, level(*value), true);
            }
            IoEvent::InputChanged { channel, value } => {
                let topic = self.topics.input_state(*channel);
                self.publish(&topic, level(*value), true);
            }
            IoEvent::InputTransition(t) => {
                let topic = self.topics.input_transition(t.channel, t.is_rise());
                match serde_json::to_vec(&TransitionPayload::from(t)) {
                    Ok(json) => self.publish(&topic, &json, false),
                    Err(e) => warn!("BusEventSink: encoding transition: {}", e),
                }
            }
            IoEvent::PullupChanged { channel, enabled } => {
                let topic = self.topics.input_pullup(*channel);
                self.publish(&topic, level(*enabled), true);
            }
            IoEvent::CommandRejected { topic, error } => {
                let log_topic = self.topics.log("error");
                let message = match topic {
                    Some(t) => format!("{t}: {error}"),
                    None => error.to_string(),
                };
                self.publish(&log_topic, message.as_bytes(), false);
            }
        }
    }
}
