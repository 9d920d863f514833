//! Bounded funnel from foreign threads into the loop thread.
//!
//! Bus-transport callbacks and interrupt-style input watchers may run on
//! their own threads.  They never touch the engine; they post here and
//! the loop drains the inbox once per tick.
//!
//! ```text
//! ┌──────────────┐  InboundMsg  ┌──────────────┐
//! │ bus callback │─────────────▶│              │
//! └──────────────┘              │  AdapterLoop │──▶ AdapterEngine
//! ┌──────────────┐  InboundMsg  │  (one thread)│
//! │ input watcher│─────────────▶│              │
//! └──────────────┘              └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::{String, Vec};
use log::warn;

use crate::error::InboxError;

/// Messages buffered before producers start seeing `Full`.
pub const INBOX_DEPTH: usize = 32;

pub const MAX_TOPIC_LEN: usize = 128;
pub const MAX_PAYLOAD_LEN: usize = 128;

pub enum InboundMsg {
    /// Raw bus command, routed on the loop thread.
    Command {
        topic: String<MAX_TOPIC_LEN>,
        payload: Vec<u8, MAX_PAYLOAD_LEN>,
    },
    /// Debounced input change from an interrupt-mode collaborator.
    InputChanged {
        channel: usize,
        value: bool,
        wall_ms: u64,
    },
}

pub struct Inbox {
    channel: Channel<CriticalSectionRawMutex, InboundMsg, INBOX_DEPTH>,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Queue a bus command.  Never blocks.
    pub fn post_command(&self, topic: &str, payload: &[u8]) -> Result<(), InboxError> {
        let topic = String::try_from(topic).map_err(|_| InboxError::TopicTooLong)?;
        let payload = Vec::from_slice(payload).map_err(|_| InboxError::PayloadTooLong)?;
        self.post(InboundMsg::Command { topic, payload })
    }

    /// Queue an input change.  Never blocks.
    pub fn post_input_change(
        &self,
        channel: usize,
        value: bool,
        wall_ms: u64,
    ) -> Result<(), InboxError> {
        self.post(InboundMsg::InputChanged {
            channel,
            value,
            wall_ms,
        })
    }

    fn post(&self, msg: InboundMsg) -> Result<(), InboxError> {
        self.channel.try_send(msg).map_err(|_| {
            warn!("Inbox: full, message dropped");
            InboxError::Full
        })
    }

    pub fn try_recv(&self) -> Option<InboundMsg> {
        self.channel.try_receive().ok()
    }

    /// Hand every message queued at call time to `f`, oldest first.
    ///
    /// Messages posted while draining wait for the next call, so a busy
    /// producer cannot starve the loop.
    pub fn drain(&self, mut f: impl FnMut(InboundMsg)) -> usize {
        let pending = self.channel.len();
        let mut handled = 0;
        while handled < pending {
            let Some(msg) = self.try_recv() else { break };
            f(msg);
            handled += 1;
        }
        handled
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}
