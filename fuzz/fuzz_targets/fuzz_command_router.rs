//! Fuzz target: `CommandRouter::parse`
//!
//! Splits the input at the first NUL into topic and payload and routes it.
//! Every accepted command must address a channel inside the layout.
//!
//! cargo fuzz run fuzz_command_router

#![no_main]

use distio::app::commands::ChannelCommand;
use distio::io::state::ChannelLayout;
use distio::router::CommandRouter;
use distio::topic::TopicScheme;
use libfuzzer_sys::fuzz_target;

const LAYOUT: ChannelLayout = ChannelLayout {
    inputs: 8,
    outputs: 8,
    default_pullup: true,
};

fuzz_target!(|data: &[u8]| {
    let (topic, payload) = match data.iter().position(|&b| b == 0) {
        Some(i) => (&data[..i], &data[i + 1..]),
        None => (data, &[][..]),
    };
    let Ok(topic) = std::str::from_utf8(topic) else {
        return;
    };

    let router = CommandRouter::new(TopicScheme::new("io", "fuzz"), LAYOUT);
    let Ok(cmd) = router.parse(topic, payload) else {
        return;
    };
    match cmd {
        ChannelCommand::SetOutput { channel, .. } => assert!(channel < LAYOUT.outputs),
        ChannelCommand::SetPullup { channel, .. } => assert!(channel < LAYOUT.inputs),
        ChannelCommand::StartPulse { channel, pattern } => {
            assert!(channel < LAYOUT.outputs);
            assert!(pattern.on_time_ms > 0);
        }
    }
});
