//! Integration tests for the router → engine → banks → sink/store pipeline.

use distio::app::commands::{ChannelCommand, UpdateMode};
use distio::app::events::{IoEvent, TransitionEvent};
use distio::app::service::AdapterEngine;
use distio::config::{AdapterConfig, InputMode};
use distio::error::{CommandError, Error, ValidationError};
use distio::io::pulse::{PulsePattern, PulsePhase};
use distio::io::state::Snapshot;

use crate::mock_hw::{HwCall, MemoryStore, MockHardware, RecordingSink, at};

fn config(inputs: usize, outputs: usize) -> AdapterConfig {
    AdapterConfig {
        client_name: "dev".into(),
        topic_root: String::new(),
        num_dio_inputs: inputs,
        num_dio_outputs: outputs,
        ..AdapterConfig::default()
    }
}

fn started(
    cfg: &AdapterConfig,
    store: &MemoryStore,
) -> (AdapterEngine<MemoryStore>, MockHardware, RecordingSink) {
    let mut engine = AdapterEngine::new(cfg, store.clone());
    let mut hw = MockHardware::with_inputs(cfg.num_dio_inputs);
    engine.start(&mut hw);
    hw.clear();
    (engine, hw, RecordingSink::new())
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn fresh_start_is_all_low_with_pullups() {
    let store = MemoryStore::new();
    let (engine, _, _) = started(&config(3, 3), &store);
    let snap = engine.snapshot();
    assert_eq!(snap.inputs.len(), 3);
    assert_eq!(snap.outputs.len(), 3);
    assert!(snap.inputs.iter().all(|i| !i.value && i.pullup_enabled && i.last_change_at.is_none()));
    assert!(snap.outputs.iter().all(|o| !o.value));
    assert_eq!(store.saves(), 1, "startup saves exactly once");
}

#[test]
fn corrupted_store_starts_from_defaults() {
    let cfg = config(2, 2);
    let store = MemoryStore::new();
    store.corrupt();
    let (engine, _, _) = started(&cfg, &store);
    assert_eq!(engine.snapshot(), Snapshot::new(cfg.layout()));
}

#[test]
fn restoration_is_silent() {
    let cfg = config(2, 2);
    let mut image = Snapshot::new(cfg.layout());
    image.outputs[1].value = true;
    image.inputs[0].pullup_enabled = false;

    let mut engine = AdapterEngine::new(&cfg, MemoryStore::with_image(image));
    let mut hw = MockHardware::with_inputs(2);
    engine.start(&mut hw);

    assert!(hw.calls.contains(&HwCall::Write {
        channel: 1,
        value: true
    }));
    assert!(hw.calls.contains(&HwCall::SetPullup {
        channel: 0,
        enabled: false
    }));
    assert!(engine.output(1).unwrap().value);
}

#[test]
fn cached_input_levels_suppress_spurious_first_transition() {
    let cfg = config(1, 0);
    let mut image = Snapshot::new(cfg.layout());
    image.inputs[0].value = true;
    let (mut engine, mut hw, mut sink) = started(&cfg, &MemoryStore::with_image(image));
    hw.inputs[0] = true;
    assert_eq!(engine.poll_inputs(at(0), &mut hw, &mut sink), 0);
    assert!(sink.events.is_empty());
}

// ── Outputs ───────────────────────────────────────────────────

#[test]
fn out_of_range_set_changes_nothing() {
    let store = MemoryStore::new();
    let (mut engine, mut hw, mut sink) = started(&config(4, 4), &store);
    let before = engine.snapshot();

    let err = engine
        .set_output_token(5, "on", UpdateMode::Announce, &mut hw, &mut sink)
        .unwrap_err();
    assert_eq!(
        err,
        Error::Validation(ValidationError::ChannelOutOfRange {
            channel: 5,
            count: 4
        })
    );
    assert_eq!(engine.snapshot(), before);
    assert!(hw.calls.is_empty());
    assert!(sink.events.is_empty());
    assert_eq!(store.saves(), 1);
}

#[test]
fn routed_high_sets_output_exactly_once() {
    let (mut engine, mut hw, mut sink) = started(&config(0, 4), &MemoryStore::new());
    engine
        .route("dev/dio-output/2/set/state", b"high", at(0), &mut hw, &mut sink)
        .unwrap();
    assert_eq!(hw.writes(), vec![(2, true)]);
    assert_eq!(
        sink.events,
        vec![IoEvent::OutputChanged {
            channel: 2,
            value: true
        }]
    );
}

#[test]
fn redundant_set_still_republishes_and_persists() {
    let store = MemoryStore::new();
    let (mut engine, mut hw, mut sink) = started(&config(0, 2), &store);
    for _ in 0..3 {
        engine
            .set_output(0, false, UpdateMode::Announce, &mut hw, &mut sink)
            .unwrap();
    }
    assert_eq!(sink.output_publishes(), 3);
    assert_eq!(store.saves(), 1 + 3);
}

#[test]
fn publish_and_persist_stay_together() {
    let store = MemoryStore::new();
    let (mut engine, mut hw, mut sink) = started(&config(0, 3), &store);
    engine
        .route("dev/dio-output/0/set/state", b"on", at(0), &mut hw, &mut sink)
        .unwrap();
    engine
        .route("dev/dio-output/2/set/state", b"ON", at(1), &mut hw, &mut sink)
        .unwrap();
    let image = store.image().unwrap();
    for event in &sink.events {
        if let IoEvent::OutputChanged { channel, value } = event {
            assert_eq!(image.outputs[*channel].value, *value);
        }
    }
}

#[test]
fn silent_set_neither_publishes_nor_saves() {
    let store = MemoryStore::new();
    let (mut engine, mut hw, mut sink) = started(&config(0, 2), &store);
    engine
        .set_output(1, true, UpdateMode::Silent, &mut hw, &mut sink)
        .unwrap();
    assert!(engine.output(1).unwrap().value);
    assert!(sink.events.is_empty());
    assert_eq!(store.saves(), 1);
}

#[test]
fn hardware_failure_is_reported_not_fatal() {
    let (mut engine, mut hw, mut sink) = started(&config(0, 2), &MemoryStore::new());
    hw.failing.push(1);
    let err = engine
        .route("dev/dio-output/1/set/state", b"1", at(0), &mut hw, &mut sink)
        .unwrap_err();
    assert_eq!(err, CommandError::HardwareWriteFailed { channel: 1 });
    assert!(!engine.output(1).unwrap().value);
    assert_eq!(sink.rejections(), 1);

    // The engine keeps serving other channels.
    engine
        .route("dev/dio-output/0/set/state", b"1", at(1), &mut hw, &mut sink)
        .unwrap();
    assert!(engine.output(0).unwrap().value);
}

#[test]
fn save_failure_is_swallowed() {
    let store = MemoryStore::new();
    let (mut engine, mut hw, mut sink) = started(&config(0, 1), &store);
    store.fail_saves(true);
    engine
        .set_output(0, true, UpdateMode::Announce, &mut hw, &mut sink)
        .unwrap();
    assert!(engine.output(0).unwrap().value, "memory stays authoritative");
    assert_eq!(engine.save_failures(), 1);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn malformed_commands_are_rejected_and_reported() {
    let (mut engine, mut hw, mut sink) = started(&config(2, 2), &MemoryStore::new());
    let cases: [(&str, &[u8], CommandError); 5] = [
        ("dev/dio-output/0/set/colour", b"1", CommandError::UnrecognizedCommand),
        ("dev/dio-output/0/set/pulse", b"", CommandError::MissingPulseArguments),
        ("dev/dio-output/0/set/state", b"maybe", CommandError::InvalidValue),
        ("dev/dio-input/0/pullup/set/pullup", b"5", CommandError::InvalidValue),
        ("other/dio-output/0/set/state", b"1", CommandError::UnrecognizedTopic),
    ];
    for (topic, payload, expected) in cases {
        assert_eq!(
            engine.route(topic, payload, at(0), &mut hw, &mut sink),
            Err(expected),
            "{topic}"
        );
    }
    assert_eq!(sink.rejections(), 5);
    assert!(hw.calls.is_empty());
}

#[test]
fn pullup_command_applies_publishes_and_persists() {
    let store = MemoryStore::new();
    let (mut engine, mut hw, mut sink) = started(&config(2, 0), &store);
    engine
        .route("dev/dio-input/1/pullup/set/pullup", b"0", at(0), &mut hw, &mut sink)
        .unwrap();
    assert_eq!(
        hw.calls,
        vec![HwCall::SetPullup {
            channel: 1,
            enabled: false
        }]
    );
    assert_eq!(
        sink.events,
        vec![IoEvent::PullupChanged {
            channel: 1,
            enabled: false
        }]
    );
    assert!(!store.image().unwrap().inputs[1].pullup_enabled);
}

#[test]
fn direct_command_dispatch() {
    let (mut engine, mut hw, mut sink) = started(&config(0, 2), &MemoryStore::new());
    engine
        .handle_command(
            ChannelCommand::StartPulse {
                channel: 1,
                pattern: PulsePattern::single(30),
            },
            at(0),
            &mut hw,
            &mut sink,
        )
        .unwrap();
    assert_eq!(engine.pulse_phase(1), Some(PulsePhase::InPulse));
}

// ── Pulses ────────────────────────────────────────────────────

#[test]
fn routed_pulse_runs_its_pattern_silently() {
    let (mut engine, mut hw, mut sink) = started(&config(0, 1), &MemoryStore::new());
    engine
        .route("dev/dio-output/0/set/pulse", b"100,50,3", at(0), &mut hw, &mut sink)
        .unwrap();
    for t in 1..=2000 {
        engine.tick(&at(t), &mut hw, &mut sink);
    }
    let levels: Vec<bool> = hw.writes().into_iter().map(|(_, v)| v).collect();
    assert_eq!(levels, vec![true, false, true, false, true, false]);
    assert_eq!(engine.pulse_phase(0), Some(PulsePhase::Done));
    assert!(sink.events.is_empty());
}

#[test]
fn new_pulse_preempts_old_one() {
    let (mut engine, mut hw, mut sink) = started(&config(0, 1), &MemoryStore::new());
    engine.start_pulse(0, &["10", "10"], at(0), &mut hw).unwrap();
    for t in 1..=100 {
        engine.tick(&at(t), &mut hw, &mut sink);
    }
    engine.start_pulse(0, &["500"], at(100), &mut hw).unwrap();
    hw.clear();
    for t in 101..=400 {
        engine.tick(&at(t), &mut hw, &mut sink);
    }
    assert!(hw.writes().is_empty(), "old pattern no longer toggles");
    assert!(engine.output(0).unwrap().value);
}

#[test]
fn restart_mid_pulse_resumes_last_announced_level() {
    let store = MemoryStore::new();
    let cfg = config(0, 2);
    {
        let (mut engine, mut hw, mut sink) = started(&cfg, &store);
        engine
            .route("dev/dio-output/0/set/pulse", b"60000", at(0), &mut hw, &mut sink)
            .unwrap();
        // Saves triggered by other channels must not leak the pulse level.
        engine
            .route("dev/dio-output/1/set/state", b"on", at(1), &mut hw, &mut sink)
            .unwrap();
        assert!(engine.output(0).unwrap().value);
        assert_eq!(sink.output_publishes(), 1);
        engine.shutdown();
    }

    let image = store.image().unwrap();
    assert!(!image.outputs[0].value);
    assert!(image.outputs[1].value);

    let (engine, _, _) = started(&cfg, &store);
    assert!(!engine.output(0).unwrap().value);
    assert!(engine.output(1).unwrap().value);
    assert_eq!(engine.pulse_phase(0), Some(PulsePhase::Idle));
}

#[test]
fn pulse_whose_first_edge_fails_is_dropped() {
    let (mut engine, mut hw, mut sink) = started(&config(0, 1), &MemoryStore::new());
    hw.failing.push(0);
    let err = engine
        .route("dev/dio-output/0/set/pulse", b"10,10,3", at(0), &mut hw, &mut sink)
        .unwrap_err();
    assert_eq!(err, CommandError::HardwareWriteFailed { channel: 0 });
    assert_eq!(engine.pulse_phase(0), Some(PulsePhase::Idle));

    hw.failing.clear();
    for t in 1..=200 {
        engine.tick(&at(t), &mut hw, &mut sink);
    }
    assert!(hw.writes().is_empty(), "rejected pulse drives no edges");
}

#[test]
fn failed_explicit_set_keeps_running_pulse() {
    let (mut engine, mut hw, mut sink) = started(&config(0, 1), &MemoryStore::new());
    engine
        .route("dev/dio-output/0/set/pulse", b"10,10", at(0), &mut hw, &mut sink)
        .unwrap();
    hw.failing.push(0);
    assert_eq!(
        engine.route("dev/dio-output/0/set/state", b"off", at(1), &mut hw, &mut sink),
        Err(CommandError::HardwareWriteFailed { channel: 0 })
    );
    assert_eq!(engine.pulse_phase(0), Some(PulsePhase::InPulse));

    hw.failing.clear();
    hw.clear();
    for t in 2..=40 {
        engine.tick(&at(t), &mut hw, &mut sink);
    }
    assert!(!hw.writes().is_empty(), "pulse still toggles");
}

// ── Inputs ────────────────────────────────────────────────────

#[test]
fn transition_elapsed_time() {
    let cfg = AdapterConfig {
        input_mode: InputMode::Interrupt,
        ..config(1, 0)
    };
    let (mut engine, _hw, mut sink) = started(&cfg, &MemoryStore::new());
    engine.report_input_change(0, true, 1000, &mut sink).unwrap();
    let second = engine.report_input_change(0, false, 1500, &mut sink).unwrap();
    assert_eq!(second.elapsed_since_last_ms, Some(500));
    assert_eq!(
        sink.events.last(),
        Some(&IoEvent::InputTransition(TransitionEvent {
            channel: 0,
            value_old: true,
            value_new: false,
            elapsed_since_last_ms: Some(500),
            occurred_at: 1500,
        }))
    );
}

#[test]
fn interrupt_mode_tick_does_not_poll() {
    let cfg = AdapterConfig {
        input_mode: InputMode::Interrupt,
        ..config(1, 0)
    };
    let (mut engine, mut hw, mut sink) = started(&cfg, &MemoryStore::new());
    hw.inputs[0] = true;
    engine.tick(&at(10), &mut hw, &mut sink);
    assert!(sink.events.is_empty());
    assert!(!engine.input(0).unwrap().value);
}

#[test]
fn polled_transitions_are_persisted_with_their_timestamp() {
    let store = MemoryStore::new();
    let (mut engine, mut hw, mut sink) = started(&config(2, 0), &store);
    hw.inputs[1] = true;
    assert_eq!(engine.poll_inputs(at(250), &mut hw, &mut sink), 1);
    let image = store.image().unwrap();
    assert!(image.inputs[1].value);
    assert_eq!(image.inputs[1].last_change_at, Some(at(250).wall_ms));
}
