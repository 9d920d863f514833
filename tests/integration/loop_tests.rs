//! Integration tests for the adapter loop: inbox funnel, tick budget and
//! the Running → Stopped lifecycle.

use std::time::Duration;

use distio::app::events::IoEvent;
use distio::app::service::AdapterEngine;
use distio::config::{AdapterConfig, InputMode};
use distio::scheduler::{AdapterLoop, LoopState};

use crate::mock_hw::{ManualClock, MemoryStore, MockHardware, RecordingSink};

type TestLoop = AdapterLoop<MemoryStore, MockHardware, RecordingSink, ManualClock>;

fn make_loop(cfg: &AdapterConfig, store: &MemoryStore) -> (TestLoop, ManualClock) {
    let mut engine = AdapterEngine::new(cfg, store.clone());
    let mut hw = MockHardware::with_inputs(cfg.num_dio_inputs);
    engine.start(&mut hw);
    let clock = ManualClock::new();
    let adapter = AdapterLoop::new(cfg, engine, hw, RecordingSink::new(), clock.clone());
    (adapter, clock)
}

fn config() -> AdapterConfig {
    AdapterConfig {
        client_name: "dev".into(),
        num_dio_inputs: 2,
        num_dio_outputs: 2,
        ..AdapterConfig::default()
    }
}

#[test]
fn commands_posted_from_another_thread_are_applied_on_tick() {
    let (mut adapter, _clock) = make_loop(&config(), &MemoryStore::new());
    let inbox = adapter.inbox();
    std::thread::spawn(move || {
        inbox
            .post_command("io/dev/dio-output/1/set/state", b"on")
            .unwrap();
    })
    .join()
    .unwrap();

    adapter.tick();
    assert!(adapter.engine().output(1).unwrap().value);
    assert_eq!(
        adapter.sink().events,
        vec![IoEvent::OutputChanged {
            channel: 1,
            value: true
        }]
    );
}

#[test]
fn interrupt_reports_flow_through_the_inbox() {
    let cfg = AdapterConfig {
        input_mode: InputMode::Interrupt,
        ..config()
    };
    let (mut adapter, _clock) = make_loop(&cfg, &MemoryStore::new());
    adapter.inbox().post_input_change(0, true, 1000).unwrap();
    adapter.inbox().post_input_change(0, false, 1500).unwrap();
    adapter.tick();

    let transitions: Vec<_> = adapter
        .sink()
        .events
        .iter()
        .filter_map(|e| match e {
            IoEvent::InputTransition(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(transitions.len(), 2);
    assert_eq!(transitions[1].elapsed_since_last_ms, Some(500));
}

#[test]
fn pulses_advance_with_the_clock() {
    let (mut adapter, clock) = make_loop(&config(), &MemoryStore::new());
    adapter
        .inbox()
        .post_command("io/dev/dio-output/0/set/pulse", b"20")
        .unwrap();
    adapter.tick();
    assert!(adapter.engine().output(0).unwrap().value);

    clock.advance_ms(21);
    adapter.tick();
    assert!(!adapter.engine().output(0).unwrap().value);
}

#[test]
fn polling_feeds_the_tick_budget() {
    let (mut adapter, _clock) = make_loop(&config(), &MemoryStore::new());
    let sleep = adapter.tick();
    assert_eq!(adapter.budget().poll_cost_us(), Some(0));
    assert_eq!(sleep, Duration::from_micros(1000));
    assert_eq!(adapter.ticks(), 1);
}

#[test]
fn stop_saves_once_more_and_ends_in_stopped() {
    let store = MemoryStore::new();
    let (mut adapter, _clock) = make_loop(&config(), &store);
    let saves_before = store.saves();
    let stop = adapter.stop_handle();

    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        stop.stop();
    });
    adapter.run();
    stopper.join().unwrap();

    assert_eq!(adapter.state(), LoopState::Stopped);
    assert!(adapter.ticks() > 0);
    assert_eq!(store.saves(), saves_before + 1);
    assert!(!adapter.engine().is_started());
}
