//! distio: host entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  SimulatedIo    FileStateStore    BusEventSink + LogEventSink│
//! │  (HardwareIo)   (StatePort)       (EventSink → stdout, log)  │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            AdapterEngine (pure logic)                  │  │
//! │  │  InputBank · OutputBank · PulseSequencer · StateStore  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  AdapterLoop (owner thread) ◀── Inbox ◀── stdin reader       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands arrive on stdin as `<topic> <payload>` lines; `sim/dio-input/N 1`
//! drives a simulated input.  End of input stops the loop cleanly.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use distio::adapters::bus_sink::BusEventSink;
use distio::adapters::console_bus::{ConsoleBus, ConsoleLine, parse_console_line};
use distio::adapters::log_sink::LogEventSink;
use distio::adapters::simulator::{SimHandle, SimulatedIo};
use distio::adapters::state_file::FileStateStore;
use distio::adapters::time::SystemClock;
use distio::app::ports::Clock;
use distio::app::service::AdapterEngine;
use distio::config::{AdapterConfig, InputMode};
use distio::inbox::Inbox;
use distio::scheduler::{AdapterLoop, StopHandle};

#[derive(Debug, Parser)]
#[command(name = "distio", version, about = "Digital I/O adapter for a pub/sub bus")]
struct Cli {
    /// JSON config file [default: <executable>.json]
    config: Option<PathBuf>,

    /// Snapshot file [default: from config, else <config>.cache]
    #[arg(long)]
    state_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // ── 1. Configuration (the only fatal failure) ─────────────
    let config_path = match cli.config {
        Some(path) => path,
        None => std::env::current_exe()
            .context("locating executable for default config")?
            .with_extension("json"),
    };
    let config = AdapterConfig::load_file(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let state_path = cli
        .state_file
        .unwrap_or_else(|| config.state_cache_path(&config_path));
    info!("distio v{} starting", env!("CARGO_PKG_VERSION"));
    info!("State cache: {}", state_path.display());

    // ── 2. Adapters ───────────────────────────────────────────
    let mut hw = SimulatedIo::new(config.num_dio_inputs, config.num_dio_outputs);
    let sim = hw.handle();
    let mut engine = AdapterEngine::new(&config, FileStateStore::new(state_path));
    let mut sink = (
        BusEventSink::new(ConsoleBus::new(std::io::stdout()), engine.topics().clone()),
        LogEventSink::new(),
    );

    // ── 3. Restore, then announce presence ────────────────────
    engine.start(&mut hw);
    sink.0.publish_status(true);

    let mut adapter = AdapterLoop::new(&config, engine, hw, sink, SystemClock::new());
    spawn_console_reader(adapter.inbox(), adapter.stop_handle(), sim, config.input_mode);

    // ── 4. Loop until stdin closes ────────────────────────────
    adapter.run();

    let (_engine, _hw, (mut bus, _log)) = adapter.into_parts();
    bus.publish_status(false);
    Ok(())
}

/// Feed stdin lines into the inbox; stop the loop at end of input.
fn spawn_console_reader(
    inbox: std::sync::Arc<Inbox>,
    stop: StopHandle,
    sim: SimHandle,
    mode: InputMode,
) {
    std::thread::spawn(move || {
        let clock = SystemClock::new();
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!("stdin: {}", e);
                    break;
                }
            };
            match parse_console_line(&line) {
                Some(ConsoleLine::Command { topic, payload }) => {
                    if let Err(e) = inbox.post_command(topic, payload.as_bytes()) {
                        warn!("dropped '{}': {}", topic, e);
                    }
                }
                Some(ConsoleLine::SimInput { channel, value }) => {
                    if !sim.set_input(channel, value) {
                        warn!("sim: no input {} (bank has {})", channel, sim.num_inputs());
                        continue;
                    }
                    // Interrupt mode: the "hardware" reports its own edges.
                    if mode == InputMode::Interrupt {
                        if let Err(e) = inbox.post_input_change(channel, value, clock.wall_ms()) {
                            warn!("sim: dropped input change: {}", e);
                        }
                    }
                }
                None => {}
            }
        }
        info!("stdin closed, stopping");
        stop.stop();
    });
}
