//! Mock adapters for integration tests.
//!
//! Record every hardware call, emitted event and snapshot save so tests can
//! assert on the full history without real pins or files.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use distio::app::events::IoEvent;
use distio::app::ports::{Clock, EventSink, HardwareIo, StatePort, Timestamp};
use distio::error::{HardwareWriteFailed, StoreError};
use distio::io::state::Snapshot;

// ── Hardware call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    Write { channel: usize, value: bool },
    SetPullup { channel: usize, enabled: bool },
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub calls: Vec<HwCall>,
    /// Levels returned by `read`; missing channels read low.
    pub inputs: Vec<bool>,
    /// Output channels whose writes fail.
    pub failing: Vec<usize>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs(n: usize) -> Self {
        Self {
            inputs: vec![false; n],
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<(usize, bool)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::Write { channel, value } => Some((*channel, *value)),
                HwCall::SetPullup { .. } => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl HardwareIo for MockHardware {
    fn read(&mut self, channel: usize) -> bool {
        self.inputs.get(channel).copied().unwrap_or(false)
    }

    fn write(&mut self, channel: usize, value: bool) -> Result<(), HardwareWriteFailed> {
        if self.failing.contains(&channel) {
            return Err(HardwareWriteFailed { channel });
        }
        self.calls.push(HwCall::Write { channel, value });
        Ok(())
    }

    fn set_pullup(&mut self, channel: usize, enabled: bool) -> Result<(), HardwareWriteFailed> {
        self.calls.push(HwCall::SetPullup { channel, enabled });
        Ok(())
    }
}

// ── MemoryStore ───────────────────────────────────────────────

/// In-memory snapshot store.  Clones share the same backing image.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    image: RefCell<Option<Snapshot>>,
    saves: Cell<u32>,
    corrupted: Cell<bool>,
    fail_saves: Cell<bool>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(snapshot: Snapshot) -> Self {
        let store = Self::default();
        *store.inner.image.borrow_mut() = Some(snapshot);
        store
    }

    /// Make `load` report a corrupted image.
    pub fn corrupt(&self) {
        self.inner.corrupted.set(true);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.inner.fail_saves.set(fail);
    }

    pub fn saves(&self) -> u32 {
        self.inner.saves.get()
    }

    pub fn image(&self) -> Option<Snapshot> {
        self.inner.image.borrow().clone()
    }
}

impl StatePort for MemoryStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        if self.inner.corrupted.get() {
            return Err(StoreError::Corrupted);
        }
        self.inner.image.borrow().clone().ok_or(StoreError::NotFound)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if self.inner.fail_saves.get() {
            return Err(StoreError::Io);
        }
        *self.inner.image.borrow_mut() = Some(snapshot.clone());
        self.inner.saves.set(self.inner.saves.get() + 1);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<IoEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_publishes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, IoEvent::OutputChanged { .. }))
            .count()
    }

    pub fn rejections(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, IoEvent::CommandRejected { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &IoEvent) {
        self.events.push(event.clone());
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Clock advanced by the test.  Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock {
    mono_us: Arc<AtomicU64>,
}

pub const WALL_EPOCH_MS: u64 = 1_700_000_000_000;

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, ms: u64) {
        self.mono_us.fetch_add(ms * 1000, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn mono_us(&self) -> u64 {
        self.mono_us.load(Ordering::Relaxed)
    }

    fn wall_ms(&self) -> u64 {
        WALL_EPOCH_MS + self.mono_us() / 1000
    }
}

/// Timestamp at `ms` on both clocks.
#[allow(dead_code)]
pub fn at(ms: u64) -> Timestamp {
    Timestamp {
        mono_ms: ms,
        wall_ms: WALL_EPOCH_MS + ms,
    }
}
