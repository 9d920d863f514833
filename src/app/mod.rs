//! Application core: the I/O state engine and its boundary.
//!
//! [`service::AdapterEngine`] owns the input and output banks and the
//! snapshot store.  Everything it touches outside of memory goes through
//! a **port trait** defined in [`ports`], so the engine runs unchanged
//! against real pins, the simulator, or the recording mocks in `tests/`.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
