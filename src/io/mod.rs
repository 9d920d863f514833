//! Channel banks and their persisted image.
//!
//! Pure state machines: nothing here performs I/O beyond the
//! [`HardwareIo`](crate::app::ports::HardwareIo) calls it is handed.

pub mod input;
pub mod output;
pub mod pulse;
pub mod state;
