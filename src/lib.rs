//! distio: digital I/O state engine for a publish/subscribe bus.
//!
//! Exposes a bank of digital inputs and outputs as addressable bus
//! resources and keeps a crash-recoverable image of their state.
//!
//! ```text
//!  bus ─▶ Inbox ─▶ AdapterLoop ─▶ AdapterEngine ─▶ EventSink ─▶ bus
//!                     (tick)       │        │
//!                                  ▼        ▼
//!                             HardwareIo  StatePort
//! ```

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod inbox;
pub mod io;
pub mod router;
pub mod scheduler;
pub mod topic;
