//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a subsystem against
//! mock adapters.  All tests run on the host with no real hardware.

mod engine_tests;
mod loop_tests;
mod mock_hw;
