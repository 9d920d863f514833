//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements   | Connects to                        |
//! |----------------|--------------|------------------------------------|
//! | `simulator`    | HardwareIo   | in-memory bank, flipped by handle  |
//! | `hal_bank`     | HardwareIo   | `embedded-hal` digital pins        |
//! | `state_file`   | StatePort    | JSON snapshot file                 |
//! | `bus_sink`     | EventSink    | any `BusPort` (topics + payloads)  |
//! | `console_bus`  | BusPort      | line-oriented writer (stdout)      |
//! | `log_sink`     | EventSink    | `log` facade                       |
//! | `time`         | Clock        | `std::time`                        |

pub mod bus_sink;
pub mod console_bus;
pub mod hal_bank;
pub mod log_sink;
pub mod simulator;
pub mod state_file;
pub mod time;
