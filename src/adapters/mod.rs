//! Adapters: concrete implementations of the hexagonal port traits that
//! are not drivers for a specific chip.
//!
//! | Adapter    | Implements | Connects to             |
//! |------------|------------|-------------------------|
//! | `log_sink` | EventSink  | Serial log output       |
//! | `time`     | Clock      | ESP32 high-res timer    |

pub mod log_sink;
pub mod time;
