//! Application core: boot sequence and main loop, zero direct I/O.
//!
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod boot;
pub mod controller;
pub mod events;
pub mod ports;
