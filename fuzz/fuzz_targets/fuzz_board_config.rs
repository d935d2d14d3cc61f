//! Fuzz target: `BoardConfig::from_json`
//!
//! Arbitrary bytes must either parse into a valid board table that fits
//! the event mask or be rejected; never panic.
//!
//! cargo fuzz run fuzz_board_config

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermowatch::config::BoardConfig;
use thermowatch::sensors::MAX_SENSORS;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(board) = BoardConfig::from_json(text) {
        assert!(board.len() <= MAX_SENSORS);
        assert!(board.validate().is_ok(), "accepted an invalid table");
    }
});
