//! Fuzz target: identity-EEPROM serial decode
//!
//! Feeds arbitrary ID blocks through both decode entry points and checks
//! that they agree, never panic, and always render twelve hex characters.
//!
//! cargo fuzz run fuzz_serial_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermowatch::sensors::serial::{SERIAL_CSTR_LEN, decode_serial, decode_serial_into};

fuzz_target!(|data: &[u8]| {
    let owned = decode_serial(data);

    let mut out = [0xFFu8; SERIAL_CSTR_LEN];
    let borrowed = decode_serial_into(data, &mut out).map(|s| s.to_owned());

    match (owned, borrowed) {
        (Ok(a), Ok(b)) => {
            assert_eq!(a.as_str(), b);
            assert_eq!(a.len(), 12);
            assert!(a.bytes().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
            assert_eq!(out[SERIAL_CSTR_LEN - 1], 0, "missing terminator");
        }
        (Err(a), Err(b)) => assert_eq!(a, b),
        (a, b) => panic!("decoders disagree: {:?} vs {:?}", a, b),
    }

    // A short destination is rejected regardless of input.
    let mut short = [0u8; SERIAL_CSTR_LEN - 1];
    assert!(decode_serial_into(data, &mut short).is_err());
});
