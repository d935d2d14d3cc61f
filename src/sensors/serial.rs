//! Serial-number decode from the identity EEPROM.
//!
//! The 8-byte block at offset 0 holds the unique ID.  Bytes 4 and 5 are
//! manufacturer-reserved and skipped; the remaining six render as twelve
//! lowercase hex characters, e.g. `01 02 03 04 AA BB 05 06` → `010203040506`.

use core::fmt::Write;

use crate::app::ports::Eeprom;
use crate::error::SerialDecodeError;

/// Offset of the ID block in the EEPROM.
pub const SERIAL_BLOCK_OFFSET: u16 = 0;
/// Length of the ID block.
pub const SERIAL_BLOCK_LEN: usize = 8;
/// Block positions that make up the serial number.
pub const SERIAL_BYTE_POSITIONS: [usize; 6] = [0, 1, 2, 3, 6, 7];
/// Hex characters in a rendered serial.
pub const SERIAL_HEX_LEN: usize = SERIAL_BYTE_POSITIONS.len() * 2;
/// Destination size for the C-string form (hex + NUL).
pub const SERIAL_CSTR_LEN: usize = SERIAL_HEX_LEN + 1;

pub type SerialNumber = heapless::String<SERIAL_HEX_LEN>;

/// Decode a serial number from a raw ID block.
pub fn decode_serial(block: &[u8]) -> Result<SerialNumber, SerialDecodeError> {
    if block.len() < SERIAL_BLOCK_LEN {
        return Err(SerialDecodeError::BufferTooSmall {
            needed: SERIAL_BLOCK_LEN,
            got: block.len(),
        });
    }
    let mut serial = SerialNumber::new();
    for &pos in &SERIAL_BYTE_POSITIONS {
        // Capacity is exactly two chars per byte.
        let _ = write!(serial, "{:02x}", block[pos]);
    }
    Ok(serial)
}

/// Decode into a caller-supplied buffer as a NUL-terminated string and
/// return the hex part.  `out` must hold at least [`SERIAL_CSTR_LEN`] bytes.
pub fn decode_serial_into<'a>(
    block: &[u8],
    out: &'a mut [u8],
) -> Result<&'a str, SerialDecodeError> {
    if out.len() < SERIAL_CSTR_LEN {
        return Err(SerialDecodeError::BufferTooSmall {
            needed: SERIAL_CSTR_LEN,
            got: out.len(),
        });
    }
    let serial = decode_serial(block)?;
    out[..SERIAL_HEX_LEN].copy_from_slice(serial.as_bytes());
    out[SERIAL_HEX_LEN] = 0;
    // Hex digits are ASCII.
    core::str::from_utf8(&out[..SERIAL_HEX_LEN])
        .map_err(|_| SerialDecodeError::InvalidText)
}

/// Read the ID block from `eeprom` and decode it.
pub fn read_serial(eeprom: &mut impl Eeprom) -> Result<SerialNumber, SerialDecodeError> {
    let mut block = [0u8; SERIAL_BLOCK_LEN];
    eeprom
        .read(SERIAL_BLOCK_OFFSET, &mut block)
        .map_err(SerialDecodeError::ReadFailed)?;
    decode_serial(&block)
}
