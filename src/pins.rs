//! GPIO / bus address assignments for the four-sensor Thermowatch board.
//!
//! Single source of truth: the default [`BoardConfig`](crate::config::BoardConfig)
//! and `main()` reference this module rather than hard-coding numbers.

// ---------------------------------------------------------------------------
// I²C bus (TMP117 array + identity EEPROM)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 14;
pub const I2C_SCL_GPIO: i32 = 15;
/// Standard mode keeps long sensor harnesses happy.
pub const I2C_BAUD_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// TMP117 sensors (ADD0 strapped to GND / V+ / SDA / SCL)
// ---------------------------------------------------------------------------

pub const TMP117_ADDRESSES: [u8; 4] = [0x48, 0x49, 0x4A, 0x4B];

/// ALERT lines, one per sensor, same order as [`TMP117_ADDRESSES`].
/// Open-drain, active-low; the MCU pull-up is enabled.
pub const ALERT_GPIOS: [i32; 4] = [4, 5, 6, 7];

// ---------------------------------------------------------------------------
// Identity EEPROM (24AA02E48-style, shared by the board)
// ---------------------------------------------------------------------------

/// Only the first sensor position carries the board's ID EEPROM.
pub const ID_EEPROM_ADDRESS: u8 = 0x50;

// ---------------------------------------------------------------------------
// User button (active-low with pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button: forces a sampling round.
pub const BUTTON_GPIO: i32 = 16;
