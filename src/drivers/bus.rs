//! Shared I2C bus access and the general-call reset broadcast.

use embedded_hal::i2c::I2c;
use log::info;

use crate::app::ports::BusPort;
use crate::error::BusError;

/// I2C general-call address.
pub const GENERAL_CALL_ADDRESS: u8 = 0x00;
/// General-call command: reset to power-on defaults.
pub const GENERAL_CALL_RESET: u8 = 0x06;

/// [`BusPort`] over any `embedded-hal` I2C handle.
pub struct I2cBus<I>(I);

impl<I: I2c> I2cBus<I> {
    pub fn new(i2c: I) -> Self {
        Self(i2c)
    }
}

impl<I: I2c> BusPort for I2cBus<I> {
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError> {
        self.0.write(address, bytes).map_err(|e| BusError::from_i2c(&e))
    }
}

/// Broadcast the reset command; every listening device returns to its
/// power-on configuration.
pub fn general_call_reset(bus: &mut impl BusPort) -> Result<(), BusError> {
    bus.write(GENERAL_CALL_ADDRESS, &[GENERAL_CALL_RESET])?;
    info!("bus: general call reset sent");
    Ok(())
}
