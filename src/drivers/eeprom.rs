//! I2C serial EEPROM holding a board/sensor unique ID.
//!
//! Random read: write the word address, repeated-start, read N bytes.
//! Small parts (24xx02 / 24AA02E48 family) use one address byte; larger ones
//! use two.

use embedded_hal::i2c::I2c;

use crate::app::ports::Eeprom;
use crate::error::BusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressWidth {
    OneByte,
    TwoBytes,
}

pub struct I2cEeprom<I> {
    i2c: I,
    address: u8,
    width: AddressWidth,
}

impl<I: I2c> I2cEeprom<I> {
    pub fn new(i2c: I, address: u8, width: AddressWidth) -> Self {
        Self { i2c, address, width }
    }

    pub fn address(&self) -> u8 {
        self.address
    }
}

impl<I: I2c> Eeprom for I2cEeprom<I> {
    fn is_ready(&mut self) -> bool {
        // Address-only probe; a part mid write-cycle NACKs.
        self.i2c.write(self.address, &[]).is_ok()
    }

    fn read(&mut self, offset: u16, buf: &mut [u8]) -> Result<(), BusError> {
        let [hi, lo] = offset.to_be_bytes();
        let result = match self.width {
            AddressWidth::OneByte => {
                if hi != 0 {
                    return Err(BusError::Other(-1));
                }
                self.i2c.write_read(self.address, &[lo], buf)
            }
            AddressWidth::TwoBytes => self.i2c.write_read(self.address, &[hi, lo], buf),
        };
        result.map_err(|e| BusError::from_i2c(&e))
    }
}
