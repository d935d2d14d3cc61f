//! TI TMP117 digital temperature sensor over I2C.
//!
//! Generic over any `embedded_hal::i2c::I2c` implementation so it runs on
//! the ESP-IDF I2C driver on target and on a mock bus in host tests.
//!
//! | Register | Addr | Use                                                |
//! |----------|------|----------------------------------------------------|
//! | TEMP     | 0x00 | 16-bit two's complement, 7.8125 m°C per LSB        |
//! | CONFIG   | 0x01 | bit 2 = DR/Alert select (data-ready on ALERT pin)  |
//! | DEVICE_ID| 0x0F | low 12 bits = 0x117                                |
//!
//! Reading TEMP clears the data-ready flag, which releases the ALERT line
//! ready for the next conversion's falling edge.

use embedded_hal::i2c::I2c;

use crate::app::ports::{
    RegisterValue, SensorAttribute, SensorChannel, SensorChannelId, SensorValue,
};
use crate::error::BusError;

pub const REG_TEMP_RESULT: u8 = 0x00;
pub const REG_CONFIGURATION: u8 = 0x01;
pub const REG_DEVICE_ID: u8 = 0x0F;

/// Expected DID field of the DEVICE_ID register.
pub const DEVICE_ID: u16 = 0x0117;
const DEVICE_ID_MASK: u16 = 0x0FFF;

/// One LSB of TEMP_RESULT in millionths of a degree (7.8125 m°C).
const MICRO_C_PER_LSB_X2: i64 = 15_625;

/// Convert a raw TEMP_RESULT word to a fixed-point °C value.
pub const fn raw_to_value(raw: i16) -> SensorValue {
    SensorValue::from_micro(raw as i64 * MICRO_C_PER_LSB_X2 / 2)
}

pub struct Tmp117<I> {
    i2c: I,
    address: u8,
    name: heapless::String<16>,
    sample: Option<i16>,
}

impl<I: I2c> Tmp117<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        let mut name = heapless::String::new();
        let _ = core::fmt::Write::write_fmt(&mut name, format_args!("tmp117@{address:02x}"));
        Self {
            i2c,
            address,
            name,
            sample: None,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give back the bus handle.
    pub fn release(self) -> I {
        self.i2c
    }

    fn read_register(&mut self, reg: u8) -> Result<u16, BusError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|e| BusError::from_i2c(&e))?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_register(&mut self, reg: u8, value: u16) -> Result<(), BusError> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[reg, hi, lo])
            .map_err(|e| BusError::from_i2c(&e))
    }
}

impl<I: I2c> SensorChannel for Tmp117<I> {
    fn is_ready(&mut self) -> bool {
        matches!(
            self.read_register(REG_DEVICE_ID),
            Ok(id) if id & DEVICE_ID_MASK == DEVICE_ID
        )
    }

    fn sample_fetch(&mut self) -> Result<(), BusError> {
        let raw = self.read_register(REG_TEMP_RESULT)?;
        self.sample = Some(raw as i16);
        Ok(())
    }

    fn channel_get(&mut self, channel: SensorChannelId) -> Result<SensorValue, BusError> {
        match channel {
            SensorChannelId::AmbientTemp => self.sample.map(raw_to_value).ok_or(BusError::NoData),
        }
    }

    fn attr_get(
        &mut self,
        _channel: SensorChannelId,
        attr: SensorAttribute,
    ) -> Result<RegisterValue, BusError> {
        match attr {
            SensorAttribute::Configuration => self.read_register(REG_CONFIGURATION),
        }
    }

    fn attr_set(
        &mut self,
        _channel: SensorChannelId,
        attr: SensorAttribute,
        value: RegisterValue,
    ) -> Result<(), BusError> {
        match attr {
            SensorAttribute::Configuration => self.write_register(REG_CONFIGURATION, value),
        }
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
