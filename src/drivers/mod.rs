//! Hardware drivers implementing the port traits, plus interrupt setup.

pub mod alert_gpio;
pub mod bus;
pub mod button;
pub mod eeprom;
pub mod hw_init;
pub mod reset;
pub mod tmp117;
pub mod watchdog;
