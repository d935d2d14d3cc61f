//! Brings one endpoint from "not ready" to "sampling-eligible".
//!
//! Steps run strictly in order and stop at the first failure:
//!
//! 1. sensor readiness
//! 2. identity EEPROM readiness + serial decode (only if an EEPROM is wired)
//! 3. ALERT pin: input, falling-edge interrupt, callback bound to the endpoint
//! 4. data-ready alert mode in the sensor configuration register
//!
//! The configured flag is set only after step 4 succeeds.

use log::{debug, info, warn};

use super::serial::read_serial;
use super::SensorEndpoint;
use crate::alerts::AlertAggregator;
use crate::app::ports::{AlertPin, Edge, Eeprom, SensorAttribute, SensorChannel, SensorChannelId};
use crate::error::{ConfigError, Error, Result};

/// Configuration register bit selecting data-ready (vs threshold) alerts.
pub const DATA_READY_ALERT_BIT: u16 = 1 << 2;

pub struct SensorConfigurator<'a> {
    alerts: &'a AlertAggregator,
}

impl<'a> SensorConfigurator<'a> {
    pub fn new(alerts: &'a AlertAggregator) -> Self {
        Self { alerts }
    }

    /// Run all configuration steps for `endpoint`.
    pub fn configure<S, P, E>(&self, endpoint: &mut SensorEndpoint<S, P, E>) -> Result<()>
    where
        S: SensorChannel,
        P: AlertPin,
        E: Eeprom,
    {
        endpoint.set_configured(false);

        let result = self.run_steps(endpoint);
        match result {
            Ok(()) => {
                endpoint.set_configured(true);
                info!(
                    "{} {}: configured (bit 0x{:08x}, serial {})",
                    endpoint.id(),
                    endpoint.label(),
                    endpoint.event_bit().mask(),
                    endpoint.serial().unwrap_or("-"),
                );
            }
            Err(e) => warn!("{} {}: configuration failed: {}", endpoint.id(), endpoint.label(), e),
        }
        result
    }

    fn run_steps<S, P, E>(&self, endpoint: &mut SensorEndpoint<S, P, E>) -> Result<()>
    where
        S: SensorChannel,
        P: AlertPin,
        E: Eeprom,
    {
        // 1. Readiness.
        if !endpoint.sensor_mut().is_ready() {
            return Err(Error::DeviceNotReady("sensor"));
        }

        // 2. Optional identity.
        if let Some(eeprom) = endpoint.eeprom_mut() {
            if !eeprom.is_ready() {
                return Err(Error::DeviceNotReady("eeprom"));
            }
            let serial = read_serial(eeprom)?;
            endpoint.set_serial(Some(serial));
        }

        // 3. Alert line.
        let notifier = self.alerts.notifier(endpoint.id(), endpoint.event_bit());
        let pin = endpoint.alert_pin_mut();
        pin.configure_input().map_err(ConfigError::PinDirection)?;
        pin.configure_interrupt(Edge::Falling)
            .map_err(ConfigError::PinInterrupt)?;
        pin.register_callback(notifier)
            .map_err(ConfigError::CallbackRegistration)?;

        // 4. Data-ready mode.
        enable_data_ready_mode(endpoint.sensor_mut())?;
        Ok(())
    }
}

/// Set the data-ready alert bit unless it is already set.
///
/// Returns whether a register write was issued.
pub fn enable_data_ready_mode(sensor: &mut impl SensorChannel) -> Result<bool> {
    let config = sensor
        .attr_get(SensorChannelId::AmbientTemp, SensorAttribute::Configuration)
        .map_err(ConfigError::AttributeRead)?;

    if config & DATA_READY_ALERT_BIT != 0 {
        debug!("{}: data-ready mode already enabled", sensor.name());
        return Ok(false);
    }

    sensor
        .attr_set(
            SensorChannelId::AmbientTemp,
            SensorAttribute::Configuration,
            config | DATA_READY_ALERT_BIT,
        )
        .map_err(ConfigError::AttributeWrite)?;
    debug!("{}: data-ready mode enabled (cfg 0x{:04x})", sensor.name(), config | DATA_READY_ALERT_BIT);
    Ok(true)
}
