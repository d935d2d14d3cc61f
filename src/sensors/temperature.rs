//! Two-phase temperature sampling.
//!
//! Phase 1 asks the driver to fetch a fresh conversion; phase 2 reads the
//! ambient-temperature channel out of it as a fixed-point [`SensorValue`] and
//! converts to °C.  A failure in either phase clears the endpoint's validity
//! flag but leaves the previously cached value in place.

use log::{debug, warn};

use super::SensorEndpoint;
use crate::app::ports::{SensorChannel, SensorChannelId};
use crate::error::SampleError;

pub struct TemperatureSampler;

impl TemperatureSampler {
    /// Sample one configured endpoint and cache the result on it.
    pub fn sample<S, P, E>(endpoint: &mut SensorEndpoint<S, P, E>) -> Result<f64, SampleError>
    where
        S: SensorChannel,
    {
        if !endpoint.is_configured() {
            return Err(SampleError::NotConfigured);
        }

        match Self::acquire(endpoint.sensor_mut()) {
            Ok(celsius) => {
                endpoint.record_sample(celsius);
                debug!("{} {}: {:.3} °C", endpoint.id(), endpoint.label(), celsius);
                Ok(celsius)
            }
            Err(e) => {
                endpoint.invalidate_sample();
                warn!("{} {}: {}", endpoint.id(), endpoint.label(), e);
                Err(e)
            }
        }
    }

    fn acquire(sensor: &mut impl SensorChannel) -> Result<f64, SampleError> {
        sensor.sample_fetch().map_err(SampleError::FetchFailed)?;
        let value = sensor
            .channel_get(SensorChannelId::AmbientTemp)
            .map_err(SampleError::ReadFailed)?;
        Ok(value.to_f64())
    }
}
