//! Sensor subsystem: the endpoint registry plus configuration and sampling.
//!
//! The [`SensorRegistry`] owns every [`SensorEndpoint`] built at boot from the
//! board's sensor descriptors.  Endpoint *i* owns event bit `1 << i`, so the
//! bits are disjoint by construction and their union is the all-sensors mask.

pub mod configurator;
pub mod serial;
pub mod temperature;

use core::fmt;

use heapless::{String, Vec};

use crate::alerts::{EventBit, EventMask};
use crate::error::{RegistryError, Result};
use serial::SerialNumber;

/// Event mask width caps the number of endpoints.
pub const MAX_SENSORS: usize = EventMask::BITS as usize;

/// Endpoint label capacity (e.g. `"tmp117@4a"`).
pub const LABEL_CAP: usize = 16;

pub type Label = String<LABEL_CAP>;

/// Registry position of an endpoint; also its identity for ISR callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(u8);

impl EndpointId {
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One physical sensor, its ALERT line, and its optional identity EEPROM.
///
/// Only the configurator (readiness / serial / configured flag) and the
/// sampler (last value) mutate an endpoint after construction.
pub struct SensorEndpoint<S, P, E> {
    id: EndpointId,
    label: Label,
    sensor: S,
    alert_pin: P,
    eeprom: Option<E>,
    event_bit: EventBit,
    configured: bool,
    serial: Option<SerialNumber>,
    last_temperature_c: f64,
    temperature_valid: bool,
}

impl<S, P, E> SensorEndpoint<S, P, E> {
    pub fn id(&self) -> EndpointId {
        self.id
    }

    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    pub fn event_bit(&self) -> EventBit {
        self.event_bit
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_ref().map(|s| s.as_str())
    }

    pub fn serial_number(&self) -> Option<&SerialNumber> {
        self.serial.as_ref()
    }

    /// Cached value of the most recent successful sample (0.0 before any).
    pub fn last_temperature_c(&self) -> f64 {
        self.last_temperature_c
    }

    /// Whether the most recent sampling attempt succeeded.
    pub fn temperature_valid(&self) -> bool {
        self.temperature_valid
    }

    /// Last temperature, only while it is valid.
    pub fn last_temperature(&self) -> Option<f64> {
        self.temperature_valid.then_some(self.last_temperature_c)
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn alert_pin(&self) -> &P {
        &self.alert_pin
    }

    pub fn eeprom(&self) -> Option<&E> {
        self.eeprom.as_ref()
    }

    // ── Mutation (configurator / sampler only) ────────────────

    pub(crate) fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub(crate) fn alert_pin_mut(&mut self) -> &mut P {
        &mut self.alert_pin
    }

    pub(crate) fn eeprom_mut(&mut self) -> Option<&mut E> {
        self.eeprom.as_mut()
    }

    pub(crate) fn set_configured(&mut self, configured: bool) {
        self.configured = configured;
    }

    pub(crate) fn set_serial(&mut self, serial: Option<SerialNumber>) {
        self.serial = serial;
    }

    pub(crate) fn record_sample(&mut self, celsius: f64) {
        self.last_temperature_c = celsius;
        self.temperature_valid = true;
    }

    pub(crate) fn invalidate_sample(&mut self) {
        self.temperature_valid = false;
    }
}

/// Static, ordered list of endpoints.
pub struct SensorRegistry<S, P, E> {
    endpoints: Vec<SensorEndpoint<S, P, E>, MAX_SENSORS>,
    all_mask: EventMask,
}

impl<S, P, E> Default for SensorRegistry<S, P, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, P, E> SensorRegistry<S, P, E> {
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
            all_mask: 0,
        }
    }

    /// Append an endpoint; it receives the next free event bit.
    pub fn add(
        &mut self,
        label: &str,
        sensor: S,
        alert_pin: P,
        eeprom: Option<E>,
    ) -> Result<EndpointId> {
        let index = self.endpoints.len();
        let event_bit = EventBit::for_index(index).ok_or(RegistryError::Full)?;
        let id = EndpointId::new(index as u8);

        let mut stored = Label::new();
        for ch in label.chars() {
            if stored.push(ch).is_err() {
                break;
            }
        }

        let endpoint = SensorEndpoint {
            id,
            label: stored,
            sensor,
            alert_pin,
            eeprom,
            event_bit,
            configured: false,
            serial: None,
            last_temperature_c: 0.0,
            temperature_valid: false,
        };
        if self.endpoints.push(endpoint).is_err() {
            return Err(RegistryError::Full.into());
        }
        self.all_mask |= event_bit.mask();
        Ok(id)
    }

    /// All endpoints in configuration order.
    pub fn enumerate(&self) -> impl Iterator<Item = &SensorEndpoint<S, P, E>> {
        self.endpoints.iter()
    }

    pub(crate) fn enumerate_mut(&mut self) -> impl Iterator<Item = &mut SensorEndpoint<S, P, E>> {
        self.endpoints.iter_mut()
    }

    pub fn get(&self, id: EndpointId) -> Option<&SensorEndpoint<S, P, E>> {
        self.endpoints.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: EndpointId) -> Option<&mut SensorEndpoint<S, P, E>> {
        self.endpoints.get_mut(id.index())
    }

    /// The endpoint that owns `bit`.
    pub fn lookup_by_event_bit(&self, bit: EventBit) -> Result<&SensorEndpoint<S, P, E>> {
        self.endpoints
            .iter()
            .find(|ep| ep.event_bit == bit)
            .ok_or_else(|| RegistryError::NotFound.into())
    }

    /// Union of every endpoint's event bit.
    pub fn all_sensors_mask(&self) -> EventMask {
        self.all_mask
    }

    /// Union of the event bits of configured endpoints.
    pub fn configured_mask(&self) -> EventMask {
        self.endpoints
            .iter()
            .filter(|ep| ep.configured)
            .fold(0, |acc, ep| acc | ep.event_bit.mask())
    }

    /// Ids of the endpoints whose bit is in `mask`, in registry order.
    pub fn ids_in(&self, mask: EventMask) -> impl Iterator<Item = EndpointId> + '_ {
        self.endpoints
            .iter()
            .filter(move |ep| ep.event_bit.mask() & mask != 0)
            .map(|ep| ep.id)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
