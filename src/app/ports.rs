//! Port traits: the hexagonal boundary between acquisition logic and hardware.
//!
//! ```text
//!   Driver ──▶ Port trait ──▶ Configurator / Sampler / MainLoopController
//! ```
//!
//! Concrete drivers (TMP117 over I2C, ESP-IDF GPIO, task watchdog) live in
//! [`crate::drivers`] and implement these traits.  The core consumes them via
//! generics, so every state transition is testable with mock adapters.

use core::fmt;

use crate::alerts::AlertNotifier;
use crate::drivers::reset::ResetCause;
use crate::error::{BusError, GpioError, WatchdogError};

// ───────────────────────────────────────────────────────────────
// Sensor channel protocol
// ───────────────────────────────────────────────────────────────

/// Channels a temperature sensor driver exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorChannelId {
    AmbientTemp,
}

/// Attributes that can be read or written on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorAttribute {
    /// Raw device configuration register.
    Configuration,
}

/// Raw register value returned by attribute reads.
pub type RegisterValue = u16;

/// Fixed-point channel value: `val1` integer part, `val2` millionths.
///
/// Both parts carry the sign of the value, so -1.5 is `{ -1, -500_000 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorValue {
    pub val1: i32,
    pub val2: i32,
}

impl SensorValue {
    pub const MICRO_PER_UNIT: i64 = 1_000_000;

    /// Build from a value expressed in millionths of a unit.
    pub const fn from_micro(micro: i64) -> Self {
        Self {
            val1: (micro / Self::MICRO_PER_UNIT) as i32,
            val2: (micro % Self::MICRO_PER_UNIT) as i32,
        }
    }

    pub const fn to_micro(self) -> i64 {
        self.val1 as i64 * Self::MICRO_PER_UNIT + self.val2 as i64
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.val1) + f64::from(self.val2) / 1_000_000.0
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_f64())
    }
}

/// Two-phase sensor driver: fetch a fresh sample, then read channels out of it.
pub trait SensorChannel {
    /// Whether the underlying driver initialised and the device answers.
    fn is_ready(&mut self) -> bool;

    /// Trigger acquisition of a fresh sample into the driver.
    fn sample_fetch(&mut self) -> Result<(), BusError>;

    /// Read one channel of the most recently fetched sample.
    fn channel_get(&mut self, channel: SensorChannelId) -> Result<SensorValue, BusError>;

    fn attr_get(
        &mut self,
        channel: SensorChannelId,
        attr: SensorAttribute,
    ) -> Result<RegisterValue, BusError>;

    fn attr_set(
        &mut self,
        channel: SensorChannelId,
        attr: SensorAttribute,
        value: RegisterValue,
    ) -> Result<(), BusError>;

    /// Driver instance name used in logs.
    fn name(&self) -> &str {
        "sensor"
    }
}

// ───────────────────────────────────────────────────────────────
// Alert GPIO
// ───────────────────────────────────────────────────────────────

/// Interrupt trigger sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Falling,
    Rising,
    Both,
}

/// A sensor's open-drain ALERT line.
pub trait AlertPin {
    fn configure_input(&mut self) -> Result<(), GpioError>;

    fn configure_interrupt(&mut self, edge: Edge) -> Result<(), GpioError>;

    /// Attach the interrupt callback.  The notifier carries the owning
    /// endpoint's identity and event bit; the ISR only calls
    /// [`AlertNotifier::notify`].
    fn register_callback(&mut self, notifier: AlertNotifier) -> Result<(), GpioError>;
}

// ───────────────────────────────────────────────────────────────
// Identity EEPROM
// ───────────────────────────────────────────────────────────────

pub trait Eeprom {
    fn is_ready(&mut self) -> bool;

    /// Fill `buf` with the bytes starting at `offset`.
    fn read(&mut self, offset: u16, buf: &mut [u8]) -> Result<(), BusError>;
}

// ───────────────────────────────────────────────────────────────
// Shared bus
// ───────────────────────────────────────────────────────────────

/// Raw write access to the shared sensor bus (used for broadcasts).
pub trait BusPort {
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError>;
}

// ───────────────────────────────────────────────────────────────
// Watchdog
// ───────────────────────────────────────────────────────────────

/// An allocated liveness channel.  Created once at boot, never reallocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogChannel {
    pub id: i32,
    pub timeout_ms: u32,
}

pub trait WatchdogPort {
    fn allocate_channel(&mut self, timeout_ms: u32) -> Result<WatchdogChannel, WatchdogError>;

    fn start(&mut self) -> Result<(), WatchdogError>;

    /// Reset the countdown.  Never fails observably; a missed feed shows up
    /// only as a hardware reset.
    fn feed(&mut self, channel: WatchdogChannel);
}

// ───────────────────────────────────────────────────────────────
// Reset cause
// ───────────────────────────────────────────────────────────────

pub trait ResetCausePort {
    fn read(&mut self) -> ResetCause;

    fn clear(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus the loop's only suspension primitive.
pub trait Clock {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Yield the loop thread for at most `max_ms`.  Interrupt callbacks keep
    /// running meanwhile.
    fn idle_ms(&self, max_ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Event sink
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
