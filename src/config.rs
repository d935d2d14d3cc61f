//! System configuration parameters
//!
//! Loop timing, wait policy and failure handling (`SystemConfig`) plus the
//! per-board sensor table (`BoardConfig`).  Both are serde types: JSON for
//! host tooling, postcard for compact storage.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::alerts::WaitPolicy;
use crate::error::{ConfigError, Result};
use crate::pins;
use crate::sensors::{Label, MAX_SENSORS};

/// What the loop does when sampling an endpoint fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleFailurePolicy {
    /// Abandon the iteration and return the error.  The watchdog is not
    /// fed, so the hardware resets the board.
    #[default]
    Abort,
    /// Report the failure, skip that endpoint, finish the iteration.  The
    /// endpoint's bit stays pending, so it is retried on the next round.
    Isolate,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Loop ---
    /// Wait timeout per iteration (seconds)
    pub main_loop_period_secs: u32,
    /// How the wait over the sensor mask is satisfied
    pub wait_policy: WaitPolicy,
    /// Sampling failure handling
    pub sample_failure_policy: SampleFailurePolicy,

    // --- Watchdog ---
    /// Liveness timeout (milliseconds); must exceed one loop period
    pub watchdog_timeout_ms: u32,

    // --- Button ---
    /// Repeat-press suppression window (milliseconds)
    pub button_debounce_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            main_loop_period_secs: 5,
            wait_policy: WaitPolicy::AllOf,
            sample_failure_policy: SampleFailurePolicy::Abort,
            watchdog_timeout_ms: 15_000,
            button_debounce_ms: 50,
        }
    }
}

impl SystemConfig {
    pub fn period_ms(&self) -> u64 {
        u64::from(self.main_loop_period_secs) * 1_000
    }

    /// Reject values that would make the loop unschedulable.
    pub fn validate(&self, sensor_count: usize) -> Result<()> {
        if self.main_loop_period_secs == 0 {
            return Err(ConfigError::Invalid("main loop period is zero").into());
        }
        if u64::from(self.watchdog_timeout_ms) <= self.period_ms() {
            return Err(ConfigError::Invalid("watchdog timeout not longer than loop period").into());
        }
        if sensor_count == 0 {
            return Err(ConfigError::Invalid("no sensors configured").into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Board sensor table
// ---------------------------------------------------------------------------

/// One sensor position on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub label: Label,
    /// 7-bit I²C address of the TMP117
    pub i2c_address: u8,
    /// GPIO wired to the sensor's ALERT output
    pub alert_gpio: i32,
    /// 7-bit I²C address of the identity EEPROM, if fitted
    pub eeprom_address: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub sensors: Vec<SensorDescriptor, MAX_SENSORS>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        let mut sensors = Vec::new();
        for (i, (&addr, &gpio)) in pins::TMP117_ADDRESSES
            .iter()
            .zip(pins::ALERT_GPIOS.iter())
            .enumerate()
        {
            let mut label = Label::new();
            let _ = core::fmt::Write::write_fmt(&mut label, format_args!("tmp117@{addr:02x}"));
            let _ = sensors.push(SensorDescriptor {
                label,
                i2c_address: addr,
                alert_gpio: gpio,
                eeprom_address: (i == 0).then_some(pins::ID_EEPROM_ADDRESS),
            });
        }
        Self { sensors }
    }
}

impl BoardConfig {
    /// Parse a board table from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let board: Self = serde_json::from_str(json)
            .map_err(|_| ConfigError::Invalid("malformed board table"))?;
        board.validate()?;
        Ok(board)
    }

    /// Addresses and alert lines must be unique per board.
    pub fn validate(&self) -> Result<()> {
        for (i, a) in self.sensors.iter().enumerate() {
            for b in &self.sensors[i + 1..] {
                if a.i2c_address == b.i2c_address {
                    return Err(ConfigError::Invalid("duplicate sensor address").into());
                }
                if a.alert_gpio == b.alert_gpio {
                    return Err(ConfigError::Invalid("duplicate alert gpio").into());
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}
