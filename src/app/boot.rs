//! Linear, one-shot boot sequence.
//!
//! ```text
//! InitWatchdog ──▶ ConfigureSensors ──▶ ArmBus ──▶ Ready
//! ```
//!
//! Each step consumes the previous step's output and any failure is fatal.
//! The watchdog is armed first so a sensor that wedges the bus during
//! configuration still ends in a reset.

use core::fmt;

use log::info;

use crate::alerts::AlertAggregator;
use crate::app::events::AppEvent;
use crate::app::ports::{
    AlertPin, BusPort, Eeprom, EventSink, ResetCausePort, SensorChannel, WatchdogChannel,
    WatchdogPort,
};
use crate::drivers::bus::general_call_reset;
use crate::drivers::reset::ResetCause;
use crate::error::Result;
use crate::sensors::SensorRegistry;
use crate::sensors::configurator::{SensorConfigurator, enable_data_ready_mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    InitWatchdog,
    ConfigureSensors,
    ArmBus,
    Ready,
}

impl BootState {
    /// Successor on success; `Ready` is terminal.
    pub fn next(self) -> Self {
        match self {
            Self::InitWatchdog => Self::ConfigureSensors,
            Self::ConfigureSensors => Self::ArmBus,
            Self::ArmBus | Self::Ready => Self::Ready,
        }
    }
}

impl fmt::Display for BootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InitWatchdog => "init-watchdog",
            Self::ConfigureSensors => "configure-sensors",
            Self::ArmBus => "arm-bus",
            Self::Ready => "ready",
        };
        f.write_str(s)
    }
}

/// Read the hardware reset reason and clear it so it is reported once.
pub fn take_reset_cause(reset: &mut impl ResetCausePort) -> ResetCause {
    let cause = reset.read();
    reset.clear();
    info!("boot: reset cause {}", cause);
    cause
}

/// Allocate the liveness channel and start the countdown.
pub fn init_watchdog(watchdog: &mut impl WatchdogPort, timeout_ms: u32) -> Result<WatchdogChannel> {
    let channel = watchdog.allocate_channel(timeout_ms)?;
    watchdog.start()?;
    info!("boot: watchdog channel {} armed ({} ms)", channel.id, channel.timeout_ms);
    Ok(channel)
}

/// Configure every endpoint in registry order, stopping at the first
/// failure.  Returns the number configured.
pub fn configure_sensors<S, P, E>(
    registry: &mut SensorRegistry<S, P, E>,
    alerts: &AlertAggregator,
    sink: &mut impl EventSink,
) -> Result<usize>
where
    S: SensorChannel,
    P: AlertPin,
    E: Eeprom,
{
    let configurator = SensorConfigurator::new(alerts);
    let mut configured = 0;
    for endpoint in registry.enumerate_mut() {
        configurator.configure(endpoint)?;
        sink.emit(&AppEvent::SensorConfigured {
            endpoint: endpoint.id(),
            serial: endpoint.serial_number().cloned(),
        });
        configured += 1;
    }
    Ok(configured)
}

/// Broadcast the general-call reset, then restore data-ready mode, which
/// the reset returns to its power-on default.
pub fn arm_bus<S, P, E>(bus: &mut impl BusPort, registry: &mut SensorRegistry<S, P, E>) -> Result<()>
where
    S: SensorChannel,
{
    general_call_reset(bus)?;
    for endpoint in registry.enumerate_mut().filter(|ep| ep.is_configured()) {
        enable_data_ready_mode(endpoint.sensor_mut())?;
    }
    Ok(())
}
