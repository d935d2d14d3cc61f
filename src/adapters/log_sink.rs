//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production, stderr on host).

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::BootStep(state) => info!("BOOT  | -> {}", state),
            AppEvent::BootFailed { state, error } => {
                error!("BOOT  | {} failed: {}", state, error);
            }
            AppEvent::SensorConfigured { endpoint, serial } => {
                info!(
                    "SENSE | {} configured serial={}",
                    endpoint,
                    serial.as_ref().map_or("-", |s| s.as_str())
                );
            }
            AppEvent::Booted {
                reset_cause,
                sensors,
            } => info!("START | reset={} sensors={}", reset_cause, sensors),
            AppEvent::EventsMatched(bits) => debug!("WAIT  | matched 0x{:08x}", bits),
            AppEvent::WaitTimedOut { pending } => {
                info!("WAIT  | timeout, pending=0x{:08x}", pending);
            }
            AppEvent::Sampled { endpoint, celsius } => {
                info!("TEMP  | {} {:.3}\u{00b0}C", endpoint, celsius);
            }
            AppEvent::SampleFailed { endpoint, error } => {
                warn!("TEMP  | {} failed: {}", endpoint, error);
            }
            AppEvent::WatchdogFed { iteration } => debug!("WDT   | fed (iter {})", iteration),
        }
    }
}
