//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API: the main task subscribes as its liveness
//! channel and must call `feed()` once per loop iteration.  A missed feed
//! panics and resets the chip, which is the only recovery path for a stuck loop.
//!
//! On host the driver tracks the feed deadline against `std::time::Instant`
//! so an expired watchdog is observable instead of resetting anything.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

use crate::app::ports::{WatchdogChannel, WatchdogPort};
use crate::error::WatchdogError;

/// The TWDT exposes a single per-task channel; the main task is channel 0.
const MAIN_TASK_CHANNEL: i32 = 0;

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    last_feed: Option<std::time::Instant>,
    #[cfg(not(target_os = "espidf"))]
    feeds: u64,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    pub fn new() -> Self {
        Self {
            timeout_ms: 0,
            #[cfg(target_os = "espidf")]
            subscribed: false,
            #[cfg(not(target_os = "espidf"))]
            last_feed: None,
            #[cfg(not(target_os = "espidf"))]
            feeds: 0,
        }
    }

    /// Simulation: number of feeds since start.
    #[cfg(not(target_os = "espidf"))]
    pub fn feeds(&self) -> u64 {
        self.feeds
    }

    /// Simulation: whether the hardware would have reset by now.
    #[cfg(not(target_os = "espidf"))]
    pub fn expired(&self) -> bool {
        self.last_feed.is_some_and(|t| {
            t.elapsed() > std::time::Duration::from_millis(u64::from(self.timeout_ms))
        })
    }
}

impl WatchdogPort for Watchdog {
    #[cfg(target_os = "espidf")]
    fn allocate_channel(&mut self, timeout_ms: u32) -> Result<WatchdogChannel, WatchdogError> {
        let cfg = esp_task_wdt_config_t {
            timeout_ms,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: plain FFI calls from the main task during boot.
        unsafe {
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK as esp_err_t {
                log::warn!(
                    "TWDT reconfigure returned {} (may already be configured)",
                    ret
                );
            }

            let ret = esp_task_wdt_add(core::ptr::null_mut());
            if ret != ESP_OK as esp_err_t {
                return Err(WatchdogError::ChannelAllocation(ret));
            }
        }
        self.subscribed = true;
        self.timeout_ms = timeout_ms;
        info!("Watchdog: main task subscribed ({} ms timeout, panic on trigger)", timeout_ms);
        Ok(WatchdogChannel {
            id: MAIN_TASK_CHANNEL,
            timeout_ms,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn allocate_channel(&mut self, timeout_ms: u32) -> Result<WatchdogChannel, WatchdogError> {
        if timeout_ms == 0 {
            return Err(WatchdogError::ChannelAllocation(-1));
        }
        self.timeout_ms = timeout_ms;
        info!("Watchdog(sim): channel {} ({} ms)", MAIN_TASK_CHANNEL, timeout_ms);
        Ok(WatchdogChannel {
            id: MAIN_TASK_CHANNEL,
            timeout_ms,
        })
    }

    #[cfg(target_os = "espidf")]
    fn start(&mut self) -> Result<(), WatchdogError> {
        // The TWDT counts from the moment the task subscribes; an initial
        // reset gives the boot sequence a full timeout window.
        // SAFETY: the calling task is subscribed (checked above).
        if self.subscribed {
            let ret = unsafe { esp_task_wdt_reset() };
            if ret != ESP_OK as esp_err_t {
                return Err(WatchdogError::Start(ret));
            }
            Ok(())
        } else {
            Err(WatchdogError::Start(-1))
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn start(&mut self) -> Result<(), WatchdogError> {
        if self.timeout_ms == 0 {
            return Err(WatchdogError::Start(-1));
        }
        self.last_feed = Some(std::time::Instant::now());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn feed(&mut self, _channel: WatchdogChannel) {
        if self.subscribed {
            // SAFETY: the calling task is subscribed.
            let ret = unsafe { esp_task_wdt_reset() };
            crate::drivers::hw_init::warn_on_error("esp_task_wdt_reset", ret);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn feed(&mut self, _channel: WatchdogChannel) {
        self.last_feed = Some(std::time::Instant::now());
        self.feeds += 1;
    }
}
