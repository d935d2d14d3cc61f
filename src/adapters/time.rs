//! Monotonic clock adapter.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` (microsecond,
//!   monotonic) and idles with a FreeRTOS delay so ISRs and other tasks run.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` plus
//!   `thread::sleep` for host-side simulation.

use crate::app::ports::Clock;

pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Milliseconds since boot truncated to 32 bits, for ISR timestamps.
    pub fn uptime_ms_u32(&self) -> u32 {
        (self.uptime_us() / 1_000) as u32
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }

    #[cfg(target_os = "espidf")]
    fn idle_ms(&self, max_ms: u64) {
        // FreeRTOS rounds down to ticks; never ask for less than one.
        let ms = u32::try_from(max_ms).unwrap_or(u32::MAX).max(1);
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn idle_ms(&self, max_ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(max_ms.max(1)));
    }
}
