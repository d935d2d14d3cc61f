//! Hardware reset cause, read once at boot and then cleared.
//!
//! On ESP-IDF the reason comes from `esp_reset_reason()`.  The ROM keeps no
//! sticky flags to clear there, so "clear" latches the value as consumed and
//! later reads report `Unknown`.  On host the cause is injected.

use core::fmt;

use crate::app::ports::ResetCausePort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCause {
    PowerOn,
    ExternalPin,
    Software,
    Panic,
    Watchdog,
    DeepSleep,
    Brownout,
    Unknown,
}

impl fmt::Display for ResetCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PowerOn => "power-on",
            Self::ExternalPin => "external pin",
            Self::Software => "software",
            Self::Panic => "panic",
            Self::Watchdog => "watchdog",
            Self::DeepSleep => "deep-sleep wake",
            Self::Brownout => "brownout",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

pub struct ResetReason {
    consumed: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_cause: ResetCause,
}

impl Default for ResetReason {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetReason {
    pub fn new() -> Self {
        Self {
            consumed: false,
            #[cfg(not(target_os = "espidf"))]
            sim_cause: ResetCause::PowerOn,
        }
    }

    /// Simulation: report `cause` on the next read.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_cause(cause: ResetCause) -> Self {
        Self {
            consumed: false,
            sim_cause: cause,
        }
    }

    #[cfg(target_os = "espidf")]
    fn hardware_cause(&self) -> ResetCause {
        use esp_idf_svc::sys::*;

        // SAFETY: read-only query of a value latched by the ROM bootloader.
        let reason = unsafe { esp_reset_reason() };
        #[allow(non_upper_case_globals)]
        match reason {
            esp_reset_reason_t_ESP_RST_POWERON => ResetCause::PowerOn,
            esp_reset_reason_t_ESP_RST_EXT => ResetCause::ExternalPin,
            esp_reset_reason_t_ESP_RST_SW => ResetCause::Software,
            esp_reset_reason_t_ESP_RST_PANIC => ResetCause::Panic,
            esp_reset_reason_t_ESP_RST_INT_WDT
            | esp_reset_reason_t_ESP_RST_TASK_WDT
            | esp_reset_reason_t_ESP_RST_WDT => ResetCause::Watchdog,
            esp_reset_reason_t_ESP_RST_DEEPSLEEP => ResetCause::DeepSleep,
            esp_reset_reason_t_ESP_RST_BROWNOUT => ResetCause::Brownout,
            _ => ResetCause::Unknown,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn hardware_cause(&self) -> ResetCause {
        self.sim_cause
    }
}

impl ResetCausePort for ResetReason {
    fn read(&mut self) -> ResetCause {
        if self.consumed {
            ResetCause::Unknown
        } else {
            self.hardware_cause()
        }
    }

    fn clear(&mut self) {
        self.consumed = true;
    }
}
