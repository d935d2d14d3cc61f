//! One-shot interrupt plumbing.
//!
//! Installs the per-pin GPIO ISR service (needed before any alert pin can
//! register its handler) and wires the optional front-panel button to a
//! [`ButtonBridge`].  Called once from `main()` before boot.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::drivers::button::ButtonBridge;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot interrupt setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

/// `ESP_OK`; every ESP-IDF call reports success as zero.
const ESP_OK_CODE: i32 = 0;

/// Log a failed return code from a call whose caller cannot propagate it.
/// Returns whether the call succeeded.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
pub(crate) fn warn_on_error(what: &str, ret: i32) -> bool {
    if ret == ESP_OK_CODE {
        return true;
    }
    log::warn!("{} returned {}", what, ret);
    false
}

// ── GPIO ISR service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable).
    let ret = unsafe { gpio_install_isr_service(0) };
    if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
        return Err(HwInitError::IsrInstallFailed(ret));
    }
    log::info!("hw_init: GPIO ISR service installed");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

// ── Button ────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static BUTTON: core::sync::atomic::AtomicPtr<ButtonBridge> =
    core::sync::atomic::AtomicPtr::new(core::ptr::null_mut());

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    let bridge = BUTTON.load(core::sync::atomic::Ordering::Acquire);
    if bridge.is_null() {
        return;
    }
    // SAFETY: esp_timer_get_time and gpio_get_level are register reads;
    // safe in ISR context.  Active-low: level 0 means pressed.
    let (now_ms, pressed) = unsafe {
        (
            (esp_timer_get_time() / 1_000) as u32,
            gpio_get_level(crate::pins::BUTTON_GPIO) == 0,
        )
    };
    // SAFETY: only leaked `&'static ButtonBridge` pointers are stored.
    unsafe { &*bridge }.on_button(pressed, now_ms);
}

/// Configure the button GPIO (input, pull-up, any edge) and route its
/// interrupt to `bridge`.
#[cfg(target_os = "espidf")]
pub fn init_button(bridge: &'static ButtonBridge) -> Result<(), HwInitError> {
    let pin = crate::pins::BUTTON_GPIO;
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
    };
    let bridge_ptr: *const ButtonBridge = bridge;
    BUTTON.store(bridge_ptr.cast_mut(), core::sync::atomic::Ordering::Release);

    // SAFETY: single main-task configuration before the loop starts.
    unsafe {
        let ret = gpio_config(&cfg);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        let ret = gpio_isr_handler_add(pin, Some(button_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        let ret = gpio_intr_enable(pin);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }
    log::info!("hw_init: button on GPIO {} posts mask 0x{:08x}", pin, bridge.mask());
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_button(bridge: &'static ButtonBridge) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): button posts mask 0x{:08x}", bridge.mask());
    Ok(())
}
