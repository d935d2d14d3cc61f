//! TMP117 ALERT line as an interrupt source.
//!
//! The ALERT output is open-drain and active-low, so the pin is an input
//! with pull-up and the interrupt fires on the falling edge.
//!
//! On target every registered pin gets one slot in `ALERT_SLOTS`, indexed
//! by the owning endpoint.  The ISR argument is that index; the ISR looks
//! up the slot and posts its bit.  No pointer arithmetic back to the
//! endpoint is ever needed.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::debug;

use crate::alerts::AlertNotifier;
use crate::app::ports::{AlertPin, Edge};
use crate::error::GpioError;

// ── ISR slot table (target only) ──────────────────────────────

#[cfg(target_os = "espidf")]
mod slots {
    use core::sync::atomic::{AtomicPtr, AtomicU32, Ordering};

    use crate::alerts::{AlertEventSet, AlertNotifier};
    use crate::sensors::MAX_SENSORS;

    pub(super) struct AlertSlot {
        events: AtomicPtr<AlertEventSet>,
        bit: AtomicU32,
    }

    impl AlertSlot {
        const fn empty() -> Self {
            Self {
                events: AtomicPtr::new(core::ptr::null_mut()),
                bit: AtomicU32::new(0),
            }
        }
    }

    pub(super) static ALERT_SLOTS: [AlertSlot; MAX_SENSORS] =
        [const { AlertSlot::empty() }; MAX_SENSORS];

    /// Publish `notifier` for the ISR.  Bit first, pointer last, so the ISR
    /// never sees a set pointer with a stale bit.
    pub(super) fn install(index: usize, notifier: &AlertNotifier) -> bool {
        let Some(slot) = ALERT_SLOTS.get(index) else {
            return false;
        };
        slot.bit.store(notifier.bit().mask(), Ordering::Release);
        let events: *const AlertEventSet = notifier.events();
        slot.events.store(events.cast_mut(), Ordering::Release);
        true
    }

    /// ISR body: post the slot's bit if the slot is populated.
    pub(super) fn fire(index: usize) {
        let Some(slot) = ALERT_SLOTS.get(index) else {
            return;
        };
        let events = slot.events.load(Ordering::Acquire);
        if events.is_null() {
            return;
        }
        // SAFETY: only `&'static AlertEventSet` pointers are ever stored.
        unsafe { &*events }.post(slot.bit.load(Ordering::Acquire));
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn alert_gpio_isr(arg: *mut core::ffi::c_void) {
    slots::fire(arg as usize);
}

// ── Pin driver ────────────────────────────────────────────────

pub struct AlertGpio {
    gpio: i32,
    #[cfg(not(target_os = "espidf"))]
    input: bool,
    #[cfg(not(target_os = "espidf"))]
    edge: Option<Edge>,
    #[cfg(not(target_os = "espidf"))]
    notifier: Option<AlertNotifier>,
}

impl AlertGpio {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            #[cfg(not(target_os = "espidf"))]
            input: false,
            #[cfg(not(target_os = "espidf"))]
            edge: None,
            #[cfg(not(target_os = "espidf"))]
            notifier: None,
        }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Simulation: drive the line low as the sensor would on data-ready.
    /// Returns whether an interrupt was delivered.
    #[cfg(not(target_os = "espidf"))]
    pub fn trigger(&self) -> bool {
        match (&self.notifier, self.edge) {
            (Some(n), Some(Edge::Falling | Edge::Both)) if self.input => {
                n.notify();
                true
            }
            _ => false,
        }
    }
}

#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t) -> Result<(), GpioError> {
    if ret == ESP_OK as esp_err_t {
        Ok(())
    } else {
        Err(GpioError(ret))
    }
}

impl AlertPin for AlertGpio {
    #[cfg(target_os = "espidf")]
    fn configure_input(&mut self) -> Result<(), GpioError> {
        // SAFETY: plain register configuration from the main task at boot.
        unsafe {
            check(gpio_set_direction(self.gpio, gpio_mode_t_GPIO_MODE_INPUT))?;
            check(gpio_set_pull_mode(self.gpio, gpio_pull_mode_t_GPIO_PULLUP_ONLY))?;
        }
        debug!("alert gpio {}: input, pull-up", self.gpio);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn configure_input(&mut self) -> Result<(), GpioError> {
        self.input = true;
        debug!("alert gpio {}(sim): input", self.gpio);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn configure_interrupt(&mut self, edge: Edge) -> Result<(), GpioError> {
        let intr = match edge {
            Edge::Falling => gpio_int_type_t_GPIO_INTR_NEGEDGE,
            Edge::Rising => gpio_int_type_t_GPIO_INTR_POSEDGE,
            Edge::Both => gpio_int_type_t_GPIO_INTR_ANYEDGE,
        };
        // SAFETY: see configure_input.
        check(unsafe { gpio_set_intr_type(self.gpio, intr) })
    }

    #[cfg(not(target_os = "espidf"))]
    fn configure_interrupt(&mut self, edge: Edge) -> Result<(), GpioError> {
        if !self.input {
            return Err(GpioError(-1));
        }
        self.edge = Some(edge);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn register_callback(&mut self, notifier: AlertNotifier) -> Result<(), GpioError> {
        let index = notifier.endpoint().index();
        if !slots::install(index, &notifier) {
            return Err(GpioError(ESP_ERR_INVALID_ARG as esp_err_t));
        }
        // SAFETY: the ISR service is installed before sensors are configured;
        // the handler only touches the static slot table.
        unsafe {
            check(gpio_isr_handler_add(
                self.gpio,
                Some(alert_gpio_isr),
                index as *mut core::ffi::c_void,
            ))?;
            check(gpio_intr_enable(self.gpio))?;
        }
        debug!("alert gpio {}: ISR bound to endpoint {}", self.gpio, notifier.endpoint());
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn register_callback(&mut self, notifier: AlertNotifier) -> Result<(), GpioError> {
        debug!("alert gpio {}(sim): callback for {}", self.gpio, notifier.endpoint());
        self.notifier = Some(notifier);
        Ok(())
    }
}
