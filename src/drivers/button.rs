//! External button bridge.
//!
//! A button press is turned into the same alert post a sensor ISR makes, so
//! the main loop cannot tell the two apart.  With the `AllOf` policy that
//! means a press only completes a round if it covers the missing bits;
//! posting the full sensor mask forces an immediate sampling round.
//!
//! ## Debounce
//!
//! | Input                           | Effect             |
//! |---------------------------------|--------------------|
//! | Release                         | ignored            |
//! | Press within `debounce_ms`      | ignored            |
//! | Press after the window          | `post(mask)`       |
//!
//! All state is atomic; [`ButtonBridge::on_button`] runs in ISR context.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::alerts::{AlertEventSet, EventMask};

pub struct ButtonBridge {
    events: &'static AlertEventSet,
    mask: EventMask,
    debounce_ms: u32,
    last_press_ms: AtomicU32,
    seen_press: AtomicBool,
    presses: AtomicU32,
}

impl ButtonBridge {
    pub fn new(events: &'static AlertEventSet, mask: EventMask, debounce_ms: u32) -> Self {
        Self {
            events,
            mask,
            debounce_ms,
            last_press_ms: AtomicU32::new(0),
            seen_press: AtomicBool::new(false),
            presses: AtomicU32::new(0),
        }
    }

    /// Bridge that posts the whole sensor mask on every accepted press.
    pub fn for_all_sensors(events: &'static AlertEventSet, debounce_ms: u32) -> Self {
        Self::new(events, events.all_mask(), debounce_ms)
    }

    /// Handle one button notification.  Returns whether it was posted.
    ///
    /// `now_ms` is a wrapping millisecond timestamp.
    pub fn on_button(&self, pressed: bool, now_ms: u32) -> bool {
        if !pressed {
            return false;
        }
        if self.seen_press.load(Ordering::Acquire) {
            let last = self.last_press_ms.load(Ordering::Acquire);
            if now_ms.wrapping_sub(last) < self.debounce_ms {
                return false;
            }
        }
        self.last_press_ms.store(now_ms, Ordering::Release);
        self.seen_press.store(true, Ordering::Release);
        self.presses.fetch_add(1, Ordering::Relaxed);
        self.events.post(self.mask);
        true
    }

    /// Presses accepted so far.
    pub fn presses(&self) -> u32 {
        self.presses.load(Ordering::Relaxed)
    }

    pub fn mask(&self) -> EventMask {
        self.mask
    }
}
