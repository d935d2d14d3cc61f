//! Interrupt-to-main-loop alert aggregation.
//!
//! Every sensor endpoint owns one bit of a shared [`AlertEventSet`].  Its
//! ALERT-line ISR (or an external button press) ORs that bit in; the main
//! loop blocks in [`AlertAggregator::wait`] until the configured policy is
//! satisfied, then consumes exactly the bits it reports.
//!
//! ```text
//! ┌─────────────┐  post(bit)  ┌────────────────┐  wait(mask)  ┌───────────┐
//! │ ALERT ISR 0 │────────────▶│                │─────────────▶│           │
//! │ ALERT ISR n │────────────▶│ AlertEventSet  │              │ Main loop │
//! │ Button      │────────────▶│ (AtomicU32)    │◀─────────────│ (single)  │
//! └─────────────┘             └────────────────┘  clear(seen) └───────────┘
//! ```
//!
//! The atomic word is the only state shared across the interrupt boundary.

use core::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::app::ports::Clock;
use crate::sensors::EndpointId;

/// Bitmask over endpoint event bits.
pub type EventMask = u32;

/// Upper bound on how long a single `idle_ms` call may last inside `wait`.
/// Bounds the latency between an ISR post and the loop noticing it.
pub const POLL_INTERVAL_MS: u64 = 10;

/// A single power-of-two event bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventBit(EventMask);

impl EventBit {
    /// Bit for the endpoint at registry position `index`.
    pub const fn for_index(index: usize) -> Option<Self> {
        if index < EventMask::BITS as usize {
            Some(Self(1 << index))
        } else {
            None
        }
    }

    /// Wrap a raw mask; `None` unless exactly one bit is set.
    pub const fn from_mask(mask: EventMask) -> Option<Self> {
        if mask.is_power_of_two() {
            Some(Self(mask))
        } else {
            None
        }
    }

    pub const fn mask(self) -> EventMask {
        self.0
    }

    pub const fn index(self) -> u32 {
        self.0.trailing_zeros()
    }
}

/// When a `wait` is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaitPolicy {
    /// Every bit of the mask must have been posted.
    #[default]
    AllOf,
    /// Any single bit of the mask suffices.
    AnyOf,
}

/// Outcome of [`AlertAggregator::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Policy satisfied; carries the consumed bits (already cleared).
    Matched(EventMask),
    /// Deadline passed; nothing was cleared.
    TimedOut,
}

impl MatchResult {
    /// Matched bits, or zero on timeout.
    pub fn bits(self) -> EventMask {
        match self {
            Self::Matched(bits) => bits,
            Self::TimedOut => 0,
        }
    }

    pub fn is_timeout(self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

// ── Shared event word ─────────────────────────────────────────

/// The shared bitmask plus the registry's all-sensors mask.
///
/// Posting is a single `fetch_or`, so it never blocks and may run in any
/// interrupt context.  Bits outside `all_mask` are dropped on post.
#[derive(Debug)]
pub struct AlertEventSet {
    bits: AtomicU32,
    all_mask: EventMask,
}

impl AlertEventSet {
    pub const fn new(all_mask: EventMask) -> Self {
        Self {
            bits: AtomicU32::new(0),
            all_mask,
        }
    }

    /// Allocate a set that lives for the rest of the program.
    ///
    /// ISR registrations hold `&'static` references, so the set is created
    /// once at boot and never freed.
    pub fn leak(all_mask: EventMask) -> &'static Self {
        Box::leak(Box::new(Self::new(all_mask)))
    }

    pub fn all_mask(&self) -> EventMask {
        self.all_mask
    }

    /// OR `mask` into the set.  Lock-free; safe from ISR context.
    pub fn post(&self, mask: EventMask) {
        let mask = mask & self.all_mask;
        if mask != 0 {
            self.bits.fetch_or(mask, Ordering::Release);
        }
    }

    /// Bits posted and not yet consumed.
    pub fn pending(&self) -> EventMask {
        self.bits.load(Ordering::Acquire)
    }

    /// Check `policy` against `mask`; on success clear and return exactly
    /// the bits that satisfied it.
    fn try_consume(&self, mask: EventMask, policy: WaitPolicy) -> Option<EventMask> {
        let observed = self.bits.load(Ordering::Acquire) & mask;
        let satisfied = observed != 0
            && match policy {
                WaitPolicy::AllOf => observed == mask,
                WaitPolicy::AnyOf => true,
            };
        if !satisfied {
            return None;
        }
        // Bits posted after the load are not in `observed` and survive.
        self.bits.fetch_and(!observed, Ordering::AcqRel);
        Some(observed)
    }
}

// ── ISR-side handle ───────────────────────────────────────────

/// What an alert ISR needs: the shared set, its own bit, and the identity of
/// the endpoint it was registered for.
#[derive(Debug, Clone, Copy)]
pub struct AlertNotifier {
    events: &'static AlertEventSet,
    endpoint: EndpointId,
    bit: EventBit,
}

impl AlertNotifier {
    pub fn endpoint(&self) -> EndpointId {
        self.endpoint
    }

    pub fn bit(&self) -> EventBit {
        self.bit
    }

    pub fn events(&self) -> &'static AlertEventSet {
        self.events
    }

    /// Post this endpoint's bit.  Safe from interrupt context.
    pub fn notify(&self) {
        self.events.post(self.bit.mask());
    }
}

// ── Loop-side consumer ────────────────────────────────────────

/// Single-consumer view over the shared set, owned by the main loop.
#[derive(Debug)]
pub struct AlertAggregator {
    events: &'static AlertEventSet,
}

impl AlertAggregator {
    pub fn new(events: &'static AlertEventSet) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &'static AlertEventSet {
        self.events
    }

    /// ISR handle bound to one endpoint.
    pub fn notifier(&self, endpoint: EndpointId, bit: EventBit) -> AlertNotifier {
        AlertNotifier {
            events: self.events,
            endpoint,
            bit,
        }
    }

    pub fn post(&self, mask: EventMask) {
        self.events.post(mask);
    }

    /// Block until `policy` is satisfied over `mask` or `timeout_ms` elapses.
    ///
    /// On a match the returned bits are cleared from the set and nothing
    /// else is.  On timeout nothing is cleared, so partial progress carries
    /// into the next call.  An empty mask can never match.
    pub fn wait(
        &mut self,
        mask: EventMask,
        policy: WaitPolicy,
        timeout_ms: u64,
        clock: &impl Clock,
    ) -> MatchResult {
        let start = clock.now_ms();
        loop {
            if let Some(bits) = self.events.try_consume(mask, policy) {
                return MatchResult::Matched(bits);
            }
            let elapsed = clock.now_ms().saturating_sub(start);
            if elapsed >= timeout_ms {
                return MatchResult::TimedOut;
            }
            clock.idle_ms((timeout_ms - elapsed).min(POLL_INTERVAL_MS));
        }
    }
}
