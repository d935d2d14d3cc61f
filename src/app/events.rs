//! Outbound application events.
//!
//! The [`MainLoopController`](super::controller::MainLoopController) emits
//! these through the [`EventSink`](super::ports::EventSink) port.  Adapters
//! on the other side decide what to do with them: log to serial, record
//! them in a test, publish them upstream.

use crate::alerts::EventMask;
use crate::drivers::reset::ResetCause;
use crate::error::{Error, SampleError};
use crate::sensors::EndpointId;
use crate::sensors::serial::SerialNumber;

use super::boot::BootState;

/// Structured events emitted by the acquisition core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A boot step finished; carries the state just entered.
    BootStep(BootState),

    /// A boot step failed; startup is aborted.
    BootFailed { state: BootState, error: Error },

    /// An endpoint passed every configuration step.
    SensorConfigured {
        endpoint: EndpointId,
        serial: Option<SerialNumber>,
    },

    /// Boot reached `Ready`.
    Booted {
        reset_cause: ResetCause,
        sensors: usize,
    },

    /// The wait policy matched; carries the consumed bits.
    EventsMatched(EventMask),

    /// The wait timed out; carries the bits still pending.
    WaitTimedOut { pending: EventMask },

    Sampled { endpoint: EndpointId, celsius: f64 },

    SampleFailed {
        endpoint: EndpointId,
        error: SampleError,
    },

    /// The liveness channel was fed at the end of an iteration.
    WatchdogFed { iteration: u64 },
}
