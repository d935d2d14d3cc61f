//! Main loop controller: owns the runtime context and drives boot and the
//! steady-state acquisition loop.
//!
//! ```text
//!                ┌──────────── feed watchdog ◀───────────┐
//!                ▼                                        │
//!  boot ──▶ Waiting ──matched──▶ Dispatch (registry order)┤
//!                │                                        │
//!                └──────────── timed out ─────────────────┘
//! ```
//!
//! The wait is the loop's only suspension point.  Every collaborator is
//! injected through a port trait, so the full loop runs on the host against
//! mock hardware.

use core::convert::Infallible;

use heapless::Vec;
use log::{debug, error, info, warn};

use crate::alerts::{AlertAggregator, AlertEventSet, EventMask, MatchResult};
use crate::config::{SampleFailurePolicy, SystemConfig};
use crate::drivers::reset::ResetCause;
use crate::error::{Error, RegistryError, Result};
use crate::sensors::temperature::TemperatureSampler;
use crate::sensors::{EndpointId, MAX_SENSORS, SensorRegistry};

use super::boot::{self, BootState};
use super::events::AppEvent;
use super::ports::{
    AlertPin, BusPort, Clock, Eeprom, EventSink, ResetCausePort, SensorChannel, WatchdogChannel,
    WatchdogPort,
};

/// Counters kept across loop iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    pub timeouts: u64,
    pub samples: u64,
    pub sample_failures: u64,
    pub watchdog_feeds: u64,
}

/// What one loop iteration did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationOutcome {
    /// Bits consumed by the wait (zero on timeout).
    pub matched: EventMask,
    pub sampled: usize,
    /// Endpoints skipped under [`SampleFailurePolicy::Isolate`].
    pub failed: usize,
}

impl IterationOutcome {
    pub fn timed_out(&self) -> bool {
        self.matched == 0
    }
}

// ───────────────────────────────────────────────────────────────
// MainLoopController
// ───────────────────────────────────────────────────────────────

pub struct MainLoopController<S, P, E, W, B, C> {
    config: SystemConfig,
    registry: SensorRegistry<S, P, E>,
    alerts: AlertAggregator,
    watchdog: W,
    bus: B,
    clock: C,
    state: BootState,
    boot_attempted: bool,
    channel: Option<WatchdogChannel>,
    reset_cause: Option<ResetCause>,
    stats: LoopStats,
}

impl<S, P, E, W, B, C> MainLoopController<S, P, E, W, B, C>
where
    S: SensorChannel,
    P: AlertPin,
    E: Eeprom,
    W: WatchdogPort,
    B: BusPort,
    C: Clock,
{
    /// Assemble the runtime context.
    ///
    /// `events` must have been created for this registry's all-sensors mask;
    /// every ISR callback registered during boot posts into it.
    pub fn new(
        config: SystemConfig,
        registry: SensorRegistry<S, P, E>,
        events: &'static AlertEventSet,
        watchdog: W,
        bus: B,
        clock: C,
    ) -> Result<Self> {
        config.validate(registry.len())?;
        if events.all_mask() != registry.all_sensors_mask() {
            return Err(RegistryError::MaskMismatch {
                registry: registry.all_sensors_mask(),
                events: events.all_mask(),
            }
            .into());
        }
        Ok(Self {
            config,
            registry,
            alerts: AlertAggregator::new(events),
            watchdog,
            bus,
            clock,
            state: BootState::InitWatchdog,
            boot_attempted: false,
            channel: None,
            reset_cause: None,
            stats: LoopStats::default(),
        })
    }

    // ── Boot ──────────────────────────────────────────────────

    /// Run the boot sequence to `Ready`.  One-shot: a second call fails
    /// with [`Error::AlreadyBooted`], whether or not the first succeeded.
    pub fn boot(&mut self, reset: &mut impl ResetCausePort, sink: &mut impl EventSink) -> Result<()> {
        if self.boot_attempted {
            return Err(Error::AlreadyBooted);
        }
        self.boot_attempted = true;

        let cause = boot::take_reset_cause(reset);
        self.reset_cause = Some(cause);

        while self.state != BootState::Ready {
            if let Err(e) = self.boot_step(sink) {
                error!("boot: {} failed: {}", self.state, e);
                sink.emit(&AppEvent::BootFailed { state: self.state, error: e });
                return Err(e);
            }
            self.state = self.state.next();
            sink.emit(&AppEvent::BootStep(self.state));
        }

        info!(
            "boot: ready ({} sensors, mask 0x{:08x}, {:?}, period {} s)",
            self.registry.len(),
            self.registry.all_sensors_mask(),
            self.config.wait_policy,
            self.config.main_loop_period_secs,
        );
        sink.emit(&AppEvent::Booted {
            reset_cause: cause,
            sensors: self.registry.len(),
        });
        Ok(())
    }

    fn boot_step(&mut self, sink: &mut impl EventSink) -> Result<()> {
        match self.state {
            BootState::InitWatchdog => {
                let channel = boot::init_watchdog(&mut self.watchdog, self.config.watchdog_timeout_ms)?;
                self.channel = Some(channel);
            }
            BootState::ConfigureSensors => {
                let n = boot::configure_sensors(&mut self.registry, &self.alerts, sink)?;
                info!("boot: {} sensors configured", n);
            }
            BootState::ArmBus => boot::arm_bus(&mut self.bus, &mut self.registry)?,
            BootState::Ready => {}
        }
        Ok(())
    }

    // ── Steady state ──────────────────────────────────────────

    /// One pass of wait → dispatch → feed.
    ///
    /// The watchdog is fed whether the wait matched or timed out.  Under
    /// [`SampleFailurePolicy::Abort`] a sampling error returns before the
    /// feed.
    pub fn run_iteration(&mut self, sink: &mut impl EventSink) -> Result<IterationOutcome> {
        let channel = match (self.state, self.channel) {
            (BootState::Ready, Some(channel)) => channel,
            _ => return Err(Error::NotBooted),
        };
        self.stats.iterations += 1;

        let mask = self.registry.all_sensors_mask();
        let result = self.alerts.wait(
            mask,
            self.config.wait_policy,
            self.config.period_ms(),
            &self.clock,
        );

        let mut outcome = IterationOutcome {
            matched: result.bits(),
            ..IterationOutcome::default()
        };
        match result {
            MatchResult::TimedOut => {
                self.stats.timeouts += 1;
                let pending = self.alerts.events().pending();
                debug!("loop: wait timed out (pending 0x{:08x})", pending);
                sink.emit(&AppEvent::WaitTimedOut { pending });
            }
            MatchResult::Matched(bits) => {
                debug!("loop: matched 0x{:08x}", bits);
                sink.emit(&AppEvent::EventsMatched(bits));
                self.dispatch(bits, &mut outcome, sink)?;
            }
        }

        self.watchdog.feed(channel);
        self.stats.watchdog_feeds += 1;
        sink.emit(&AppEvent::WatchdogFed {
            iteration: self.stats.iterations,
        });
        Ok(outcome)
    }

    /// Sample every endpoint whose bit is in `bits`, in registry order.
    ///
    /// Under [`SampleFailurePolicy::Isolate`] a failed endpoint's bit is
    /// posted back, so it is retried on the next round without its ALERT
    /// line having to fire again.
    fn dispatch(
        &mut self,
        bits: EventMask,
        outcome: &mut IterationOutcome,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let ids: Vec<EndpointId, MAX_SENSORS> = self.registry.ids_in(bits).collect();
        for id in ids {
            let Some(endpoint) = self.registry.get_mut(id) else {
                continue;
            };
            let bit = endpoint.event_bit();
            match TemperatureSampler::sample(endpoint) {
                Ok(celsius) => {
                    self.stats.samples += 1;
                    outcome.sampled += 1;
                    sink.emit(&AppEvent::Sampled { endpoint: id, celsius });
                }
                Err(e) => {
                    self.stats.sample_failures += 1;
                    sink.emit(&AppEvent::SampleFailed { endpoint: id, error: e });
                    match self.config.sample_failure_policy {
                        SampleFailurePolicy::Abort => {
                            error!("loop: {} sampling failed, aborting: {}", id, e);
                            return Err(e.into());
                        }
                        SampleFailurePolicy::Isolate => {
                            // Data-ready is still set after a failed fetch, so
                            // the ALERT line stays low and will not edge again.
                            warn!("loop: {} sampling failed, skipped: {}", id, e);
                            self.alerts.post(bit.mask());
                            outcome.failed += 1;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Loop forever; only returns on a fatal error.
    pub fn run(&mut self, sink: &mut impl EventSink) -> Result<Infallible> {
        loop {
            self.run_iteration(sink)?;
        }
    }
}

// ── Accessors ─────────────────────────────────────────────────

impl<S, P, E, W, B, C> MainLoopController<S, P, E, W, B, C> {
    pub fn state(&self) -> BootState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == BootState::Ready
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn registry(&self) -> &SensorRegistry<S, P, E> {
        &self.registry
    }

    pub fn alerts(&self) -> &AlertAggregator {
        &self.alerts
    }

    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn channel(&self) -> Option<WatchdogChannel> {
        self.channel
    }

    pub fn reset_cause(&self) -> Option<ResetCause> {
        self.reset_cause
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }
}
