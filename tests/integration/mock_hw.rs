//! Mock hardware for integration tests.
//!
//! Every mock is split into the part the controller owns (moved into the
//! registry) and a shared `*Handle` the test keeps, so faults can be injected
//! and calls inspected while the controller holds the hardware.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use thermowatch::alerts::{AlertEventSet, AlertNotifier, EventMask};
use thermowatch::app::controller::MainLoopController;
use thermowatch::app::events::AppEvent;
use thermowatch::app::ports::{
    AlertPin, BusPort, Clock, Edge, Eeprom, EventSink, RegisterValue, ResetCausePort,
    SensorAttribute, SensorChannel, SensorChannelId, SensorValue, WatchdogChannel, WatchdogPort,
};
use thermowatch::config::SystemConfig;
use thermowatch::drivers::reset::ResetCause;
use thermowatch::error::{BusError, GpioError, WatchdogError};
use thermowatch::sensors::SensorRegistry;

/// TMP117 CONFIG register after power-on or general-call reset.
pub const POWER_ON_CONFIG: u16 = 0x0220;

// ── Sensor ────────────────────────────────────────────────────

pub struct SensorHandle {
    pub index: usize,
    pub ready: Cell<bool>,
    pub config: Cell<u16>,
    pub config_writes: Cell<usize>,
    pub temp_micro: Cell<i64>,
    pub fail_fetch: Cell<bool>,
    pub fail_read: Cell<bool>,
    pub fail_attr_write: Cell<bool>,
    pub fetches: Cell<usize>,
}

#[allow(dead_code)]
impl SensorHandle {
    fn new(index: usize) -> Self {
        Self {
            index,
            ready: Cell::new(true),
            config: Cell::new(POWER_ON_CONFIG),
            config_writes: Cell::new(0),
            temp_micro: Cell::new(20_000_000 + index as i64 * 1_250_000),
            fail_fetch: Cell::new(false),
            fail_read: Cell::new(false),
            fail_attr_write: Cell::new(false),
            fetches: Cell::new(0),
        }
    }

    /// Temperature the sensor reports, in °C.
    pub fn celsius(&self) -> f64 {
        self.temp_micro.get() as f64 / 1_000_000.0
    }

    pub fn power_on_reset(&self) {
        self.config.set(POWER_ON_CONFIG);
    }
}

pub struct MockSensor {
    handle: Rc<SensorHandle>,
    /// Shared across all sensors: indices in fetch order.
    order: Rc<RefCell<Vec<usize>>>,
    fetched: Option<i64>,
}

impl SensorChannel for MockSensor {
    fn is_ready(&mut self) -> bool {
        self.handle.ready.get()
    }

    fn sample_fetch(&mut self) -> Result<(), BusError> {
        self.handle.fetches.set(self.handle.fetches.get() + 1);
        self.order.borrow_mut().push(self.handle.index);
        if self.handle.fail_fetch.get() {
            return Err(BusError::Nack);
        }
        self.fetched = Some(self.handle.temp_micro.get());
        Ok(())
    }

    fn channel_get(&mut self, _channel: SensorChannelId) -> Result<SensorValue, BusError> {
        if self.handle.fail_read.get() {
            return Err(BusError::Bus);
        }
        self.fetched.map(SensorValue::from_micro).ok_or(BusError::NoData)
    }

    fn attr_get(
        &mut self,
        _channel: SensorChannelId,
        _attr: SensorAttribute,
    ) -> Result<RegisterValue, BusError> {
        Ok(self.handle.config.get())
    }

    fn attr_set(
        &mut self,
        _channel: SensorChannelId,
        _attr: SensorAttribute,
        value: RegisterValue,
    ) -> Result<(), BusError> {
        if self.handle.fail_attr_write.get() {
            return Err(BusError::Nack);
        }
        self.handle.config.set(value);
        self.handle.config_writes.set(self.handle.config_writes.get() + 1);
        Ok(())
    }
}

// ── Alert pin ─────────────────────────────────────────────────

#[derive(Default)]
pub struct PinHandle {
    pub input: Cell<bool>,
    pub edge: Cell<Option<Edge>>,
    pub notifier: Cell<Option<AlertNotifier>>,
    pub fail_direction: Cell<bool>,
    pub fail_interrupt: Cell<bool>,
    pub fail_callback: Cell<bool>,
}

#[allow(dead_code)]
impl PinHandle {
    /// Pull the ALERT line low.  Only reaches the aggregator if the pin was
    /// armed for a falling edge and a callback is registered.
    pub fn fire(&self) -> bool {
        match (self.notifier.get(), self.edge.get()) {
            (Some(n), Some(Edge::Falling | Edge::Both)) if self.input.get() => {
                n.notify();
                true
            }
            _ => false,
        }
    }
}

pub struct MockPin(Rc<PinHandle>);

impl AlertPin for MockPin {
    fn configure_input(&mut self) -> Result<(), GpioError> {
        if self.0.fail_direction.get() {
            return Err(GpioError(-2));
        }
        self.0.input.set(true);
        Ok(())
    }

    fn configure_interrupt(&mut self, edge: Edge) -> Result<(), GpioError> {
        if self.0.fail_interrupt.get() {
            return Err(GpioError(-3));
        }
        self.0.edge.set(Some(edge));
        Ok(())
    }

    fn register_callback(&mut self, notifier: AlertNotifier) -> Result<(), GpioError> {
        if self.0.fail_callback.get() {
            return Err(GpioError(-4));
        }
        self.0.notifier.set(Some(notifier));
        Ok(())
    }
}

// ── EEPROM ────────────────────────────────────────────────────

pub struct MockEeprom {
    pub data: Vec<u8>,
    pub ready: bool,
    pub fail_read: bool,
}

#[allow(dead_code)]
impl MockEeprom {
    pub fn with_id(id: [u8; 8]) -> Self {
        Self {
            data: id.to_vec(),
            ready: true,
            fail_read: false,
        }
    }
}

impl Eeprom for MockEeprom {
    fn is_ready(&mut self) -> bool {
        self.ready
    }

    fn read(&mut self, offset: u16, buf: &mut [u8]) -> Result<(), BusError> {
        let start = offset as usize;
        if self.fail_read || start + buf.len() > self.data.len() {
            return Err(BusError::Nack);
        }
        buf.copy_from_slice(&self.data[start..start + buf.len()]);
        Ok(())
    }
}

// ── Bus ───────────────────────────────────────────────────────

/// Records writes; a general-call reset restores every sensor's CONFIG.
pub struct MockBus {
    pub writes: Rc<RefCell<Vec<(u8, Vec<u8>)>>>,
    sensors: Vec<Rc<SensorHandle>>,
    fail: Rc<Cell<bool>>,
}

impl BusPort for MockBus {
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError> {
        if self.fail.get() {
            return Err(BusError::ArbitrationLoss);
        }
        self.writes.borrow_mut().push((address, bytes.to_vec()));
        if address == 0x00 && bytes == [0x06] {
            for s in &self.sensors {
                s.power_on_reset();
            }
        }
        Ok(())
    }
}

// ── Clock ─────────────────────────────────────────────────────

type Action = Box<dyn Fn()>;

/// Virtual time: advances only when the loop idles, and fires scheduled
/// "interrupts" once their time has come.
pub struct MockClock {
    now: Rc<Cell<u64>>,
    schedule: RefCell<Vec<(u64, Action)>>,
}

#[allow(dead_code)]
impl MockClock {
    /// Run `action` once virtual time reaches `at_ms`.
    pub fn at(&self, at_ms: u64, action: impl Fn() + 'static) {
        self.schedule.borrow_mut().push((at_ms, Box::new(action)));
    }

    /// Jump forward without running the loop.
    pub fn advance(&self, ms: u64) {
        self.idle_ms(ms);
    }

    pub fn scheduled(&self) -> usize {
        self.schedule.borrow().len()
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn idle_ms(&self, max_ms: u64) {
        let now = self.now.get() + max_ms;
        self.now.set(now);
        let due: Vec<(u64, Action)> = {
            let mut schedule = self.schedule.borrow_mut();
            let (due, rest): (Vec<_>, Vec<_>) = schedule.drain(..).partition(|(t, _)| *t <= now);
            *schedule = rest;
            due
        };
        for (_, action) in due {
            action();
        }
    }
}

// ── Watchdog ──────────────────────────────────────────────────

/// Tracks feeds against the shared virtual clock.  A gap longer than the
/// timeout is a liveness violation (the hardware would have reset).
pub struct MockWatchdog {
    now: Rc<Cell<u64>>,
    pub channel: Option<WatchdogChannel>,
    pub started_at: Option<u64>,
    pub feeds: Vec<u64>,
    fail_allocate: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl MockWatchdog {
    pub fn last_feed(&self) -> Option<u64> {
        self.feeds.last().copied().or(self.started_at)
    }

    pub fn liveness_violated(&self) -> bool {
        let (Some(channel), Some(last)) = (self.channel, self.last_feed()) else {
            return false;
        };
        self.now.get() - last > u64::from(channel.timeout_ms)
    }
}

impl WatchdogPort for MockWatchdog {
    fn allocate_channel(&mut self, timeout_ms: u32) -> Result<WatchdogChannel, WatchdogError> {
        if self.fail_allocate.get() || self.channel.is_some() {
            return Err(WatchdogError::ChannelAllocation(-1));
        }
        let channel = WatchdogChannel { id: 3, timeout_ms };
        self.channel = Some(channel);
        Ok(channel)
    }

    fn start(&mut self) -> Result<(), WatchdogError> {
        self.started_at = Some(self.now.get());
        Ok(())
    }

    fn feed(&mut self, channel: WatchdogChannel) {
        assert_eq!(Some(channel), self.channel, "fed an unallocated channel");
        self.feeds.push(self.now.get());
    }
}

// ── Reset cause ───────────────────────────────────────────────

pub struct MockResetCause {
    pub cause: ResetCause,
    pub cleared: bool,
}

impl ResetCausePort for MockResetCause {
    fn read(&mut self) -> ResetCause {
        if self.cleared { ResetCause::Unknown } else { self.cause }
    }

    fn clear(&mut self) {
        self.cleared = true;
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig: controller + handles ─────────────────────────────────

pub type Controller =
    MainLoopController<MockSensor, MockPin, MockEeprom, MockWatchdog, MockBus, MockClock>;

pub struct Rig {
    pub ctl: Controller,
    pub sensors: Vec<Rc<SensorHandle>>,
    pub pins: Vec<Rc<PinHandle>>,
    pub order: Rc<RefCell<Vec<usize>>>,
    pub bus_writes: Rc<RefCell<Vec<(u8, Vec<u8>)>>>,
    /// Make the next bus write fail.
    pub bus_fail: Rc<Cell<bool>>,
    /// Make watchdog channel allocation fail.
    pub watchdog_fail: Rc<Cell<bool>>,
    pub events: &'static AlertEventSet,
    pub reset: MockResetCause,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    /// `n` sensors, no EEPROMs.
    pub fn new(n: usize, config: SystemConfig) -> Self {
        Self::with_eeproms(config, (0..n).map(|_| None).collect())
    }

    /// One sensor per entry of `eeproms`.
    pub fn with_eeproms(config: SystemConfig, eeproms: Vec<Option<MockEeprom>>) -> Self {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SensorRegistry::new();
        let mut sensors = Vec::new();
        let mut pins = Vec::new();

        for (i, eeprom) in eeproms.into_iter().enumerate() {
            let handle = Rc::new(SensorHandle::new(i));
            let pin = Rc::new(PinHandle::default());
            let label = format!("tmp117@{:02x}", 0x48 + i);
            registry
                .add(
                    &label,
                    MockSensor {
                        handle: handle.clone(),
                        order: order.clone(),
                        fetched: None,
                    },
                    MockPin(pin.clone()),
                    eeprom,
                )
                .unwrap();
            sensors.push(handle);
            pins.push(pin);
        }

        let events = AlertEventSet::leak(registry.all_sensors_mask());
        let now = Rc::new(Cell::new(0));
        let bus_writes = Rc::new(RefCell::new(Vec::new()));
        let bus_fail = Rc::new(Cell::new(false));
        let watchdog_fail = Rc::new(Cell::new(false));
        let ctl = MainLoopController::new(
            config,
            registry,
            events,
            MockWatchdog {
                now: now.clone(),
                channel: None,
                started_at: None,
                feeds: Vec::new(),
                fail_allocate: watchdog_fail.clone(),
            },
            MockBus {
                writes: bus_writes.clone(),
                sensors: sensors.clone(),
                fail: bus_fail.clone(),
            },
            MockClock {
                now,
                schedule: RefCell::new(Vec::new()),
            },
        )
        .unwrap();

        Self {
            ctl,
            sensors,
            pins,
            order,
            bus_writes,
            bus_fail,
            watchdog_fail,
            events,
            reset: MockResetCause {
                cause: ResetCause::PowerOn,
                cleared: false,
            },
            sink: RecordingSink::default(),
        }
    }

    pub fn boot(&mut self) -> thermowatch::error::Result<()> {
        self.ctl.boot(&mut self.reset, &mut self.sink)
    }

    /// Fire pin `i` when virtual time reaches `at_ms`.
    pub fn fire_at(&self, i: usize, at_ms: u64) {
        let pin = self.pins[i].clone();
        self.ctl.clock().at(at_ms, move || {
            pin.fire();
        });
    }

    pub fn now(&self) -> u64 {
        self.ctl.clock().now_ms()
    }

    pub fn mask_of(indices: &[usize]) -> EventMask {
        indices.iter().fold(0, |m, i| m | (1u32 << i))
    }
}
