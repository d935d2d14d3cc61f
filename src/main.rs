//! Thermowatch firmware entry point.
//!
//! Alert-driven TMP117 array sampling with watchdog-backed liveness.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Drivers / Adapters                        │
//! │                                                                │
//! │  Tmp117 ×N   AlertGpio ×N   I2cEeprom   I2cBus   Watchdog      │
//! │  (channel)   (ALERT ISR)    (serial)    (gcall)  (TWDT)        │
//! │  LogEventSink   MonotonicClock   ButtonBridge   ResetReason    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        MainLoopController (pure logic)                 │    │
//! │  │  boot · AlertAggregator · Configurator · Sampler       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::cell::RefCell;

use anyhow::Result;
use embedded_hal_bus::i2c::RefCellDevice;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use log::{error, info};

use thermowatch::adapters::log_sink::LogEventSink;
use thermowatch::adapters::time::MonotonicClock;
use thermowatch::alerts::AlertEventSet;
use thermowatch::app::controller::MainLoopController;
use thermowatch::config::{BoardConfig, SystemConfig};
use thermowatch::drivers::alert_gpio::AlertGpio;
use thermowatch::drivers::bus::I2cBus;
use thermowatch::drivers::button::ButtonBridge;
use thermowatch::drivers::eeprom::{AddressWidth, I2cEeprom};
use thermowatch::drivers::hw_init;
use thermowatch::drivers::reset::ResetReason;
use thermowatch::drivers::tmp117::Tmp117;
use thermowatch::drivers::watchdog::Watchdog;
use thermowatch::pins;
use thermowatch::sensors::SensorRegistry;

// `I2cDriver::new` takes the typed gpio14 / gpio15 peripherals below.
const _: () = assert!(pins::I2C_SDA_GPIO == 14 && pins::I2C_SCL_GPIO == 15);

type SharedI2c = RefCellDevice<'static, I2cDriver<'static>>;
type Registry = SensorRegistry<Tmp117<SharedI2c>, AlertGpio, I2cEeprom<SharedI2c>>;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Thermowatch v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    hw_init::init_isr_service()?;

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    let board = BoardConfig::default();
    board.validate()?;

    // ── 3. Shared I2C bus ─────────────────────────────────────
    // gpio14 / gpio15 are pinned to pins::I2C_SDA_GPIO / I2C_SCL_GPIO above.
    let peripherals = Peripherals::take()?;
    let i2c_cfg = I2cConfig::new().baudrate(Hertz(pins::I2C_BAUD_HZ).into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio14,
        peripherals.pins.gpio15,
        &i2c_cfg,
    )?;
    let i2c: &'static RefCell<I2cDriver<'static>> = Box::leak(Box::new(RefCell::new(i2c)));

    // ── 4. Registry + alert event set ─────────────────────────
    let registry = build_registry(&board, i2c)?;
    let events = AlertEventSet::leak(registry.all_sensors_mask());

    let button: &'static ButtonBridge = Box::leak(Box::new(ButtonBridge::for_all_sensors(
        events,
        config.button_debounce_ms,
    )));
    hw_init::init_button(button)?;

    let mut controller = MainLoopController::new(
        config,
        registry,
        events,
        Watchdog::new(),
        I2cBus::new(RefCellDevice::new(i2c)),
        MonotonicClock::new(),
    )?;

    // ── 5. Boot ───────────────────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut reset = ResetReason::new();
    if let Err(e) = controller.boot(&mut reset, &mut sink) {
        error!("Boot aborted: {}", e);
        if controller.channel().is_none() {
            // No watchdog to fall back on.
            FreeRtos::delay_ms(5_000);
            esp_idf_svc::hal::reset::restart();
        }
        halt();
    }

    // ── 6. Main loop ──────────────────────────────────────────
    match controller.run(&mut sink) {
        Ok(never) => match never {},
        Err(e) => {
            error!("Main loop aborted: {} (waiting for watchdog reset)", e);
            halt();
        }
    }
}

fn build_registry(board: &BoardConfig, i2c: &'static RefCell<I2cDriver<'static>>) -> Result<Registry> {
    let mut registry = Registry::new();
    for desc in &board.sensors {
        let eeprom = desc
            .eeprom_address
            .map(|addr| I2cEeprom::new(RefCellDevice::new(i2c), addr, AddressWidth::OneByte));
        registry.add(
            &desc.label,
            Tmp117::new(RefCellDevice::new(i2c), desc.i2c_address),
            AlertGpio::new(desc.alert_gpio),
            eeprom,
        )?;
    }
    Ok(registry)
}

/// Park the main task without feeding the watchdog.
fn halt() -> ! {
    loop {
        FreeRtos::delay_ms(1_000);
    }
}
