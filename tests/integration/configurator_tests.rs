//! Per-endpoint configuration steps, exercised through the boot sequence.

use thermowatch::app::events::AppEvent;
use thermowatch::app::ports::Edge;
use thermowatch::config::SystemConfig;
use thermowatch::error::{BusError, ConfigError, Error, GpioError, SerialDecodeError};
use thermowatch::sensors::EndpointId;

use crate::mock_hw::{MockEeprom, Rig, POWER_ON_CONFIG};

const ID_BLOCK: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB, 0x05, 0x06];

#[test]
fn serial_is_decoded_skipping_reserved_bytes() {
    let mut rig = Rig::with_eeproms(
        SystemConfig::default(),
        vec![Some(MockEeprom::with_id(ID_BLOCK)), None],
    );
    rig.boot().unwrap();

    let reg = rig.ctl.registry();
    assert_eq!(reg.get(EndpointId::new(0)).unwrap().serial(), Some("010203040506"));
    assert_eq!(reg.get(EndpointId::new(1)).unwrap().serial(), None);

    let serials: Vec<Option<String>> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::SensorConfigured { serial, .. } => {
                Some(serial.as_ref().map(|s| s.as_str().to_owned()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(serials, [Some("010203040506".to_owned()), None]);
}

#[test]
fn eeprom_not_ready_fails_the_endpoint() {
    let mut eeprom = MockEeprom::with_id(ID_BLOCK);
    eeprom.ready = false;
    let mut rig = Rig::with_eeproms(SystemConfig::default(), vec![Some(eeprom)]);

    assert_eq!(rig.boot(), Err(Error::DeviceNotReady("eeprom")));
    let ep = rig.ctl.registry().get(EndpointId::new(0)).unwrap();
    assert!(!ep.is_configured());
    // Stopped before arming the pin.
    assert!(rig.pins[0].notifier.get().is_none());
}

#[test]
fn short_eeprom_is_a_serial_decode_error() {
    let eeprom = MockEeprom {
        data: vec![1, 2, 3, 4],
        ready: true,
        fail_read: false,
    };
    let mut rig = Rig::with_eeproms(SystemConfig::default(), vec![Some(eeprom)]);

    assert_eq!(
        rig.boot(),
        Err(Error::SerialDecode(SerialDecodeError::ReadFailed(BusError::Nack)))
    );
}

#[test]
fn alert_pin_is_armed_for_falling_edge_with_endpoint_identity() {
    let mut rig = Rig::new(3, SystemConfig::default());
    rig.boot().unwrap();

    for (i, pin) in rig.pins.iter().enumerate() {
        assert!(pin.input.get());
        assert_eq!(pin.edge.get(), Some(Edge::Falling));
        let notifier = pin.notifier.get().unwrap();
        assert_eq!(notifier.endpoint(), EndpointId::new(i as u8));
        assert_eq!(notifier.bit().mask(), 1 << i);
    }

    assert!(rig.pins[1].fire());
    assert_eq!(rig.events.pending(), 0b010);
}

#[test]
fn pin_failures_map_to_config_errors() {
    let cases: [(fn(&Rig), ConfigError); 3] = [
        (|r| r.pins[0].fail_direction.set(true), ConfigError::PinDirection(GpioError(-2))),
        (|r| r.pins[0].fail_interrupt.set(true), ConfigError::PinInterrupt(GpioError(-3))),
        (
            |r| r.pins[0].fail_callback.set(true),
            ConfigError::CallbackRegistration(GpioError(-4)),
        ),
    ];
    for (inject, expected) in cases {
        let mut rig = Rig::new(1, SystemConfig::default());
        inject(&rig);
        assert_eq!(rig.boot(), Err(Error::Config(expected)));
        assert_eq!(rig.sensors[0].config_writes.get(), 0, "data-ready step not reached");
    }
}

#[test]
fn attribute_write_failure_leaves_endpoint_unconfigured() {
    let mut rig = Rig::new(2, SystemConfig::default());
    rig.sensors[0].fail_attr_write.set(true);

    assert_eq!(
        rig.boot(),
        Err(Error::Config(ConfigError::AttributeWrite(BusError::Nack)))
    );
    assert!(!rig.ctl.registry().get(EndpointId::new(0)).unwrap().is_configured());
    // Registry order: the second endpoint was never attempted.
    assert!(rig.pins[1].notifier.get().is_none());
}

#[test]
fn data_ready_bit_already_set_is_not_rewritten() {
    let mut rig = Rig::new(1, SystemConfig::default());
    rig.sensors[0].config.set(POWER_ON_CONFIG | (1 << 2));
    rig.boot().unwrap();

    // No write while configuring; the only write restores the bit after
    // the general-call reset cleared it.
    assert_eq!(rig.sensors[0].config_writes.get(), 1);
    assert_eq!(rig.sensors[0].config.get(), POWER_ON_CONFIG | (1 << 2));
}
