//! Startup sequencing over the public API: every controller claims its
//! pins, builds its ports and passes its self-test — or nothing starts.

use crate::mock_bridge::{MockBridge, TestClock};

use vivarium::config::SystemConfig;
use vivarium::controllers::ControllerId;
use vivarium::error::FatalError;
use vivarium::orchestrator::Orchestrator;
use vivarium::pins::{self, PinTable};

fn config() -> SystemConfig {
    let mut c = SystemConfig::default();
    c.cycle_interval_secs = 1;
    c
}

#[test]
fn full_board_comes_up_in_fixed_order() {
    let mut bridge = MockBridge::new();
    let orch = Orchestrator::initialize(
        &config(),
        PinTable::default_board(),
        &mut bridge,
        TestClock::at_hour(12),
    )
    .expect("startup should succeed with a healthy bridge");

    let ids: Vec<ControllerId> = orch.statuses().iter().map(|s| s.id).collect();
    assert_eq!(ids, ControllerId::ALL);

    // Temperature and humidity hold two pins each, light and feeding
    // one each.
    assert_eq!(orch.registry().claimed_count(), 6);
    assert_eq!(
        orch.registry().owner_of(pins::HEATER_RELAY),
        Some(ControllerId::Temperature)
    );
    assert_eq!(
        orch.registry().owner_of(pins::FEEDING_SERVO),
        Some(ControllerId::Feeding)
    );
}

#[test]
fn dead_sensor_line_aborts_the_whole_startup() {
    let mut bridge = MockBridge::new();
    bridge.dead_lines.push(pins::HUMIDITY_SENSOR);

    let err = Orchestrator::initialize(
        &config(),
        PinTable::default_board(),
        &mut bridge,
        TestClock::at_hour(12),
    )
    .unwrap_err();

    // The error names the controller that could not start.
    match err {
        FatalError::ControllerInit { controller, .. } => {
            assert_eq!(controller, ControllerId::Humidity);
        }
        other => panic!("expected ControllerInit, got {other}"),
    }

    // Nothing is left behind: the same bridge, repaired, starts clean.
    bridge.dead_lines.clear();
    let orch = Orchestrator::initialize(
        &config(),
        PinTable::default_board(),
        &mut bridge,
        TestClock::at_hour(12),
    )
    .expect("retry after repair should succeed");
    assert_eq!(orch.registry().claimed_count(), 6);
}

#[test]
fn failed_humidity_self_test_aborts_startup() {
    // Temperature came up first and claimed its pins; a humidity probe
    // that answers at build time but fails its self-test read still
    // takes the whole startup down with it.
    let mut bridge = MockBridge::new();
    bridge.set_sensor_fault(pins::HUMIDITY_SENSOR, true);

    let err = Orchestrator::initialize(
        &config(),
        PinTable::default_board(),
        &mut bridge,
        TestClock::at_hour(12),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FatalError::ControllerInit {
            controller: ControllerId::Humidity,
            ..
        }
    ));

    bridge.set_sensor_fault(pins::HUMIDITY_SENSOR, false);
    let orch = Orchestrator::initialize(
        &config(),
        PinTable::default_board(),
        &mut bridge,
        TestClock::at_hour(12),
    )
    .expect("no claim survives the rollback");
    assert_eq!(orch.registry().claimed_count(), 6);
}

#[test]
fn failed_self_test_is_fatal() {
    // The light relay builds but cannot be written: the safe-off
    // self-test fails, which kills the whole startup.
    let mut bridge = MockBridge::new();
    bridge.set_relay_fault(pins::LIGHT_RELAY, true);

    let err = Orchestrator::initialize(
        &config(),
        PinTable::default_board(),
        &mut bridge,
        TestClock::at_hour(12),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FatalError::ControllerInit {
            controller: ControllerId::Light,
            ..
        }
    ));
}

#[test]
fn self_test_drives_actuators_to_safe_off() {
    let mut bridge = MockBridge::new();
    let _orch = Orchestrator::initialize(
        &config(),
        PinTable::default_board(),
        &mut bridge,
        TestClock::at_hour(2), // night: no cycle has run yet anyway
    )
    .unwrap();

    // Every relay saw exactly its safe-off write during startup.
    assert_eq!(bridge.writes_to(pins::HEATER_RELAY), vec![false]);
    assert_eq!(bridge.writes_to(pins::MIST_RELAY), vec![false]);
    assert_eq!(bridge.writes_to(pins::LIGHT_RELAY), vec![false]);
    assert!(bridge.servo_pulses.borrow().is_empty());
}
