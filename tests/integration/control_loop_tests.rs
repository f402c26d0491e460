//! Control loop behaviour over the public API: hysteresis without
//! chatter, per-controller fault isolation, schedule tracking, and
//! teardown semantics.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::mock_bridge::{MockBridge, TestClock};

use vivarium::config::SystemConfig;
use vivarium::error::{FatalError, StepError};
use vivarium::orchestrator::Orchestrator;
use vivarium::pins::{self, PinTable};

fn config() -> SystemConfig {
    let mut c = SystemConfig::default();
    c.cycle_interval_secs = 1;
    c
}

#[test]
fn heater_follows_the_band_without_chatter() {
    let mut bridge = MockBridge::new();
    // First value serves the startup self-test; the five after it are
    // one per cycle.  Target 25.0, band 1.0.
    bridge.script_sensor(pins::TEMP_SENSOR, &[25.0, 23.5, 24.5, 26.5, 25.0, 23.0]);

    let clock = TestClock::at_hour(12);
    let mut orch = Orchestrator::initialize(
        &config(),
        PinTable::default_board(),
        &mut bridge,
        clock,
    )
    .unwrap();

    let mut states = Vec::new();
    for _ in 0..5 {
        orch.run_cycle();
        states.push(format!("{}", orch.statuses()[0].state));
    }
    assert_eq!(
        states,
        ["actuating", "actuating", "idle", "idle", "actuating"]
    );

    // In-band readings must not touch the relay: one safe-off write at
    // startup, then only the three transitions.
    assert_eq!(
        bridge.writes_to(pins::HEATER_RELAY),
        vec![false, true, false, true]
    );
}

#[test]
fn sensor_fault_is_isolated_and_recovers() {
    let mut bridge = MockBridge::new();
    let clock = TestClock::at_hour(12);
    let mut orch = Orchestrator::initialize(
        &config(),
        PinTable::default_board(),
        &mut bridge,
        clock,
    )
    .unwrap();

    bridge.set_sensor_fault(pins::HUMIDITY_SENSOR, true);
    let record = orch.run_cycle();
    assert!(matches!(
        record.outcomes[1].result,
        Err(StepError::Sensor(_))
    ));
    // The other three controllers still stepped.
    assert!(record.outcomes[0].result.is_ok());
    assert!(record.outcomes[2].result.is_ok());
    assert!(record.outcomes[3].result.is_ok());

    // The probe comes back and the controller self-heals — no restart.
    bridge.set_sensor_fault(pins::HUMIDITY_SENSOR, false);
    let record = orch.run_cycle();
    assert!(record.outcomes[1].result.is_ok());
}

#[test]
fn feeding_serves_the_window_then_waits_out_the_interval() {
    let mut config = config();
    config.feeding.interval_hours = 1;
    config.feeding.feeds_per_interval = 2;

    let mut bridge = MockBridge::new();
    let clock = TestClock::at_hour(12);
    let mut orch = Orchestrator::initialize(
        &config,
        PinTable::default_board(),
        &mut bridge,
        clock.clone(),
    )
    .unwrap();

    // One bounded pulse per cycle until the window is served.
    orch.run_cycle();
    assert_eq!(bridge.servo_pulses.borrow().len(), 1);
    orch.run_cycle();
    assert_eq!(bridge.servo_pulses.borrow().len(), 2);
    orch.run_cycle();
    assert_eq!(bridge.servo_pulses.borrow().len(), 2, "window exhausted");

    // The trap opens for the configured time.
    assert_eq!(bridge.servo_pulses.borrow()[0], Duration::from_secs(5));

    // Interval elapses: a fresh window opens.
    clock.advance(Duration::from_secs(3601));
    orch.run_cycle();
    assert_eq!(bridge.servo_pulses.borrow().len(), 3);
}

#[test]
fn light_tracks_the_clock_and_holds_without_one() {
    let mut bridge = MockBridge::new();
    let clock = TestClock::at_hour(12);
    let mut orch = Orchestrator::initialize(
        &config(),
        PinTable::default_board(),
        &mut bridge,
        clock.clone(),
    )
    .unwrap();

    orch.run_cycle();
    assert_eq!(bridge.writes_to(pins::LIGHT_RELAY), vec![false, true]);

    clock.set_hour(Some(2));
    orch.run_cycle();
    assert_eq!(bridge.writes_to(pins::LIGHT_RELAY), vec![false, true, false]);

    // Wall clock lost: hold the previous state, no relay traffic.
    clock.set_hour(None);
    orch.run_cycle();
    assert_eq!(bridge.writes_to(pins::LIGHT_RELAY), vec![false, true, false]);
}

#[test]
fn stopped_loop_tears_down_and_cannot_restart() {
    let mut bridge = MockBridge::new();
    let mut orch = Orchestrator::initialize(
        &config(),
        PinTable::default_board(),
        &mut bridge,
        TestClock::at_hour(12),
    )
    .unwrap();

    let stop = AtomicBool::new(true);
    orch.run(&stop).expect("a stopped loop exits cleanly");
    assert_eq!(orch.registry().claimed_count(), 0);
    assert!(!orch.registry().is_initialized());

    // The loop cannot come back after teardown.
    assert!(matches!(orch.run(&stop), Err(FatalError::Loop(_))));
}
