//! Scripted hardware bridge for integration tests.
//!
//! Sensors replay a per-line script (last value repeats when the script
//! runs out), relays record every write into a shared history, and the
//! servo counts its pulses — so tests can assert on the full actuator
//! command stream without real hardware.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::atomic::{AtomicI8, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use vivarium::error::{ActuatorWriteError, SensorReadError};
use vivarium::orchestrator::HardwareBridge;
use vivarium::pins::PinSpec;
use vivarium::ports::{Clock, PulsePort, SensorPort, SwitchPort};

// ── Test clock ────────────────────────────────────────────────

/// Clock the test can move while the orchestrator holds clones of it.
pub struct TestClock {
    uptime_secs: AtomicU64,
    /// Hour of day, or -1 for "wall clock unavailable".
    hour: AtomicI8,
}

#[allow(dead_code)]
impl TestClock {
    pub fn at_hour(hour: u8) -> Arc<Self> {
        Arc::new(Self {
            uptime_secs: AtomicU64::new(0),
            hour: AtomicI8::new(hour as i8),
        })
    }

    pub fn set_hour(&self, hour: Option<u8>) {
        self.hour.store(hour.map_or(-1, |h| h as i8), Ordering::Relaxed);
    }

    pub fn advance(&self, d: Duration) {
        self.uptime_secs.fetch_add(d.as_secs(), Ordering::Relaxed);
    }
}

impl Clock for TestClock {
    fn uptime(&self) -> Duration {
        Duration::from_secs(self.uptime_secs.load(Ordering::Relaxed))
    }

    fn hour_of_day(&self) -> Option<u8> {
        match self.hour.load(Ordering::Relaxed) {
            h if h < 0 => None,
            h => Some(h as u8),
        }
    }
}

// ── Ports ─────────────────────────────────────────────────────

struct ScriptedSensor {
    script: Rc<RefCell<VecDeque<f32>>>,
    last: f32,
    fail: Rc<RefCell<bool>>,
}

impl SensorPort for ScriptedSensor {
    fn read(&mut self) -> Result<f32, SensorReadError> {
        if *self.fail.borrow() {
            return Err(SensorReadError::NotResponding);
        }
        if let Some(value) = self.script.borrow_mut().pop_front() {
            self.last = value;
        }
        Ok(self.last)
    }
}

struct RecordingRelay {
    name: String,
    log: Rc<RefCell<Vec<(String, bool)>>>,
    fail: Rc<RefCell<bool>>,
}

impl SwitchPort for RecordingRelay {
    fn set(&mut self, on: bool) -> Result<(), ActuatorWriteError> {
        if *self.fail.borrow() {
            return Err(ActuatorWriteError::WriteFailed);
        }
        self.log.borrow_mut().push((self.name.clone(), on));
        Ok(())
    }
}

struct CountingServo {
    pulses: Rc<RefCell<Vec<Duration>>>,
}

impl PulsePort for CountingServo {
    fn pulse(&mut self, width: Duration) -> Result<(), ActuatorWriteError> {
        self.pulses.borrow_mut().push(width);
        Ok(())
    }

    fn hold_closed(&mut self) -> Result<(), ActuatorWriteError> {
        Ok(())
    }
}

// ── Bridge ────────────────────────────────────────────────────

pub struct MockBridge {
    /// Per-sensor value scripts, keyed by logical pin name.
    scripts: HashMap<String, Rc<RefCell<VecDeque<f32>>>>,
    /// Per-sensor read-failure switches, settable after startup.
    sensor_faults: HashMap<String, Rc<RefCell<bool>>>,
    /// Per-relay write-failure switches.
    relay_faults: HashMap<String, Rc<RefCell<bool>>>,
    /// Ports that must fail to build at all.
    pub dead_lines: Vec<&'static str>,
    pub relay_log: Rc<RefCell<Vec<(String, bool)>>>,
    pub servo_pulses: Rc<RefCell<Vec<Duration>>>,
}

#[allow(dead_code)]
impl MockBridge {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            sensor_faults: HashMap::new(),
            relay_faults: HashMap::new(),
            dead_lines: Vec::new(),
            relay_log: Rc::new(RefCell::new(Vec::new())),
            servo_pulses: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Script the values a sensor line will report, in order.  The
    /// first value also serves the startup self-test read.
    pub fn script_sensor(&mut self, name: &str, values: &[f32]) {
        self.scripts.insert(
            name.to_owned(),
            Rc::new(RefCell::new(values.iter().copied().collect())),
        );
    }

    /// Flip a sensor line into (or out of) a not-responding fault.
    pub fn set_sensor_fault(&mut self, name: &str, failing: bool) {
        *self
            .sensor_faults
            .entry(name.to_owned())
            .or_default()
            .borrow_mut() = failing;
    }

    /// Flip a relay line into (or out of) a write fault.
    pub fn set_relay_fault(&mut self, name: &str, failing: bool) {
        *self
            .relay_faults
            .entry(name.to_owned())
            .or_default()
            .borrow_mut() = failing;
    }

    /// Writes recorded for one relay, in order.
    pub fn writes_to(&self, name: &str) -> Vec<bool> {
        self.relay_log
            .borrow()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, on)| *on)
            .collect()
    }
}

impl Default for MockBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareBridge for MockBridge {
    fn sensor(&mut self, name: &str, _spec: &PinSpec) -> anyhow::Result<Box<dyn SensorPort>> {
        if self.dead_lines.contains(&name) {
            anyhow::bail!("no device on line {name}");
        }
        let script = self
            .scripts
            .entry(name.to_owned())
            .or_insert_with(|| Rc::new(RefCell::new(VecDeque::new())));
        let fail = self.sensor_faults.entry(name.to_owned()).or_default();
        Ok(Box::new(ScriptedSensor {
            script: Rc::clone(script),
            // Unscripted sensors idle at a mid-range value valid for
            // both the temperature and humidity plausibility windows.
            last: 25.0,
            fail: Rc::clone(fail),
        }))
    }

    fn switch(&mut self, name: &str, _spec: &PinSpec) -> anyhow::Result<Box<dyn SwitchPort>> {
        if self.dead_lines.contains(&name) {
            anyhow::bail!("no device on line {name}");
        }
        let fail = self.relay_faults.entry(name.to_owned()).or_default();
        Ok(Box::new(RecordingRelay {
            name: name.to_owned(),
            log: Rc::clone(&self.relay_log),
            fail: Rc::clone(fail),
        }))
    }

    fn feeder(&mut self, name: &str, _spec: &PinSpec) -> anyhow::Result<Box<dyn PulsePort>> {
        if self.dead_lines.contains(&name) {
            anyhow::bail!("no device on line {name}");
        }
        Ok(Box::new(CountingServo {
            pulses: Rc::clone(&self.servo_pulses),
        }))
    }
}
