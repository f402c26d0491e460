//! GPIO pin assignment table for the enclosure main board.
//!
//! Single source of truth — controllers reference pins by logical name,
//! never by BCM number.  The table is loaded once (from the gpio config
//! file or [`PinTable::default_board`]) and is immutable after the
//! registry seals it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Logical pin names
// ---------------------------------------------------------------------------

/// DHT22 combined temperature probe.
pub const TEMP_SENSOR: &str = "temp_sensor";
/// Second DHT22 line dedicated to the humidity probe.
pub const HUMIDITY_SENSOR: &str = "humidity_sensor";
/// Ambient light sensor (digital, active HIGH in daylight).
pub const LIGHT_SENSOR: &str = "light_sensor";

/// Relay driving the heating mat (active HIGH).
pub const HEATER_RELAY: &str = "heater_relay";
/// Relay driving the ultrasonic mist generator.
pub const MIST_RELAY: &str = "mist_relay";
/// Relay driving the UV/LED canopy light.
pub const LIGHT_RELAY: &str = "light_relay";
/// Servo PWM line for the feeding trap door (50 Hz).
pub const FEEDING_SERVO: &str = "feeding_servo";

/// Front-panel status LED.
pub const STATUS_LED: &str = "status_led";

// ---------------------------------------------------------------------------
// Pin specification
// ---------------------------------------------------------------------------

/// Electrical class of a line (3.3 V logic throughout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinClass {
    Input,
    Output,
    Pwm,
}

/// What subsystem category the line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinCategory {
    Sensor,
    Actuator,
    Interface,
    Status,
}

/// One physical line: BCM number, electrical class, category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinSpec {
    /// Broadcom (BCM) pin number.
    pub bcm: u8,
    pub class: PinClass,
    pub category: PinCategory,
}

impl PinSpec {
    pub const fn new(bcm: u8, class: PinClass, category: PinCategory) -> Self {
        Self {
            bcm,
            class,
            category,
        }
    }
}

// ---------------------------------------------------------------------------
// Assignment table
// ---------------------------------------------------------------------------

/// Logical name → physical line.  Ordered map so iteration (and logs)
/// are deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinTable(BTreeMap<String, PinSpec>);

impl PinTable {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// The wiring of the reference main board.
    pub fn default_board() -> Self {
        use PinCategory::{Actuator, Sensor, Status};
        use PinClass::{Input, Output, Pwm};

        let mut t = Self::new();
        t.insert(TEMP_SENSOR, PinSpec::new(4, Input, Sensor));
        t.insert(HUMIDITY_SENSOR, PinSpec::new(27, Input, Sensor));
        t.insert(LIGHT_SENSOR, PinSpec::new(17, Input, Sensor));
        t.insert(HEATER_RELAY, PinSpec::new(18, Output, Actuator));
        t.insert(MIST_RELAY, PinSpec::new(23, Output, Actuator));
        t.insert(LIGHT_RELAY, PinSpec::new(24, Output, Actuator));
        t.insert(FEEDING_SERVO, PinSpec::new(12, Pwm, Actuator));
        t.insert(STATUS_LED, PinSpec::new(25, Output, Status));
        t
    }

    /// Load the table from a JSON file (`{"name": {"bcm": .., ..}, ..}`).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let table: Self = serde_json::from_str(&raw)?;
        Ok(table)
    }

    pub fn insert(&mut self, name: &str, spec: PinSpec) -> Option<PinSpec> {
        self.0.insert(name.to_owned(), spec)
    }

    pub fn get(&self, name: &str) -> Option<&PinSpec> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PinSpec)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
