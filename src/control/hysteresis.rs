//! Dead-zone (hysteresis) control policy.
//!
//! Two thresholds around a target avoid rapid on/off toggling near the
//! setpoint:
//!
//! ```text
//!            lower = target - band          upper = target + band
//!   ── Actuate ──────┤        Hold previous        ├────── Release ──
//! ```
//!
//! The decision is a pure function of the current measurement and the
//! band — never of the previous demand — so a missed cycle self-heals
//! on the next one.

/// What the policy asks of the actuator this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demand {
    /// Below the lower threshold: drive the actuator ON (correcting).
    Actuate,
    /// Above the upper threshold: drive the actuator OFF.
    Release,
    /// Inside the dead zone: keep whatever the actuator was doing.
    Hold,
}

/// Symmetric dead-zone around a target value.
#[derive(Debug, Clone, Copy)]
pub struct Hysteresis {
    target: f32,
    band: f32,
}

impl Hysteresis {
    pub fn new(target: f32, band: f32) -> Self {
        debug_assert!(band > 0.0, "hysteresis band must be positive");
        Self { target, band }
    }

    pub fn lower(&self) -> f32 {
        self.target - self.band
    }

    pub fn upper(&self) -> f32 {
        self.target + self.band
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Evaluate one measurement.  Pure — no state is read or written.
    pub fn evaluate(&self, measured: f32) -> Demand {
        if measured < self.lower() {
            Demand::Actuate
        } else if measured > self.upper() {
            Demand::Release
        } else {
            Demand::Hold
        }
    }
}
