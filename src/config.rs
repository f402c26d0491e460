//! System configuration.
//!
//! All tunable parameters for the enclosure.  Loaded from a common JSON
//! file, optionally overlaid with a species-specific file (the species
//! file only lists the keys it changes), plus the pin assignment table
//! which lives in its own file (see [`crate::pins::PinTable::load`]).

use std::path::Path;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Per-subsystem blocks
// ---------------------------------------------------------------------------

/// Hysteresis setpoint for a threshold controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Target value (°C or %RH).
    pub target: f32,
    /// Dead-zone half-width around the target.
    pub band: f32,
    /// Readings below this are rejected as implausible.
    pub min_valid: f32,
    /// Readings above this are rejected as implausible.
    pub max_valid: f32,
}

/// Daily photoperiod window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LightSchedule {
    /// Hour (0–23) the canopy light switches on.
    pub on_hour: u8,
    /// Hour (0–23) it switches off.  May be below `on_hour` for a
    /// window that wraps past midnight.
    pub off_hour: u8,
}

/// Feeding interval and portioning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedingSchedule {
    /// Hours between feeding windows.
    pub interval_hours: u32,
    /// Portions served per window (one servo pulse each).
    pub feeds_per_interval: u8,
    /// Seconds the trap door stays open per portion.
    pub trap_open_secs: u16,
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub temperature: ThresholdConfig,
    pub humidity: ThresholdConfig,
    pub light: LightSchedule,
    pub feeding: FeedingSchedule,

    /// Pause between control cycles (seconds).
    pub cycle_interval_secs: u64,
    /// Budget for a single sensor read / actuator write (milliseconds).
    /// Over-budget hardware calls are surfaced as timeouts.
    pub hardware_budget_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            temperature: ThresholdConfig {
                target: 25.0,
                band: 1.0,
                min_valid: 15.0,
                max_valid: 35.0,
            },
            humidity: ThresholdConfig {
                target: 65.0,
                band: 5.0,
                min_valid: 20.0,
                max_valid: 95.0,
            },
            light: LightSchedule {
                on_hour: 6,
                off_hour: 18,
            },
            feeding: FeedingSchedule {
                interval_hours: 72, // every 3 days
                feeds_per_interval: 2,
                trap_open_secs: 5,
            },
            cycle_interval_secs: 30,
            hardware_budget_ms: 2000,
        }
    }
}

impl SystemConfig {
    /// Load the common config file and overlay the species-specific
    /// file on top of it, if given.  The species file is a partial
    /// document: only the keys it lists are replaced.
    pub fn load(common: &Path, species: Option<&Path>) -> anyhow::Result<Self> {
        let mut doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(common)?)?;
        if let Some(species) = species {
            let overlay: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(species)?)?;
            merge(&mut doc, overlay);
        }
        let config: Self = serde_json::from_value(doc)?;
        config
            .validate()
            .map_err(|msg| anyhow::anyhow!("invalid configuration: {msg}"))?;
        Ok(config)
    }

    /// Range-check every parameter.  Invalid values are rejected, not
    /// clamped.
    pub fn validate(&self) -> Result<(), &'static str> {
        for block in [&self.temperature, &self.humidity] {
            if block.band <= 0.0 {
                return Err("hysteresis band must be positive");
            }
            if block.min_valid >= block.max_valid {
                return Err("plausibility range is empty");
            }
            if block.target < block.min_valid || block.target > block.max_valid {
                return Err("target outside plausibility range");
            }
        }
        if self.light.on_hour > 23 || self.light.off_hour > 23 {
            return Err("photoperiod hours must be 0-23");
        }
        if self.feeding.interval_hours == 0 {
            return Err("feeding interval must be at least one hour");
        }
        if self.feeding.feeds_per_interval == 0 {
            return Err("feeds per interval must be at least 1");
        }
        if self.feeding.trap_open_secs == 0 {
            return Err("trap open time must be positive");
        }
        if self.cycle_interval_secs == 0 {
            return Err("cycle interval must be positive");
        }
        Ok(())
    }
}

/// Deep-merge `overlay` into `doc`: objects merge recursively, any
/// other value replaces wholesale.
fn merge(doc: &mut serde_json::Value, overlay: serde_json::Value) {
    match (doc, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(over)) => {
            for (key, value) in over {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
