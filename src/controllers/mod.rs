//! Controller subsystem — one small state machine per enclosure concern.
//!
//! Every controller is polymorphic over `{check_status, control}`:
//! `check_status` is a one-time self-test run right after construction
//! (a `false` result is fatal during startup only); `control` executes
//! one isolated step and reports its outcome as a [`StepError`] result
//! that the orchestrator folds into the cycle record.

pub mod feeding;
pub mod light;
pub mod threshold;

use core::fmt;
use std::time::Duration;

use crate::error::StepError;

// ---------------------------------------------------------------------------
// Controller identity
// ---------------------------------------------------------------------------

/// Identity of each control unit, in fixed registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerId {
    Temperature,
    Humidity,
    Light,
    Feeding,
}

impl ControllerId {
    /// Fixed construction and cycle order.
    pub const ALL: [ControllerId; 4] = [
        Self::Temperature,
        Self::Humidity,
        Self::Light,
        Self::Feeding,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Light => "light",
            Self::Feeding => "feeding",
        }
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Actuator state machine
// ---------------------------------------------------------------------------

/// Threshold controllers run a two-state machine over their actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActuatorState {
    /// Actuator off; nothing to correct.
    #[default]
    Idle,
    /// Actuator on, correcting towards the target.
    Actuating,
}

impl fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Actuating => f.write_str("actuating"),
        }
    }
}

// ---------------------------------------------------------------------------
// Status snapshot
// ---------------------------------------------------------------------------

/// Point-in-time view of one controller, for logs and diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct ControllerStatus {
    pub id: ControllerId,
    pub state: ActuatorState,
    /// Last successfully read measurement, if any.
    pub last_measured: Option<f32>,
    /// Uptime at which the actuator last changed state.
    pub last_actuation: Option<Duration>,
}

// ---------------------------------------------------------------------------
// Controller trait
// ---------------------------------------------------------------------------

/// The capability set shared by all four concrete controllers.
pub trait Controller {
    fn id(&self) -> ControllerId;

    /// One-time startup self-test: sensor reachable, actuator reachable.
    /// Side-effect free beyond the check itself (actuators end up in the
    /// safe off/closed position).
    fn check_status(&mut self) -> bool;

    /// Execute one control step.  Errors are returned, never panicked;
    /// the caller records them as this controller's cycle outcome.
    fn control(&mut self) -> Result<(), StepError>;

    fn status(&self) -> ControllerStatus;
}
