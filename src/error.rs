//! Unified error types for the vivarium controller.
//!
//! Two explicit channels, never mixed:
//!
//! - [`StepError`] — recoverable per-cycle failures (`SensorReadError`,
//!   `ActuatorWriteError`).  Caught at the controller boundary and folded
//!   into the cycle outcome; they never abort the loop.
//! - [`FatalError`] — startup and loop-fatal conditions (registry failures,
//!   controller construction/self-test failures).  These trigger a full
//!   rollback of every pin claim made so far.
//!
//! Per-cycle variants are `Copy` so they can be recorded in cycle history
//! without allocation.

use core::fmt;

use crate::controllers::ControllerId;

// ---------------------------------------------------------------------------
// Per-cycle sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorReadError {
    /// The probe did not answer (bus error, disconnected wire).
    NotResponding,
    /// Reading is outside the physically plausible range for this probe.
    OutOfRange,
    /// The read did not complete within the configured budget.
    Timeout,
}

impl fmt::Display for SensorReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotResponding => write!(f, "sensor not responding"),
            Self::OutOfRange => write!(f, "reading out of plausible range"),
            Self::Timeout => write!(f, "sensor read timed out"),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-cycle actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorWriteError {
    /// The relay/servo line could not be driven.
    WriteFailed,
    /// The write did not complete within the configured budget.
    Timeout,
}

impl fmt::Display for ActuatorWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "actuator write failed"),
            Self::Timeout => write!(f, "actuator write timed out"),
        }
    }
}

// ---------------------------------------------------------------------------
// One control step — the per-cycle funnel
// ---------------------------------------------------------------------------

/// Every fallible effect inside `Controller::control()` funnels into this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    Sensor(SensorReadError),
    Actuator(ActuatorWriteError),
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
        }
    }
}

impl From<SensorReadError> for StepError {
    fn from(e: SensorReadError) -> Self {
        Self::Sensor(e)
    }
}

impl From<ActuatorWriteError> for StepError {
    fn from(e: ActuatorWriteError) -> Self {
        Self::Actuator(e)
    }
}

impl std::error::Error for StepError {}

// ---------------------------------------------------------------------------
// Pin registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry could not be brought up (or was used after `cleanup`).
    InitFailed(&'static str),
    /// A logical pin name was registered twice.
    DuplicateClaim(String),
    /// A requested pin is already exclusively owned.  Names the first
    /// conflicting pin of the request; the whole request is rolled back.
    PinUnavailable { pin: String, held_by: ControllerId },
    /// A requested logical name is not in the assignment table.
    UnknownPin(String),
    /// `acquire` was called before `initialize`.
    NotInitialized,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed(msg) => write!(f, "pin registry init failed: {msg}"),
            Self::DuplicateClaim(name) => write!(f, "pin '{name}' already registered"),
            Self::PinUnavailable { pin, held_by } => {
                write!(f, "pin '{pin}' unavailable (held by {held_by})")
            }
            Self::UnknownPin(name) => write!(f, "pin '{name}' not in assignment table"),
            Self::NotInitialized => write!(f, "pin registry not initialized"),
        }
    }
}

impl std::error::Error for RegistryError {}

// ---------------------------------------------------------------------------
// Fatal errors — startup rollback and loop termination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
    /// Pin namespace could not be established or arbitration failed.
    Registry(RegistryError),
    /// One controller failed construction or its startup self-test.
    /// Startup is all-or-nothing: this aborts the whole set.
    ControllerInit {
        controller: ControllerId,
        reason: String,
    },
    /// A condition outside the per-controller isolation boundary.
    Loop(&'static str),
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(e) => write!(f, "resource: {e}"),
            Self::ControllerInit { controller, reason } => {
                write!(f, "controller '{controller}' failed to start: {reason}")
            }
            Self::Loop(msg) => write!(f, "control loop fatal: {msg}"),
        }
    }
}

impl From<RegistryError> for FatalError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl std::error::Error for FatalError {}
