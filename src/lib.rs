//! Vivarium controller library.
//!
//! Resource arbitration and control orchestration for a live-animal
//! enclosure: exclusive pin ownership ([`registry`]), four small
//! controllers over narrow hardware ports ([`controllers`], [`ports`]),
//! and a fault-isolating control loop ([`orchestrator`]).  All hardware
//! access goes through the [`orchestrator::HardwareBridge`] seam, so
//! the whole stack runs host-side against the [`sim`] bridge.

#![deny(unused_must_use)]

pub mod config;
pub mod control;
pub mod controllers;
pub mod error;
pub mod orchestrator;
pub mod pins;
pub mod ports;
pub mod registry;
pub mod sim;
