//! Control policies shared by the concrete controllers.

pub mod hysteresis;
