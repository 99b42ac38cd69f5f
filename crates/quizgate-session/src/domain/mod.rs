//! Domain layer for the Quiz Session & Delivery context.

pub mod commands;
pub mod delivery;
pub mod gating;
