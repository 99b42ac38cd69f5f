//! Domain layer for the Content context.

pub mod bank;
pub mod commands;
pub mod rotation;
