//! Application layer for the Quiz Session & Delivery context.

pub mod command_handlers;
pub mod locks;
pub mod query_handlers;
pub mod services;
