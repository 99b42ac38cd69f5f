//! Application layer for the Referral & Unlock context.

pub mod command_handlers;
pub mod query_handlers;
