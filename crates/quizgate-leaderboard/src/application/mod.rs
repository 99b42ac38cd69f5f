//! Application layer for the Score & Leaderboard context.

pub mod command_handlers;
pub mod query_handlers;
