//! Domain layer for the Score & Leaderboard context.

pub mod commands;
pub mod ranking;
