//! Quizgate — Score & Leaderboard bounded context.
//!
//! Responsible for per-department attempt tallies and the on-demand
//! leaderboard report.

pub mod application;
pub mod domain;
