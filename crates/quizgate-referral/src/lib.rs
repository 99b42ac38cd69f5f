//! Quizgate — Referral & Unlock bounded context.
//!
//! Responsible for referral deep links, the referral audit trail, and the
//! per-department unlock that lifts the question preview cap.

pub mod application;
pub mod domain;
