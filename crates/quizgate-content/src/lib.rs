//! Quizgate — Content bounded context.
//!
//! Responsible for department and question lookup, question-bank
//! ingestion, and the ad rotation schedule.

pub mod application;
pub mod domain;
