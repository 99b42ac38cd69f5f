//! Quizgate — Quiz Session & Delivery bounded context.
//!
//! Owns the per-user quiz session lifecycle: starting a department,
//! accepting ordinal-checked answers, and the delivery pipeline that decides
//! between the preview lock, completion, ad breaks and the next question.

pub mod application;
pub mod domain;
