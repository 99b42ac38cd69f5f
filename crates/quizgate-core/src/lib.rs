//! Quizgate Core — shared domain model and store abstractions.
//!
//! This crate defines the identifiers, persisted record shapes, policy
//! constants and store traits that every bounded context depends on. It
//! contains no infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod ids;
pub mod model;
pub mod policy;
pub mod repository;
