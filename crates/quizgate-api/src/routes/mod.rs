//! Route modules organized by bounded context.

pub mod admin;
pub mod departments;
pub mod health;
pub mod quiz;
