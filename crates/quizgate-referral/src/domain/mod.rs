//! Domain layer for the Referral & Unlock context.

pub mod commands;
pub mod link;
pub mod unlock;
