//! Shared test doubles and fixtures for the Quizgate quiz engine.

mod clock;
mod fixtures;
mod store;

pub use clock::{FixedClock, fixed_now};
pub use fixtures::{media_ad, question, seed_department, text_ad, user_id};
pub use store::{FailingStore, InMemoryStore};
