//! PostgreSQL-backed stores for the Quizgate quiz engine.
//!
//! [`PgStore`] implements every store trait from `quizgate-core`. Counter
//! mutations are single SQL statements (`x = x + 1`, upserts) or run inside
//! one transaction, and every call is bounded by a timeout.

mod content;
mod error;
mod leaderboard;
mod membership;
pub mod pg_store;
mod referrals;
mod rows;
mod users;

pub use pg_store::{DEFAULT_TIMEOUT, PgStore};

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
