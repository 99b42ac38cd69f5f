//! Command handlers for the Score & Leaderboard context.

use quizgate_core::clock::Clock;
use quizgate_core::error::DomainError;
use quizgate_core::repository::LeaderboardStore;
use tracing::debug;

use crate::domain::commands::RecordAttempt;

/// Handles the `RecordAttempt` command: increments the user's department
/// tally, creating it on first write.
///
/// # Errors
///
/// Returns the store's error if the increment fails.
pub async fn handle_record_attempt(
    command: &RecordAttempt,
    clock: &dyn Clock,
    store: &dyn LeaderboardStore,
) -> Result<(), DomainError> {
    store
        .record_attempt(
            command.user_id,
            &command.department_id,
            command.correct,
            clock.now(),
        )
        .await?;
    debug!(
        correlation_id = %command.correlation_id,
        user_id = %command.user_id,
        department_id = %command.department_id,
        correct = command.correct,
        "leaderboard attempt recorded"
    );
    Ok(())
}
