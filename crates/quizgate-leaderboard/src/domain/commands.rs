//! Commands for the Score & Leaderboard context.

use quizgate_core::command::Command;
use quizgate_core::ids::{DepartmentId, UserId};
use uuid::Uuid;

/// Command to tally one accepted answer.
#[derive(Debug, Clone)]
pub struct RecordAttempt {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user who answered.
    pub user_id: UserId,
    /// The department of the question.
    pub department_id: DepartmentId,
    /// Whether the answer was correct.
    pub correct: bool,
}

impl Command for RecordAttempt {
    fn command_type(&self) -> &'static str {
        "leaderboard.record_attempt"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
