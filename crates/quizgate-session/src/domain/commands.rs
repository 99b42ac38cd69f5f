//! Commands for the Quiz Session & Delivery context.

use quizgate_core::command::Command;
use quizgate_core::ids::{DepartmentId, UserId};
use quizgate_core::model::{Choice, UserProfile};
use uuid::Uuid;

/// Command sent when a user opens the bot, possibly through a deep link.
#[derive(Debug, Clone)]
pub struct EnrollUser {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The arriving user.
    pub user_id: UserId,
    /// Display fields from the platform.
    pub profile: UserProfile,
    /// Raw deep-link start parameter, if any.
    pub start_param: Option<String>,
}

impl Command for EnrollUser {
    fn command_type(&self) -> &'static str {
        "session.enroll_user"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to begin a fresh quiz in a department.
#[derive(Debug, Clone)]
pub struct StartQuiz {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player.
    pub user_id: UserId,
    /// The department to play.
    pub department_id: DepartmentId,
}

impl Command for StartQuiz {
    fn command_type(&self) -> &'static str {
        "session.start_quiz"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command carrying an answer to a specific question.
#[derive(Debug, Clone)]
pub struct SubmitAnswer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player.
    pub user_id: UserId,
    /// The question number the answer is for.
    pub question_number: u32,
    /// The chosen option.
    pub choice: Choice,
}

impl Command for SubmitAnswer {
    fn command_type(&self) -> &'static str {
        "session.submit_answer"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to deliver whatever is due next.
#[derive(Debug, Clone)]
pub struct AdvanceQuiz {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player.
    pub user_id: UserId,
}

impl Command for AdvanceQuiz {
    fn command_type(&self) -> &'static str {
        "session.advance_quiz"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to leave the quiz while keeping progress.
#[derive(Debug, Clone)]
pub struct PauseQuiz {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player.
    pub user_id: UserId,
}

impl Command for PauseQuiz {
    fn command_type(&self) -> &'static str {
        "session.pause_quiz"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to continue a paused quiz.
#[derive(Debug, Clone)]
pub struct ResumeQuiz {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player.
    pub user_id: UserId,
}

impl Command for ResumeQuiz {
    fn command_type(&self) -> &'static str {
        "session.resume_quiz"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command sent from the lock screen: re-check referrals and continue if
/// the department is now unlocked.
#[derive(Debug, Clone)]
pub struct CheckUnlockStatus {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player.
    pub user_id: UserId,
    /// Department to check; defaults to the current session's department.
    pub department_id: Option<DepartmentId>,
}

impl Command for CheckUnlockStatus {
    fn command_type(&self) -> &'static str {
        "session.check_unlock_status"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
