//! Commands for the Referral & Unlock context.

use quizgate_core::command::Command;
use quizgate_core::ids::{DepartmentId, UserId};
use uuid::Uuid;

/// Command to credit an inviter for a newly arrived user.
#[derive(Debug, Clone)]
pub struct RecordReferral {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user who shared the link.
    pub inviter_id: UserId,
    /// The user who arrived through it.
    pub invited_id: UserId,
    /// The department the link was scoped to.
    pub department_id: Option<DepartmentId>,
}

impl Command for RecordReferral {
    fn command_type(&self) -> &'static str {
        "referral.record_referral"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to unlock a department for a user if they qualify.
#[derive(Debug, Clone)]
pub struct CheckUnlock {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user whose access is checked.
    pub user_id: UserId,
    /// The department to check.
    pub department_id: DepartmentId,
}

impl Command for CheckUnlock {
    fn command_type(&self) -> &'static str {
        "referral.check_unlock"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
