//! Commands for the Content context.

use quizgate_core::command::Command;
use quizgate_core::ids::DepartmentId;
use quizgate_core::model::AdKind;
use uuid::Uuid;

use super::bank::BankFormat;

/// Command to replace a department's question bank from uploaded source.
#[derive(Debug, Clone)]
pub struct IngestQuestionBank {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The department to (re)load.
    pub department_id: DepartmentId,
    /// Human-readable name; defaults to the department id.
    pub display_name: Option<String>,
    /// Encoding of `source`.
    pub format: BankFormat,
    /// The uploaded question bank.
    pub source: String,
}

impl Command for IngestQuestionBank {
    fn command_type(&self) -> &'static str {
        "content.ingest_question_bank"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to add an ad to the rotation.
#[derive(Debug, Clone)]
pub struct RegisterAd {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Media or text payload.
    pub kind: AdKind,
    /// Caption for media ads.
    pub caption: String,
    /// Rotation position; defaults to the registration time in seconds.
    pub order_index: Option<i64>,
}

impl Command for RegisterAd {
    fn command_type(&self) -> &'static str {
        "content.register_ad"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
