//! Command handlers for the Content context.
//!
//! These are the administrative write paths: loading a question bank into a
//! department and adding ads to the rotation.

use quizgate_core::clock::Clock;
use quizgate_core::error::DomainError;
use quizgate_core::ids::DepartmentId;
use quizgate_core::model::{Ad, AdKind, Department};
use quizgate_core::repository::ContentStore;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::bank::QuestionBank;
use crate::domain::commands::{IngestQuestionBank, RegisterAd};

/// Result of a successful question-bank ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// The department that was loaded.
    pub department_id: DepartmentId,
    /// Number of questions stored.
    pub total_questions: u32,
    /// SHA-256 of the uploaded source.
    pub content_hash: String,
}

/// Handles the `IngestQuestionBank` command: validates the upload, then
/// stores the department as active with its full question set.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the bank is malformed, or the
/// store's error if the write fails.
pub async fn handle_ingest_question_bank(
    command: &IngestQuestionBank,
    store: &dyn ContentStore,
) -> Result<IngestReport, DomainError> {
    let bank = QuestionBank::parse(&command.department_id, command.format, &command.source)?;
    let total_questions = u32::try_from(bank.len())
        .map_err(|_| DomainError::Validation("question bank is too large".to_owned()))?;

    let department = Department {
        id: command.department_id.clone(),
        display_name: command
            .display_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| command.department_id.to_string()),
        is_active: true,
        total_questions,
    };
    store.put_department(&department, &bank.questions).await?;

    info!(
        correlation_id = %command.correlation_id,
        department_id = %department.id,
        total_questions,
        content_hash = %bank.content_hash,
        "question bank ingested"
    );

    Ok(IngestReport {
        department_id: department.id,
        total_questions,
        content_hash: bank.content_hash,
    })
}

/// Handles the `RegisterAd` command: validates the payload and adds an
/// active ad to the rotation.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the payload is blank, or the store's
/// error if the write fails.
pub async fn handle_register_ad(
    command: &RegisterAd,
    clock: &dyn Clock,
    store: &dyn ContentStore,
) -> Result<Ad, DomainError> {
    let payload = match &command.kind {
        AdKind::Photo { media_ref } | AdKind::Video { media_ref } => media_ref,
        AdKind::Text { body } => body,
    };
    if payload.trim().is_empty() {
        return Err(DomainError::Validation("ad payload must not be empty".to_owned()));
    }

    let ad = Ad {
        id: Uuid::new_v4(),
        kind: command.kind.clone(),
        caption: command.caption.clone(),
        order_index: command
            .order_index
            .unwrap_or_else(|| clock.now().timestamp()),
        is_active: true,
    };
    store.add_ad(&ad).await?;

    info!(
        correlation_id = %command.correlation_id,
        ad_id = %ad.id,
        order_index = ad.order_index,
        "ad registered"
    );

    Ok(ad)
}
