//! Query handlers for the Content context.
//!
//! Read-only lookups over the content store, returning view DTOs that never
//! expose answer keys.

use quizgate_core::error::DomainError;
use quizgate_core::ids::DepartmentId;
use quizgate_core::model::{Ad, Department, Options, Question};
use quizgate_core::policy::QUIZ_LENGTH;
use quizgate_core::repository::ContentStore;
use serde::Serialize;

use crate::domain::rotation;

/// Read-only view of a department offered to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentView {
    /// Department identifier.
    pub department_id: DepartmentId,
    /// Human-readable name.
    pub display_name: String,
    /// Number of questions available.
    pub total_questions: u32,
}

impl From<Department> for DepartmentView {
    fn from(department: Department) -> Self {
        Self {
            department_id: department.id,
            display_name: department.display_name,
            total_questions: department.total_questions,
        }
    }
}

/// A question as presented to a user: no answer key, no explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// Department of the question.
    pub department_id: DepartmentId,
    /// 1-based number, also the number an answer must claim.
    pub question_number: u32,
    /// Number of questions in a full quiz.
    pub quiz_length: u32,
    /// The prompt.
    pub question_text: String,
    /// The four option texts.
    pub options: Options,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            department_id: question.department_id.clone(),
            question_number: question.question_number,
            quiz_length: QUIZ_LENGTH,
            question_text: question.question_text.clone(),
            options: question.options.clone(),
        }
    }
}

/// Lists departments a quiz can be started in, ordered by id.
///
/// # Errors
///
/// Returns the store's error if the listing fails.
pub async fn list_departments(store: &dyn ContentStore) -> Result<Vec<DepartmentView>, DomainError> {
    let mut departments: Vec<DepartmentView> = store
        .list_active_departments()
        .await?
        .into_iter()
        .filter(Department::is_playable)
        .map(DepartmentView::from)
        .collect();
    departments.sort_by(|a, b| a.department_id.cmp(&b.department_id));
    Ok(departments)
}

/// Loads a department and checks that a quiz can be started in it.
///
/// # Errors
///
/// Returns `DomainError::InvalidDepartment` if the department is unknown,
/// inactive or empty.
pub async fn require_playable_department(
    department_id: &DepartmentId,
    store: &dyn ContentStore,
) -> Result<Department, DomainError> {
    match store.get_department(department_id).await? {
        Some(department) if department.is_playable() => Ok(department),
        Some(_) => Err(DomainError::InvalidDepartment(format!(
            "{department_id} is not active or has no questions"
        ))),
        None => Err(DomainError::InvalidDepartment(format!(
            "{department_id} does not exist"
        ))),
    }
}

/// Loads the rotation-ordered list of active ads.
///
/// # Errors
///
/// Returns the store's error if the listing fails.
pub async fn ad_rotation(store: &dyn ContentStore) -> Result<Vec<Ad>, DomainError> {
    Ok(rotation::rotation_order(store.list_active_ads().await?))
}
