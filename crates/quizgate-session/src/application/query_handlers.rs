//! Query handlers for the Quiz Session & Delivery context.

use quizgate_core::error::DomainError;
use quizgate_core::ids::UserId;
use quizgate_core::model::{SessionSummary, accuracy_percent};
use quizgate_core::repository::UserStore;
use serde::Serialize;

/// A user's results across every session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreView {
    /// The user.
    pub user_id: UserId,
    /// Answers given.
    pub total_attempts: u64,
    /// Correct answers given.
    pub total_correct: u64,
    /// `total_correct / total_attempts` as a percentage.
    pub accuracy_percent: f64,
}

/// The current or most recent session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    /// Progress summary.
    #[serde(flatten)]
    pub summary: SessionSummary,
    /// The next question due.
    pub next_question_number: u32,
    /// Whether questions are being served.
    pub session_active: bool,
    /// Whether every question was answered.
    pub completed: bool,
    /// Ads shown in the session.
    pub ad_break_counter: u32,
}

/// Retrieves a user's overall score.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the user does not exist.
pub async fn get_score(user_id: UserId, users: &dyn UserStore) -> Result<ScoreView, DomainError> {
    let user = users
        .get(user_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("user {user_id}")))?;
    Ok(ScoreView {
        user_id,
        total_attempts: user.total_attempts,
        total_correct: user.total_correct,
        accuracy_percent: accuracy_percent(user.total_correct, user.total_attempts),
    })
}

/// Retrieves a user's session.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the user does not exist or has never
/// started a quiz.
pub async fn get_session(
    user_id: UserId,
    users: &dyn UserStore,
) -> Result<SessionView, DomainError> {
    let session = users
        .get(user_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("user {user_id}")))?
        .session
        .ok_or_else(|| DomainError::NotFound(format!("session of user {user_id}")))?;
    Ok(SessionView {
        summary: session.summary(),
        next_question_number: session.due_question_number(),
        session_active: session.session_active,
        completed: session.is_complete(),
        ad_break_counter: session.ad_break_counter,
    })
}

#[cfg(test)]
mod tests {
    use quizgate_core::error::DomainError;
    use quizgate_core::ids::DepartmentId;
    use quizgate_core::model::{AnswerDelta, Session, User, UserProfile};
    use quizgate_core::repository::UserStore;
    use quizgate_test_support::{FailingStore, InMemoryStore, fixed_now, user_id};

    use super::{get_score, get_session};

    async fn user_with_answers(store: &InMemoryStore, answers: &[bool]) {
        let id = user_id(1);
        store
            .create(&User::new(id, UserProfile::default(), fixed_now()))
            .await
            .unwrap();
        store
            .save_session(id, &Session::start(DepartmentId::new("Math").unwrap()))
            .await
            .unwrap();
        for (index, correct) in answers.iter().enumerate() {
            store
                .apply_answer(
                    id,
                    AnswerDelta {
                        expected_index: u32::try_from(index).unwrap(),
                        correct: *correct,
                    },
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_get_score_reports_accuracy() {
        // Arrange
        let store = InMemoryStore::new();
        user_with_answers(&store, &[true, false, true, true]).await;

        // Act
        let score = get_score(user_id(1), &store).await.unwrap();

        // Assert
        assert_eq!(score.total_attempts, 4);
        assert_eq!(score.total_correct, 3);
        assert!((score.accuracy_percent - 75.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_get_score_is_zero_before_any_answer() {
        let store = InMemoryStore::new();
        user_with_answers(&store, &[]).await;

        let score = get_score(user_id(1), &store).await.unwrap();

        assert_eq!(score.total_attempts, 0);
        assert!(score.accuracy_percent.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_get_session_flattens_summary() {
        let store = InMemoryStore::new();
        user_with_answers(&store, &[true, false]).await;

        let view = get_session(user_id(1), &store).await.unwrap();

        assert_eq!(view.next_question_number, 3);
        assert!(view.session_active);
        assert!(!view.completed);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["department_id"], "Math");
        assert_eq!(json["attempted"], 2);
        assert_eq!(json["accuracy_percent"], 50.0);
    }

    #[tokio::test]
    async fn test_queries_report_missing_users_and_sessions() {
        let store = InMemoryStore::new();
        store
            .create(&User::new(user_id(2), UserProfile::default(), fixed_now()))
            .await
            .unwrap();

        assert!(matches!(
            get_score(user_id(9), &store).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            get_session(user_id(2), &store).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            get_score(user_id(2), &FailingStore).await,
            Err(DomainError::StorageUnavailable(_))
        ));
    }
}
