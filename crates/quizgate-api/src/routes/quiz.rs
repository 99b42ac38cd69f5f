//! Routes for the Quiz Session & Delivery context.
//!
//! One route per user action of the bot: every path is scoped to the acting
//! user's id.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use quizgate_core::ids::{DepartmentId, UserId};
use quizgate_core::model::{Choice, SessionSummary, UserProfile};
use quizgate_referral::application::query_handlers::{self as referral_queries, ReferralStatusView};
use quizgate_session::application::command_handlers::{
    self, AnswerFeedback, Enrollment, UnlockStatus,
};
use quizgate_session::application::query_handlers::{self, ScoreView, SessionView};
use quizgate_session::domain::commands;
use quizgate_session::domain::delivery::Delivery;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{user_id}/start.
#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    /// Profile fields refreshed on every start.
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Deep-link parameter the bot was opened with.
    #[serde(default)]
    pub start_param: Option<String>,
}

/// Request body for POST /{user_id}/quiz.
#[derive(Debug, Deserialize)]
pub struct SelectDepartmentRequest {
    /// The department to quiz in.
    pub department_id: String,
}

/// Request body for POST /{user_id}/answer.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    /// The question the answer is for.
    pub question_number: u32,
    /// Option letter, `a` to `d` in any case.
    pub choice: String,
}

/// Query string naming an optional department.
#[derive(Debug, Deserialize)]
pub struct DepartmentQuery {
    /// The department; defaults per route.
    #[serde(default)]
    pub department_id: Option<String>,
}

impl DepartmentQuery {
    fn parse(&self) -> Result<Option<DepartmentId>, ApiError> {
        Ok(self
            .department_id
            .as_deref()
            .map(DepartmentId::new)
            .transpose()?)
    }
}

/// POST /{user_id}/start
#[instrument(skip(state, request))]
async fn start(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(request): Json<StartRequest>,
) -> Result<Json<Enrollment>, ApiError> {
    let command = commands::EnrollUser {
        correlation_id: Uuid::new_v4(),
        user_id,
        profile: request.profile,
        start_param: request.start_param,
    };

    info!(correlation_id = %command.correlation_id, "handling enroll_user command");

    let enrollment = command_handlers::handle_enroll_user(&command, &state.services()).await?;
    Ok(Json(enrollment))
}

/// POST /{user_id}/quiz
#[instrument(skip(state, request))]
async fn select_department(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(request): Json<SelectDepartmentRequest>,
) -> Result<Json<Delivery>, ApiError> {
    let command = commands::StartQuiz {
        correlation_id: Uuid::new_v4(),
        user_id,
        department_id: DepartmentId::new(&request.department_id)?,
    };

    info!(correlation_id = %command.correlation_id, department_id = %command.department_id, "handling start_quiz command");

    let delivery = command_handlers::handle_start_quiz(&command, &state.services()).await?;
    Ok(Json(delivery))
}

/// POST /{user_id}/answer
#[instrument(skip(state, request), fields(question_number = request.question_number))]
async fn answer(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerFeedback>, ApiError> {
    let command = commands::SubmitAnswer {
        correlation_id: Uuid::new_v4(),
        user_id,
        question_number: request.question_number,
        choice: request.choice.parse::<Choice>()?,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_answer command");

    let feedback = command_handlers::handle_submit_answer(&command, &state.services()).await?;
    Ok(Json(feedback))
}

/// POST /{user_id}/advance
#[instrument(skip(state))]
async fn advance(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Delivery>, ApiError> {
    let command = commands::AdvanceQuiz {
        correlation_id: Uuid::new_v4(),
        user_id,
    };

    info!(correlation_id = %command.correlation_id, "handling advance_quiz command");

    let delivery = command_handlers::handle_advance_quiz(&command, &state.services()).await?;
    Ok(Json(delivery))
}

/// POST /{user_id}/pause
#[instrument(skip(state))]
async fn pause(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<SessionSummary>, ApiError> {
    let command = commands::PauseQuiz {
        correlation_id: Uuid::new_v4(),
        user_id,
    };

    info!(correlation_id = %command.correlation_id, "handling pause_quiz command");

    let summary = command_handlers::handle_pause_quiz(&command, &state.services()).await?;
    Ok(Json(summary))
}

/// POST /{user_id}/resume
#[instrument(skip(state))]
async fn resume(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Delivery>, ApiError> {
    let command = commands::ResumeQuiz {
        correlation_id: Uuid::new_v4(),
        user_id,
    };

    info!(correlation_id = %command.correlation_id, "handling resume_quiz command");

    let delivery = command_handlers::handle_resume_quiz(&command, &state.services()).await?;
    Ok(Json(delivery))
}

/// POST /{user_id}/check-unlock
#[instrument(skip(state, query))]
async fn check_unlock(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<DepartmentQuery>,
) -> Result<Json<UnlockStatus>, ApiError> {
    let command = commands::CheckUnlockStatus {
        correlation_id: Uuid::new_v4(),
        user_id,
        department_id: query.parse()?,
    };

    info!(correlation_id = %command.correlation_id, "handling check_unlock_status command");

    let status =
        command_handlers::handle_check_unlock_status(&command, &state.services()).await?;
    Ok(Json(status))
}

/// GET /{user_id}/score
async fn score(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<ScoreView>, ApiError> {
    let view = query_handlers::get_score(user_id, &*state.users).await?;
    Ok(Json(view))
}

/// GET /{user_id}/session
async fn session(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<SessionView>, ApiError> {
    let view = query_handlers::get_session(user_id, &*state.users).await?;
    Ok(Json(view))
}

/// GET /{user_id}/referral
///
/// Defaults to the department of the user's current session.
async fn referral(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<DepartmentQuery>,
) -> Result<Json<ReferralStatusView>, ApiError> {
    let department_id = match query.parse()? {
        Some(department_id) => department_id,
        None => query_handlers::get_session(user_id, &*state.users)
            .await?
            .summary
            .department_id,
    };
    let view =
        referral_queries::get_referral_status(user_id, &department_id, &*state.users, &state.links)
            .await?;
    Ok(Json(view))
}

/// Returns the router for the quiz context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{user_id}/start", post(start))
        .route("/{user_id}/quiz", post(select_department))
        .route("/{user_id}/answer", post(answer))
        .route("/{user_id}/advance", post(advance))
        .route("/{user_id}/pause", post(pause))
        .route("/{user_id}/resume", post(resume))
        .route("/{user_id}/check-unlock", post(check_unlock))
        .route("/{user_id}/score", get(score))
        .route("/{user_id}/session", get(session))
        .route("/{user_id}/referral", get(referral))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use quizgate_referral::domain::link::LinkBuilder;
    use quizgate_test_support::{FailingStore, FixedClock, InMemoryStore, seed_department};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn app_with_math() -> Router {
        let store = Arc::new(InMemoryStore::new());
        seed_department(&*store, "Math", 30).await;
        let state = AppState::new(
            store,
            Arc::new(FixedClock::default()),
            LinkBuilder::new("QuizBot"),
            None,
        );
        router().with_state(state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap()
        };
        (status, json)
    }

    async fn enroll_and_start(app: &Router) {
        let (status, _) = send(app, "POST", "/7/start", Some(json!({ "first_name": "Ada" }))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(app, "POST", "/7/quiz", Some(json!({ "department_id": "Math" }))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_start_enrolls_and_lists_departments() {
        // Arrange
        let app = app_with_math().await;

        // Act
        let (status, json) = send(
            &app,
            "POST",
            "/7/start",
            Some(json!({ "first_name": "Ada", "username": "ada" })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["user_id"], 7);
        assert_eq!(json["created"], true);
        assert_eq!(json["departments"][0]["department_id"], "Math");
        assert!(json["delivery"].is_null());
    }

    #[tokio::test]
    async fn test_department_link_start_delivers_first_question() {
        let app = app_with_math().await;

        let (status, json) = send(&app, "POST", "/7/start", Some(json!({ "start_param": "dept_Math" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["delivery"]["kind"], "question");
        assert_eq!(json["delivery"]["question"]["question_number"], 1);
    }

    #[tokio::test]
    async fn test_select_department_delivers_question_without_answer_key() {
        let app = app_with_math().await;
        send(&app, "POST", "/7/start", Some(json!({}))).await;

        let (status, json) = send(&app, "POST", "/7/quiz", Some(json!({ "department_id": "Math" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["kind"], "question");
        assert_eq!(json["question"]["question_number"], 1);
        assert!(json["question"].get("answer").is_none());
    }

    #[tokio::test]
    async fn test_select_unknown_department_returns_400() {
        let app = app_with_math().await;
        send(&app, "POST", "/7/start", Some(json!({}))).await;

        let (status, json) = send(&app, "POST", "/7/quiz", Some(json!({ "department_id": "Art" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_department");
    }

    #[tokio::test]
    async fn test_answer_grades_and_advances() {
        // Arrange
        let app = app_with_math().await;
        enroll_and_start(&app).await;

        // Act
        let (status, json) = send(
            &app,
            "POST",
            "/7/answer",
            Some(json!({ "question_number": 1, "choice": "A" })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["correct"], true);
        assert_eq!(json["correct_choice"], "a");
        assert_eq!(json["session"]["current_question_index"], 1);
        let (_, next) = send(&app, "POST", "/7/advance", None).await;
        assert_eq!(next["question"]["question_number"], 2);
    }

    #[tokio::test]
    async fn test_stale_answer_returns_409() {
        let app = app_with_math().await;
        enroll_and_start(&app).await;
        send(&app, "POST", "/7/answer", Some(json!({ "question_number": 1, "choice": "b" }))).await;

        let (status, json) = send(&app, "POST", "/7/answer", Some(json!({ "question_number": 1, "choice": "a" }))).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "stale_answer");
        let (_, score) = send(&app, "GET", "/7/score", None).await;
        assert_eq!(score["total_attempts"], 1);
        assert_eq!(score["total_correct"], 0);
    }

    #[tokio::test]
    async fn test_unknown_choice_letter_returns_400() {
        let app = app_with_math().await;
        enroll_and_start(&app).await;

        let (status, json) = send(&app, "POST", "/7/answer", Some(json!({ "question_number": 1, "choice": "e" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_advance_without_session_returns_410() {
        let app = app_with_math().await;
        send(&app, "POST", "/7/start", Some(json!({}))).await;

        let (status, json) = send(&app, "POST", "/7/advance", None).await;

        assert_eq!(status, StatusCode::GONE);
        assert_eq!(json["error"], "session_expired");
    }

    #[tokio::test]
    async fn test_pause_then_resume_keeps_position() {
        let app = app_with_math().await;
        enroll_and_start(&app).await;
        send(&app, "POST", "/7/answer", Some(json!({ "question_number": 1, "choice": "a" }))).await;

        let (status, summary) = send(&app, "POST", "/7/pause", None).await;
        let (_, paused) = send(&app, "GET", "/7/session", None).await;
        let (resume_status, delivery) = send(&app, "POST", "/7/resume", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["attempted"], 1);
        assert_eq!(paused["session_active"], false);
        assert_eq!(resume_status, StatusCode::OK);
        assert_eq!(delivery["question"]["question_number"], 2);
    }

    #[tokio::test]
    async fn test_referral_defaults_to_session_department() {
        let app = app_with_math().await;
        enroll_and_start(&app).await;

        let (status, json) = send(&app, "GET", "/7/referral", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["department_id"], "Math");
        assert_eq!(json["referrals"], 0);
        assert_eq!(json["required"], 2);
        assert_eq!(json["referral_link"], "https://t.me/QuizBot?start=ref_7_dept_Math");
    }

    #[tokio::test]
    async fn test_check_unlock_without_department_or_session_returns_400() {
        let app = app_with_math().await;
        send(&app, "POST", "/7/start", Some(json!({}))).await;

        let (status, json) = send(&app, "POST", "/7/check-unlock", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_check_unlock_reports_locked_status() {
        let app = app_with_math().await;
        send(&app, "POST", "/7/start", Some(json!({}))).await;

        let (status, json) = send(&app, "POST", "/7/check-unlock?department_id=Math", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["department_id"], "Math");
        assert!(json["delivery"].is_null());
    }

    #[tokio::test]
    async fn test_score_for_unknown_user_returns_404() {
        let app = app_with_math().await;

        let (status, json) = send(&app, "GET", "/99/score", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_start_returns_503_when_store_fails() {
        let state = AppState::new(
            Arc::new(FailingStore),
            Arc::new(FixedClock::default()),
            LinkBuilder::new("QuizBot"),
            None,
        );
        let app = router().with_state(state);

        let (status, json) = send(&app, "POST", "/7/start", Some(json!({}))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "storage_unavailable");
    }
}
