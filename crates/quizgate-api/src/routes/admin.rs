//! Administrative routes: user count, leaderboard, question-bank ingestion,
//! ad registration and channel membership reports.
//!
//! Every route requires the `x-admin-id` header to match the configured
//! admin user id.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use quizgate_content::application::command_handlers::{self, IngestReport};
use quizgate_content::domain::bank::BankFormat;
use quizgate_content::domain::commands;
use quizgate_core::error::DomainError;
use quizgate_core::ids::{DepartmentId, UserId};
use quizgate_core::model::{Ad, AdKind, MemberStatus};
use quizgate_leaderboard::application::query_handlers::{self, LeaderboardView};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the caller's user id.
pub const ADMIN_HEADER: &str = "x-admin-id";

/// Response body for GET /users/count.
#[derive(Debug, Serialize)]
pub struct UserCountResponse {
    /// Number of enrolled users.
    pub users: u64,
}

/// Query string for PUT /departments/{department_id}/questions.
#[derive(Debug, Deserialize)]
pub struct IngestQuery {
    /// Encoding of the body.
    #[serde(default)]
    pub format: BankFormat,
    /// Human-readable department name.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Request body for POST /ads.
#[derive(Debug, Deserialize)]
pub struct RegisterAdRequest {
    /// Media or text payload, tagged by `type`.
    #[serde(flatten)]
    pub kind: AdKind,
    /// Caption for media ads.
    #[serde(default)]
    pub caption: String,
    /// Rotation position.
    #[serde(default)]
    pub order_index: Option<i64>,
}

/// Request body for PUT /members/{user_id}.
#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    /// Status reported by the chat platform.
    pub status: MemberStatus,
}

/// Response body for PUT /members/{user_id}.
#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    /// The reported user.
    pub user_id: UserId,
    /// The recorded status.
    pub status: MemberStatus,
    /// Whether the status admits the user to quizzes.
    pub is_member: bool,
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<UserId, ApiError> {
    let Some(admin_id) = state.admin_user_id else {
        return Err(DomainError::Forbidden("admin access is disabled".to_owned()).into());
    };
    let caller = headers
        .get(ADMIN_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<UserId>().ok());
    match caller {
        Some(caller) if caller == admin_id => Ok(caller),
        _ => {
            warn!(header = ADMIN_HEADER, "rejected admin request");
            Err(DomainError::Forbidden("admin only".to_owned()).into())
        }
    }
}

/// GET /users/count
#[instrument(skip(state, headers))]
async fn user_count(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserCountResponse>, ApiError> {
    require_admin(&state, &headers)?;
    let users = state.users.count().await?;
    Ok(Json(UserCountResponse { users }))
}

/// GET /leaderboard
#[instrument(skip(state, headers))]
async fn leaderboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LeaderboardView>, ApiError> {
    require_admin(&state, &headers)?;
    let view = query_handlers::get_leaderboard(&*state.leaderboard, &*state.users).await?;
    Ok(Json(view))
}

/// PUT /departments/{department_id}/questions
#[instrument(skip(state, headers, body))]
async fn ingest_question_bank(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(department_id): Path<String>,
    Query(query): Query<IngestQuery>,
    body: String,
) -> Result<Json<IngestReport>, ApiError> {
    let admin = require_admin(&state, &headers)?;
    let command = commands::IngestQuestionBank {
        correlation_id: Uuid::new_v4(),
        department_id: DepartmentId::new(&department_id)?,
        display_name: query.display_name,
        format: query.format,
        source: body,
    };

    info!(correlation_id = %command.correlation_id, %admin, "handling ingest_question_bank command");

    let report = command_handlers::handle_ingest_question_bank(&command, &*state.content).await?;
    Ok(Json(report))
}

/// POST /ads
#[instrument(skip(state, headers, request))]
async fn register_ad(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RegisterAdRequest>,
) -> Result<Json<Ad>, ApiError> {
    let admin = require_admin(&state, &headers)?;
    let command = commands::RegisterAd {
        correlation_id: Uuid::new_v4(),
        kind: request.kind,
        caption: request.caption,
        order_index: request.order_index,
    };

    info!(correlation_id = %command.correlation_id, %admin, "handling register_ad command");

    let ad =
        command_handlers::handle_register_ad(&command, state.clock.as_ref(), &*state.content)
            .await?;
    Ok(Json(ad))
}

/// PUT /members/{user_id}
#[instrument(skip(state, headers, request))]
async fn record_membership(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
    Json(request): Json<MembershipRequest>,
) -> Result<Json<MembershipResponse>, ApiError> {
    let admin = require_admin(&state, &headers)?;
    state
        .memberships
        .record_membership(user_id, request.status, state.clock.now())
        .await?;

    info!(%admin, %user_id, status = request.status.as_str(), "channel membership recorded");

    Ok(Json(MembershipResponse {
        user_id,
        status: request.status,
        is_member: request.status.grants_access(),
    }))
}

/// Returns the router for administrative operations.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/count", get(user_count))
        .route("/leaderboard", get(leaderboard))
        .route(
            "/departments/{department_id}/questions",
            put(ingest_question_bank),
        )
        .route("/ads", post(register_ad))
        .route("/members/{user_id}", put(record_membership))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use quizgate_core::model::{User, UserProfile};
    use quizgate_core::repository::{
        ContentStore, LeaderboardStore, MembershipChecker, UserStore,
    };
    use quizgate_referral::domain::link::LinkBuilder;
    use quizgate_test_support::{FailingStore, FixedClock, InMemoryStore, fixed_now, user_id};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const ADMIN: &str = "42";

    fn app_with(store: Arc<InMemoryStore>) -> Router {
        let state = AppState::new(
            store,
            Arc::new(FixedClock::default()),
            LinkBuilder::new("QuizBot"),
            Some(user_id(42)),
        );
        router().with_state(state)
    }

    async fn send(
        app: Router,
        method: &str,
        uri: &str,
        admin: Option<&str>,
        body: Body,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(admin) = admin {
            builder = builder.header(ADMIN_HEADER, admin);
        }
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap())
    }

    fn bank_json(count: u32) -> String {
        let questions: Vec<Value> = (1..=count)
            .map(|n| {
                json!({
                    "question_number": n,
                    "question_text": format!("Q{n}?"),
                    "options": { "a": "1", "b": "2", "c": "3", "d": "4" },
                    "answer": "c",
                })
            })
            .collect();
        serde_json::to_string(&questions).unwrap()
    }

    #[tokio::test]
    async fn test_user_count_requires_admin_header() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());

        // Act
        let (missing, json) = send(
            app_with(store.clone()),
            "GET",
            "/users/count",
            None,
            Body::empty(),
        )
        .await;
        let (wrong, _) = send(
            app_with(store),
            "GET",
            "/users/count",
            Some("7"),
            Body::empty(),
        )
        .await;

        // Assert
        assert_eq!(missing, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "forbidden");
        assert_eq!(wrong, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_routes_are_disabled_without_configured_admin() {
        let state = AppState::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(FixedClock::default()),
            LinkBuilder::new("QuizBot"),
            None,
        );
        let app = router().with_state(state);

        let (status, _) = send(app, "GET", "/users/count", Some(ADMIN), Body::empty()).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_user_count_counts_enrolled_users() {
        let store = Arc::new(InMemoryStore::new());
        for id in [1, 2, 3] {
            store
                .create(&User::new(user_id(id), UserProfile::default(), fixed_now()))
                .await
                .unwrap();
        }

        let (status, json) = send(
            app_with(store),
            "GET",
            "/users/count",
            Some(ADMIN),
            Body::empty(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["users"], 3);
    }

    #[tokio::test]
    async fn test_ingest_question_bank_activates_department() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());

        // Act
        let (status, json) = send(
            app_with(store.clone()),
            "PUT",
            "/departments/Physics/questions?display_name=Physics%20101",
            Some(ADMIN),
            Body::from(bank_json(4)),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["department_id"], "Physics");
        assert_eq!(json["total_questions"], 4);
        let department = store
            .get_department(&DepartmentId::new("Physics").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(department.is_active);
        assert_eq!(department.display_name, "Physics 101");
    }

    #[tokio::test]
    async fn test_ingest_rejects_malformed_bank() {
        let store = Arc::new(InMemoryStore::new());

        let (status, json) = send(
            app_with(store),
            "PUT",
            "/departments/Physics/questions",
            Some(ADMIN),
            Body::from(r#"[{"question_number": 0}]"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_register_ad_defaults_order_to_registration_time() {
        let store = Arc::new(InMemoryStore::new());
        let body = json!({ "type": "photo", "media_ref": "AgAD-1", "caption": "Sponsor" });

        let (status, json) = send(
            app_with(store.clone()),
            "POST",
            "/ads",
            Some(ADMIN),
            Body::from(serde_json::to_vec(&body).unwrap()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["type"], "photo");
        assert_eq!(json["media_ref"], "AgAD-1");
        assert_eq!(json["order_index"], fixed_now().timestamp());
        assert_eq!(store.list_active_ads().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_ad_rejects_blank_text() {
        let body = json!({ "type": "text", "body": "  " });

        let (status, json) = send(
            app_with(Arc::new(InMemoryStore::new())),
            "POST",
            "/ads",
            Some(ADMIN),
            Body::from(serde_json::to_vec(&body).unwrap()),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_leaderboard_ranks_recorded_attempts() {
        let store = Arc::new(InMemoryStore::new());
        let math = DepartmentId::new("Math").unwrap();
        for (user, correct) in [(1, true), (2, false)] {
            store
                .record_attempt(user_id(user), &math, correct, fixed_now())
                .await
                .unwrap();
        }

        let (status, json) = send(
            app_with(store),
            "GET",
            "/leaderboard",
            Some(ADMIN),
            Body::empty(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["overall"][0]["user_id"], 1);
        assert_eq!(json["overall"][0]["rank"], 1);
        assert_eq!(json["per_department"]["Math"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_leaderboard_returns_503_when_store_fails() {
        let state = AppState::new(
            Arc::new(FailingStore),
            Arc::new(FixedClock::default()),
            LinkBuilder::new("QuizBot"),
            Some(user_id(42)),
        );
        let app = router().with_state(state);

        let (status, json) = send(app, "GET", "/leaderboard", Some(ADMIN), Body::empty()).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "storage_unavailable");
    }

    #[tokio::test]
    async fn test_record_membership_updates_the_gate() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());

        // Act
        let (joined, json) = send(
            app_with(store.clone()),
            "PUT",
            "/members/7",
            Some(ADMIN),
            Body::from(json!({ "status": "administrator" }).to_string()),
        )
        .await;
        let admitted = store.is_member(user_id(7)).await.unwrap();
        let (kicked, _) = send(
            app_with(store.clone()),
            "PUT",
            "/members/7",
            Some(ADMIN),
            Body::from(json!({ "status": "kicked" }).to_string()),
        )
        .await;

        // Assert
        assert_eq!(joined, StatusCode::OK);
        assert_eq!(json["user_id"], 7);
        assert_eq!(json["is_member"], true);
        assert!(admitted);
        assert_eq!(kicked, StatusCode::OK);
        assert!(!store.is_member(user_id(7)).await.unwrap());
    }
}
