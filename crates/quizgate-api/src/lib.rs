//! Quizgate HTTP transport.
//!
//! Exposes the quiz engine over JSON routes; the binary in `main.rs` wires
//! it to PostgreSQL.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Builds the full application router with every route mounted.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/departments", routes::departments::router())
        .nest("/api/v1/users", routes::quiz::router())
        .nest("/api/v1/admin", routes::admin::router())
        .with_state(state)
}
