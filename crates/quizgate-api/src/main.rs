//! Quizgate API server entry point.

use std::error::Error;
use std::sync::Arc;

use quizgate_api::config::Config;
use quizgate_api::state::AppState;
use quizgate_core::clock::SystemClock;
use quizgate_referral::domain::link::LinkBuilder;
use quizgate_store::{MIGRATOR, PgStore};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Quizgate API server");

    let config = Config::from_env()?;
    let addr = config.bind_addr()?;

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    MIGRATOR.run(&pool).await?;

    let store = Arc::new(PgStore::new(pool).with_timeout(config.storage_timeout));
    let mut app_state = AppState::new(
        store.clone(),
        Arc::new(SystemClock),
        LinkBuilder::new(config.bot_username.clone()),
        config.admin_user_id,
    );
    if config.require_channel_membership {
        tracing::info!("channel membership required to start a quiz");
        app_state = app_state.with_membership_gate(store);
    }
    if config.admin_user_id.is_none() {
        tracing::warn!("ADMIN_USER_ID is not set; admin routes are disabled");
    }

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = quizgate_api::build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
