//! HTTP surface for promptgate.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod state;

pub use config::AppConfig;
pub use error::ApiError;
pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    let langchain_routes = Router::new()
        .route("/langchain/translate", post(handlers::translate))
        .route("/langchain/parse-review", post(handlers::parse_review));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/gemini-completion", post(handlers::completion))
        .merge(langchain_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
