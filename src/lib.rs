use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod backend;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;

use backend::BandmateApi;
use mcp::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn BandmateApi>,
    pub sessions: SessionStore,
    pub legacy_sessions: SessionStore,
}

impl AppState {
    pub fn new(
        api: Arc<dyn BandmateApi>,
        sessions: SessionStore,
        legacy_sessions: SessionStore,
    ) -> Self {
        Self {
            api,
            sessions,
            legacy_sessions,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::descriptor))
        .route("/health", get(http::handlers::health))
        .route(
            "/mcp",
            post(http::handlers::mcp_post)
                .get(http::handlers::mcp_get)
                .delete(http::handlers::mcp_delete),
        )
        .route("/sse", get(http::handlers::sse_get))
        .route("/messages", post(http::handlers::messages_post))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
