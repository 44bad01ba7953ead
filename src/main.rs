use std::sync::Arc;

use bandmate_mcp::{
    backend::HttpBandmateClient, build_app, config::Config, logging, mcp::session::SessionStore,
    AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let bind_socket = config.bind_socket()?;

    let api = Arc::new(HttpBandmateClient::new(
        config.api_url.clone(),
        config.auth_token.clone(),
        config.auth_policy,
    ));
    let state = AppState::new(api, SessionStore::new(), SessionStore::new());
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        api_url = %config.api_url,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
