mod config;
mod error;
mod gate;
mod logging;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use config::Config;
use logging::Logger;
use services::backend::HttpBackend;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    logging::init_console(config.log.level);

    let logger = Logger::from_config(&config.log);
    if config.log.clear_on_start {
        logger.clear_logs();
    }

    // Non-fatal: the gate and static routes work without a collaborator.
    if config.backend_url.is_none() {
        tracing::warn!("BACKEND_API_URL not set: auth and user APIs will fail with a configuration error");
    }
    let backend = HttpBackend::new(config.backend_url.clone(), config.backend_timeout_secs)?;

    let port = config.port;
    let state = state::AppState::new(config, logger.clone(), Arc::new(backend));

    let _event_log = services::events::spawn_event_log(state.auth.subscribe(), logger);
    if !state.auth.check_api_connection().await {
        tracing::warn!("backend API unreachable at startup");
    }

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "portico listening");
    axum::serve(listener, app).await?;
    Ok(())
}
