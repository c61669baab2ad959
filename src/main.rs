//! Skill gateway - voice assistant skill webhook adapter
//!
//! Receives skill requests over HTTP, tracks per-session request history,
//! routes each request to a named intent handler and answers with a
//! normalized response envelope.

mod api;
mod config;
mod dialog;
mod dispatcher;
mod error;
mod handler;
mod request;
mod response;
mod session;

use api::{create_router, AppState};
use config::SkillConfig;
use dispatcher::Dispatcher;
use handler::HandlerRegistry;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skill_gateway=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = match std::env::var("SKILL_CONFIG") {
        Ok(path) => {
            let path = PathBuf::from(path);
            tracing::info!(path = %path.display(), "Loading skill config");
            SkillConfig::load(&path)?
        }
        Err(_) => {
            tracing::warn!("SKILL_CONFIG not set, using built-in defaults");
            SkillConfig::default()
        }
    };

    let port: u16 = std::env::var("SKILL_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    // Handlers defined in config
    let handlers = HandlerRegistry::from_config(&config);
    tracing::info!(
        handlers = ?handlers.names(),
        launch_handler = %config.launch_request_app,
        "Handler registry initialized"
    );

    let idle_timeout = config.session_idle_timeout();
    let dispatcher = Dispatcher::new(config, handlers);
    let sessions = Arc::clone(dispatcher.sessions());

    let sweeper = idle_timeout.map(|max_idle| {
        tracing::info!(max_idle_secs = max_idle.as_secs(), "Idle session sweeping enabled");
        sessions.spawn_idle_sweeper(max_idle)
    });

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(dispatcher))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Skill gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    let cleared = sessions.clear_all().await;
    tracing::info!(cleared, "Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
