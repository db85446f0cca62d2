use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recipe_gateway::cli::{run_command, Cli};
use recipe_gateway::config::Config;
use recipe_gateway::session::MemorySessionStore;
use recipe_gateway::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Client subcommands talk to a running server and never load the server stack
    if cli.command.is_some() {
        return run_command(&cli).await;
    }

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting recipe-gateway v{}", env!("CARGO_PKG_VERSION"));

    config.validate()?;
    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    // Sessions live in memory; keep a typed handle for the sweeper
    let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(
        config.session.ttl_seconds,
    )));
    let state = Arc::new(AppState::new(config.clone())?.with_session_store(sessions.clone()));

    recipe_gateway::session::spawn_cleanup_task(sessions, config.session.cleanup_interval);
    if config.rate_limit.enabled {
        recipe_gateway::api::rate_limit::spawn_cleanup_task(
            state.rate_limiter.clone(),
            config.rate_limit.cleanup_interval,
        );
    }

    let mut app = recipe_gateway::api::create_router(state.clone())?;

    // Serve a built client with SPA fallback when configured
    if let Some(static_dir) = &config.server.static_dir {
        let index_file = static_dir.join("index.html");
        let serve_static = ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file));
        app = app.fallback_service(serve_static);
        tracing::info!(dir = %static_dir.display(), "Serving static client files");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!(
        environment = ?config.server.environment,
        client = %config.client.url,
        generator = state.recipes.has_generator(),
        "Gateway ready"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
