//! dishfeed server entry point.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use dishfeed_api::{AppState, router as api_router};
use dishfeed_common::{Config, MediaUrlSigner, Metrics, config::LogFormat, signer_from_config};
use dishfeed_core::{FeedService, ReactionService, Repositories};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dishfeed=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_tracing(config.logging.format);

    info!("Starting dishfeed server...");

    let db = Arc::new(dishfeed_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    dishfeed_db::migrate(&db).await?;
    info!("Migrations completed");

    let metrics = Arc::new(Metrics::new());
    let signer: Arc<dyn MediaUrlSigner> = Arc::from(signer_from_config(&config.media)?);
    let repos = Repositories::new(&db, &metrics);

    let state = AppState {
        feed_service: FeedService::new(
            repos.clone(),
            signer,
            config.feed.clone(),
            metrics.clone(),
        ),
        reaction_service: ReactionService::new(repos, metrics.clone()),
        metrics,
    };

    let app = api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let host: IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
