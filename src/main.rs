use anyhow::{Context, Result};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;
use trainsafe::api::{
    create_status_router, create_update_router, create_ws_router, StatusAppState, UpdateAppState,
    WsAppState,
};
use trainsafe::config::{self, TrainsafeConfig};
use trainsafe::state::{seed, TrainRegistry};
use trainsafe::stepper;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trainsafe=info".into()),
        )
        .init();

    info!("TrainSafe backend starting...");

    // Optional TOML config; defaults when the file is absent
    let config_path =
        std::env::var("TRAINSAFE_CONFIG").unwrap_or_else(|_| "trainsafe.toml".to_string());
    let config = if Path::new(&config_path).exists() {
        config::load_config(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", config_path, e))?
    } else {
        TrainsafeConfig::default()
    };

    // PORT env var overrides the configured port
    let port: u16 = match std::env::var("PORT") {
        Ok(v) => v.parse().context("PORT must be a valid port number")?,
        Err(_) => config.server.port,
    };

    // Seed the registry once at startup
    let world = seed::load_world(config.seed.file.as_deref())?;
    let registry = Arc::new(TrainRegistry::new(world));

    if config.stepper.enabled {
        tokio::spawn(stepper::run(
            Arc::clone(&registry),
            Duration::from_secs_f64(config.stepper.interval_seconds),
        ));
    }

    let app = Router::new()
        .merge(create_status_router(Arc::new(StatusAppState {
            registry: Arc::clone(&registry),
        })))
        .merge(create_update_router(Arc::new(UpdateAppState {
            registry: Arc::clone(&registry),
        })))
        .merge(create_ws_router(Arc::new(WsAppState {
            registry: Arc::clone(&registry),
        })))
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(addr = %addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
