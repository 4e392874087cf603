//! Mushroom Classifier Server
//!
//! HTTP API exposing the trained mushroom classifier: a health check, a
//! base64 prediction endpoint, and a multipart file-upload endpoint.

mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use mushroom_vision::backend::{backend_name, default_device, DefaultBackend};
use mushroom_vision::inference::{Predictor, DEFAULT_MODEL_PATH};

use crate::state::{AppState, ServerConfig};

/// Mushroom Classifier Server
#[derive(Parser, Debug)]
#[command(name = "mushroom-vision-server")]
#[command(version)]
#[command(about = "HTTP API for mushroom edibility classification")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Path to the model snapshot
    #[arg(short, long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let config = ServerConfig {
        host: cli.host.clone(),
        port: cli.port,
        model_path: cli.model.clone(),
    };

    info!("Mushroom Classifier Server v{}", env!("CARGO_PKG_VERSION"));
    info!("  Backend: {}", backend_name());
    info!("  Model:   {}", config.model_path.display());

    // The server stays up without a model so /health keeps answering
    let device = default_device();
    let predictor = match Predictor::<DefaultBackend>::load(&config.model_path, &device) {
        Ok(predictor) => {
            info!(
                "Loaded {} snapshot trained at {}px",
                predictor.architecture(),
                predictor.image_size()
            );
            Some(predictor)
        }
        Err(e) => {
            warn!(
                "Failed to load model from {:?}: {}. Predictions will fail until \
                a snapshot is trained.",
                config.model_path, e
            );
            None
        }
    };

    let state = Arc::new(AppState::new(config, predictor));

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/predict", post(routes::predict::predict))
        .route("/predict-file", post(routes::predict::predict_file))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
