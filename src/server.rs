use crate::config::AppConfig;
use crate::render::STATS_FILE;
use crate::types::RunStats;
use anyhow::{Context, Result};
use axum::{extract::State, response::Json, routing::get, Router};
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

pub struct AppState {
    pub stats: Option<RunStats>,
}

/// Serves the generated heatmap plus a small stats API.
pub async fn start_server(config: AppConfig) -> Result<()> {
    let stats = load_stats(&config)?;
    if stats.is_none() {
        println!("No run stats found; generate a heatmap first for /api/stats to respond.");
    }

    let state = Arc::new(AppState { stats });

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    println!("Starting server on http://{}", addr);

    let app = Router::new()
        .route("/api/stats", get(stats_handler))
        .nest_service("/", ServeDir::new(&config.output.dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn load_stats(config: &AppConfig) -> Result<Option<RunStats>> {
    let path = config.output.dir.join(STATS_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read stats file: {:?}", path))?;
    let stats: RunStats =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse stats: {:?}", path))?;
    Ok(Some(stats))
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<Option<RunStats>> {
    Json(state.stats.clone())
}
