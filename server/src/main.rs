use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::{response::Json, routing::get, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

mod handlers;
mod jobs;

use jobs::JobRegistry;

/// Loopback only: batch requests name folders on this host.
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cors = cors_layer(std::env::var("IMAGE_REDUCER_CORS_ORIGINS").ok().as_deref())?;

    let mut app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(handlers::router(JobRegistry::new()));
    if let Some(cors) = cors {
        app = app.layer(cors);
    }
    let app = app.layer(TraceLayer::new_for_http());

    // Server address
    let addr = bind_addr(std::env::var("IMAGE_REDUCER_ADDR").ok());
    log::info!("Image Reducer Server running on http://{}", addr);
    log::info!("API endpoints:");
    log::info!("   POST   /batches      - Start a batch");
    log::info!("   GET    /batches/:id  - Batch progress and results");
    log::info!("   DELETE /batches/:id  - Cancel a running batch or forget a finished one");
    log::info!("   GET    /health       - Health check");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn bind_addr(configured: Option<String>) -> String {
    configured
        .filter(|addr| !addr.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string())
}

/// CORS for a comma-separated list of origins. No list, no CORS layer, so
/// browsers on other origins cannot drive the API.
fn cors_layer(origins: Option<&str>) -> Result<Option<CorsLayer>> {
    let origins = origins
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin {o:?}")))
        .collect::<Result<Vec<_>>>()?;

    if origins.is_empty() {
        return Ok(None);
    }
    log::info!("CORS enabled for {} origin(s)", origins.len());

    Ok(Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([axum::http::header::CONTENT_TYPE]),
    ))
}

async fn root() -> &'static str {
    "Image Reducer Server\n\nAPI Endpoints:\n  POST /batches\n  GET  /batches/:id\n  DELETE /batches/:id\n  GET  /health\n"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binds_loopback_by_default() {
        assert_eq!(bind_addr(None), "127.0.0.1:3000");
        assert_eq!(bind_addr(Some("  ".into())), "127.0.0.1:3000");
        assert_eq!(bind_addr(Some("0.0.0.0:8080".into())), "0.0.0.0:8080");
    }

    #[test]
    fn test_no_cors_without_origins() {
        assert!(cors_layer(None).unwrap().is_none());
        assert!(cors_layer(Some(" , ")).unwrap().is_none());
    }

    #[test]
    fn test_cors_for_configured_origins() {
        let layer = cors_layer(Some("http://localhost:5173, https://photos.example.org")).unwrap();
        assert!(layer.is_some());
        assert!(cors_layer(Some("http://bad\norigin")).is_err());
    }
}
