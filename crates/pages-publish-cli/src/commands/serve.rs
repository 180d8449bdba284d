use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result, bail};
use axum::Router;
use axum::http::{HeaderName, HeaderValue, header};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Static preview of `root`. Every response allows any origin and disables
/// caching, so edits show up on reload.
pub fn router(root: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root).append_index_html_on_directories(true))
        .layer(always(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .layer(always(header::ACCESS_CONTROL_ALLOW_METHODS, "GET"))
        .layer(always(
            header::CACHE_CONTROL,
            "no-store, no-cache, must-revalidate",
        ))
        .layer(TraceLayer::new_for_http())
}

fn always(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Serve `root` on all interfaces until Ctrl+C.
pub async fn run(root: &Path, port: u16) -> Result<()> {
    if !root.is_dir() {
        bail!("not a directory: {}", root.display());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    println!("Starting server at http://localhost:{port}");
    println!("Serving files from: {}", root.display());
    println!("Press Ctrl+C to stop the server");

    axum::serve(listener, router(root))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    println!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
