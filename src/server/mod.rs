pub mod handlers;
pub mod state;
pub mod url_validation;

use crate::config::Config;
use axum::{routing::get, Router};
use state::AppState;
use tracing::{error, info};

/// Build the full router backed by the real HTTP fetcher.
pub fn build_router(config: Config) -> Router {
    build_router_with_state(AppState::new(config))
}

/// Build the router around an existing state; tests inject a stub fetcher
/// through this.
pub fn build_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/vod.m3u8", get(handlers::vod::serve_vod))
        .route("/live.m3u8", get(handlers::live::serve_live))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::serve_metrics))
        .with_state(state)
}

/// Start the Axum HTTP server, terminating TLS itself when configured.
pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);
    let tls = config.tls.clone();
    let app = build_router(config);

    match tls {
        Some(tls) => {
            let rustls =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                    .await?;
            let socket_addr: std::net::SocketAddr = addr.parse()?;
            info!("Server listening on https://{}", addr);
            axum_server::bind_rustls(socket_addr, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
                Ok(listener) => listener,
                Err(e) => {
                    error!("Failed to bind to address {}: {}", addr, e);
                    return Err(e.into());
                }
            };
            info!("Server listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
