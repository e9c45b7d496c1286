//! Magic Canvas document server
//!
//! Serves canvas documents over HTTP so editors can load and save them.
//! Set `MAGICCANVAS_DATA_DIR` to keep documents on disk; otherwise they live in memory
//! until the process exits.

mod config;
mod routes;

use config::ServerConfig;
use routes::{AppState, router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "magiccanvas_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let store = match config.open_store() {
        Ok(store) => store,
        Err(e) => {
            error!("Could not open document store: {e}");
            std::process::exit(1);
        }
    };

    let app = router(AppState::new(store))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Could not bind {}: {e}", config.addr);
            std::process::exit(1);
        }
    };
    info!("Magic Canvas server listening on {}", config.addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {e}");
    }
}
