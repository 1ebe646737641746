mod error;
mod routes;
mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use spimex_sdk::async_client::AsyncSpimexSdkBuilder;
use spimex_sdk::Settings;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env().expect("Invalid SPIMEX_* configuration");
    info!("Initializing SPIMEX SDK...");
    let sdk = AsyncSpimexSdkBuilder::from_settings(settings)
        .build()
        .await
        .expect("Failed to initialize SPIMEX SDK");

    let state = Arc::new(AppState { sdk });

    let app = Router::new()
        .route("/create_spimex", post(routes::ingest::create_spimex))
        .route("/all", get(routes::results::get_all))
        .route(
            "/get_last_trading_dates",
            get(routes::results::get_last_trading_dates),
        )
        .route("/get_dynamics", get(routes::results::get_dynamics))
        .route(
            "/get_trading_results",
            get(routes::results::get_trading_results),
        )
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = "0.0.0.0:8000";
    info!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
