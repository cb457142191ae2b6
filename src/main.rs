mod chat;
mod images;
mod import;
mod llm;
mod models;
mod pdf;
mod prompt;
mod render;
mod routes;
mod validate;

use axum::{Router, routing::{get, post}};
use routes::{AppState, deck_svg, export_pdf, generate_deck, get_chat, get_current_deck, get_deck,
             import_upload, send_chat};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use tower_http::cors::{CorsLayer, Any};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let generator = llm::from_env();
    match &generator {
        Some(g) => tracing::info!("Generation backend: {} profile", g.profile()),
        None => tracing::warn!(
            "No generation credential configured; deck and chat calls will return fallbacks"
        ),
    }
    let state = AppState::new(generator);

    let app = Router::new()
        .route("/api/deck", post(generate_deck))
        .route("/api/deck/current", get(get_current_deck))
        .route("/api/deck/:id", get(get_deck))
        .route("/api/deck/:id/svg", get(deck_svg))
        .route("/api/deck/:id/pdf", get(export_pdf))
        .route("/api/chat", post(send_chat).get(get_chat))
        .route("/api/import", post(import_upload))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state);

    let port: u16 = std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Starting server");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
