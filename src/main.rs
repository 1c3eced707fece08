//! Entry point for the hosting HTTP server.

use translation_structure_checker::server::{
    AppConfig,
    create_router,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let origin = std::env::var("TRANSLATION_ORIGIN").unwrap_or_default();
    let addr =
        std::env::var("TRANSLATION_CHECKER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let router = create_router(AppConfig { origin });
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "translation checker listening");
    axum::serve(listener, router).await?;

    Ok(())
}
