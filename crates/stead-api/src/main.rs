use std::sync::Arc;

use stead_api::config::AppConfig;
use stead_api::routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stead_api=info".parse().expect("valid directive")),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!("Starting stead-api with config: {:?}", config);

    let bind_addr = config.bind_addr.clone();
    let state = AppState::from_config(config)?;
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("stead-api listening on {}", bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
