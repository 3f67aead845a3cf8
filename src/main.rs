use std::net::SocketAddr;
use std::sync::Arc;

use rag_dialog::api::{create_router, AppState};
use rag_dialog::infrastructure::{AppConfig, YandexCredentials, YandexEmbedding, YandexGpt};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rag_dialog=debug,server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let credentials = YandexCredentials::from_env()?;
    info!(folder_id = %credentials.folder_id, "credentials loaded");

    let embedding = Arc::new(YandexEmbedding::from_config(
        &config.config.embedding,
        &credentials,
    )?);
    let llm = Arc::new(YandexGpt::from_config(&config.config.llm, &credentials)?);

    let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| config.config.server.host.clone());
    let port: u16 = match std::env::var("SERVER_PORT") {
        Ok(port) => port.parse()?,
        Err(_) => config.config.server.port,
    };
    let addr = SocketAddr::new(host.parse()?, port);

    let state = AppState::initialize(config, embedding, llm).await?;
    info!("QA system initialized");
    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
