use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use server::config::{load_tts_config, ServerConfig};
use server::{build_app, init_start_time, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting Cartesia streaming reader...");

    let config = ServerConfig::from_env();
    // Missing credential is an operator error, reported before anything
    // else starts.
    let tts = load_tts_config()?;
    init_start_time();

    info!(
        "Server configuration loaded: port={}, rate_limit={}/min, model={}, voice={}, sample_rate={}",
        config.port, config.rate_limit_per_minute, tts.model_id, tts.voice_id, tts.sample_rate
    );

    let state = AppState::new(tts, config.clone());
    let app = build_app(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT."))?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
