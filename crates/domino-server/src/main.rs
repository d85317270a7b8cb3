use domino_server::{DominoServer, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        target_score = config.room.match_config.target_score,
        hand_size = config.room.match_config.hand_size,
        strict_pass = config.room.match_config.strict_pass,
        "starting domino server"
    );

    let server = DominoServer::builder().config(&config).build().await?;
    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
