use anyhow::Result;
use spot_cycler::bin_common::{config_path_from_env, parse_args};
use std::sync::Arc;
use tracing::info;
use trader::{init_tracing, BinanceClient, Engine, EngineConfig, ShutdownManager};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = parse_args();
    let config_path = config_path_from_env(&args);
    let config = EngineConfig::load(&config_path)?;

    init_tracing(&config.log_level);
    info!("Spot Cycler starting (config: {})", config_path.display());
    config.log();

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.spawn_signal_handler();

    let client = Arc::new(BinanceClient::new(
        &config.exchange.rest_url,
        &config.exchange.ws_url,
        &config.api_key,
        &config.api_secret,
    ));

    Engine::start(config, client, shutdown).await?;

    info!("Spot Cycler exited");
    Ok(())
}
