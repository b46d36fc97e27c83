use skywatch_bot::config::BotConfig;
use skywatch_bot::module::engine::SessionEngine;
use skywatch_bot::module::feed;
use skywatch_bot::module::notify::TelegramNotifier;
use skywatch_bot::module::watchlist::WatchlistManager;
use skywatch_bot::service::PollService;
use skywatch_bot::{VERSION, logging};

use anyhow::{Context, Result};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (optional path argument, defaults to ./config.toml)
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = BotConfig::load(&config_path)?;

    // Initialize logging
    let _logging_guard = logging::init_logging(
        &config.bot.log_dir,
        "skywatch",
        &config.bot.log_level,
    );

    tracing::info!("Skywatch bot v{} starting (config: {})", VERSION, config_path);

    let engine = SessionEngine::open(&config.tracking.db_path, config.tracking.engine_config())
        .with_context(|| {
            format!(
                "failed to open state store {}",
                config.tracking.db_path.display()
            )
        })?;

    let watchlist = WatchlistManager::new(
        config.watchlist.cache_dir.clone(),
        Duration::from_secs(config.watchlist.ttl_secs),
        config.watchlist.lists.clone(),
    )?;

    let notifier = TelegramNotifier::new(&config.telegram)?;

    let station = feed::load_station(&config.feed.receiver_json, config.station_fallback()).await;
    match station {
        Some((lat, lon)) => tracing::info!("Station position: {:.4}, {:.4}", lat, lon),
        None => tracing::info!("No station position, captions will omit distance"),
    }

    let interval = config.bot.poll_interval_secs;
    let mut service = PollService::new(config, watchlist, engine, Box::new(notifier), station);

    match interval {
        Some(secs) => service.run_loop(Duration::from_secs(secs)).await,
        None => {
            let report = service.run_once().await?;
            tracing::info!("Cycle complete: {}", report);
            Ok(())
        }
    }
}
