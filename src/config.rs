use crate::module::engine::EngineConfig;
use crate::module::watchlist::ListSource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level bot configuration, read from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub bot: GeneralConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub watchlist: WatchlistConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// When set, run poll cycles forever at this interval; when absent,
    /// process one snapshot and exit (external scheduler model).
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_aircraft_json")]
    pub aircraft_json: PathBuf,

    #[serde(default = "default_receiver_json")]
    pub receiver_json: PathBuf,

    /// Station position fallback when receiver.json has none
    #[serde(default)]
    pub station_lat: Option<f64>,
    #[serde(default)]
    pub station_lon: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistConfig {
    #[serde(default = "default_list_cache_dir")]
    pub cache_dir: PathBuf,

    /// Seconds a downloaded list stays fresh before it is re-fetched
    #[serde(default = "default_list_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default)]
    pub lists: Vec<ListSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Minimum seconds between two notifications for one aircraft
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: i64,

    /// Telemetry older than this ends an aircraft's visibility session
    #[serde(default = "default_max_seen_secs")]
    pub max_seen_secs: f64,
}

impl TrackingConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            cooldown_secs: self.cooldown_secs,
            max_seen_secs: self.max_seen_secs,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub chat_ids: Vec<String>,

    /// Telegram's photo caption limit
    #[serde(default = "default_caption_max")]
    pub caption_max: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_footer")]
    pub footer: String,

    /// Base URL of a tar1090 map for per-aircraft links ("" disables)
    #[serde(default)]
    pub tar1090_base: String,

    /// Base URL of an airplanes.live style map ("" disables)
    #[serde(default)]
    pub airplaneslive_base: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_aircraft_json() -> PathBuf {
    PathBuf::from("/run/readsb/aircraft.json")
}

fn default_receiver_json() -> PathBuf {
    PathBuf::from("/run/readsb/receiver.json")
}

fn default_list_cache_dir() -> PathBuf {
    PathBuf::from("/var/lib/skywatch/lists")
}

fn default_list_ttl_secs() -> u64 {
    900
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/var/lib/skywatch/state.sqlite")
}

fn default_cooldown_secs() -> i64 {
    15 * 60
}

fn default_max_seen_secs() -> f64 {
    60.0
}

fn default_caption_max() -> usize {
    1024
}

fn default_title() -> String {
    "Skywatch Alert".to_string()
}

fn default_footer() -> String {
    "#adsb #alert".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            poll_interval_secs: None,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            aircraft_json: default_aircraft_json(),
            receiver_json: default_receiver_json(),
            station_lat: None,
            station_lon: None,
        }
    }
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_list_cache_dir(),
            ttl_secs: default_list_ttl_secs(),
            lists: Vec::new(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cooldown_secs: default_cooldown_secs(),
            max_seen_secs: default_max_seen_secs(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            footer: default_footer(),
            tar1090_base: String::new(),
            airplaneslive_base: String::new(),
        }
    }
}

impl BotConfig {
    /// Load from a TOML file, then fill Telegram credentials from the
    /// environment (`TG_TOKEN`, `TG_CHAT_IDS`) when the file leaves them
    /// empty.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path, e))?;
        let mut config: BotConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path, e))?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if self.telegram.token.is_empty() {
            if let Ok(token) = std::env::var("TG_TOKEN") {
                self.telegram.token = token;
            }
        }
        if self.telegram.chat_ids.is_empty() {
            if let Ok(chats) = std::env::var("TG_CHAT_IDS") {
                self.telegram.chat_ids = chats
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }
    }

    /// Station position override from the config, if both coordinates set.
    pub fn station_fallback(&self) -> Option<(f64, f64)> {
        match (self.feed.station_lat, self.feed.station_lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}
