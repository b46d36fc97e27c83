///! Curated aircraft watchlists
///!
///! Remote CSV lists of interesting aircraft, mirrored locally with a TTL
///! and merged into one id -> metadata mapping. Only aircraft present here
///! are ever considered for notification.

mod cache;
mod manager;
mod types;

pub use cache::ListCache;
pub use manager::WatchlistManager;
pub use types::{ListSource, WatchlistCsvRow, WatchlistEntry};
