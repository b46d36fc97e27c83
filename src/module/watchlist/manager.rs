///! Watchlist manager
///!
///! Pulls every configured list through the cache, parses the CSVs and keeps
///! the merged id -> entry mapping the poll cycle matches against.

use super::cache::ListCache;
use super::types::{ListSource, WatchlistCsvRow, WatchlistEntry};
use crate::module::icao::IcaoHex;
use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub struct WatchlistManager {
    cache: ListCache,
    sources: Vec<ListSource>,
    entries: HashMap<IcaoHex, WatchlistEntry>,
}

impl WatchlistManager {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        ttl: Duration,
        sources: Vec<ListSource>,
    ) -> Result<Self> {
        Ok(Self {
            cache: ListCache::new(cache_dir, ttl)?,
            sources,
            entries: HashMap::new(),
        })
    }

    /// Reload all lists through the TTL cache and rebuild the mapping.
    ///
    /// On id collisions, later lists override earlier ones. Individual list
    /// failures are logged and tolerated; ending a refresh with zero entries
    /// is an error (an empty watchlist would silently alert on nothing).
    pub async fn refresh(&mut self) -> Result<()> {
        let mut entries = HashMap::new();
        let mut loaded = 0usize;

        for source in &self.sources {
            match self.load_list(source).await {
                Ok(list) => {
                    loaded += 1;
                    for entry in list {
                        entries.insert(entry.hex.clone(), entry);
                    }
                }
                Err(e) => tracing::warn!("Skipping list '{}': {:#}", source.name, e),
            }
        }

        if entries.is_empty() {
            anyhow::bail!(
                "no watchlist entries loaded ({}/{} lists failed)",
                self.sources.len() - loaded,
                self.sources.len()
            );
        }

        tracing::info!(
            "Watchlist refreshed: {} entries from {}/{} lists",
            entries.len(),
            loaded,
            self.sources.len()
        );

        self.entries = entries;
        Ok(())
    }

    async fn load_list(&self, source: &ListSource) -> Result<Vec<WatchlistEntry>> {
        let path = self.cache.fetch(&source.name, &source.url).await?;
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(parse_watchlist_csv(&source.name, &content))
    }

    pub fn get(&self, hex: &IcaoHex) -> Option<&WatchlistEntry> {
        self.entries.get(hex)
    }

    pub fn contains(&self, hex: &IcaoHex) -> bool {
        self.entries.contains_key(hex)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse one list's CSV content into entries, dropping unusable rows.
pub(crate) fn parse_watchlist_csv(name: &str, content: &str) -> Vec<WatchlistEntry> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // community lists have ragged rows
        .from_reader(content.as_bytes());

    let mut entries = Vec::new();
    let mut row_count = 0usize;
    let mut dropped = 0usize;

    for result in reader.deserialize::<WatchlistCsvRow>() {
        row_count += 1;
        match result {
            Ok(row) => match WatchlistEntry::from_row(row) {
                Some(entry) => entries.push(entry),
                None => dropped += 1,
            },
            Err(e) => {
                dropped += 1;
                tracing::warn!("List '{}' row {}: {}", name, row_count, e);
            }
        }
    }

    tracing::debug!(
        "List '{}': {} rows, {} entries, {} dropped",
        name,
        row_count,
        entries.len(),
        dropped
    );

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
hex,reg,operator,type,icao_type,cmpg,tag1,tag2,tag3,category,link,img1,img2,img3,img4
4d0131,HB-JLT,Swiss,Airbus A320,A320,,Scheduled,,,CIV,https://example.com/hb-jlt,,,,
ae01ff,01-0041,USAF,Boeing C-40B,B737,,Military,VIP,,MIL,,https://example.com/images/c40b_1234.jpg,,,
badhex,XX-XXX,Nobody,,,,,,,,,,,,
abc123,I-SHRT";

    #[test]
    fn test_parse_sample() {
        let entries = parse_watchlist_csv("sample", SAMPLE_CSV);
        // badhex dropped, short row kept with defaults
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].hex.as_str(), "4D0131");
        assert_eq!(entries[1].operator, "USAF");
        assert_eq!(entries[1].tags_line().as_deref(), Some("Military | VIP"));
    }

    #[test]
    fn test_parse_short_row_pads_fields() {
        let entries = parse_watchlist_csv("sample", SAMPLE_CSV);
        let short = &entries[2];
        assert_eq!(short.hex.as_str(), "ABC123");
        assert_eq!(short.registration, "I-SHRT");
        assert_eq!(short.operator, "");
        assert!(short.photo_urls().is_empty());
    }

    #[test]
    fn test_parse_empty_content() {
        assert!(parse_watchlist_csv("empty", "").is_empty());
        assert!(parse_watchlist_csv("header-only", "hex,reg\n").is_empty());
    }

    #[tokio::test]
    async fn test_refresh_merges_with_later_lists_winning() {
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let first = "hex,reg,operator\nabc123,OLD-REG,Old Op\n";
        let second = "hex,reg,operator\nabc123,NEW-REG,New Op\nae01ff,01-0041,USAF\n";
        tokio::fs::write(dir.path().join("first.csv"), first).await.unwrap();
        tokio::fs::write(dir.path().join("second.csv"), second).await.unwrap();

        // Fresh mirrors: the dead URLs are never contacted
        let sources = vec![
            ListSource {
                name: "first".to_string(),
                url: "http://127.0.0.1:9/first.csv".to_string(),
            },
            ListSource {
                name: "second".to_string(),
                url: "http://127.0.0.1:9/second.csv".to_string(),
            },
        ];
        let mut manager =
            WatchlistManager::new(dir.path(), Duration::from_secs(900), sources).unwrap();
        manager.refresh().await.unwrap();

        assert_eq!(manager.len(), 2);
        let hex = IcaoHex::parse("abc123").unwrap();
        assert_eq!(manager.get(&hex).unwrap().registration, "NEW-REG");
        assert!(manager.contains(&IcaoHex::parse("AE01FF").unwrap()));
    }

    #[tokio::test]
    async fn test_refresh_with_nothing_loaded_is_an_error() {
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let sources = vec![ListSource {
            name: "missing".to_string(),
            url: "http://127.0.0.1:9/missing.csv".to_string(),
        }];
        let mut manager =
            WatchlistManager::new(dir.path(), Duration::from_secs(900), sources).unwrap();

        assert!(manager.refresh().await.is_err());
    }
}
