///! Watchlist data structures
///!
///! Curated lists are CSV files mapping ICAO addresses to static metadata
///! (registration, operator, type, tags, media links). Rows come from
///! community-maintained sources, so parsing is deliberately forgiving:
///! short rows are padded, bad rows are dropped, ids are case-normalized.

use crate::module::icao::IcaoHex;
use serde::{Deserialize, Serialize};

/// Minimum plausible length for an image URL; anything shorter is noise
const MIN_PHOTO_URL_LEN: usize = 20;

/// One remote list to watch: a short name (cache key) and its URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSource {
    pub name: String,
    pub url: String,
}

/// Raw CSV row. Every field defaults to empty so rows with fewer columns
/// than the header still deserialize.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchlistCsvRow {
    #[serde(default)]
    pub hex: String,
    #[serde(default)]
    pub reg: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default, rename = "type")]
    pub type_desc: String,
    #[serde(default)]
    pub icao_type: String,
    #[serde(default)]
    pub cmpg: String,
    #[serde(default)]
    pub tag1: String,
    #[serde(default)]
    pub tag2: String,
    #[serde(default)]
    pub tag3: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub img1: String,
    #[serde(default)]
    pub img2: String,
    #[serde(default)]
    pub img3: String,
    #[serde(default)]
    pub img4: String,
}

/// Validated watchlist entry, keyed by ICAO address.
#[derive(Debug, Clone)]
pub struct WatchlistEntry {
    pub hex: IcaoHex,
    pub registration: String,
    pub operator: String,
    pub type_desc: String,
    pub icao_type: String,
    pub campaign: String,
    pub tags: Vec<String>,
    pub category: String,
    pub link: String,
    pub images: Vec<String>,
}

impl WatchlistEntry {
    /// Build an entry from a CSV row; `None` when the id is malformed.
    pub fn from_row(row: WatchlistCsvRow) -> Option<Self> {
        let hex = IcaoHex::parse(&row.hex).ok()?;

        let tags = [row.tag1, row.tag2, row.tag3]
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let images = [row.img1, row.img2, row.img3, row.img4]
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();

        Some(Self {
            hex,
            registration: row.reg.trim().to_string(),
            operator: row.operator.trim().to_string(),
            type_desc: row.type_desc.trim().to_string(),
            icao_type: row.icao_type.trim().to_string(),
            campaign: row.cmpg.trim().to_string(),
            tags,
            category: row.category.trim().to_string(),
            link: row.link.trim().to_string(),
            images,
        })
    }

    /// Usable photo URLs, extracted and cleaned from the image fields.
    ///
    /// List maintainers paste URLs wrapped in markdown or prose; take the
    /// `https://` span, cut it at the first `]`, `)` or space, and drop
    /// leftovers too short to be a real URL.
    pub fn photo_urls(&self) -> Vec<String> {
        self.images
            .iter()
            .filter_map(|raw| clean_photo_url(raw))
            .collect()
    }

    /// Pipe-joined tag line for the caption, if any tags are set.
    pub fn tags_line(&self) -> Option<String> {
        if self.tags.is_empty() {
            None
        } else {
            Some(self.tags.join(" | "))
        }
    }
}

fn clean_photo_url(raw: &str) -> Option<String> {
    let start = raw.find("https://")?;
    let tail = &raw[start..];

    let end = tail
        .char_indices()
        .find(|&(_, c)| c == ']' || c == ')' || c == ' ')
        .map(|(i, _)| i)
        .unwrap_or(tail.len());

    let url = tail[..end].trim_end_matches(')');
    if url.len() > MIN_PHOTO_URL_LEN {
        Some(url.to_string())
    } else {
        None
    }
}
