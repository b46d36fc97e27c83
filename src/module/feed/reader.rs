///! Snapshot reader
///!
///! Loads `aircraft.json` once per poll cycle and resolves the station
///! position from `receiver.json` with a config fallback.

use super::types::{AircraftSnapshot, ReceiverInfo};
use anyhow::{Context, Result};
use std::path::Path;

/// Read and parse one `aircraft.json` snapshot.
pub async fn read_snapshot(path: impl AsRef<Path>) -> Result<AircraftSnapshot> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read aircraft snapshot: {}", path.display()))?;

    let snapshot: AircraftSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse aircraft snapshot: {}", path.display()))?;

    tracing::debug!(
        "Snapshot loaded: {} aircraft (feed time {:.0})",
        snapshot.aircraft.len(),
        snapshot.now
    );

    Ok(snapshot)
}

/// Resolve the station lat/lon: `receiver.json` first, config fallback second.
///
/// Returns `None` when neither source has a position; captions then simply
/// omit the distance line.
pub async fn load_station(
    receiver_json: impl AsRef<Path>,
    fallback: Option<(f64, f64)>,
) -> Option<(f64, f64)> {
    let path = receiver_json.as_ref();

    match tokio::fs::read_to_string(path).await {
        Ok(content) => match serde_json::from_str::<ReceiverInfo>(&content) {
            Ok(ReceiverInfo {
                lat: Some(lat),
                lon: Some(lon),
            }) => return Some((lat, lon)),
            Ok(_) => tracing::debug!("receiver.json has no position: {}", path.display()),
            Err(e) => tracing::warn!("Failed to parse {}: {}", path.display(), e),
        },
        Err(e) => tracing::debug!("No receiver.json at {}: {}", path.display(), e),
    }

    fallback
}
