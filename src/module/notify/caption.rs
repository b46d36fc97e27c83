///! Alert caption builder
///!
///! Assembles the HTML caption for one notification: static watchlist
///! metadata, live telemetry, visibility statistics and map links. All
///! interpolated text is HTML-escaped, all query values URL-encoded.

use crate::config::DisplayConfig;
use crate::module::engine::AircraftRecord;
use crate::module::feed::LiveAircraft;
use crate::module::geo;
use crate::module::watchlist::WatchlistEntry;
use chrono::{DateTime, Local, Utc};

/// Escape text for Telegram HTML (parse_mode=HTML leaves quotes alone).
fn h(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Build the full notification caption.
///
/// `record` is the post-touch state of the aircraft, so the daily total is
/// `today_visible_seconds` plus the open session; `station` is the receiver
/// position for the haversine fallback when the feed has no `r_dst`.
pub fn build_caption(
    display: &DisplayConfig,
    entry: &WatchlistEntry,
    live: &LiveAircraft,
    record: &AircraftRecord,
    now: i64,
    station: Option<(f64, f64)>,
) -> String {
    let hex = entry.hex.as_str();
    let tail = non_empty(&entry.registration).or(live.registration.as_deref());
    let icao_type = non_empty(&entry.icao_type).or(live.type_code.as_deref());

    let mut lines = vec![format!("<b>{}</b>", h(&display.title))];

    let mut top = format!(
        "<b>{}</b> \u{2022} <b>ICAO:</b> <code>{}</code>",
        h(tail.unwrap_or("-")),
        h(hex)
    );
    if let Some(t) = icao_type {
        top.push_str(&format!(" \u{2022} <code>{}</code>", h(t)));
    }
    lines.push(top);

    if let Some(flight) = live.callsign() {
        lines.push(format!("<b>Flight:</b> <code>{}</code>", h(flight)));
    }
    if let Some(operator) = non_empty(&entry.operator) {
        lines.push(format!("<b>Operator:</b> {}", h(operator)));
    }
    if let Some(type_desc) = non_empty(&entry.type_desc) {
        lines.push(format!("<b>Aircraft:</b> {}", h(type_desc)));
    }

    lines.push(live_line(live, record, now, station));
    lines.push(timestamps(now));
    lines.push(display.footer.clone());

    if let Some(tags) = entry.tags_line() {
        lines.push(h(&tags));
    }

    let links = links_line(display, entry, hex);
    if !links.is_empty() {
        lines.push(links);
    }

    lines.join("\n")
}

/// The bullet-joined live telemetry line.
fn live_line(
    live: &LiveAircraft,
    record: &AircraftRecord,
    now: i64,
    station: Option<(f64, f64)>,
) -> String {
    let mut parts = Vec::new();

    if let Some(ft) = live.altitude_ft() {
        let (m, ft) = geo::fmt_alt_m_ft(ft);
        parts.push(format!(
            "<b>Alt:</b> <code>{}</code> m (<code>{}</code> ft)",
            m, ft
        ));
    }
    if let Some(gs) = live.gs {
        parts.push(format!(
            "<b>Speed:</b> <code>{}</code> km/h",
            geo::fmt_speed_kmh(gs)
        ));
    }
    if let Some(dist_km) = distance_km(live, station) {
        match live.r_dir {
            Some(dir) => parts.push(format!(
                "<b>Dist:</b> <code>{:.1}</code> km @ <code>{:.0}</code>\u{b0}",
                dist_km, dir
            )),
            None => parts.push(format!("<b>Dist:</b> <code>{:.1}</code> km", dist_km)),
        }
    }

    parts.push(format!(
        "<b>Seen today:</b> <code>{}</code>",
        geo::fmt_duration(record.visible_today_secs(now))
    ));
    parts.push(format!(
        "<b>In sight:</b> <code>{}</code>",
        geo::fmt_duration(record.in_session_secs(now))
    ));

    if let Some(seen) = live.seen {
        parts.push(format!("<b>Last msg:</b> <code>{:.0}s</code>", seen));
    }
    parts.push(format!("<b>Source:</b> <code>{}</code>", live.source_label()));

    parts.join(" \u{2022} ")
}

/// Feed-provided distance, or haversine from the station position.
fn distance_km(live: &LiveAircraft, station: Option<(f64, f64)>) -> Option<f64> {
    if let Some(dst) = live.r_dst {
        return Some(dst);
    }
    let (st_lat, st_lon) = station?;
    match (live.lat, live.lon) {
        (Some(lat), Some(lon)) => Some(geo::haversine_km(st_lat, st_lon, lat, lon)),
        _ => None,
    }
}

fn timestamps(now: i64) -> String {
    let utc = DateTime::<Utc>::from_timestamp(now, 0).unwrap_or_default();
    let local = utc.with_timezone(&Local);
    format!(
        "{} ({} UTC)",
        local.format("%d-%m-%Y %H:%M:%S"),
        utc.format("%Y-%m-%d %H:%M:%S")
    )
}

fn links_line(display: &DisplayConfig, entry: &WatchlistEntry, hex: &str) -> String {
    let mut links = Vec::new();

    if !display.tar1090_base.is_empty() {
        links.push(format!(
            "<a href=\"{}/?icao={}\">Tar1090</a>",
            display.tar1090_base,
            urlencoding::encode(hex)
        ));
    }
    if !display.airplaneslive_base.is_empty() {
        links.push(format!(
            "<a href=\"{}/?icao={}\">Airplanes.live</a>",
            display.airplaneslive_base,
            urlencoding::encode(hex)
        ));
    }
    if entry.link.starts_with("http") {
        links.push(format!("<a href=\"{}\">Info</a>", h(&entry.link)));
    }

    links.join(" | ")
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::icao::IcaoHex;
    use crate::module::watchlist::WatchlistCsvRow;

    fn display() -> DisplayConfig {
        DisplayConfig {
            title: "Skywatch Alert".to_string(),
            footer: "#adsb #alert".to_string(),
            tar1090_base: "https://map.example".to_string(),
            airplaneslive_base: String::new(),
        }
    }

    fn entry() -> WatchlistEntry {
        WatchlistEntry::from_row(WatchlistCsvRow {
            hex: "ae01ff".to_string(),
            reg: "01-0041".to_string(),
            operator: "USAF <1st> & Co".to_string(),
            type_desc: "Boeing C-40B".to_string(),
            icao_type: "B737".to_string(),
            link: "https://example.com/info".to_string(),
            tag1: "Military".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn live() -> LiveAircraft {
        LiveAircraft {
            hex: "ae01ff".to_string(),
            seen: Some(2.0),
            flight: Some("SAM041 ".to_string()),
            gs: Some(100.0),
            lat: Some(46.0),
            lon: Some(9.0),
            ..Default::default()
        }
    }

    fn record(now: i64) -> AircraftRecord {
        AircraftRecord::new(IcaoHex::parse("AE01FF").unwrap(), now - 120)
    }

    #[test]
    fn test_caption_core_content() {
        let caption = build_caption(&display(), &entry(), &live(), &record(1000), 1000, None);

        assert!(caption.starts_with("<b>Skywatch Alert</b>"));
        assert!(caption.contains("<code>AE01FF</code>"));
        assert!(caption.contains("<b>01-0041</b>"));
        assert!(caption.contains("<b>Flight:</b> <code>SAM041</code>"));
        assert!(caption.contains("<b>Speed:</b> <code>185</code> km/h"));
        assert!(caption.contains("<b>In sight:</b> <code>2m00s</code>"));
        assert!(caption.contains("#adsb #alert"));
        assert!(caption.contains("Military"));
        assert!(caption.contains("https://map.example/?icao=AE01FF"));
        assert!(caption.contains("<a href=\"https://example.com/info\">Info</a>"));
    }

    #[test]
    fn test_caption_escapes_html() {
        let caption = build_caption(&display(), &entry(), &live(), &record(1000), 1000, None);
        assert!(caption.contains("USAF &lt;1st&gt; &amp; Co"));
        assert!(!caption.contains("<1st>"));
    }

    #[test]
    fn test_distance_from_station_fallback() {
        let station = Some((45.0, 9.0));
        let caption = build_caption(&display(), &entry(), &live(), &record(1000), 1000, station);
        // ~111 km per degree of latitude
        assert!(caption.contains("<b>Dist:</b>"));

        let without = build_caption(&display(), &entry(), &live(), &record(1000), 1000, None);
        assert!(!without.contains("<b>Dist:</b>"));
    }

    #[test]
    fn test_feed_distance_beats_haversine() {
        let mut a = live();
        a.r_dst = Some(12.34);
        a.r_dir = Some(270.0);
        let caption = build_caption(&display(), &entry(), &a, &record(1000), 1000, Some((0.0, 0.0)));
        assert!(caption.contains("<code>12.3</code> km @ <code>270</code>"));
    }

    #[test]
    fn test_daily_total_includes_open_session() {
        let mut rec = record(1000); // session open for 120s
        rec.today_visible_seconds = 480;
        let caption = build_caption(&display(), &entry(), &live(), &rec, 1000, None);
        assert!(caption.contains("<b>Seen today:</b> <code>10m00s</code>"));
    }
}
