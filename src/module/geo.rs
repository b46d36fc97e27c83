///! Geometry and unit helpers
///!
///! Pure, stateless conversions used by the caption builder: great-circle
///! distance, knots to km/h, feet to meters, and human-readable durations.

/// Knots to kilometers per hour
pub const KNOTS_TO_KMH: f64 = 1.852;

/// Feet to meters
pub const FT_TO_M: f64 = 0.3048;

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two lat/lon points in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Format a duration in seconds as "1h05m", "4m09s" or "32s".
///
/// Negative inputs are clamped to zero.
pub fn fmt_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let (minutes, s) = (secs / 60, secs % 60);
    let (h, m) = (minutes / 60, minutes % 60);
    if h > 0 {
        format!("{}h{:02}m", h, m)
    } else if m > 0 {
        format!("{}m{:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// Ground speed in km/h, rounded to whole units.
pub fn fmt_speed_kmh(knots: f64) -> String {
    format!("{:.0}", knots * KNOTS_TO_KMH)
}

/// Altitude as (meters, feet) strings, both rounded to whole units.
pub fn fmt_alt_m_ft(feet: f64) -> (String, String) {
    (format!("{:.0}", feet * FT_TO_M), format!("{:.0}", feet))
}
