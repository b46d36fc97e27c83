///! Feed data structures
///!
///! Mirrors the subset of the readsb/tar1090 `aircraft.json` schema this bot
///! consumes. Fields the decoder may omit are optional; everything else is
///! defaulted so a partially populated entry never sinks the whole snapshot.

use serde::Deserialize;

/// One decoded `aircraft.json` document.
#[derive(Debug, Clone, Deserialize)]
pub struct AircraftSnapshot {
    /// Feed-side wall clock (seconds since epoch, fractional)
    #[serde(default)]
    pub now: f64,

    /// Currently tracked aircraft, in feed order
    #[serde(default)]
    pub aircraft: Vec<LiveAircraft>,
}

/// Barometric/geometric altitude: a number of feet, or the literal
/// string `"ground"` when the aircraft reports weight-on-wheels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Altitude {
    Feet(f64),
    Special(String),
}

impl Altitude {
    /// Altitude in feet; `"ground"` maps to 0, other strings to `None`.
    pub fn feet(&self) -> Option<f64> {
        match self {
            Altitude::Feet(ft) => Some(*ft),
            Altitude::Special(s) if s.eq_ignore_ascii_case("ground") => Some(0.0),
            Altitude::Special(_) => None,
        }
    }
}

/// One live aircraft entry from the snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveAircraft {
    /// Raw ICAO hex address as emitted by the decoder (unvalidated)
    #[serde(default)]
    pub hex: String,

    /// Seconds since the last message from this aircraft
    pub seen: Option<f64>,

    /// Callsign/flight number (decoder pads with spaces)
    pub flight: Option<String>,

    /// Registration ("tail number")
    #[serde(rename = "r")]
    pub registration: Option<String>,

    /// ICAO type code (e.g. "A320")
    #[serde(rename = "t")]
    pub type_code: Option<String>,

    pub alt_baro: Option<Altitude>,
    pub alt_geom: Option<Altitude>,

    /// Ground speed in knots
    pub gs: Option<f64>,

    pub lat: Option<f64>,
    pub lon: Option<f64>,

    /// Distance from the receiver in km, when the decoder provides it
    pub r_dst: Option<f64>,

    /// Bearing from the receiver in degrees
    pub r_dir: Option<f64>,

    /// Receivers contributing MLAT-derived fields (non-empty => MLAT)
    #[serde(default)]
    pub mlat: Vec<String>,

    /// Fields sourced from TIS-B (non-empty => TIS-B)
    #[serde(default)]
    pub tisb: Vec<String>,
}

impl LiveAircraft {
    /// Preferred altitude: barometric, falling back to geometric.
    pub fn altitude_ft(&self) -> Option<f64> {
        self.alt_baro
            .as_ref()
            .or(self.alt_geom.as_ref())
            .and_then(Altitude::feet)
    }

    /// Trimmed callsign, if any.
    pub fn callsign(&self) -> Option<&str> {
        self.flight.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Label for where this position came from.
    pub fn source_label(&self) -> &'static str {
        if !self.mlat.is_empty() {
            "MLAT"
        } else if !self.tisb.is_empty() {
            "TIS-B"
        } else {
            "ADS-B"
        }
    }
}

/// Receiver metadata (`receiver.json`), used for the station position.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiverInfo {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}
