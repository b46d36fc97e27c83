///! Live aircraft feed (readsb/tar1090)
///!
///! The feed side of the bot: parsing the periodic `aircraft.json` snapshot
///! and the receiver metadata. Read-only; all tracking state lives in the
///! engine module.

mod reader;
mod types;

pub use reader::{load_station, read_snapshot};
pub use types::{AircraftSnapshot, Altitude, LiveAircraft, ReceiverInfo};
