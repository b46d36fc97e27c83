///! Aircraft session & notification-gating engine
///!
///! Decides, for each watchlisted aircraft on each poll cycle, whether its
///! visibility session continues or closes, whether a notification is due
///! under the cooldown, and how daily visible time accumulates across
///! sessions and day boundaries.
///!
///! ## Components
///! - `transition`: the pure per-observation state transition
///! - `SeenStore`: SQLite persistence, one atomic row write per touch
///! - `SessionEngine`: ties the two together behind `touch` / `confirm_notified`

mod session;
mod store;
mod types;

pub use session::SessionEngine;
pub use store::{EngineError, SeenStore};
pub use types::{
    AircraftRecord, EngineConfig, NEVER_NOTIFIED, TouchOutcome, day_key, transition,
};
