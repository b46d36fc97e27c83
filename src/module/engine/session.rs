///! Session & cooldown engine
///!
///! The stateful heart of the bot. Once per poll cycle, every observed
///! aircraft gets exactly one `touch` with the cycle's shared `now`; the
///! engine decides whether its visibility session continues or closes and
///! whether a notification is due. Delivery is someone else's job: the
///! engine only learns about it through `confirm_notified`.

use super::store::{EngineError, SeenStore};
use super::types::{AircraftRecord, EngineConfig, TouchOutcome, transition};
use crate::module::icao::IcaoHex;
use std::path::Path;

pub struct SessionEngine {
    store: SeenStore,
    config: EngineConfig,
}

impl SessionEngine {
    pub fn new(store: SeenStore, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Open the engine over an on-disk state store.
    pub fn open(db_path: impl AsRef<Path>, config: EngineConfig) -> Result<Self, EngineError> {
        Ok(Self::new(SeenStore::open(db_path)?, config))
    }

    /// Engine over an in-memory store (tests, dry runs).
    pub fn in_memory(config: EngineConfig) -> Result<Self, EngineError> {
        Ok(Self::new(SeenStore::open_in_memory()?, config))
    }

    /// Process one observation of `id` at cycle time `now`.
    ///
    /// `now` is injected by the caller so a whole cycle is computed against
    /// one consistent instant; the engine never reads the clock itself.
    ///
    /// All record mutations (creation, rollover, session close) are committed
    /// here in one transaction, because they reflect what was observed.
    /// `last_notify` is not one of them: a `NotifyDue` outcome leaves it
    /// untouched until the caller confirms delivery.
    pub fn touch(
        &mut self,
        id: &IcaoHex,
        now: i64,
        observed_age: Option<f64>,
        in_watchlist: bool,
    ) -> Result<TouchOutcome, EngineError> {
        if !in_watchlist {
            return Ok(TouchOutcome::NoOp);
        }

        let tx = self.store.begin()?;
        let prev = SeenStore::get_with(&tx, id)?;
        let (next, outcome) = transition(prev, id, now, observed_age, &self.config);
        SeenStore::upsert_with(&tx, &next)?;
        tx.commit()?;

        Ok(outcome)
    }

    /// Record a confirmed delivery. Idempotent; `last_notify` only ever
    /// moves forward.
    pub fn confirm_notified(&mut self, id: &IcaoHex, now: i64) -> Result<(), EngineError> {
        if !self.store.advance_last_notify(id, now)? {
            tracing::debug!("confirm_notified({}, {}) changed nothing", id, now);
        }
        Ok(())
    }

    /// Current record for an aircraft, if it was ever tracked.
    pub fn record(&self, id: &IcaoHex) -> Result<Option<AircraftRecord>, EngineError> {
        self.store.get(id)
    }
}
