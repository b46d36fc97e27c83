///! Poll-cycle orchestration
///!
///! One cycle: read the snapshot, then for each aircraft in feed order match
///! it against the watchlist, let the engine decide, and deliver + confirm
///! when a notification is due. The whole cycle shares a single `now` so
///! every decision in it is computed against the same instant.

use crate::config::BotConfig;
use crate::module::engine::{EngineError, SessionEngine, TouchOutcome};
use crate::module::feed::{self, AircraftSnapshot};
use crate::module::icao::IcaoHex;
use crate::module::notify::{self, Notifier, build_caption};
use crate::module::watchlist::WatchlistManager;
use anyhow::Result;
use chrono::Utc;
use std::time::Duration;

/// Per-cycle counters, logged at the end of every cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Aircraft in the snapshot
    pub live: usize,
    /// Watchlisted aircraft seen this cycle
    pub matched: usize,
    /// Notifications delivered and confirmed
    pub notified: usize,
    /// Visibility sessions closed
    pub closed: usize,
    /// Aircraft skipped on storage or delivery failure
    pub failed: usize,
}

impl std::fmt::Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "live={} matched={} notified={} closed={} failed={}",
            self.live, self.matched, self.notified, self.closed, self.failed
        )
    }
}

pub struct PollService {
    config: BotConfig,
    watchlist: WatchlistManager,
    engine: SessionEngine,
    notifier: Box<dyn Notifier>,
    station: Option<(f64, f64)>,
}

impl PollService {
    pub fn new(
        config: BotConfig,
        watchlist: WatchlistManager,
        engine: SessionEngine,
        notifier: Box<dyn Notifier>,
        station: Option<(f64, f64)>,
    ) -> Self {
        Self {
            config,
            watchlist,
            engine,
            notifier,
            station,
        }
    }

    /// Run one poll cycle against the current snapshot file.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        self.watchlist.refresh().await?;
        let snapshot = feed::read_snapshot(&self.config.feed.aircraft_json).await?;
        let now = Utc::now().timestamp();
        Ok(self.process_snapshot(&snapshot, now).await)
    }

    /// Run cycles forever at the given interval, strictly sequentially.
    /// The first cycle starts immediately; a failed cycle is logged and the
    /// loop carries on.
    pub async fn run_loop(&mut self, interval: Duration) -> Result<()> {
        tracing::info!("Polling every {}s", interval.as_secs());

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.run_once().await {
                Ok(report) => tracing::info!("Cycle complete: {}", report),
                Err(e) => tracing::error!("Poll cycle failed: {:#}", e),
            }
        }
    }

    /// Process one snapshot with an injected cycle time.
    ///
    /// Individual aircraft failures (storage, delivery) are counted and
    /// skipped; they never abort the rest of the cycle.
    pub async fn process_snapshot(&mut self, snapshot: &AircraftSnapshot, now: i64) -> CycleReport {
        let mut report = CycleReport {
            live: snapshot.aircraft.len(),
            ..Default::default()
        };

        for live in &snapshot.aircraft {
            // Feed entries without a usable hex never reach the engine
            let Ok(hex) = IcaoHex::parse(&live.hex) else {
                continue;
            };

            let entry = self.watchlist.get(&hex);
            let outcome = match self.engine.touch(&hex, now, live.seen, entry.is_some()) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!("Skipping {} this cycle: {}", hex, e);
                    report.failed += 1;
                    continue;
                }
            };

            match outcome {
                TouchOutcome::NoOp => {}
                TouchOutcome::Continues => report.matched += 1,
                TouchOutcome::Closes => {
                    report.matched += 1;
                    report.closed += 1;
                    tracing::debug!("Session closed for {}", hex);
                }
                TouchOutcome::NotifyDue => {
                    report.matched += 1;
                    let Some(entry) = entry.cloned() else {
                        // touch only returns NotifyDue for watchlisted ids
                        continue;
                    };

                    match self.notify_one(&hex, &entry, live, now).await {
                        Ok(true) => report.notified += 1,
                        Ok(false) | Err(_) => report.failed += 1,
                    }
                }
            }
        }

        tracing::info!(
            "Cycle at {}: {} (watchlist {})",
            now,
            report,
            self.watchlist.len()
        );
        report
    }

    /// Deliver one due notification; commit the cooldown only on success.
    async fn notify_one(
        &mut self,
        hex: &IcaoHex,
        entry: &crate::module::watchlist::WatchlistEntry,
        live: &crate::module::feed::LiveAircraft,
        now: i64,
    ) -> Result<bool, EngineError> {
        let Some(record) = self.engine.record(hex)? else {
            tracing::warn!("No record after touch for {}", hex);
            return Ok(false);
        };

        let caption = build_caption(&self.config.display, entry, live, &record, now, self.station);
        let photos = entry.photo_urls();

        if notify::deliver(self.notifier.as_ref(), &photos, &caption, now as usize).await {
            self.engine.confirm_notified(hex, now)?;
            tracing::info!("Alert sent for {} ({})", hex, entry.registration);
            Ok(true)
        } else {
            tracing::warn!("Alert for {} undelivered, will retry after next cycle", hex);
            Ok(false)
        }
    }
}
