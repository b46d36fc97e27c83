///! Session tracking state and transitions
///!
///! One `AircraftRecord` per ICAO address carries everything the bot
///! remembers between poll cycles: the last successful notification, the
///! start of the current visibility session, and how long the aircraft has
///! already been visible today. The `transition` function below is the whole
///! decision logic, kept free of I/O so it can be tested without a store.

use crate::module::icao::IcaoHex;
use chrono::{DateTime, Local, Utc};

/// Sentinel for "never notified" in `last_notify`
pub const NEVER_NOTIFIED: i64 = 0;

/// Engine tuning knobs, passed in explicitly (never read from globals).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum seconds between two notifications for the same aircraft
    pub cooldown_secs: i64,

    /// Telemetry older than this many seconds ends the visibility session
    pub max_seen_secs: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 15 * 60,
            max_seen_secs: 60.0,
        }
    }
}

/// What one `touch` call decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    /// Not watchlisted: nothing recorded, nothing to do
    NoOp,
    /// Session still running, cooldown not yet expired
    Continues,
    /// Telemetry went stale: session time folded into the daily total
    Closes,
    /// Fresh telemetry and cooldown expired (or never notified)
    NotifyDue,
}

/// Persistent per-aircraft tracking state (one row in the `seen` table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AircraftRecord {
    pub id: IcaoHex,

    /// Time of the last successfully delivered notification,
    /// `NEVER_NOTIFIED` before the first one. Monotonic once set.
    pub last_notify: i64,

    /// Start of the current uninterrupted visibility session
    pub session_start: i64,

    /// Local-time calendar day (`YYYY-MM-DD`) the daily counter refers to
    pub day: String,

    /// Seconds visible on `day`, closed sessions only. The open session's
    /// elapsed time is added on read, see [`AircraftRecord::visible_today_secs`].
    pub today_visible_seconds: i64,
}

impl AircraftRecord {
    /// Fresh record for an aircraft observed for the first time.
    pub fn new(id: IcaoHex, now: i64) -> Self {
        Self {
            id,
            last_notify: NEVER_NOTIFIED,
            session_start: now,
            day: day_key(now),
            today_visible_seconds: 0,
        }
    }

    pub fn never_notified(&self) -> bool {
        self.last_notify <= NEVER_NOTIFIED
    }

    /// Elapsed seconds of the currently open session.
    pub fn in_session_secs(&self, now: i64) -> i64 {
        (now - self.session_start).max(0)
    }

    /// Live total of seconds visible today, open session included.
    pub fn visible_today_secs(&self, now: i64) -> i64 {
        self.today_visible_seconds + self.in_session_secs(now)
    }
}

/// Calendar-day key for a unix timestamp, in the host's local time zone.
///
/// The key's meaning depends on the host TZ staying stable while the bot
/// runs; a mid-operation TZ change shifts day boundaries and is not handled.
pub fn day_key(now: i64) -> String {
    DateTime::<Utc>::from_timestamp(now, 0)
        .unwrap_or_default()
        .with_timezone(&Local)
        .format("%Y-%m-%d")
        .to_string()
}

/// Compute the next record and outcome for one observation of a watchlisted
/// aircraft. Pure: no clock reads, no storage.
///
/// `observed_age` is the feed's `seen` value; `None` (field absent) counts
/// as fresh, matching the decoder's behavior for just-arrived aircraft.
///
/// `last_notify` is deliberately never modified here: it only advances via
/// [`super::SessionEngine::confirm_notified`] once delivery is confirmed, so
/// a failed send is retried on the next eligible cycle.
pub fn transition(
    prev: Option<AircraftRecord>,
    id: &IcaoHex,
    now: i64,
    observed_age: Option<f64>,
    config: &EngineConfig,
) -> (AircraftRecord, TouchOutcome) {
    let mut record = prev.unwrap_or_else(|| AircraftRecord::new(id.clone(), now));

    // Day rollover: the daily counter restarts, the cooldown clock does not.
    // A session spanning midnight keeps running; for accounting purposes it
    // is treated as restarted at the rollover instant.
    let today = day_key(now);
    if record.day != today {
        record.day = today;
        record.today_visible_seconds = 0;
        record.session_start = now;
    }

    // Stale telemetry ends the session: fold the elapsed time into the daily
    // total and advance the session start. Never a notify decision here.
    if let Some(age) = observed_age {
        if age > config.max_seen_secs {
            record.today_visible_seconds += record.in_session_secs(now);
            record.session_start = now;
            return (record, TouchOutcome::Closes);
        }
    }

    let due = record.never_notified() || now - record.last_notify >= config.cooldown_secs;
    let outcome = if due {
        TouchOutcome::NotifyDue
    } else {
        TouchOutcome::Continues
    };

    (record, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn id() -> IcaoHex {
        IcaoHex::parse("ABC123").unwrap()
    }

    fn config() -> EngineConfig {
        EngineConfig {
            cooldown_secs: 900,
            max_seen_secs: 60.0,
        }
    }

    /// Noon local time on the given date, as a unix timestamp. Keeps the
    /// rollover tests deterministic in any host time zone.
    fn local_noon(year: i32, month: u32, day: u32) -> i64 {
        Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .unwrap()
            .timestamp()
    }

    #[test]
    fn test_first_observation_is_notify_due() {
        let (record, outcome) = transition(None, &id(), 1000, Some(0.5), &config());
        assert_eq!(outcome, TouchOutcome::NotifyDue);
        assert_eq!(record.last_notify, NEVER_NOTIFIED);
        assert_eq!(record.session_start, 1000);
        assert_eq!(record.today_visible_seconds, 0);
    }

    #[test]
    fn test_cooldown_boundary_inclusive() {
        let mut record = AircraftRecord::new(id(), 1000);
        record.last_notify = 1000;

        // 1499s: 499s since notify, cooldown 900 -> still cooling down
        let (_, outcome) = transition(Some(record.clone()), &id(), 1499, Some(1.0), &config());
        assert_eq!(outcome, TouchOutcome::Continues);

        // 1900s: exactly cooldown_secs later -> due again
        let (_, outcome) = transition(Some(record), &id(), 1900, Some(1.0), &config());
        assert_eq!(outcome, TouchOutcome::NotifyDue);
    }

    #[test]
    fn test_missing_age_counts_as_fresh() {
        let (_, outcome) = transition(None, &id(), 1000, None, &config());
        assert_eq!(outcome, TouchOutcome::NotifyDue);
    }

    #[test]
    fn test_stale_telemetry_closes_session() {
        let record = AircraftRecord::new(id(), 1000);

        let (next, outcome) = transition(Some(record), &id(), 2000, Some(120.0), &config());
        assert_eq!(outcome, TouchOutcome::Closes);
        assert_eq!(next.today_visible_seconds, 1000);
        assert_eq!(next.session_start, 2000);
    }

    #[test]
    fn test_close_folds_time_up_to_the_closing_call() {
        // Session runs fresh at t0..tn, goes stale at tn+1: the fold covers
        // tn+1 - t0, not tn - t0.
        let cfg = config();
        let (mut record, _) = transition(None, &id(), 100, Some(1.0), &cfg);
        for t in [130, 160, 190] {
            let (next, outcome) = transition(Some(record), &id(), t, Some(1.0), &cfg);
            assert_eq!(outcome, TouchOutcome::NotifyDue); // never confirmed
            record = next;
        }

        let (closed, outcome) = transition(Some(record), &id(), 220, Some(300.0), &cfg);
        assert_eq!(outcome, TouchOutcome::Closes);
        assert_eq!(closed.today_visible_seconds, 120); // 220 - 100
        assert_eq!(closed.session_start, 220);
    }

    #[test]
    fn test_close_never_notifies() {
        // Cooldown long expired AND telemetry stale: closing wins, no notify.
        let mut record = AircraftRecord::new(id(), 0);
        record.last_notify = 1;

        let (_, outcome) = transition(Some(record), &id(), 100_000, Some(999.0), &config());
        assert_eq!(outcome, TouchOutcome::Closes);
    }

    #[test]
    fn test_repeated_closes_fold_nothing_extra() {
        let record = AircraftRecord::new(id(), 1000);
        let (closed, _) = transition(Some(record), &id(), 1500, Some(120.0), &config());
        assert_eq!(closed.today_visible_seconds, 500);

        // Still stale on the next cycle: session_start already advanced, so
        // only the inter-cycle gap is folded.
        let (closed2, outcome) = transition(Some(closed), &id(), 1530, Some(120.0), &config());
        assert_eq!(outcome, TouchOutcome::Closes);
        assert_eq!(closed2.today_visible_seconds, 530);
    }

    #[test]
    fn test_day_rollover_resets_counter_once() {
        let day1 = local_noon(2025, 6, 1);
        let day2 = local_noon(2025, 6, 2);

        let mut record = AircraftRecord::new(id(), day1);
        record.today_visible_seconds = 3600;
        record.last_notify = day1;

        // First touch after midnight: counter and session restart
        let (next, _) = transition(Some(record), &id(), day2, Some(1.0), &config());
        assert_eq!(next.today_visible_seconds, 0);
        assert_eq!(next.session_start, day2);
        assert_eq!(next.day, day_key(day2));
        // ...but the cooldown clock is untouched
        assert_eq!(next.last_notify, day1);

        // Further touches within the same day never reset again
        let (again, _) = transition(Some(next), &id(), day2 + 300, Some(1.0), &config());
        assert_eq!(again.day, day_key(day2));
        let (folded, outcome) = transition(Some(again), &id(), day2 + 600, Some(120.0), &config());
        assert_eq!(outcome, TouchOutcome::Closes);
        assert_eq!(folded.today_visible_seconds, 600);
    }

    #[test]
    fn test_rollover_and_close_in_one_call() {
        // Stale observation that is also the first touch of a new day: the
        // rollover zeroes the counter and restarts the session first, so the
        // close folds nothing from yesterday.
        let day1 = local_noon(2025, 6, 1);
        let day2 = local_noon(2025, 6, 2);

        let mut record = AircraftRecord::new(id(), day1);
        record.today_visible_seconds = 7200;

        let (next, outcome) = transition(Some(record), &id(), day2, Some(600.0), &config());
        assert_eq!(outcome, TouchOutcome::Closes);
        assert_eq!(next.today_visible_seconds, 0);
        assert_eq!(next.session_start, day2);
    }

    #[test]
    fn test_transition_never_advances_last_notify() {
        let mut record = AircraftRecord::new(id(), 1000);
        record.last_notify = 1000;

        let (next, _) = transition(Some(record), &id(), 5000, Some(1.0), &config());
        assert_eq!(next.last_notify, 1000);
    }

    #[test]
    fn test_visible_today_includes_open_session() {
        let mut record = AircraftRecord::new(id(), 1000);
        record.today_visible_seconds = 300;
        assert_eq!(record.visible_today_secs(1200), 500);
        assert_eq!(record.in_session_secs(1200), 200);
        // session_start <= now is an invariant, but reads stay sane anyway
        assert_eq!(record.in_session_secs(900), 0);
    }
}
