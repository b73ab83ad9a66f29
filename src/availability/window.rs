use super::schedule::Schedule;
use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;

/// Fallback picks look for things open at 10am.
pub const FALLBACK_TARGET_MINUTE: u32 = 10 * 60;
pub const LATE_NIGHT_START_HOUR: u32 = 21;
pub const MORNING_START_HOUR: u32 = 9;
pub const EVENT_LEAD_MINUTES: i64 = 30;

/// Answers time questions against a single civil timezone, pinned to one
/// instant so a whole selection request sees a consistent "now".
#[derive(Debug, Clone, Copy)]
pub struct TimeWindowEvaluator {
    tz: Tz,
    now: DateTime<Tz>,
}

impl TimeWindowEvaluator {
    pub fn new(tz: Tz, now: DateTime<Utc>) -> Self {
        Self {
            tz,
            now: now.with_timezone(&tz),
        }
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.now.with_timezone(&Utc)
    }

    pub fn local_time(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    pub fn current_minutes(&self) -> u32 {
        self.now.hour() * 60 + self.now.minute()
    }

    pub fn today(&self) -> Weekday {
        self.now.weekday()
    }

    pub fn is_late_night(&self) -> bool {
        self.now.hour() >= LATE_NIGHT_START_HOUR
    }

    pub fn is_early_morning(&self) -> bool {
        self.now.hour() < MORNING_START_HOUR
    }

    /// After 9pm the fallback looks at tomorrow, otherwise at later today.
    pub fn target_day(&self) -> Weekday {
        if self.is_late_night() {
            self.today().succ()
        } else {
            self.today()
        }
    }

    pub fn is_open_now(&self, schedule: &Schedule) -> bool {
        let open = schedule
            .hours_for(self.today())
            .map(|hours| hours.contains(self.current_minutes()))
            .unwrap_or(false);
        tracing::trace!(
            "Open check for {:?} at minute {}: {}",
            self.today(),
            self.current_minutes(),
            open
        );
        open
    }

    pub fn is_open_at_target(&self, schedule: &Schedule, target_day: Weekday) -> bool {
        schedule
            .hours_for(target_day)
            .map(|hours| hours.contains(FALLBACK_TARGET_MINUTE))
            .unwrap_or(false)
    }

    pub fn is_event_happening_now(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> bool {
        match (start, end) {
            (Some(start), Some(end)) => {
                let now = self.now_utc();
                now >= start && now <= end
            }
            _ => false,
        }
    }

    /// Starts today (local), at least 30 minutes from now, and no later than
    /// the last millisecond of the day.
    pub fn is_event_starting_soon(&self, start: DateTime<Utc>) -> bool {
        if self.local_time(start).date_naive() != self.now.date_naive() {
            return false;
        }
        if start < self.now_utc() + Duration::minutes(EVENT_LEAD_MINUTES) {
            return false;
        }
        self.end_of_day(self.now.date_naive())
            .map(|end| start <= end)
            .unwrap_or(false)
    }

    pub fn is_event_on_next_calendar_day(&self, start: DateTime<Utc>) -> bool {
        self.now.date_naive().succ_opt() == Some(self.local_time(start).date_naive())
    }

    /// Start-time range for events still worth heading out to today.
    /// `None` once less than the lead time is left in the day.
    pub fn today_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.now_utc() + Duration::minutes(EVENT_LEAD_MINUTES);
        let end = self.end_of_day(self.now.date_naive())?;
        (start <= end).then_some((start, end))
    }

    /// The whole next local calendar day.
    pub fn next_day_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let tomorrow = self.now.date_naive().succ_opt()?;
        Some((self.start_of_day(tomorrow)?, self.end_of_day(tomorrow)?))
    }

    fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        self.tz
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn end_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let last = date.and_hms_milli_opt(23, 59, 59, 999)?;
        self.tz
            .from_local_datetime(&last)
            .latest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Parse a provider timestamp. Offsets are honoured; naive timestamps are read
/// as wall-clock time in `tz`.
pub fn parse_instant(text: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    // PostgREST renders timestamptz as "2025-03-12 18:00:00+00"
    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    None
}
