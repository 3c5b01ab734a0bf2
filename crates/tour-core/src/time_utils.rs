use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::config::MonthKeyMode;
use crate::error::{ReportError, Result};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Timezone-aware timestamp parsing and calendar bucketing.
///
/// Month buckets depend on the zone: a booking made at 23:30 UTC on
/// 31 January is a February booking in Shanghai.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneHandler {
    tz: Tz,
}

impl Default for TimezoneHandler {
    fn default() -> Self {
        Self { tz: Tz::UTC }
    }
}

impl TimezoneHandler {
    /// Create a handler for `tz_name`, falling back to UTC with a warning when
    /// the name is not a recognised IANA timezone.
    pub fn new(tz_name: &str) -> Self {
        Self::try_new(tz_name).unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Self::default()
        })
    }

    /// Strict variant of [`TimezoneHandler::new`].
    pub fn try_new(tz_name: &str) -> Result<Self> {
        tz_name
            .parse::<Tz>()
            .map(|tz| Self { tz })
            .map_err(|_| ReportError::InvalidTimezone(tz_name.to_string()))
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Parse a timestamp column into UTC.
    ///
    /// Accepts RFC 3339 (with `Z` or an offset), naive date-times and bare
    /// `YYYY-MM-DD` dates. Naive values are read in the handler's zone; bare
    /// dates mean local midnight. Returns `None` for empty or unrecognised
    /// input.
    pub fn parse_timestamp(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }

        // Postgres renders timestamptz as "2024-03-15 10:00:00+00".
        const OFFSET_FMTS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%#z"];
        for fmt in OFFSET_FMTS {
            if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
        }

        const NAIVE_FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];
        for fmt in NAIVE_FMTS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return self.localize(naive);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).and_then(|naive| self.localize(naive));
        }

        warn!("TimezoneHandler: could not parse timestamp \"{}\"", s);
        None
    }

    /// Chart bucket label for `dt` in this zone.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use tour_core::config::MonthKeyMode;
    /// use tour_core::time_utils::TimezoneHandler;
    ///
    /// let handler = TimezoneHandler::new("UTC");
    /// let dt = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
    /// assert_eq!(handler.month_key(&dt, MonthKeyMode::MonthName), "Jan");
    /// assert_eq!(handler.month_key(&dt, MonthKeyMode::YearMonth), "2024-01");
    /// ```
    pub fn month_key(&self, dt: &DateTime<Utc>, mode: MonthKeyMode) -> String {
        let local = dt.with_timezone(&self.tz);
        match mode {
            MonthKeyMode::MonthName => local.format("%b").to_string(),
            MonthKeyMode::YearMonth => local.format("%Y-%m").to_string(),
        }
    }

    /// Whether `a` and `b` fall in the same calendar month and year here.
    pub fn same_month(&self, a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
        let a = a.with_timezone(&self.tz);
        let b = b.with_timezone(&self.tz);
        a.year() == b.year() && a.month() == b.month()
    }

    /// `YYYY-MM-DD` of `dt` in this zone.
    pub fn format_date(&self, dt: &DateTime<Utc>) -> String {
        dt.with_timezone(&self.tz).format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM-DD HH:MM` of `dt` in this zone.
    pub fn format_datetime(&self, dt: &DateTime<Utc>) -> String {
        dt.with_timezone(&self.tz).format("%Y-%m-%d %H:%M").to_string()
    }

    fn localize(&self, naive: chrono::NaiveDateTime) -> Option<DateTime<Utc>> {
        use chrono::TimeZone as _;
        // Ambiguous local times (DST fall-back) resolve to the earlier instant.
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
