//! Aggregation parameters.
//!
//! Every threshold and constant the aggregators use lives here so that a
//! deployment can swap them without touching code. Defaults reproduce the
//! dashboard's behaviour.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::time_utils::TimezoneHandler;

/// Default chart palette, cycled by destination rank.
pub const DEFAULT_PALETTE: [&str; 6] = [
    "#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#8884d8", "#82ca9d",
];

/// Upper bound for the dashboard windows, about a century.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// How monthly chart buckets are keyed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MonthKeyMode {
    /// Short month name (`"Jan"`). The same month of different years shares
    /// one bucket.
    #[default]
    MonthName,
    /// Calendar year and month (`"2024-01"`).
    YearMonth,
}

impl MonthKeyMode {
    /// Parse the CLI spelling (`"month"` / `"year-month"`).
    pub fn from_cli(s: &str) -> Option<Self> {
        match s {
            "month" => Some(MonthKeyMode::MonthName),
            "year-month" => Some(MonthKeyMode::YearMonth),
            _ => None,
        }
    }

    pub fn as_cli(&self) -> &'static str {
        match self {
            MonthKeyMode::MonthName => "month",
            MonthKeyMode::YearMonth => "year-month",
        }
    }
}

/// Parameters shared by every aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AggregationConfig {
    /// Bookings needed for the VIP tier.
    pub vip_threshold: u32,
    /// Bookings needed for the Regular tier.
    pub regular_threshold: u32,
    /// Colour tags assigned to destinations by rank.
    pub palette: Vec<String>,
    /// Seats assumed per tour by the occupancy estimate.
    pub capacity_per_tour: u32,
    pub month_key: MonthKeyMode,
    /// IANA timezone used for month buckets and date rendering.
    pub timezone: String,
    /// Trailing window for "active" customers on the dashboard.
    pub active_window_days: i64,
    /// Leading window for "upcoming" tours on the dashboard.
    pub upcoming_window_days: i64,
    /// Number of bookings listed as recent on the dashboard.
    pub recent_limit: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            vip_threshold: 5,
            regular_threshold: 2,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            capacity_per_tour: 20,
            month_key: MonthKeyMode::MonthName,
            timezone: "UTC".to_string(),
            active_window_days: 30,
            upcoming_window_days: 30,
            recent_limit: 5,
        }
    }
}

impl AggregationConfig {
    /// Read a config file. Missing keys take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ReportError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the aggregators cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.palette.is_empty() {
            return Err(ReportError::Config("palette must not be empty".to_string()));
        }
        if self.capacity_per_tour == 0 {
            return Err(ReportError::Config(
                "capacityPerTour must be greater than zero".to_string(),
            ));
        }
        if self.regular_threshold > self.vip_threshold {
            return Err(ReportError::Config(format!(
                "regularThreshold ({}) exceeds vipThreshold ({})",
                self.regular_threshold, self.vip_threshold
            )));
        }
        for (name, days) in [
            ("activeWindowDays", self.active_window_days),
            ("upcomingWindowDays", self.upcoming_window_days),
        ] {
            if !(0..=MAX_WINDOW_DAYS).contains(&days) {
                return Err(ReportError::Config(format!(
                    "{name} must be between 0 and {MAX_WINDOW_DAYS}, got {days}"
                )));
            }
        }
        if !TimezoneHandler::validate_timezone(&self.timezone) {
            return Err(ReportError::InvalidTimezone(self.timezone.clone()));
        }
        Ok(())
    }

    /// Palette colour for the destination at `rank` (0-based).
    pub fn color_for(&self, rank: usize) -> &str {
        if self.palette.is_empty() {
            return "";
        }
        &self.palette[rank % self.palette.len()]
    }

    pub fn timezone_handler(&self) -> TimezoneHandler {
        TimezoneHandler::new(&self.timezone)
    }
}
