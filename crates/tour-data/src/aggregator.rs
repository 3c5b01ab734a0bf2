//! Monthly revenue and booking-count rollups.
//!
//! Buckets are listed in first-seen order. With the default
//! [`MonthKeyMode::MonthName`] key, the same month of two different years
//! lands in one bucket.
//!
//! [`MonthKeyMode::MonthName`]: tour_core::config::MonthKeyMode::MonthName

use serde::Serialize;
use tour_core::config::AggregationConfig;
use tour_core::models::{BookingRecord, MonthlyMetric};

use crate::ordered::FirstSeenMap;

// ── MonthlyStats ──────────────────────────────────────────────────────────────

/// Revenue and booking totals accumulated across records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    /// Unrounded sum of normalized amounts.
    pub revenue: f64,
    pub bookings: u32,
}

impl MonthlyStats {
    /// Add a single record to the running totals.
    pub fn add_record(&mut self, record: &BookingRecord) {
        self.revenue += record.amount_value();
        self.bookings += 1;
    }
}

// ── MonthlyPeriod ─────────────────────────────────────────────────────────────

/// All bookings within one month bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPeriod {
    /// `"Jan"` or `"2024-01"`, depending on the key mode.
    pub month_label: String,
    pub stats: MonthlyStats,
}

// ── MonthlyAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that groups bookings by creation month.
pub struct MonthlyAggregator;

impl MonthlyAggregator {
    /// Group `records` by the month of `created_at`, in first-seen order.
    pub fn aggregate(records: &[BookingRecord], config: &AggregationConfig) -> Vec<MonthlyPeriod> {
        let tz = config.timezone_handler();

        let buckets = records.iter().fold(
            FirstSeenMap::<String, MonthlyStats>::new(),
            |mut map, record| {
                map.entry_or_default(tz.month_key(&record.created_at, config.month_key))
                    .add_record(record);
                map
            },
        );

        buckets
            .into_entries()
            .into_iter()
            .map(|(month_label, stats)| MonthlyPeriod { month_label, stats })
            .collect()
    }

    /// Revenue per month, rounded to whole currency units.
    pub fn revenue_series(periods: &[MonthlyPeriod]) -> Vec<MonthlyMetric> {
        periods
            .iter()
            .map(|p| MonthlyMetric {
                month_label: p.month_label.clone(),
                value: p.stats.revenue.round(),
            })
            .collect()
    }

    /// Booking count per month.
    pub fn booking_series(periods: &[MonthlyPeriod]) -> Vec<MonthlyMetric> {
        periods
            .iter()
            .map(|p| MonthlyMetric {
                month_label: p.month_label.clone(),
                value: f64::from(p.stats.bookings),
            })
            .collect()
    }

    /// Monthly revenue series straight from records.
    pub fn monthly_revenue(records: &[BookingRecord], config: &AggregationConfig) -> Vec<MonthlyMetric> {
        Self::revenue_series(&Self::aggregate(records, config))
    }

    /// Monthly booking-count series straight from records.
    pub fn monthly_bookings(records: &[BookingRecord], config: &AggregationConfig) -> Vec<MonthlyMetric> {
        Self::booking_series(&Self::aggregate(records, config))
    }

    /// Sum up the stats from all periods.
    pub fn calculate_totals(periods: &[MonthlyPeriod]) -> MonthlyStats {
        let mut totals = MonthlyStats::default();
        for period in periods {
            totals.revenue += period.stats.revenue;
            totals.bookings += period.stats.bookings;
        }
        totals
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
