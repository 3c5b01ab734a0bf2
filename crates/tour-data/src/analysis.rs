//! Report pipeline.
//!
//! Runs every aggregator over one materialized booking list and bundles the
//! results into a [`Report`] ready for the presentation layer.

use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use tour_core::config::{AggregationConfig, MonthKeyMode};
use tour_core::models::{
    BookingRecord, CustomerSegment, CustomerStats, CustomerSummary, DashboardSummary,
    DestinationShare, MonthlyMetric, ReportSummary, StatusBreakdown,
};
use tracing::debug;

use crate::aggregator::{MonthlyAggregator, MonthlyStats};
use crate::dashboard::{dashboard_summary, status_breakdown};
use crate::destinations::{destination_shares, OccupancyEstimate};
use crate::roster::{build_roster, customer_segments, customer_stats};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// The reference instant every relative window is measured from.
    pub generated_at: DateTime<Utc>,
    /// Records handed to the pipeline.
    pub records_received: usize,
    /// Records left after the report window was applied.
    pub records_processed: usize,
    pub months_back: Option<u32>,
    pub month_key: MonthKeyMode,
    pub timezone: String,
}

/// Every dashboard data product for one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: ReportSummary,
    pub monthly_revenue: Vec<MonthlyMetric>,
    pub monthly_bookings: Vec<MonthlyMetric>,
    /// Unrounded totals across every month bucket.
    pub monthly_totals: MonthlyStats,
    pub destinations: Vec<DestinationShare>,
    pub customers: Vec<CustomerSummary>,
    pub customer_segments: Vec<CustomerSegment>,
    pub customer_stats: CustomerStats,
    pub status_breakdown: StatusBreakdown,
    pub dashboard: DashboardSummary,
    pub metadata: ReportMetadata,
}

/// Optional restriction to recently created bookings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportWindow {
    pub months_back: Option<u32>,
}

impl ReportWindow {
    pub fn last_months(months: u32) -> Self {
        Self {
            months_back: Some(months),
        }
    }

    /// Earliest creation time kept, or `None` when unbounded.
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let months = self.months_back?;
        Some(
            now.checked_sub_months(Months::new(months))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        )
    }

    /// Records created at or after [`ReportWindow::start`], order kept.
    pub fn apply(&self, records: &[BookingRecord], now: DateTime<Utc>) -> Vec<BookingRecord> {
        match self.start(now) {
            Some(start) => records
                .iter()
                .filter(|r| r.created_at >= start)
                .cloned()
                .collect(),
            None => records.to_vec(),
        }
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Reports-page headline numbers.
pub fn report_summary(records: &[BookingRecord], config: &AggregationConfig) -> ReportSummary {
    let occupancy = OccupancyEstimate::from_records(records, config);
    ReportSummary {
        total_revenue: records.iter().map(BookingRecord::amount_value).sum(),
        total_bookings: occupancy.total_bookings,
        active_tours: occupancy.distinct_tours,
        occupancy_rate: occupancy.percent(),
    }
}

/// Run the full pipeline.
///
/// 1. Apply the report window.
/// 2. Build the monthly series, destination shares and headline summary.
/// 3. Build the customer roster, its segments and stats.
/// 4. Build the status breakdown and dashboard summary.
///
/// Deterministic: the same records, config and `now` give the same report.
pub fn build_report(
    records: &[BookingRecord],
    config: &AggregationConfig,
    window: ReportWindow,
    now: DateTime<Utc>,
) -> Report {
    // ── Step 1: Window ────────────────────────────────────────────────────────
    let records_received = records.len();
    let records_in_window = window.apply(records, now);
    let records = records_in_window.as_slice();

    // ── Step 2: Charts ────────────────────────────────────────────────────────
    let periods = MonthlyAggregator::aggregate(records, config);
    let monthly_revenue = MonthlyAggregator::revenue_series(&periods);
    let monthly_bookings = MonthlyAggregator::booking_series(&periods);
    let monthly_totals = MonthlyAggregator::calculate_totals(&periods);
    let destinations = destination_shares(records, config);
    let summary = report_summary(records, config);

    // ── Step 3: Customers ─────────────────────────────────────────────────────
    let customers = build_roster(records, config);
    let segments = customer_segments(&customers);
    let stats = customer_stats(&customers, config, now);

    // ── Step 4: Dashboard ─────────────────────────────────────────────────────
    let breakdown = status_breakdown(records);
    let dashboard = dashboard_summary(records, config, now);

    debug!(
        "Report built: {} records, {} months, {} destinations, {} customers",
        records.len(),
        periods.len(),
        destinations.len(),
        customers.len()
    );

    Report {
        summary,
        monthly_revenue,
        monthly_bookings,
        monthly_totals,
        destinations,
        customers,
        customer_segments: segments,
        customer_stats: stats,
        status_breakdown: breakdown,
        dashboard,
        metadata: ReportMetadata {
            generated_at: now,
            records_received,
            records_processed: records.len(),
            months_back: window.months_back,
            month_key: config.month_key,
            timezone: config.timezone.clone(),
        },
    }
}
