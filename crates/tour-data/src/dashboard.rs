//! Landing-page and bookings-page headline numbers.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use tour_core::config::AggregationConfig;
use tour_core::models::{
    Availability, BookingRecord, BookingStatus, DashboardSummary, StatusBreakdown, UpcomingTour,
};

use crate::ordered::FirstSeenMap;

/// Count bookings per status.
pub fn status_breakdown(records: &[BookingRecord]) -> StatusBreakdown {
    records.iter().fold(StatusBreakdown::default(), |mut acc, r| {
        acc.add(r.status);
        acc
    })
}

/// Headline numbers for the dashboard, relative to `now`.
///
/// * active customers: distinct emails with a booking created in the last
///   `active_window_days`.
/// * upcoming tours: bookings whose tour date lies in
///   `[now, now + upcoming_window_days]`.
/// * revenue: confirmed bookings only.
/// * recent bookings: newest `recent_limit` by creation time; ties keep input
///   order.
pub fn dashboard_summary(
    records: &[BookingRecord],
    config: &AggregationConfig,
    now: DateTime<Utc>,
) -> DashboardSummary {
    // Windows too wide for the calendar saturate at its ends.
    let active_since = Duration::try_days(config.active_window_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let upcoming_until = Duration::try_days(config.upcoming_window_days)
        .and_then(|window| now.checked_add_signed(window))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let active_customers: HashSet<&str> = records
        .iter()
        .filter(|r| r.created_at >= active_since)
        .map(|r| r.customer_email.as_str())
        .collect();

    let upcoming: Vec<&BookingRecord> = records
        .iter()
        .filter(|r| matches!(r.tour_date, Some(date) if date >= now && date <= upcoming_until))
        .collect();

    let revenue: f64 = records
        .iter()
        .filter(|r| r.status == BookingStatus::Confirmed)
        .map(BookingRecord::amount_value)
        .sum();

    // Stable sort keeps input order among equal timestamps.
    let mut recent: Vec<&BookingRecord> = records.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let recent_bookings = recent
        .into_iter()
        .take(config.recent_limit)
        .cloned()
        .collect();

    DashboardSummary {
        total_bookings: records.len() as u32,
        active_customers: active_customers.len() as u32,
        upcoming_tours: upcoming.len() as u32,
        revenue,
        recent_bookings,
        upcoming_departures: upcoming_departures(&upcoming, config),
    }
}

/// Group upcoming bookings into departures (same tour, same tour date),
/// soonest first. Seats are checked against `capacity_per_tour`.
fn upcoming_departures(upcoming: &[&BookingRecord], config: &AggregationConfig) -> Vec<UpcomingTour> {
    let booked = upcoming.iter().fold(
        FirstSeenMap::<(&str, DateTime<Utc>), u32>::new(),
        |mut map, record| {
            if let Some(date) = record.tour_date {
                *map.entry_or_default((record.tour_name.as_str(), date)) +=
                    record.guests.unwrap_or(1);
            }
            map
        },
    );

    let mut departures: Vec<UpcomingTour> = booked
        .into_entries()
        .into_iter()
        .map(|((tour_name, tour_date), booked)| UpcomingTour {
            tour_name: tour_name.to_string(),
            tour_date,
            booked,
            capacity: config.capacity_per_tour,
            availability: Availability::from_seats(booked, config.capacity_per_tour),
        })
        .collect();
    departures.sort_by_key(|d| d.tour_date);
    departures
}
