//! Destination popularity and the occupancy estimate.

use std::collections::HashSet;

use tour_core::config::AggregationConfig;
use tour_core::formatting::whole_percent;
use tour_core::models::{BookingRecord, DestinationShare};

use crate::ordered::FirstSeenMap;

/// Share of bookings per tour name.
///
/// Records with an empty tour name are not counted. Each percentage is
/// rounded on its own, so the sequence may sum to 99 or 101. Returns an
/// empty sequence when no record has a tour name.
pub fn destination_shares(
    records: &[BookingRecord],
    config: &AggregationConfig,
) -> Vec<DestinationShare> {
    let counts = records
        .iter()
        .filter(|r| !r.tour_name.is_empty())
        .fold(FirstSeenMap::<&str, u32>::new(), |mut map, record| {
            *map.entry_or_default(record.tour_name.as_str()) += 1;
            map
        });

    let total: u32 = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }

    counts
        .iter()
        .enumerate()
        .map(|(rank, (name, &count))| DestinationShare {
            name: (*name).to_string(),
            percentage: whole_percent(count, total),
            color_tag: config.color_for(rank).to_string(),
        })
        .collect()
}

/// Occupancy estimate from booking volume alone.
///
/// Assumes every tour that appears in the data offers
/// `capacity_per_tour` seats; real capacities are not consulted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupancyEstimate {
    pub total_bookings: u32,
    /// Distinct tour names, the empty name included.
    pub distinct_tours: u32,
    pub capacity_per_tour: u32,
}

impl OccupancyEstimate {
    pub fn from_records(records: &[BookingRecord], config: &AggregationConfig) -> Self {
        let distinct: HashSet<&str> = records.iter().map(|r| r.tour_name.as_str()).collect();
        Self {
            total_bookings: records.len() as u32,
            distinct_tours: distinct.len() as u32,
            capacity_per_tour: config.capacity_per_tour,
        }
    }

    /// `bookings / (tours * capacity)`; `0.0` when there are no tours.
    pub fn ratio(&self) -> f64 {
        let seats = u64::from(self.distinct_tours) * u64::from(self.capacity_per_tour);
        if seats == 0 {
            return 0.0;
        }
        f64::from(self.total_bookings) / seats as f64
    }

    /// [`OccupancyEstimate::ratio`] as a whole percentage. May exceed 100.
    pub fn percent(&self) -> u32 {
        (self.ratio() * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tour_core::models::BookingStatus;

    fn make_record(tour: &str) -> BookingRecord {
        BookingRecord {
            booking_id: None,
            customer_name: "Emily Zhang".to_string(),
            customer_email: "emily@example.com".to_string(),
            customer_phone: None,
            tour_name: tour.to_string(),
            amount: Some("$890".to_string()),
            guests: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 25, 9, 0, 0).unwrap(),
            tour_date: None,
            status: BookingStatus::Pending,
        }
    }

    fn records(tours: &[&str]) -> Vec<BookingRecord> {
        tours.iter().map(|t| make_record(t)).collect()
    }

    // ── destination_shares ────────────────────────────────────────────────────

    #[test]
    fn test_three_to_one_split() {
        let shares = destination_shares(&records(&["A", "A", "B", "A"]), &AggregationConfig::default());
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].name, "A");
        assert_eq!(shares[0].percentage, 75);
        assert_eq!(shares[1].name, "B");
        assert_eq!(shares[1].percentage, 25);
    }

    #[test]
    fn test_colors_follow_rank() {
        let shares = destination_shares(&records(&["A", "B"]), &AggregationConfig::default());
        assert_eq!(shares[0].color_tag, "#0088FE");
        assert_eq!(shares[1].color_tag, "#00C49F");
    }

    #[test]
    fn test_palette_cycles_past_its_length() {
        let config = AggregationConfig {
            palette: vec!["red".to_string(), "blue".to_string()],
            ..Default::default()
        };
        let shares = destination_shares(&records(&["A", "B", "C", "D", "E"]), &config);
        let colors: Vec<&str> = shares.iter().map(|s| s.color_tag.as_str()).collect();
        assert_eq!(colors, vec!["red", "blue", "red", "blue", "red"]);
    }

    #[test]
    fn test_rounding_drift_is_not_corrected() {
        let shares = destination_shares(&records(&["A", "B", "C"]), &AggregationConfig::default());
        let sum: u32 = shares.iter().map(|s| s.percentage).sum();
        assert!(shares.iter().all(|s| s.percentage == 33));
        assert_eq!(sum, 99);
    }

    #[test]
    fn test_empty_tour_names_are_skipped() {
        let shares = destination_shares(&records(&["", "A", ""]), &AggregationConfig::default());
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].percentage, 100);
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        assert!(destination_shares(&[], &AggregationConfig::default()).is_empty());
        assert!(destination_shares(&records(&["", ""]), &AggregationConfig::default()).is_empty());
    }

    // ── OccupancyEstimate ─────────────────────────────────────────────────────

    #[test]
    fn test_occupancy_uses_assumed_capacity() {
        // 30 bookings over 2 tours of 20 seats.
        let mut tours = vec!["A"; 20];
        tours.extend(vec!["B"; 10]);
        let estimate = OccupancyEstimate::from_records(&records(&tours), &AggregationConfig::default());
        assert_eq!(estimate.distinct_tours, 2);
        assert!((estimate.ratio() - 0.75).abs() < 1e-9);
        assert_eq!(estimate.percent(), 75);
    }

    #[test]
    fn test_occupancy_counts_empty_name_as_a_tour() {
        let estimate = OccupancyEstimate::from_records(&records(&["A", ""]), &AggregationConfig::default());
        assert_eq!(estimate.distinct_tours, 2);
    }

    #[test]
    fn test_occupancy_can_exceed_full() {
        let estimate = OccupancyEstimate::from_records(&records(&["A"; 30]), &AggregationConfig::default());
        assert_eq!(estimate.percent(), 150);
    }

    #[test]
    fn test_occupancy_empty_is_zero() {
        let estimate = OccupancyEstimate::from_records(&[], &AggregationConfig::default());
        assert_eq!(estimate.ratio(), 0.0);
        assert_eq!(estimate.percent(), 0);
    }
}
