use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::normalize_amount;

/// Lifecycle state of a booking as stored in the `bookings` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Parse a status column value, ignoring case and surrounding whitespace.
    ///
    /// The store holds both `"Confirmed"` and `"confirmed"`; anything that is
    /// not recognised is treated as [`BookingStatus::Pending`].
    ///
    /// # Examples
    ///
    /// ```
    /// use tour_core::models::BookingStatus;
    ///
    /// assert_eq!(BookingStatus::parse_lenient("confirmed"), BookingStatus::Confirmed);
    /// assert_eq!(BookingStatus::parse_lenient(" CANCELLED "), BookingStatus::Cancelled);
    /// assert_eq!(BookingStatus::parse_lenient("on hold"), BookingStatus::Pending);
    /// ```
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" | "canceled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

/// A single row of the `bookings` table, as delivered by the loader.
///
/// Records are read-only to the aggregators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    /// Human-facing booking reference, e.g. `"BK001"`.
    #[serde(default)]
    pub booking_id: Option<String>,
    pub customer_name: String,
    /// Identity key for the customer roster. Compared byte-for-byte.
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub tour_name: String,
    /// Currency-formatted amount string, e.g. `"$1,500"`.
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub guests: Option<u32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tour_date: Option<DateTime<Utc>>,
    pub status: BookingStatus,
}

impl BookingRecord {
    /// Numeric value of [`BookingRecord::amount`]; `0.0` when absent or malformed.
    pub fn amount_value(&self) -> f64 {
        normalize_amount(self.amount.as_deref())
    }
}

/// Customer tier derived purely from the number of bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerTier {
    New,
    Regular,
    #[serde(rename = "VIP")]
    Vip,
}

impl CustomerTier {
    /// Classify a booking count against the VIP and regular thresholds.
    ///
    /// # Examples
    ///
    /// ```
    /// use tour_core::models::CustomerTier;
    ///
    /// assert_eq!(CustomerTier::classify(1, 5, 2), CustomerTier::New);
    /// assert_eq!(CustomerTier::classify(3, 5, 2), CustomerTier::Regular);
    /// assert_eq!(CustomerTier::classify(5, 5, 2), CustomerTier::Vip);
    /// ```
    pub fn classify(total_bookings: u32, vip_threshold: u32, regular_threshold: u32) -> Self {
        if total_bookings >= vip_threshold {
            CustomerTier::Vip
        } else if total_bookings >= regular_threshold {
            CustomerTier::Regular
        } else {
            CustomerTier::New
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerTier::New => "New",
            CustomerTier::Regular => "Regular",
            CustomerTier::Vip => "VIP",
        }
    }

    /// Label used for the tier in the customer segment breakdown.
    pub fn segment_label(&self) -> &'static str {
        match self {
            CustomerTier::New => "New Customers",
            CustomerTier::Regular => "Returning",
            CustomerTier::Vip => "VIP",
        }
    }
}

/// One row of the customer roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    /// Positional display id, e.g. `"CU001"`. Not stable across fetch orders.
    pub display_id: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub total_bookings: u32,
    pub total_spent: f64,
    pub status: CustomerTier,
    pub last_booking_date: DateTime<Utc>,
}

/// A single point of a monthly chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyMetric {
    /// Short month name (`"Jan"`) or `"2024-01"` in year-month key mode.
    pub month_label: String,
    pub value: f64,
}

/// Share of all bookings attributable to one tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationShare {
    pub name: String,
    /// Independently rounded; the sequence does not necessarily sum to 100.
    pub percentage: u32,
    pub color_tag: String,
}

/// Number of roster customers in one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSegment {
    pub segment: String,
    pub count: u32,
}

/// Booking counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub total: u32,
    pub confirmed: u32,
    pub pending: u32,
    pub cancelled: u32,
}

impl StatusBreakdown {
    pub fn add(&mut self, status: BookingStatus) {
        self.total += 1;
        match status {
            BookingStatus::Confirmed => self.confirmed += 1,
            BookingStatus::Pending => self.pending += 1,
            BookingStatus::Cancelled => self.cancelled += 1,
        }
    }
}

/// Headline numbers for the customers page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub total_customers: u32,
    pub vip_customers: u32,
    pub active_customers: u32,
    pub new_this_month: u32,
}

/// Seats left on a departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Full,
    /// Three seats or fewer left.
    Limited,
    Available,
}

impl Availability {
    pub fn from_seats(booked: u32, capacity: u32) -> Self {
        match capacity.saturating_sub(booked) {
            0 => Availability::Full,
            1..=3 => Availability::Limited,
            _ => Availability::Available,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Full => "Full",
            Availability::Limited => "Limited",
            Availability::Available => "Available",
        }
    }
}

/// One tour departure inside the upcoming window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingTour {
    pub tour_name: String,
    pub tour_date: DateTime<Utc>,
    /// Guests across the departure's bookings; a booking without a guest
    /// count holds one seat.
    pub booked: u32,
    pub capacity: u32,
    pub availability: Availability,
}

/// Headline numbers for the dashboard landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_bookings: u32,
    /// Distinct customers with a booking created in the trailing window.
    pub active_customers: u32,
    /// Bookings whose tour date falls inside the upcoming window.
    pub upcoming_tours: u32,
    /// Sum of confirmed booking amounts.
    pub revenue: f64,
    pub recent_bookings: Vec<BookingRecord>,
    /// Departures in the upcoming window, soonest first.
    pub upcoming_departures: Vec<UpcomingTour>,
}

/// Headline numbers for the reports page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_revenue: f64,
    pub total_bookings: u32,
    /// Distinct tour names, the empty name included.
    pub active_tours: u32,
    /// Estimated occupancy as a rounded percentage.
    pub occupancy_rate: u32,
}
