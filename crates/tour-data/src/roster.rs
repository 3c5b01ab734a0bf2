//! Customer roster built from booking history.
//!
//! Customers are keyed by their exact email string; `Ann@x.com` and
//! `ann@x.com` are two customers. Display ids are positional (`CU001` is the
//! first email seen), so the same customer can get a different id when the
//! input arrives in a different order.

use chrono::{DateTime, Utc};
use tour_core::config::AggregationConfig;
use tour_core::formatting::customer_display_id;
use tour_core::models::{BookingRecord, CustomerSegment, CustomerStats, CustomerSummary, CustomerTier};

use crate::ordered::FirstSeenMap;

const PHONE_NOT_PROVIDED: &str = "Not provided";

/// Running totals for one customer while folding over bookings.
#[derive(Debug, Clone)]
struct CustomerAccumulator {
    name: String,
    phone: String,
    bookings: u32,
    spent: f64,
    last_booking: DateTime<Utc>,
}

impl CustomerAccumulator {
    fn from_first(record: &BookingRecord) -> Self {
        let phone = record
            .customer_phone
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(PHONE_NOT_PROVIDED)
            .to_string();
        Self {
            name: record.customer_name.clone(),
            phone,
            bookings: 0,
            spent: 0.0,
            last_booking: record.created_at,
        }
    }

    fn add_record(&mut self, record: &BookingRecord) {
        self.bookings += 1;
        self.spent += record.amount_value();
        if record.created_at > self.last_booking {
            self.last_booking = record.created_at;
        }
    }
}

/// Group bookings into one [`CustomerSummary`] per email, in first-seen order.
///
/// Name and phone come from the customer's first record in the input.
pub fn build_roster(records: &[BookingRecord], config: &AggregationConfig) -> Vec<CustomerSummary> {
    let customers = records.iter().fold(
        FirstSeenMap::<&str, CustomerAccumulator>::new(),
        |mut map, record| {
            map.entry_or_insert_with(record.customer_email.as_str(), || {
                CustomerAccumulator::from_first(record)
            })
            .add_record(record);
            map
        },
    );

    customers
        .into_entries()
        .into_iter()
        .enumerate()
        .map(|(i, (email, acc))| CustomerSummary {
            display_id: customer_display_id(i + 1),
            email: email.to_string(),
            name: acc.name,
            phone: acc.phone,
            total_bookings: acc.bookings,
            total_spent: acc.spent,
            status: CustomerTier::classify(
                acc.bookings,
                config.vip_threshold,
                config.regular_threshold,
            ),
            last_booking_date: acc.last_booking,
        })
        .collect()
}

/// Number of customers per tier: new, returning, VIP.
///
/// Every tier is listed, zero counts included, unless the roster is empty.
pub fn customer_segments(roster: &[CustomerSummary]) -> Vec<CustomerSegment> {
    if roster.is_empty() {
        return Vec::new();
    }

    [CustomerTier::New, CustomerTier::Regular, CustomerTier::Vip]
        .into_iter()
        .map(|tier| CustomerSegment {
            segment: tier.segment_label().to_string(),
            count: roster.iter().filter(|c| c.status == tier).count() as u32,
        })
        .collect()
}

/// Headline customer numbers relative to `now`.
///
/// "New this month" counts customers whose latest booking falls in the same
/// calendar month as `now` in the configured timezone.
pub fn customer_stats(
    roster: &[CustomerSummary],
    config: &AggregationConfig,
    now: DateTime<Utc>,
) -> CustomerStats {
    let tz = config.timezone_handler();
    roster.iter().fold(CustomerStats::default(), |mut stats, customer| {
        stats.total_customers += 1;
        if customer.status == CustomerTier::Vip {
            stats.vip_customers += 1;
        }
        if customer.total_bookings > 0 {
            stats.active_customers += 1;
        }
        if tz.same_month(&customer.last_booking_date, &now) {
            stats.new_this_month += 1;
        }
        stats
    })
}
