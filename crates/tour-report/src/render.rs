//! Plain-text tables for the terminal.
//!
//! Each report view becomes one or more aligned tables. Column widths are
//! measured in display cells so tour names with CJK characters line up.

use serde_json::{json, Value};
use tour_core::formatting::{format_amount, format_number};
use tour_core::time_utils::TimezoneHandler;
use tour_data::analysis::Report;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A titled table with an optional totals row.
#[derive(Debug, Clone)]
pub struct TextTable {
    title: String,
    columns: Vec<(String, Align)>,
    rows: Vec<Vec<String>>,
    footer: Option<Vec<String>>,
}

impl TextTable {
    pub fn new(title: &str, columns: &[(&str, Align)]) -> Self {
        Self {
            title: title.to_string(),
            columns: columns
                .iter()
                .map(|(name, align)| ((*name).to_string(), *align))
                .collect(),
            rows: Vec::new(),
            footer: None,
        }
    }

    pub fn row(mut self, cells: Vec<String>) -> Self {
        self.rows.push(cells);
        self
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = Vec<String>>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn footer(mut self, cells: Vec<String>) -> Self {
        self.footer = Some(cells);
        self
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.columns.iter().map(|(h, _)| h.width()).collect();
        for row in self.rows.iter().chain(self.footer.iter()) {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.width());
            }
        }
        widths
    }

    fn format_line(&self, cells: &[String], widths: &[usize]) -> String {
        let line = self
            .columns
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, ((_, align), width))| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                pad(cell, *width, *align)
            })
            .collect::<Vec<_>>()
            .join("  ");
        line.trim_end().to_string()
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let total_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        let headers: Vec<String> = self.columns.iter().map(|(h, _)| h.clone()).collect();

        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        out.push_str(&self.format_line(&headers, &widths));
        out.push('\n');
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        if self.rows.is_empty() {
            out.push_str("(no data)\n");
        }
        for row in &self.rows {
            out.push_str(&self.format_line(row, &widths));
            out.push('\n');
        }

        if let Some(footer) = &self.footer {
            out.push_str(&"-".repeat(total_width));
            out.push('\n');
            out.push_str(&self.format_line(footer, &widths));
            out.push('\n');
        }
        out
    }
}

fn pad(cell: &str, width: usize, align: Align) -> String {
    let fill = " ".repeat(width.saturating_sub(cell.width()));
    match align {
        Align::Left => format!("{cell}{fill}"),
        Align::Right => format!("{fill}{cell}"),
    }
}

fn count(n: u32) -> String {
    format_number(f64::from(n), 0)
}

// ── Sections ──────────────────────────────────────────────────────────────────

pub fn summary_section(report: &Report) -> String {
    let s = &report.summary;
    TextTable::new("Summary", &[("Metric", Align::Left), ("Value", Align::Right)])
        .row(vec!["Total revenue".into(), format_amount(s.total_revenue)])
        .row(vec!["Total bookings".into(), count(s.total_bookings)])
        .row(vec!["Active tours".into(), count(s.active_tours)])
        .row(vec!["Occupancy rate".into(), format!("{}%", s.occupancy_rate)])
        .render()
}

pub fn revenue_section(report: &Report) -> String {
    TextTable::new("Monthly revenue", &[("Month", Align::Left), ("Revenue", Align::Right)])
        .rows(
            report
                .monthly_revenue
                .iter()
                .map(|m| vec![m.month_label.clone(), format_amount(m.value)]),
        )
        .footer(vec!["TOTAL".into(), format_amount(report.monthly_totals.revenue)])
        .render()
}

pub fn bookings_section(report: &Report) -> String {
    let b = &report.status_breakdown;
    let monthly = TextTable::new("Monthly bookings", &[("Month", Align::Left), ("Bookings", Align::Right)])
        .rows(
            report
                .monthly_bookings
                .iter()
                .map(|m| vec![m.month_label.clone(), format_number(m.value, 0)]),
        )
        .footer(vec!["TOTAL".into(), count(report.monthly_totals.bookings)])
        .render();

    let by_status = TextTable::new("Bookings by status", &[("Status", Align::Left), ("Count", Align::Right)])
        .row(vec!["Confirmed".into(), count(b.confirmed)])
        .row(vec!["Pending".into(), count(b.pending)])
        .row(vec!["Cancelled".into(), count(b.cancelled)])
        .footer(vec!["Total".into(), count(b.total)])
        .render();

    format!("{monthly}\n{by_status}")
}

pub fn destinations_section(report: &Report) -> String {
    TextTable::new(
        "Popular destinations",
        &[("Tour", Align::Left), ("Share", Align::Right), ("Color", Align::Left)],
    )
    .rows(report.destinations.iter().map(|d| {
        vec![
            d.name.clone(),
            format!("{}%", d.percentage),
            d.color_tag.clone(),
        ]
    }))
    .render()
}

pub fn customers_section(report: &Report) -> String {
    let stats = &report.customer_stats;
    let tz = TimezoneHandler::new(&report.metadata.timezone);
    TextTable::new(
        "Customers",
        &[
            ("ID", Align::Left),
            ("Name", Align::Left),
            ("Email", Align::Left),
            ("Phone", Align::Left),
            ("Bookings", Align::Right),
            ("Spent", Align::Right),
            ("Status", Align::Left),
            ("Last booking", Align::Left),
        ],
    )
    .rows(report.customers.iter().map(|c| {
        vec![
            c.display_id.clone(),
            c.name.clone(),
            c.email.clone(),
            c.phone.clone(),
            count(c.total_bookings),
            format_amount(c.total_spent),
            c.status.as_str().to_string(),
            tz.format_date(&c.last_booking_date),
        ]
    }))
    .footer(vec![
        "TOTAL".into(),
        format!("{} customers", stats.total_customers),
        String::new(),
        String::new(),
        count(report.customers.iter().map(|c| c.total_bookings).sum()),
        format_amount(report.customers.iter().map(|c| c.total_spent).sum()),
        format!("{} VIP", stats.vip_customers),
        format!("{} this month", stats.new_this_month),
    ])
    .render()
}

pub fn segments_section(report: &Report) -> String {
    TextTable::new("Customer segments", &[("Segment", Align::Left), ("Customers", Align::Right)])
        .rows(
            report
                .customer_segments
                .iter()
                .map(|s| vec![s.segment.clone(), count(s.count)]),
        )
        .render()
}

pub fn dashboard_section(report: &Report) -> String {
    let d = &report.dashboard;
    let tz = TimezoneHandler::new(&report.metadata.timezone);
    let headline = TextTable::new("Dashboard", &[("Metric", Align::Left), ("Value", Align::Right)])
        .row(vec!["Total bookings".into(), count(d.total_bookings)])
        .row(vec!["Active customers".into(), count(d.active_customers)])
        .row(vec!["Upcoming tours".into(), count(d.upcoming_tours)])
        .row(vec!["Confirmed revenue".into(), format_amount(d.revenue)])
        .render();

    let recent = TextTable::new(
        "Recent bookings",
        &[
            ("Created", Align::Left),
            ("Customer", Align::Left),
            ("Tour", Align::Left),
            ("Amount", Align::Right),
            ("Status", Align::Left),
        ],
    )
    .rows(d.recent_bookings.iter().map(|b| {
        vec![
            tz.format_datetime(&b.created_at),
            b.customer_name.clone(),
            b.tour_name.clone(),
            format_amount(b.amount_value()),
            b.status.as_str().to_string(),
        ]
    }))
    .render();

    let departures = TextTable::new(
        "Upcoming tours",
        &[
            ("Tour", Align::Left),
            ("Date", Align::Left),
            ("Booked", Align::Right),
            ("Status", Align::Left),
        ],
    )
    .rows(d.upcoming_departures.iter().map(|t| {
        vec![
            t.tour_name.clone(),
            tz.format_date(&t.tour_date),
            format!("{}/{}", t.booked, t.capacity),
            t.availability.as_str().to_string(),
        ]
    }))
    .render();

    format!("{headline}\n{recent}\n{departures}")
}

/// Render the sections that make up `view`; `"all"` prints every section.
pub fn render_view(report: &Report, view: &str) -> Option<String> {
    let sections: Vec<fn(&Report) -> String> = match view {
        "summary" => vec![summary_section],
        "revenue" => vec![revenue_section],
        "bookings" => vec![bookings_section],
        "destinations" => vec![destinations_section],
        "customers" => vec![customers_section],
        "segments" => vec![segments_section],
        "dashboard" => vec![dashboard_section],
        "all" => vec![
            dashboard_section,
            summary_section,
            revenue_section,
            bookings_section,
            destinations_section,
            customers_section,
            segments_section,
        ],
        _ => return None,
    };
    Some(
        sections
            .into_iter()
            .map(|section| section(report))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// The JSON document for `view`; `"all"` is the whole report.
pub fn view_json(report: &Report, view: &str) -> serde_json::Result<Option<Value>> {
    let value = match view {
        "all" => serde_json::to_value(report)?,
        "summary" => serde_json::to_value(&report.summary)?,
        "revenue" => serde_json::to_value(&report.monthly_revenue)?,
        "bookings" => json!({
            "monthlyBookings": report.monthly_bookings,
            "statusBreakdown": report.status_breakdown,
        }),
        "destinations" => serde_json::to_value(&report.destinations)?,
        "customers" => json!({
            "customers": report.customers,
            "customerStats": report.customer_stats,
        }),
        "segments" => serde_json::to_value(&report.customer_segments)?,
        "dashboard" => serde_json::to_value(&report.dashboard)?,
        _ => return Ok(None),
    };
    Ok(Some(value))
}
