//! Booking export discovery and loading.
//!
//! Reads dumps of the `bookings` table, either a JSON document (an array of
//! rows, or an object with a `data` array as the hosted store returns it) or
//! JSON lines, and converts rows into [`BookingRecord`]s. Row order is kept:
//! files are visited in path order and rows in file order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tour_core::error::{ReportError, Result};
use tour_core::models::{BookingRecord, BookingStatus};
use tour_core::time_utils::TimezoneHandler;
use tracing::{debug, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// Counters collected while loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStats {
    pub files_read: usize,
    pub rows_read: usize,
    pub records_loaded: usize,
    /// Rows that were malformed or lacked an email or creation time.
    pub rows_skipped: usize,
    /// Rows dropped because their booking id was already loaded.
    pub duplicates_dropped: usize,
}

/// Records plus the counters describing how they were obtained.
#[derive(Debug, Clone, Default)]
pub struct LoadedBookings {
    pub records: Vec<BookingRecord>,
    pub stats: LoadStats,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.json` and `.jsonl` files recursively under `data_path`, sorted
/// by path. A path to a single file is returned as-is.
pub fn find_export_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }
    if data_path.is_file() {
        return vec![data_path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_export_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load every booking under `data_path`.
///
/// Rows sharing a `booking_id` with an earlier row are dropped. Rows
/// without an id are always kept.
pub fn load_bookings(data_path: &Path, tz: &TimezoneHandler) -> Result<LoadedBookings> {
    if !data_path.exists() {
        return Err(ReportError::DataPathNotFound(data_path.to_path_buf()));
    }

    let files = find_export_files(data_path);
    if files.is_empty() {
        return Err(ReportError::NoDataFiles(data_path.to_path_buf()));
    }

    let mut loaded = LoadedBookings::default();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for file_path in &files {
        let content = std::fs::read_to_string(file_path).map_err(|source| ReportError::FileRead {
            path: file_path.clone(),
            source,
        })?;

        let rows = if is_jsonl(file_path) {
            parse_jsonl(&content, &mut loaded.stats)
        } else {
            parse_json_document(&content, &mut loaded.stats)?
        };

        loaded.stats.files_read += 1;

        for row in rows {
            let Some(record) = row.into_record(tz) else {
                loaded.stats.rows_skipped += 1;
                continue;
            };
            if let Some(id) = &record.booking_id {
                if !seen_ids.insert(id.clone()) {
                    loaded.stats.duplicates_dropped += 1;
                    continue;
                }
            }
            loaded.records.push(record);
        }
    }

    loaded.stats.records_loaded = loaded.records.len();
    debug!(
        "Loaded {} bookings from {} files ({} skipped, {} duplicates)",
        loaded.stats.records_loaded,
        loaded.stats.files_read,
        loaded.stats.rows_skipped,
        loaded.stats.duplicates_dropped
    );

    Ok(loaded)
}

/// Parse bookings from an in-memory JSON document.
pub fn parse_bookings_json(content: &str, tz: &TimezoneHandler) -> Result<Vec<BookingRecord>> {
    Ok(parse_json_document(content, &mut LoadStats::default())?
        .into_iter()
        .filter_map(|row| row.into_record(tz))
        .collect())
}

// ── Raw rows ──────────────────────────────────────────────────────────────────

/// A `bookings` row as stored, before validation.
#[derive(Debug, Default, Deserialize)]
struct RawBooking {
    #[serde(default)]
    booking_id: Option<serde_json::Value>,
    #[serde(default)]
    customer_name: Option<String>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    customer_phone: Option<String>,
    #[serde(default)]
    tour_name: Option<String>,
    #[serde(default)]
    amount: Option<serde_json::Value>,
    #[serde(default)]
    guests: Option<serde_json::Value>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    tour_date: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl RawBooking {
    /// Validate and convert. Rows without an email or a parseable
    /// `created_at` are rejected.
    fn into_record(self, tz: &TimezoneHandler) -> Option<BookingRecord> {
        let Some(customer_email) = self.customer_email.filter(|e| !e.is_empty()) else {
            warn!("Skipping booking without customer_email");
            return None;
        };
        let Some(created_at) = self.created_at.as_deref().and_then(|s| tz.parse_timestamp(s)) else {
            warn!("Skipping booking for {} without a valid created_at", customer_email);
            return None;
        };

        Some(BookingRecord {
            booking_id: self.booking_id.as_ref().and_then(value_to_string),
            customer_name: self.customer_name.unwrap_or_default(),
            customer_email,
            customer_phone: self.customer_phone,
            tour_name: self.tour_name.unwrap_or_default(),
            amount: self.amount.as_ref().and_then(value_to_string),
            guests: self
                .guests
                .as_ref()
                .and_then(serde_json::Value::as_u64)
                .and_then(|g| u32::try_from(g).ok()),
            created_at,
            tour_date: self.tour_date.as_deref().and_then(|s| tz.parse_timestamp(s)),
            status: self
                .status
                .as_deref()
                .map(BookingStatus::parse_lenient)
                .unwrap_or(BookingStatus::Pending),
        })
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_export_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("json") | Some("jsonl")
    )
}

fn is_jsonl(path: &Path) -> bool {
    path.extension().map(|ext| ext == "jsonl").unwrap_or(false)
}

/// Strings pass through; numbers are rendered. Anything else is absent.
fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A whole-file JSON export: an array, `{"data": [...]}`, or one object.
/// A JSON document; rows that do not fit a booking are counted as skipped.
fn parse_json_document(content: &str, stats: &mut LoadStats) -> Result<Vec<RawBooking>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let rows = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("data") {
            Some(serde_json::Value::Array(items)) => items,
            _ => vec![serde_json::Value::Object(map)],
        },
        _ => Vec::new(),
    };

    stats.rows_read += rows.len();
    Ok(rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<RawBooking>(row) {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!("Skipping malformed booking row: {}", e);
                stats.rows_skipped += 1;
                None
            }
        })
        .collect())
}

/// JSON lines; blank lines are ignored, malformed lines counted as skipped.
fn parse_jsonl(content: &str, stats: &mut LoadStats) -> Vec<RawBooking> {
    let mut rows = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        stats.rows_read += 1;
        match serde_json::from_str::<RawBooking>(trimmed) {
            Ok(raw) => rows.push(raw),
            Err(e) => {
                debug!("Skipping malformed line {}: {}", line_no + 1, e);
                stats.rows_skipped += 1;
            }
        }
    }
    rows
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    fn sample_row(id: &str, email: &str, created_at: &str, amount: &str) -> String {
        serde_json::json!({
            "booking_id": id,
            "customer_name": "Sarah Johnson",
            "customer_email": email,
            "tour_name": "Guangzhou Heritage Tour",
            "amount": amount,
            "created_at": created_at,
            "tour_date": "2024-04-02",
            "status": "Confirmed",
            "guests": 2
        })
        .to_string()
    }

    fn utc() -> TimezoneHandler {
        TimezoneHandler::new("UTC")
    }

    // ── find_export_files ─────────────────────────────────────────────────────

    #[test]
    fn test_find_export_files_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "b.jsonl", "");
        write_file(dir.path(), "nested/a.json", "[]");
        write_file(dir.path(), "notes.txt", "ignore me");

        let files = find_export_files(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with('b'));
        assert!(names[1].starts_with("nested"));
    }

    #[test]
    fn test_find_export_files_single_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "export.json", "[]");
        assert_eq!(find_export_files(&path), vec![path]);
    }

    #[test]
    fn test_find_export_files_nonexistent_path() {
        assert!(find_export_files(Path::new("/definitely/not/here")).is_empty());
    }

    // ── load_bookings ─────────────────────────────────────────────────────────

    #[test]
    fn test_load_jsonl_keeps_file_order() {
        let dir = TempDir::new().unwrap();
        let lines = [
            sample_row("BK2", "b@x.com", "2024-03-20T10:00:00Z", "$2,100.00"),
            sample_row("BK1", "a@x.com", "2024-03-15T10:00:00Z", "$1,250.00"),
        ];
        write_file(dir.path(), "bookings.jsonl", &lines.join("\n"));

        let loaded = load_bookings(dir.path(), &utc()).unwrap();
        let ids: Vec<&str> = loaded
            .records
            .iter()
            .filter_map(|r| r.booking_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["BK2", "BK1"]);
        assert_eq!(loaded.records[0].amount.as_deref(), Some("$2,100.00"));
        assert_eq!(loaded.records[0].guests, Some(2));
        assert_eq!(
            loaded.records[0].tour_date,
            Some(Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_load_json_array_and_data_envelope() {
        let dir = TempDir::new().unwrap();
        let row = sample_row("BK1", "a@x.com", "2024-03-15T10:00:00Z", "$10");
        let array = write_file(dir.path(), "array.json", &format!("[{row}]"));
        let envelope = write_file(dir.path(), "envelope.json", &format!("{{\"data\": [{row}]}}"));

        assert_eq!(load_bookings(&array, &utc()).unwrap().records.len(), 1);
        assert_eq!(load_bookings(&envelope, &utc()).unwrap().records.len(), 1);
    }

    #[test]
    fn test_load_skips_malformed_and_incomplete_rows() {
        let dir = TempDir::new().unwrap();
        let good = sample_row("BK1", "a@x.com", "2024-03-15T10:00:00Z", "$10");
        let no_email = sample_row("BK2", "", "2024-03-15T10:00:00Z", "$10");
        let bad_date = sample_row("BK3", "c@x.com", "someday", "$10");
        write_file(
            dir.path(),
            "bookings.jsonl",
            &["{not json", good.as_str(), "", no_email.as_str(), bad_date.as_str()].join("\n"),
        );

        let loaded = load_bookings(dir.path(), &utc()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.stats.rows_read, 4);
        assert_eq!(loaded.stats.rows_skipped, 3);
        assert_eq!(loaded.stats.records_loaded, 1);
    }

    #[test]
    fn test_load_counts_malformed_rows_in_json_document() {
        let dir = TempDir::new().unwrap();
        let good = sample_row("BK1", "a@x.com", "2024-03-15T10:00:00Z", "$10");
        let no_email = sample_row("BK2", "", "2024-03-15T10:00:00Z", "$10");
        write_file(
            dir.path(),
            "bookings.json",
            &format!("[{good}, 42, \"row\", {no_email}]"),
        );

        let loaded = load_bookings(dir.path(), &utc()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.stats.rows_read, 4);
        assert_eq!(loaded.stats.rows_skipped, 3);
        assert_eq!(loaded.stats.records_loaded, 1);
    }

    #[test]
    fn test_load_drops_duplicate_booking_ids_across_files() {
        let dir = TempDir::new().unwrap();
        let row = sample_row("BK1", "a@x.com", "2024-03-15T10:00:00Z", "$10");
        write_file(dir.path(), "a.jsonl", &row);
        write_file(dir.path(), "b.jsonl", &row);

        let loaded = load_bookings(dir.path(), &utc()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.stats.duplicates_dropped, 1);
        assert_eq!(loaded.stats.files_read, 2);
    }

    #[test]
    fn test_load_numeric_amount_and_lowercase_status() {
        let dir = TempDir::new().unwrap();
        let row = r#"{"customer_email":"a@x.com","amount":1500,"created_at":"2024-03-15 10:00:00+00","status":"confirmed"}"#;
        write_file(dir.path(), "bookings.jsonl", row);

        let loaded = load_bookings(dir.path(), &utc()).unwrap();
        let record = &loaded.records[0];
        assert_eq!(record.amount.as_deref(), Some("1500"));
        assert_eq!(record.amount_value(), 1500.0);
        assert_eq!(record.status, BookingStatus::Confirmed);
        assert!(record.booking_id.is_none());
        assert_eq!(record.customer_name, "");
    }

    #[test]
    fn test_load_missing_path_errors() {
        let err = load_bookings(Path::new("/definitely/not/here"), &utc()).unwrap_err();
        assert!(matches!(err, ReportError::DataPathNotFound(_)));
    }

    #[test]
    fn test_load_empty_directory_errors() {
        let dir = TempDir::new().unwrap();
        let err = load_bookings(dir.path(), &utc()).unwrap_err();
        assert!(matches!(err, ReportError::NoDataFiles(_)));
    }

    #[test]
    fn test_load_invalid_json_document_errors() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "broken.json", "[{");
        let err = load_bookings(&path, &utc()).unwrap_err();
        assert!(matches!(err, ReportError::JsonParse(_)));
    }

    // ── parse_bookings_json ───────────────────────────────────────────────────

    #[test]
    fn test_parse_bookings_json_in_memory() {
        let row = sample_row("BK9", "z@x.com", "2024-01-01T00:00:00Z", "$5");
        let records = parse_bookings_json(&format!("[{row}]"), &utc()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].customer_email, "z@x.com");
    }
}
