use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{AggregationConfig, MonthKeyMode};
use crate::error::Result;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Booking reports for the travel agency dashboard
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tour-report",
    about = "Booking reports for the travel agency dashboard",
    version
)]
pub struct Settings {
    /// Booking export: a .json/.jsonl file or a directory of them
    #[arg(long, env = "TOUR_REPORT_DATA")]
    pub data_path: Option<PathBuf>,

    /// Report section to print
    #[arg(long, default_value = "all", value_parser = ["all", "summary", "revenue", "bookings", "destinations", "customers", "segments", "dashboard"])]
    pub view: String,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Timezone for month buckets; `auto` uses the system zone
    /// [default: config file value, else auto]
    #[arg(long)]
    pub timezone: Option<String>,

    /// Month bucket key [default: config file value, else month]
    #[arg(long, value_parser = ["month", "year-month"])]
    pub month_key: Option<String>,

    /// Only aggregate bookings created in the last N months
    #[arg(long)]
    pub months_back: Option<u32>,

    /// Aggregation config file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.tour-report/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_key: Option<String>,
}

impl LastUsedParams {
    /// Default path of the persisted file: `~/.tour-report/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// The persisted file rooted at `base_dir`.
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".tour-report").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories if
    /// needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the file at `path` if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation; takes args and the persisted-file path so tests
    /// can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins. `months_back` and `config` are never persisted.
        if !is_arg_explicitly_set(&matches, "data_path") && settings.data_path.is_none() {
            settings.data_path = last.data_path;
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        // Unset here means the config file (or its defaults) decides.
        if settings.timezone.is_none() {
            settings.timezone = last.timezone;
        }
        if settings.month_key.is_none() {
            settings.month_key = last.month_key;
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone.as_deref() == Some("auto") {
            settings.timezone = Some(crate::time_utils::get_system_timezone());
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// Build the aggregation config.
    ///
    /// Timezone and month key come from the flags (or their persisted
    /// last-used values) when set, otherwise from the `--config` file.
    /// Without either, the timezone is the system zone.
    pub fn aggregation_config(&self) -> Result<AggregationConfig> {
        let mut config = match &self.config {
            Some(path) => AggregationConfig::load_from(path)?,
            None => AggregationConfig {
                timezone: crate::time_utils::get_system_timezone(),
                ..Default::default()
            },
        };
        if let Some(tz) = &self.timezone {
            config.timezone = tz.clone();
        }
        if let Some(mode) = self.month_key.as_deref().and_then(MonthKeyMode::from_cli) {
            config.month_key = mode;
        }
        config.validate()?;
        Ok(config)
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_path: s.data_path.clone(),
            view: Some(s.view.clone()),
            format: Some(s.format.clone()),
            timezone: s.timezone.clone(),
            month_key: s.month_key.clone(),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    fn settings_from(args: &[&str]) -> Settings {
        Settings::parse_from(std::iter::once("tour-report").chain(args.iter().copied()))
    }

    // ── LastUsedParams ───────────────────────────────────────────────────────

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            data_path: Some(PathBuf::from("/exports/bookings.jsonl")),
            view: Some("customers".to_string()),
            format: Some("json".to_string()),
            timezone: Some("Asia/Shanghai".to_string()),
            month_key: Some("year-month".to_string()),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.data_path, Some(PathBuf::from("/exports/bookings.jsonl")));
        assert_eq!(loaded.view, Some("customers".to_string()));
        assert_eq!(loaded.format, Some("json".to_string()));
        assert_eq!(loaded.timezone, Some("Asia/Shanghai".to_string()));
        assert_eq!(loaded.month_key, Some("year-month".to_string()));
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams {
            view: Some("revenue".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_last_used_params_save_reports_io_error() {
        let tmp = TempDir::new().expect("tempdir");
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, "").expect("write");

        let result = LastUsedParams::default().save_to(&blocker.join("last_used.json"));
        assert!(matches!(result, Err(ReportError::Io(_))));
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert!(LastUsedParams::load_from(&path).view.is_none());

        std::fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
        std::fs::write(&path, "{not json").expect("write");
        assert!(LastUsedParams::load_from(&path).view.is_none());
    }

    // ── Settings parsing ─────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = settings_from(&[]);
        assert_eq!(settings.view, "all");
        assert_eq!(settings.format, "table");
        assert!(settings.timezone.is_none());
        assert!(settings.month_key.is_none());
        assert!(settings.months_back.is_none());
        assert!(settings.config.is_none());
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_cli_flags() {
        let settings = settings_from(&[
            "--data-path",
            "/tmp/bookings.json",
            "--view",
            "destinations",
            "--format",
            "json",
            "--months-back",
            "6",
        ]);
        assert_eq!(settings.data_path, Some(PathBuf::from("/tmp/bookings.json")));
        assert_eq!(settings.view, "destinations");
        assert_eq!(settings.format, "json");
        assert_eq!(settings.months_back, Some(6));
    }

    #[test]
    fn test_settings_rejects_unknown_view() {
        let result = Settings::try_parse_from(["tour-report", "--view", "weekly"]);
        assert!(result.is_err());
    }

    // ── load_with_last_used ──────────────────────────────────────────────────

    #[test]
    fn test_load_with_last_used_merges_persisted_view() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            view: Some("customers".to_string()),
            timezone: Some("UTC".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["tour-report".into()], &config_path);
        assert_eq!(settings.view, "customers");
        assert_eq!(settings.timezone.as_deref(), Some("UTC"));
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            format: Some("json".to_string()),
            timezone: Some("UTC".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["tour-report".into(), "--format".into(), "table".into()],
            &config_path,
        );
        assert_eq!(settings.format, "table");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            view: Some("summary".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        Settings::load_with_last_used_impl(
            vec!["tour-report".into(), "--clear".into()],
            &config_path,
        );
        assert!(!config_path.exists());
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = Settings::load_with_last_used_impl(
            vec!["tour-report".into(), "--debug".into()],
            &tmp_config_path(&tmp),
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec![
                "tour-report".into(),
                "--month-key".into(),
                "year-month".into(),
                "--timezone".into(),
                "UTC".into(),
            ],
            &config_path,
        );

        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.month_key, Some("year-month".to_string()));
        assert_eq!(loaded.timezone, Some("UTC".to_string()));
    }

    // ── aggregation_config ───────────────────────────────────────────────────

    #[test]
    fn test_aggregation_config_applies_flags() {
        let settings = settings_from(&["--timezone", "Asia/Shanghai", "--month-key", "year-month"]);
        let config = settings.aggregation_config().expect("config");
        assert_eq!(config.timezone, "Asia/Shanghai");
        assert_eq!(config.month_key, MonthKeyMode::YearMonth);
        assert_eq!(config.vip_threshold, 5);
    }

    #[test]
    fn test_aggregation_config_rejects_bad_timezone() {
        let settings = settings_from(&["--timezone", "Atlantis/Capital"]);
        assert!(matches!(
            settings.aggregation_config(),
            Err(ReportError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_aggregation_config_reads_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("aggregation.json");
        std::fs::write(&path, r#"{"capacityPerTour": 25}"#).expect("write");

        let path_str = path.to_string_lossy().to_string();
        let settings = settings_from(&["--config", path_str.as_str(), "--timezone", "UTC"]);
        let config = settings.aggregation_config().expect("config");
        assert_eq!(config.capacity_per_tour, 25);
        assert_eq!(config.timezone, "UTC");
    }

    #[test]
    fn test_aggregation_config_file_keeps_timezone_and_month_key() {
        let tmp = TempDir::new().expect("tempdir");
        let file = tmp.path().join("aggregation.json");
        std::fs::write(
            &file,
            r#"{"monthKey": "year-month", "timezone": "Asia/Shanghai"}"#,
        )
        .expect("write");

        let file_str = file.to_string_lossy().to_string();
        let settings = Settings::load_with_last_used_impl(
            vec!["tour-report".into(), "--config".into(), file_str.into()],
            &tmp_config_path(&tmp),
        );
        let config = settings.aggregation_config().expect("config");
        assert_eq!(config.month_key, MonthKeyMode::YearMonth);
        assert_eq!(config.timezone, "Asia/Shanghai");
    }

    #[test]
    fn test_aggregation_config_flag_overrides_file() {
        let tmp = TempDir::new().expect("tempdir");
        let file = tmp.path().join("aggregation.json");
        std::fs::write(
            &file,
            r#"{"monthKey": "year-month", "timezone": "Asia/Shanghai"}"#,
        )
        .expect("write");

        let file_str = file.to_string_lossy().to_string();
        let settings = settings_from(&["--config", file_str.as_str(), "--month-key", "month"]);
        let config = settings.aggregation_config().expect("config");
        assert_eq!(config.month_key, MonthKeyMode::MonthName);
        assert_eq!(config.timezone, "Asia/Shanghai");
    }

    #[test]
    fn test_unset_flags_are_not_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        Settings::load_with_last_used_impl(vec!["tour-report".into()], &config_path);

        let loaded = LastUsedParams::load_from(&config_path);
        assert!(loaded.timezone.is_none());
        assert!(loaded.month_key.is_none());
    }

    #[test]
    fn test_auto_timezone_resolves_to_system_zone() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = Settings::load_with_last_used_impl(
            vec!["tour-report".into(), "--timezone".into(), "auto".into()],
            &tmp_config_path(&tmp),
        );
        assert_eq!(
            settings.timezone,
            Some(crate::time_utils::get_system_timezone())
        );
    }
}
