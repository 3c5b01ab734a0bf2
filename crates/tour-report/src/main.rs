mod bootstrap;
mod render;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tour_core::settings::Settings;
use tour_data::analysis::{build_report, ReportWindow};
use tour_data::reader::load_bookings;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Tour Report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("View: {}, Format: {}", settings.view, settings.format);

    let config = settings
        .aggregation_config()
        .context("invalid aggregation config")?;
    tracing::info!(
        "Timezone: {}, Month key: {}",
        config.timezone,
        config.month_key.as_cli()
    );

    let Some(data_path) = settings
        .data_path
        .clone()
        .or_else(bootstrap::discover_data_path)
    else {
        bail!(
            "no booking export found; pass --data-path or set TOUR_REPORT_DATA \
             (looked in ~/.tour-report/)"
        );
    };

    tracing::info!("Loading bookings from {}", data_path.display());
    let loaded = load_bookings(&data_path, &config.timezone_handler())
        .with_context(|| format!("failed to load bookings from {}", data_path.display()))?;
    tracing::info!(
        "Loaded {} bookings from {} files ({} rows skipped, {} duplicates dropped)",
        loaded.stats.records_loaded,
        loaded.stats.files_read,
        loaded.stats.rows_skipped,
        loaded.stats.duplicates_dropped
    );

    let window = ReportWindow {
        months_back: settings.months_back,
    };
    let report = build_report(&loaded.records, &config, window, Utc::now());

    match settings.format.as_str() {
        "json" => match render::view_json(&report, &settings.view)? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => bail!("unknown view: {}", settings.view),
        },
        _ => match render::render_view(&report, &settings.view) {
            Some(text) => print!("{text}"),
            None => bail!("unknown view: {}", settings.view),
        },
    }

    Ok(())
}
