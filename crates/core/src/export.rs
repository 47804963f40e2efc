//! CSV export and export file naming.

use chrono::{FixedOffset, NaiveDate};

use crate::reading::SensorReading;
use crate::time::format_local;

/// Column headings of the exported file.
pub const CSV_HEADER: [&str; 3] = ["Data/Hora", "Umidade (%)", "Temperatura (°C)"];

/// Placeholder for a missing value.
const MISSING: &str = "N/A";

/// Render readings as CSV: header line, then one line per reading.
///
/// Lines are joined with `\n` and there is no trailing newline. Values use
/// two decimals; a missing value is written as `N/A`.
pub fn readings_to_csv(readings: &[SensorReading], offset: &FixedOffset) -> String {
    let mut lines = Vec::with_capacity(readings.len() + 1);
    lines.push(CSV_HEADER.join(","));

    for reading in readings {
        lines.push(format!(
            "{},{},{}",
            format_local(&reading.observed_at, offset),
            format_value(reading.humidity),
            format_value(reading.temperature)
        ));
    }

    lines.join("\n")
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => MISSING.to_string(),
    }
}

/// `dados-sensor-2026-10-19.csv` style names.
pub fn export_file_name(prefix: &str, extension: &str, date: NaiveDate) -> String {
    format!("{prefix}-{}.{extension}", date.format("%Y-%m-%d"))
}

/// Default name of a CSV export made on `date`.
pub fn csv_file_name(date: NaiveDate) -> String {
    export_file_name("dados-sensor", "csv", date)
}

/// Default name of a chart export made on `date`.
pub fn chart_file_name(date: NaiveDate) -> String {
    export_file_name("grafico-sensor", "png", date)
}
