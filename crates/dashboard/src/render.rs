//! Plain-text rendering of the dashboard view.

use std::io::{self, Write};

use chrono::FixedOffset;
use silo_core::reading::SensorReading;
use silo_core::stats::StatsDisplay;
use silo_core::table::{table_row, Page, Paginator};

use crate::app::DashboardView;

pub const NO_DATA_FOR_FILTERS: &str = "No data found for the applied filters.";
pub const NO_TABLE_DATA: &str = "No data found.";

const RULE: &str = "--------------------------------------------------------------";

/// Stats block: total, averages and period.
pub fn render_stats<W: Write + ?Sized>(out: &mut W, stats: &StatsDisplay) -> io::Result<()> {
    writeln!(out, "Total records:       {}", stats.total)?;
    writeln!(out, "Average humidity:    {}", stats.humidity)?;
    writeln!(out, "Average temperature: {}", stats.temperature)?;
    writeln!(out, "Period:              {}", stats.period)
}

/// One table page plus its pagination footer.
pub fn render_table<W: Write + ?Sized>(
    out: &mut W,
    page: &Page<'_, SensorReading>,
    offset: &FixedOffset,
) -> io::Result<()> {
    if page.total == 0 {
        return writeln!(out, "{NO_TABLE_DATA}");
    }

    writeln!(out, "{:<21}{:>14}{:>16}", "Date/Time", "Humidity", "Temperature")?;
    writeln!(out, "{RULE}")?;
    for reading in page.rows {
        let [at, humidity, temperature] = table_row(reading, offset);
        writeln!(out, "{at:<21}{humidity:>14}{temperature:>16}")?;
    }
    writeln!(out, "{RULE}")?;

    writeln!(
        out,
        "Showing {}-{} of {} | page {}/{}{}{}",
        page.showing_from,
        page.showing_to,
        page.total,
        page.page,
        page.total_pages,
        if page.has_previous() { " | --page for previous" } else { "" },
        if page.has_next() { " | --page for next" } else { "" },
    )
}

pub fn render_error<W: Write + ?Sized>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "Error loading data: {message}")
}

/// Alert banner. Every line of the alert is framed.
pub fn render_banner<W: Write + ?Sized>(out: &mut W, text: &str) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    for line in text.lines() {
        writeln!(out, "!! {line}")?;
    }
    writeln!(out, "{RULE}")
}

/// The whole view: banner, error or empty notice, stats, table page.
pub fn render_view<W: Write + ?Sized>(
    out: &mut W,
    view: &DashboardView,
    banner: Option<&str>,
    page: usize,
) -> io::Result<()> {
    if let Some(text) = banner {
        render_banner(out, text)?;
    }

    if let Some(message) = &view.error {
        return render_error(out, message);
    }
    if view.readings.is_empty() {
        return writeln!(out, "{NO_DATA_FOR_FILTERS}");
    }

    render_stats(out, &view.stats.display(&view.offset))?;
    writeln!(out)?;
    let page = Paginator::default().page(&view.readings, page);
    render_table(out, &page, &view.offset)
}
