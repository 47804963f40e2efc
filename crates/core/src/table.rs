//! Paginated table rows.

use chrono::FixedOffset;

use crate::reading::SensorReading;
use crate::time::format_local;

/// Rows shown per table page.
pub const ITEMS_PER_PAGE: usize = 20;

/// One page of a slice plus the numbers the pagination footer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub rows: &'a [T],
    /// 1-based page number after clamping.
    pub page: usize,
    /// Zero when there are no items.
    pub total_pages: usize,
    /// 1-based index of the first row shown, or 0 when empty.
    pub showing_from: usize,
    pub showing_to: usize,
    pub total: usize,
}

impl<T> Page<'_, T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(ITEMS_PER_PAGE)
    }
}

impl Paginator {
    /// A page size of zero is treated as one.
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.per_page)
    }

    /// Slice out `page` (1-based), clamped to the valid range.
    pub fn page<'a, T>(&self, items: &'a [T], page: usize) -> Page<'a, T> {
        let total = items.len();
        let total_pages = self.total_pages(total);
        let page = page.clamp(1, total_pages.max(1));

        let start = ((page - 1) * self.per_page).min(total);
        let end = (start + self.per_page).min(total);

        Page {
            rows: &items[start..end],
            page,
            total_pages,
            showing_from: if total == 0 { 0 } else { start + 1 },
            showing_to: end,
            total,
        }
    }
}

/// Display cells for one reading: timestamp, humidity, temperature.
pub fn table_row(reading: &SensorReading, offset: &FixedOffset) -> [String; 3] {
    let humidity = reading
        .humidity
        .map_or_else(|| "N/A".to_string(), |h| format!("{h:.2}%"));
    let temperature = reading
        .temperature
        .map_or_else(|| "N/A".to_string(), |t| format!("{t:.2}°C"));
    [
        format_local(&reading.observed_at, offset),
        humidity,
        temperature,
    ]
}
