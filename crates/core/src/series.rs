//! Chart series derived from a reading set.

use chrono::FixedOffset;
use serde::Serialize;

use crate::reading::SensorReading;
use crate::time::format_local;

/// Labels plus the two aligned value series drawn on the chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub humidity: Vec<f64>,
    pub temperature: Vec<f64>,
}

impl ChartSeries {
    /// Build series from readings in the order given. Unusable readings are skipped
    /// so every label has both values.
    pub fn from_readings(readings: &[SensorReading], offset: &FixedOffset) -> Self {
        let mut series = Self::default();
        for reading in readings {
            if let Some((humidity, temperature)) = reading.values() {
                series.labels.push(format_local(&reading.observed_at, offset));
                series.humidity.push(humidity);
                series.temperature.push(temperature);
            }
        }
        series
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
