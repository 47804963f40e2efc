//! Summary statistics over a reading set.

use chrono::FixedOffset;
use serde::Serialize;

use crate::reading::SensorReading;
use crate::time::format_local_date;
use crate::types::Timestamp;

/// Earliest and latest observation in a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Aggregate over the usable readings of one refresh.
///
/// The empty state is `count == 0`, both averages `0.0` and `period == None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadingStats {
    pub count: usize,
    pub avg_humidity: f64,
    pub avg_temperature: f64,
    pub period: Option<Period>,
}

impl ReadingStats {
    pub fn empty() -> Self {
        Self {
            count: 0,
            avg_humidity: 0.0,
            avg_temperature: 0.0,
            period: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Text for the stats block: total, humidity, temperature, period.
    pub fn display(&self, offset: &FixedOffset) -> StatsDisplay {
        let period = match &self.period {
            Some(p) => format!(
                "{} - {}",
                format_local_date(&p.start, offset),
                format_local_date(&p.end, offset)
            ),
            None => "-".to_string(),
        };

        if self.is_empty() {
            return StatsDisplay {
                total: "0".into(),
                humidity: "0%".into(),
                temperature: "0°C".into(),
                period,
            };
        }

        StatsDisplay {
            total: self.count.to_string(),
            humidity: format!("{:.2}%", self.avg_humidity),
            temperature: format!("{:.2}°C", self.avg_temperature),
            period,
        }
    }
}

/// Rendered stats strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsDisplay {
    pub total: String,
    pub humidity: String,
    pub temperature: String,
    pub period: String,
}

/// Compute count, rounded averages and the observation period.
///
/// Unusable readings do not count towards anything.
pub fn aggregate(readings: &[SensorReading]) -> ReadingStats {
    let mut count = 0usize;
    let mut humidity_sum = 0.0;
    let mut temperature_sum = 0.0;
    let mut period: Option<Period> = None;

    for reading in readings {
        let Some((humidity, temperature)) = reading.values() else {
            continue;
        };
        count += 1;
        humidity_sum += humidity;
        temperature_sum += temperature;

        let at = reading.observed_at;
        period = Some(match period {
            None => Period { start: at, end: at },
            Some(p) => Period {
                start: p.start.min(at),
                end: p.end.max(at),
            },
        });
    }

    if count == 0 {
        return ReadingStats::empty();
    }

    ReadingStats {
        count,
        avg_humidity: round2(humidity_sum / count as f64),
        avg_temperature: round2(temperature_sum / count as f64),
        period,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
