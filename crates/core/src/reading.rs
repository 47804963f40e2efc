//! Sensor readings and the `{feeds: [...]}` wire format.
//!
//! `field1` is relative humidity (%) and `field2` is temperature (°C).
//! Devices sometimes drop a field or report it as a string, so the wire type
//! is lenient and [`SensorReading::is_usable`] decides what downstream code
//! may look at.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{DbId, Timestamp};

/// One humidity + temperature sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub observed_at: Timestamp,
}

impl SensorReading {
    pub fn new(humidity: Option<f64>, temperature: Option<f64>, observed_at: Timestamp) -> Self {
        Self {
            humidity,
            temperature,
            observed_at,
        }
    }

    /// Both values present and finite.
    pub fn is_usable(&self) -> bool {
        self.values().is_some()
    }

    /// `(humidity, temperature)` if the reading is usable.
    pub fn values(&self) -> Option<(f64, f64)> {
        match (self.humidity, self.temperature) {
            (Some(h), Some(t)) if h.is_finite() && t.is_finite() => Some((h, t)),
            _ => None,
        }
    }
}

/// Keep only usable readings, preserving order.
pub fn usable_readings<I>(readings: I) -> Vec<SensorReading>
where
    I: IntoIterator<Item = SensorReading>,
{
    readings.into_iter().filter(SensorReading::is_usable).collect()
}

/// One entry of the backend's `feeds` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DbId>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub field1: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub field2: Option<f64>,
    pub created_at: Timestamp,
}

impl From<Feed> for SensorReading {
    fn from(feed: Feed) -> Self {
        SensorReading::new(feed.field1, feed.field2, feed.created_at)
    }
}

/// Body of `GET /api/data`: either `{feeds}` or `{error}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedEnvelope {
    #[serde(default)]
    pub feeds: Vec<Feed>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Accept a JSON number, a numeric string, or null. Anything else is `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
