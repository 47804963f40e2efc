//! Sensor reading rows, serialized in the `feeds` wire shape.

use serde::{Deserialize, Serialize};
use silo_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// One row of `sensor_readings`.
///
/// Field names follow the device protocol: `field1` is humidity, `field2`
/// is temperature.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SensorReadingRow {
    pub id: DbId,
    pub field1: Option<f64>,
    pub field2: Option<f64>,
    pub created_at: Timestamp,
}

/// DTO for inserting a reading. `created_at` defaults to the database clock.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSensorReading {
    pub field1: Option<f64>,
    pub field2: Option<f64>,
    pub created_at: Option<Timestamp>,
}
