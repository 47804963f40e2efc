//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod sensor_reading_repo;
pub mod user_repo;

pub use sensor_reading_repo::SensorReadingRepo;
pub use user_repo::UserRepo;
