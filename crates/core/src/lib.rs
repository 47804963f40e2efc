//! Domain logic for the silo monitor.
//!
//! Everything here is pure: no database, no network, no clock reads. Callers
//! pass `now` and the display offset in so results are deterministic.

pub mod alert;
pub mod error;
pub mod export;
pub mod query;
pub mod reading;
pub mod series;
pub mod stats;
pub mod table;
pub mod time;
pub mod types;
