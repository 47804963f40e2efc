//! `silo-dashboard` library crate.
//!
//! Terminal dashboard for the silo monitor: fetches readings from the API,
//! renders stats and a paginated table, raises threshold alerts with a
//! cooldown, and exports CSV/PNG. The binary entrypoint lives in `main.rs`.

pub mod app;
pub mod chart;
pub mod cli;
pub mod client;
pub mod config;
pub mod fetcher;
pub mod notify;
pub mod render;
pub mod session;
