//! Silo API server library.
//!
//! Exposes the building blocks (config, state, error handling, auth, routes,
//! mail relay) so integration tests and the binary entrypoint can both
//! access them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod query;
pub mod router;
pub mod routes;
pub mod state;
