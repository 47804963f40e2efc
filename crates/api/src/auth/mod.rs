//! Credential primitives.
//!
//! - [`password`] -- Argon2id hashing, verification, length policy.
//! - [`jwt`] -- signed session tokens.

pub mod jwt;
pub mod password;
