use std::path::PathBuf;

use chrono::{FixedOffset, Local, Offset};
use silo_core::alert::{AlertThresholds, Band};
use silo_core::error::CoreError;
use silo_core::time::offset_from_minutes;

use crate::cli::GlobalArgs;

/// Token file location relative to the home directory.
const DEFAULT_TOKEN_PATH: &str = ".silo/token";

/// Dashboard configuration resolved from CLI flags and the environment.
///
/// | Flag / Env Var                                 | Default                     |
/// |------------------------------------------------|-----------------------------|
/// | `--api-url` / `SILO_API_URL`                   | `http://localhost:5000/api` |
/// | `--token-file` / `SILO_TOKEN_FILE`             | `~/.silo/token`             |
/// | `--utc-offset-minutes` / `SILO_UTC_OFFSET_MINUTES` | local offset            |
/// | `--humidity-min/max` / `SILO_HUMIDITY_MIN/MAX` | `60` / `70`                 |
/// | `--temperature-min/max` / `SILO_TEMPERATURE_MIN/MAX` | `15` / `30`           |
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_url: String,
    pub token_file: PathBuf,
    /// Offset used to render every timestamp.
    pub offset: FixedOffset,
    pub thresholds: AlertThresholds,
}

impl DashboardConfig {
    /// Validate the parsed flags.
    pub fn from_args(args: &GlobalArgs) -> Result<Self, CoreError> {
        let offset = match args.utc_offset_minutes {
            Some(minutes) => offset_from_minutes(minutes)?,
            None => Local::now().offset().fix(),
        };

        let thresholds = AlertThresholds {
            humidity: Band::new(args.humidity_min, args.humidity_max)?,
            temperature: Band::new(args.temperature_min, args.temperature_max)?,
        };

        Ok(Self {
            api_url: args.api_url.trim_end_matches('/').to_string(),
            token_file: args.token_file.clone().unwrap_or_else(default_token_file),
            offset,
            thresholds,
        })
    }
}

fn default_token_file() -> PathBuf {
    match std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        Some(home) => PathBuf::from(home).join(DEFAULT_TOKEN_PATH),
        None => PathBuf::from(DEFAULT_TOKEN_PATH),
    }
}
