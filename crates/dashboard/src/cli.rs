//! Command-line interface.
//!
//! Every connection and threshold setting can come from a flag or from the
//! environment variable named next to it; flags win.

use std::path::PathBuf;

use chrono::Duration;
use clap::{Args, Parser, Subcommand};
use silo_core::error::CoreError;
use silo_core::query::FeedQuery;
use silo_core::types::Timestamp;

/// Days covered by the default filter.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Parser)]
#[command(name = "silo-dashboard")]
#[command(about = "Humidity and temperature dashboard for the silo monitor")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection, session and threshold settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Base URL of the API, including the `/api` prefix
    #[arg(long, global = true, env = "SILO_API_URL", default_value = "http://localhost:5000/api")]
    pub api_url: String,

    /// Where the session token is stored (default: ~/.silo/token)
    #[arg(long, global = true, env = "SILO_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    /// Display offset from UTC in minutes (default: the machine's local offset)
    #[arg(long, global = true, env = "SILO_UTC_OFFSET_MINUTES", allow_hyphen_values = true)]
    pub utc_offset_minutes: Option<i32>,

    #[arg(long, global = true, env = "SILO_HUMIDITY_MIN", default_value_t = 60.0)]
    pub humidity_min: f64,

    #[arg(long, global = true, env = "SILO_HUMIDITY_MAX", default_value_t = 70.0)]
    pub humidity_max: f64,

    #[arg(long, global = true, env = "SILO_TEMPERATURE_MIN", default_value_t = 15.0, allow_hyphen_values = true)]
    pub temperature_min: f64,

    #[arg(long, global = true, env = "SILO_TEMPERATURE_MAX", default_value_t = 30.0, allow_hyphen_values = true)]
    pub temperature_max: f64,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account on the API
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SILO_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log in and store the session token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "SILO_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session token
    Logout,

    /// Fetch once and print stats and one table page
    Show {
        #[command(flatten)]
        filter: FilterArgs,

        /// Table page to print (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Refresh on an interval until Ctrl-C
    Watch {
        #[command(flatten)]
        filter: FilterArgs,

        /// Seconds between refreshes
        #[arg(long, env = "SILO_REFRESH_SECS", default_value_t = 30)]
        interval: u64,
    },

    /// Write the filtered readings as CSV
    ExportCsv {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output path (default: dados-sensor-YYYY-MM-DD.csv)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Write the filtered readings as a PNG line chart
    ExportPng {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output path (default: grafico-sensor-YYYY-MM-DD.png)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Feed filter flags.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Maximum number of readings to fetch
    #[arg(long)]
    pub limit: Option<i64>,

    /// Start of the range (date or date-time)
    #[arg(long)]
    pub start: Option<String>,

    /// End of the range (date or date-time)
    #[arg(long)]
    pub end: Option<String>,

    /// Ignore the other filter flags and use the default filter
    #[arg(long)]
    pub reset: bool,
}

impl FilterArgs {
    /// Resolve into a query at `now`.
    ///
    /// The default filter is the last [`DEFAULT_WINDOW_DAYS`] days with the
    /// default limit. It applies with `--reset` or when no flag is given.
    pub fn to_query(&self, now: Timestamp) -> Result<FeedQuery, CoreError> {
        let untouched = self.limit.is_none() && self.start.is_none() && self.end.is_none();
        if self.reset || untouched {
            return FeedQuery::new(None, Some(now - Duration::days(DEFAULT_WINDOW_DAYS)), None);
        }
        FeedQuery::from_raw(self.limit, self.start.as_deref(), self.end.as_deref())
    }
}
