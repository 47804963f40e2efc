//! `silo-dashboard` -- terminal dashboard for the silo monitor.
//!
//! Logs go to stderr (filter with `RUST_LOG`); the dashboard itself writes to
//! stdout. See `silo-dashboard --help` for commands and settings.

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use silo_core::alert::AlertEvaluator;
use silo_core::export::{chart_file_name, csv_file_name, readings_to_csv};
use silo_core::types::Timestamp;
use silo_dashboard::app::{run_watch, Dashboard, RefreshOutcome};
use silo_dashboard::chart::save_chart;
use silo_dashboard::cli::{Cli, Command, FilterArgs};
use silo_dashboard::client::ApiClient;
use silo_dashboard::config::DashboardConfig;
use silo_dashboard::fetcher::{DataFetcher, FetchOutcome};
use silo_dashboard::notify::{Banner, BannerSink, EmailForwardSink, Notifier, SharedWriter, ToneSink};
use silo_dashboard::render::render_view;
use silo_dashboard::session::TokenStore;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "silo_dashboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = DashboardConfig::from_args(&cli.global)?;
    let client = ApiClient::new(config.api_url.clone())?;
    let store = TokenStore::new(config.token_file.clone());

    match cli.command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let message = client.register(&username, &email, &password).await?;
            println!("{message}");
        }

        Command::Login { username, password } => {
            let token = client
                .login(&username, &password)
                .await
                .context("Login failed")?;
            store
                .save(&token)
                .with_context(|| format!("Failed to write {}", store.path().display()))?;
            println!("Logged in as {username}");
        }

        Command::Logout => {
            store.clear()?;
            println!("Logged out");
        }

        Command::Show { filter, page } => {
            let token = require_token(&store)?;
            let query = filter.to_query(Utc::now())?;
            let banner = Arc::new(Banner::new());
            let dashboard = build_dashboard(&config, client, token, Arc::clone(&banner));

            if let RefreshOutcome::Updated(view) = dashboard.refresh(&query).await {
                let shown = view.banner_text(banner.current());
                render_view(&mut std::io::stdout().lock(), &view, shown.as_deref(), page)?;
            }
            dashboard.wait_for_deliveries().await;
        }

        Command::Watch { filter, interval } => {
            let token = require_token(&store)?;
            filter.to_query(Utc::now())?;
            watch(&config, client, token, filter, interval).await;
        }

        Command::ExportCsv { filter, output } => {
            let outcome = fetch_for_export(&config, client, &store, &filter).await?;
            let today = Utc::now().with_timezone(&config.offset).date_naive();
            let path = output.unwrap_or_else(|| PathBuf::from(csv_file_name(today)));

            std::fs::write(&path, readings_to_csv(&outcome.readings, &config.offset))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Exported {} readings to {}",
                outcome.readings.len(),
                path.display()
            );
        }

        Command::ExportPng { filter, output } => {
            let outcome = fetch_for_export(&config, client, &store, &filter).await?;
            let today = Utc::now().with_timezone(&config.offset).date_naive();
            let path = output.unwrap_or_else(|| PathBuf::from(chart_file_name(today)));

            let layout = save_chart(&outcome.series, &path)?;
            println!("Chart written to {}", path.display());
            println!(
                "Humidity (left, %): {:.1} .. {:.1}",
                layout.humidity.min, layout.humidity.max
            );
            println!(
                "Temperature (right, °C): {:.1} .. {:.1}",
                layout.temperature.min, layout.temperature.max
            );
        }
    }

    Ok(())
}

fn require_token(store: &TokenStore) -> anyhow::Result<String> {
    match store.load()? {
        Some(token) => Ok(token),
        None => bail!("Not logged in. Run `silo-dashboard login` first."),
    }
}

fn build_dashboard(
    config: &DashboardConfig,
    client: ApiClient,
    token: String,
    banner: Arc<Banner>,
) -> Dashboard {
    let bell: SharedWriter = Arc::new(Mutex::new(std::io::stderr()));
    let notifier = Notifier::new()
        .with_sink(BannerSink::new(banner))
        .with_sink(ToneSink::new(bell))
        .with_sink(EmailForwardSink::new(client.clone(), token.clone()));

    Dashboard::new(
        DataFetcher::new(client, token, config.offset),
        AlertEvaluator::new(config.thresholds, config.offset),
        notifier,
        config.offset,
    )
}

async fn watch(
    config: &DashboardConfig,
    client: ApiClient,
    token: String,
    filter: FilterArgs,
    interval_secs: u64,
) {
    let banner = Arc::new(Banner::new());
    let dashboard = Arc::new(build_dashboard(config, client, token, Arc::clone(&banner)));
    let out: SharedWriter = Arc::new(Mutex::new(std::io::stdout()));
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C");
        }
        ctrl_c.cancel();
    });

    // Blocking stdin on a plain thread so it cannot hold up runtime shutdown.
    let dismiss_banner = Arc::clone(&banner);
    let dismiss_out = Arc::clone(&out);
    std::thread::spawn(move || {
        for _ in std::io::stdin().lock().lines() {
            dismiss_banner.dismiss_to(&dismiss_out);
        }
    });

    println!("Refreshing every {interval_secs}s. Press Enter to dismiss an alert, Ctrl-C to quit.");

    let make_query = move |now: Timestamp| match filter.to_query(now) {
        Ok(query) => Some(query),
        Err(e) => {
            tracing::error!(error = %e, "Invalid filter");
            None
        }
    };

    run_watch(
        dashboard,
        make_query,
        Duration::from_secs(interval_secs.max(1)),
        banner,
        out,
        cancel,
    )
    .await;
}

async fn fetch_for_export(
    config: &DashboardConfig,
    client: ApiClient,
    store: &TokenStore,
    filter: &FilterArgs,
) -> anyhow::Result<FetchOutcome> {
    let token = require_token(store)?;
    let query = filter.to_query(Utc::now())?;
    let outcome = DataFetcher::new(client, token, config.offset)
        .fetch(&query)
        .await;

    if let Some(message) = outcome.error {
        bail!("Error loading data: {message}");
    }
    if outcome.is_empty() {
        bail!("No data to export for the applied filters.");
    }
    Ok(outcome)
}
