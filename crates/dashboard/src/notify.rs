//! Alert notification sinks.
//!
//! A raised [`Alert`] fans out to every sink the [`Notifier`] holds. Sinks
//! run concurrently and independently: a failing sink is logged and the
//! others still deliver.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::future::join_all;
use silo_core::alert::Alert;

use crate::client::ApiClient;

/// Terminal output shared between the renderer and the sinks.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Lock a shared writer, recovering from a poisoned lock.
pub fn lock_writer(out: &SharedWriter) -> MutexGuard<'_, dyn Write + Send + 'static> {
    out.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One way of telling someone about an alert.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &'static str;

    async fn deliver(&self, alert: &Alert) -> anyhow::Result<()>;
}

/// Fans an alert out to a set of sinks.
#[derive(Default)]
pub struct Notifier {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: impl AlertSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Deliver to every sink. Returns how many succeeded.
    pub async fn notify(&self, alert: &Alert) -> usize {
        let results = join_all(self.sinks.iter().map(|sink| sink.deliver(alert))).await;

        let mut delivered = 0;
        for (sink, result) in self.sinks.iter().zip(results) {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(sink = sink.name(), error = %e, "Alert delivery failed"),
            }
        }
        tracing::info!(delivered, sinks = self.sinks.len(), "Alert dispatched");
        delivered
    }
}

// ---------------------------------------------------------------------------
// Banner
// ---------------------------------------------------------------------------

/// The dismissable banner surface. Holds the text of the latest alert until
/// it is dismissed.
#[derive(Debug, Default)]
pub struct Banner {
    current: Mutex<Option<String>>,
}

impl Banner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&self, text: String) {
        *self.lock() = Some(text);
    }

    /// Hide the banner. Returns whether one was showing.
    pub fn dismiss(&self) -> bool {
        self.lock().take().is_some()
    }

    /// Dismiss and, if a banner was showing, say so on `out`. A failed
    /// write is logged; the banner is cleared either way.
    pub fn dismiss_to(&self, out: &SharedWriter) -> bool {
        if !self.dismiss() {
            return false;
        }
        if let Err(e) = writeln!(lock_writer(out), "Alert dismissed") {
            tracing::warn!(error = %e, "Failed to write dismissal notice");
        }
        true
    }

    pub fn current(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.current.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Puts the alert on the [`Banner`].
pub struct BannerSink {
    banner: Arc<Banner>,
}

impl BannerSink {
    pub fn new(banner: Arc<Banner>) -> Self {
        Self { banner }
    }
}

#[async_trait]
impl AlertSink for BannerSink {
    fn name(&self) -> &'static str {
        "banner"
    }

    async fn deliver(&self, alert: &Alert) -> anyhow::Result<()> {
        self.banner.show(alert.plain_text());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tone
// ---------------------------------------------------------------------------

/// Rings the terminal bell.
pub struct ToneSink {
    out: SharedWriter,
}

impl ToneSink {
    pub fn new(out: SharedWriter) -> Self {
        Self { out }
    }
}

#[async_trait]
impl AlertSink for ToneSink {
    fn name(&self) -> &'static str {
        "tone"
    }

    async fn deliver(&self, _alert: &Alert) -> anyhow::Result<()> {
        let mut out = lock_writer(&self.out);
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Email forward
// ---------------------------------------------------------------------------

/// Forwards the plain-text alert to the API's mail relay.
pub struct EmailForwardSink {
    client: ApiClient,
    token: String,
}

impl EmailForwardSink {
    pub fn new(client: ApiClient, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }
}

#[async_trait]
impl AlertSink for EmailForwardSink {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, alert: &Alert) -> anyhow::Result<()> {
        self.client
            .send_alert(&self.token, &alert.plain_text())
            .await?;
        Ok(())
    }
}
