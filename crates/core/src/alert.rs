//! Threshold alert evaluation with a global cooldown.
//!
//! Pure logic, no clock reads: the caller passes `now` and owns the
//! [`AlertState`]. Holding `&mut AlertState` for the whole of
//! [`AlertEvaluator::evaluate`] makes the cooldown check and the
//! `last_raised_at` update a single step, so two overlapping refresh cycles
//! that share the state behind a mutex cannot both raise.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::FixedOffset;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::reading::SensorReading;
use crate::time::format_local;
use crate::types::Timestamp;

/// Minimum interval between two raised alerts.
pub const ALERT_COOLDOWN: Duration = Duration::from_secs(30);

/// First line of every alert body.
const ALERT_HEADING: &str = "Critical alert";

static BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Inclusive acceptable range for one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    /// Build a band, rejecting non-finite bounds and `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, CoreError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(CoreError::Validation(format!(
                "Band bounds must be finite, got {min}..{max}"
            )));
        }
        if min > max {
            return Err(CoreError::Validation(format!(
                "Band minimum {min} is greater than maximum {max}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Humidity and temperature bands. Read-only for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub humidity: Band,
    pub temperature: Band,
}

impl Default for AlertThresholds {
    /// Humidity 60-70 %, temperature 15-30 °C.
    fn default() -> Self {
        Self {
            humidity: Band {
                min: 60.0,
                max: 70.0,
            },
            temperature: Band {
                min: 15.0,
                max: 30.0,
            },
        }
    }
}

/// The three tracked violation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    HumidityOutOfRange,
    TemperatureTooLow,
    TemperatureTooHigh,
}

impl ViolationKind {
    /// Rendering order of alert lines.
    pub const ALL: [ViolationKind; 3] = [
        ViolationKind::HumidityOutOfRange,
        ViolationKind::TemperatureTooLow,
        ViolationKind::TemperatureTooHigh,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViolationKind::HumidityOutOfRange => "Humidity out of range",
            ViolationKind::TemperatureTooLow => "Temperature too low",
            ViolationKind::TemperatureTooHigh => "Temperature too high",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            ViolationKind::HumidityOutOfRange => "%",
            ViolationKind::TemperatureTooLow | ViolationKind::TemperatureTooHigh => "°C",
        }
    }

    fn slot(self) -> usize {
        match self {
            ViolationKind::HumidityOutOfRange => 0,
            ViolationKind::TemperatureTooLow => 1,
            ViolationKind::TemperatureTooHigh => 2,
        }
    }
}

/// The most recent out-of-band value of one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub value: f64,
    pub observed_at: Timestamp,
}

impl Violation {
    /// `"<category>: <value> at <timestamp>"`.
    pub fn describe(&self, offset: &FixedOffset) -> String {
        format!(
            "{}: {:.2}{} at {}",
            self.kind.label(),
            self.value,
            self.kind.unit(),
            format_local(&self.observed_at, offset)
        )
    }
}

/// A raised alert: one to three violation lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub raised_at: Timestamp,
    pub violations: Vec<Violation>,
    pub lines: Vec<String>,
}

impl Alert {
    /// Markup body for the banner surface.
    pub fn html(&self) -> String {
        let mut body = format!("<strong>{ALERT_HEADING}</strong>");
        for line in &self.lines {
            body.push_str("<br>");
            body.push_str(line);
        }
        body
    }

    /// Tag-stripped body forwarded to the mail relay.
    pub fn plain_text(&self) -> String {
        strip_tags(&self.html())
    }
}

/// Remove markup, turning `<br>` into newlines.
pub fn strip_tags(html: &str) -> String {
    let with_breaks = BREAK_RE.replace_all(html, "\n");
    TAG_RE.replace_all(&with_breaks, "").trim().to_string()
}

/// Cooldown bookkeeping. Starts as "never raised" and is never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertState {
    pub last_raised_at: Option<Timestamp>,
}

impl AlertState {
    /// Time left before another alert may be raised, if any.
    pub fn cooldown_remaining(&self, now: Timestamp, cooldown: Duration) -> Option<Duration> {
        let last = self.last_raised_at?;
        let elapsed = now.signed_duration_since(last).to_std().unwrap_or_default();
        cooldown.checked_sub(elapsed).filter(|left| !left.is_zero())
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertDecision {
    /// No usable reading is out of band.
    Clear,
    /// Violations exist but the cooldown is still running.
    Suppressed {
        violations: Vec<Violation>,
        remaining: Duration,
    },
    /// A new alert; the state has already been stamped with `raised_at`.
    Raised(Alert),
}

impl AlertDecision {
    pub fn into_alert(self) -> Option<Alert> {
        match self {
            AlertDecision::Raised(alert) => Some(alert),
            _ => None,
        }
    }
}

/// Find the most recent violation per category.
///
/// Readings may arrive in any order; they are scanned newest first. Scanning
/// stops once every category has a violation. Unusable readings are skipped.
pub fn scan(readings: &[SensorReading], thresholds: &AlertThresholds) -> Vec<Violation> {
    let mut ordered: Vec<&SensorReading> = readings.iter().collect();
    ordered.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));

    let mut found: [Option<Violation>; 3] = [None; 3];

    for reading in ordered {
        let Some((humidity, temperature)) = reading.values() else {
            continue;
        };

        let mut record = |kind: ViolationKind, value: f64| {
            let slot = &mut found[kind.slot()];
            if slot.is_none() {
                *slot = Some(Violation {
                    kind,
                    value,
                    observed_at: reading.observed_at,
                });
            }
        };

        if !thresholds.humidity.contains(humidity) {
            record(ViolationKind::HumidityOutOfRange, humidity);
        }
        if temperature < thresholds.temperature.min {
            record(ViolationKind::TemperatureTooLow, temperature);
        }
        if temperature > thresholds.temperature.max {
            record(ViolationKind::TemperatureTooHigh, temperature);
        }

        if found.iter().all(Option::is_some) {
            break;
        }
    }

    ViolationKind::ALL
        .iter()
        .filter_map(|kind| found[kind.slot()])
        .collect()
}

/// Scans readings and applies the cooldown.
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    thresholds: AlertThresholds,
    offset: FixedOffset,
    cooldown: Duration,
}

impl AlertEvaluator {
    /// Evaluator with the standard [`ALERT_COOLDOWN`]. `offset` is used to
    /// render timestamps in alert lines.
    pub fn new(thresholds: AlertThresholds, offset: FixedOffset) -> Self {
        Self {
            thresholds,
            offset,
            cooldown: ALERT_COOLDOWN,
        }
    }

    /// Decide whether `readings` raise an alert at `now`.
    ///
    /// `state.last_raised_at` is set to `now` only when the decision is
    /// [`AlertDecision::Raised`].
    pub fn evaluate(
        &self,
        readings: &[SensorReading],
        state: &mut AlertState,
        now: Timestamp,
    ) -> AlertDecision {
        let violations = scan(readings, &self.thresholds);
        if violations.is_empty() {
            return AlertDecision::Clear;
        }

        if let Some(remaining) = state.cooldown_remaining(now, self.cooldown) {
            return AlertDecision::Suppressed {
                violations,
                remaining,
            };
        }

        state.last_raised_at = Some(now);

        let lines = violations
            .iter()
            .map(|v| v.describe(&self.offset))
            .collect();

        AlertDecision::Raised(Alert {
            raised_at: now,
            violations,
            lines,
        })
    }
}
