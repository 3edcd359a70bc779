//! Resilience metrics (failover latency and error rate).
//!
//! # Metrics
//! - `tbascule_200_spare_s`: first successful secondary response at or after
//!   the stimulus, minus the stimulus instant
//! - `tbascule_from_first_error_s`: the same secondary success, minus the first
//!   failure at or after the stimulus
//! - `error_rate_percent`: share of non-success entries in
//!   `[t_panne - pre, t_panne + post]`
//!
//! Missing anchors yield `None` ("unavailable"), never zero. An empty window
//! yields `error_rate_percent = None` with `total_requests_in_window = 0`.

use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::ledger::LedgerEntry;
use crate::registry::NodeRole;
use crate::stimulus::{StimulusGateway, StimulusRecord};

/// Window around the stimulus used for the error rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsWindow {
    pub pre: Duration,
    pub post: Duration,
}

impl MetricsWindow {
    /// Build from seconds; `None` for negative or non-finite values.
    pub fn from_secs(pre: f64, post: f64) -> Option<Self> {
        Some(Self {
            pre: Duration::try_from_secs_f64(pre).ok()?,
            post: Duration::try_from_secs_f64(post).ok()?,
        })
    }
}

impl Default for MetricsWindow {
    fn default() -> Self {
        Self {
            pre: Duration::from_secs(2),
            post: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MetricsError {
    #[error("No failure injected yet. Call /stimulus/fail-primary first.")]
    NoStimulusRecorded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResilienceReport {
    pub stimulus: StimulusSection,
    #[serde(rename = "Tbascule")]
    pub tbascule: FailoverLatency,
    #[serde(rename = "Ebascule")]
    pub ebascule: ErrorRate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StimulusSection {
    pub injected_at: DateTime<Utc>,
    pub reason: String,
    pub window: WindowSection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSection {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub pre_s: f64,
    pub post_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailoverLatency {
    pub tbascule_200_spare_s: Option<f64>,
    pub tbascule_from_first_error_s: Option<f64>,
    pub t_first_error: Option<DateTime<Utc>>,
    pub t_first_success_spare: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRate {
    pub total_requests_in_window: usize,
    pub failed_requests_in_window: usize,
    /// `None` when the window holds no entries.
    pub error_rate_percent: Option<f64>,
}

/// Computes reports from a consistent stimulus + ledger view.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    gateway: Arc<StimulusGateway>,
}

impl MetricsEngine {
    pub fn new(gateway: Arc<StimulusGateway>) -> Self {
        Self { gateway }
    }

    pub fn evaluate(&self, window: MetricsWindow) -> Result<ResilienceReport, MetricsError> {
        let (record, entries) = self.gateway.view();
        compute(&entries, record.as_ref(), window)
    }
}

/// Pure computation over ledger entries (in arrival order) and the stimulus.
pub fn compute(
    entries: &[LedgerEntry],
    stimulus: Option<&StimulusRecord>,
    window: MetricsWindow,
) -> Result<ResilienceReport, MetricsError> {
    let stimulus = stimulus.ok_or(MetricsError::NoStimulusRecorded)?;
    let t_panne = stimulus.injected_at;

    let after_stimulus = || entries.iter().filter(move |e| e.timestamp >= t_panne);

    let t_first_error = after_stimulus()
        .find(|e| !e.is_success())
        .map(|e| e.timestamp);
    let t_first_success_spare = after_stimulus()
        .find(|e| e.is_success() && e.target == Some(NodeRole::Secondary))
        .map(|e| e.timestamp);

    let tbascule_200_spare_s = t_first_success_spare.map(|t| round(seconds_between(t, t_panne), 4));
    let tbascule_from_first_error_s = match (t_first_success_spare, t_first_error) {
        (Some(spare), Some(error)) => Some(round(seconds_between(spare, error), 4)),
        _ => None,
    };

    let start = shift(t_panne, window.pre, false);
    let end = shift(t_panne, window.post, true);
    let (total, failed) = entries
        .iter()
        .filter(|e| e.within(start, end))
        .fold((0usize, 0usize), |(total, failed), e| {
            (total + 1, failed + usize::from(!e.is_success()))
        });
    let error_rate_percent = (total > 0).then(|| round(failed as f64 * 100.0 / total as f64, 2));

    Ok(ResilienceReport {
        stimulus: StimulusSection {
            injected_at: t_panne,
            reason: stimulus.reason.clone(),
            window: WindowSection {
                start,
                end,
                pre_s: window.pre.as_secs_f64(),
                post_s: window.post.as_secs_f64(),
            },
        },
        tbascule: FailoverLatency {
            tbascule_200_spare_s,
            tbascule_from_first_error_s,
            t_first_error,
            t_first_success_spare,
        },
        ebascule: ErrorRate {
            total_requests_in_window: total,
            failed_requests_in_window: failed,
            error_rate_percent,
        },
    })
}

fn seconds_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

fn shift(t: DateTime<Utc>, by: Duration, forward: bool) -> DateTime<Utc> {
    let shifted = chrono::Duration::from_std(by).ok().and_then(|d| {
        if forward {
            t.checked_add_signed(d)
        } else {
            t.checked_sub_signed(d)
        }
    });
    shifted.unwrap_or(if forward { DateTime::<Utc>::MAX_UTC } else { DateTime::<Utc>::MIN_UTC })
}

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
