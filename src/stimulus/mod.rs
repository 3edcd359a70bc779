//! Stimulus gateway.
//!
//! # Responsibilities
//! - Record the operator's "fail primary" instant (`t_panne`) and reason
//! - Arm / disarm the simulated fault on the primary node
//! - Reset the stimulus record together with the request ledger
//!
//! # Design Decisions
//! - The record is written before the primary is contacted and is never
//!   rolled back: the timing reference is when the operator acted
//! - Each stimulus overwrites the previous one
//! - Reset holds the stimulus lock while truncating the ledger, so a
//!   metrics read never pairs an old stimulus with an emptied ledger

use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::http::upstream::{UpstreamClient, UpstreamError, UpstreamResponse};
use crate::ledger::{LedgerEntry, RequestLedger};
use crate::observability::metrics;
use crate::registry::{Node, NodeRegistry, NodeRole};

/// The last "fail primary" stimulus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StimulusRecord {
    pub injected_at: DateTime<Utc>,
    pub reason: String,
    pub target: NodeRole,
}

impl StimulusRecord {
    pub fn new(injected_at: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            injected_at,
            reason: reason.into(),
            target: NodeRole::Primary,
        }
    }
}

/// Acknowledgement of a fault-control call the primary accepted.
#[derive(Debug, Clone, Serialize)]
pub struct StimulusAck {
    /// Present for "fail primary"; `None` for recovery.
    pub record: Option<StimulusRecord>,
    pub primary_response: Value,
}

/// Acknowledgement of a metrics reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResetAck {
    pub cleared_entries: usize,
    pub had_stimulus: bool,
}

/// The primary could not be driven into (or out of) the simulated fault.
#[derive(Debug, Clone, Error)]
pub enum StimulusError {
    #[error("Primary did not accept stimulus (status {status})")]
    PrimaryRejected {
        status: u16,
        record: Option<StimulusRecord>,
    },

    #[error("Unable to reach primary: {source}")]
    PrimaryUnreachable {
        #[source]
        source: UpstreamError,
        record: Option<StimulusRecord>,
    },
}

impl StimulusError {
    /// The stimulus that stays recorded despite the failure, if any.
    pub fn record(&self) -> Option<&StimulusRecord> {
        match self {
            StimulusError::PrimaryRejected { record, .. } => record.as_ref(),
            StimulusError::PrimaryUnreachable { record, .. } => record.as_ref(),
        }
    }
}

/// Operator-facing fault trigger and metrics reset.
#[derive(Debug)]
pub struct StimulusGateway {
    record: Mutex<Option<StimulusRecord>>,
    registry: Arc<NodeRegistry>,
    ledger: Arc<RequestLedger>,
    client: UpstreamClient,
    timeout: Duration,
}

impl StimulusGateway {
    pub fn new(
        registry: Arc<NodeRegistry>,
        ledger: Arc<RequestLedger>,
        client: UpstreamClient,
        timeout: Duration,
    ) -> Self {
        Self {
            record: Mutex::new(None),
            registry,
            ledger,
            client,
            timeout,
        }
    }

    /// Record a stimulus now, then arm the simulated fault on the primary.
    pub async fn fail_primary(&self, reason: &str) -> Result<StimulusAck, StimulusError> {
        let record = StimulusRecord::new(Utc::now(), reason);
        *self.record.lock() = Some(record.clone());
        metrics::record_stimulus();

        tracing::warn!(
            reason = %record.reason,
            injected_at = %record.injected_at,
            "Stimulus recorded: failing primary"
        );

        let primary = self.registry.node(NodeRole::Primary);
        let url = fault_url(primary, "/stimulus/fail", Some(reason));
        let response = self.call_primary(&url, Some(&record)).await?;

        Ok(StimulusAck {
            record: Some(record),
            primary_response: response.json().unwrap_or(Value::Null),
        })
    }

    /// Disarm the simulated fault. Leaves the stimulus record and ledger alone.
    pub async fn recover_primary(&self) -> Result<StimulusAck, StimulusError> {
        let primary = self.registry.node(NodeRole::Primary);
        let url = fault_url(primary, "/stimulus/recover", None);
        let response = self.call_primary(&url, None).await?;

        tracing::info!("Primary recovery requested");
        Ok(StimulusAck {
            record: None,
            primary_response: response.json().unwrap_or(Value::Null),
        })
    }

    /// Clear the stimulus record and truncate the ledger.
    pub fn reset_metrics(&self) -> ResetAck {
        let mut record = self.record.lock();
        let had_stimulus = record.take().is_some();
        let cleared_entries = self.ledger.reset();

        tracing::info!(cleared_entries, had_stimulus, "Metrics and stimulus markers reset");
        ResetAck { cleared_entries, had_stimulus }
    }

    pub fn current(&self) -> Option<StimulusRecord> {
        self.record.lock().clone()
    }

    /// Stimulus record and ledger contents read as one consistent view.
    pub fn view(&self) -> (Option<StimulusRecord>, Vec<LedgerEntry>) {
        let record = self.record.lock();
        (record.clone(), self.ledger.entries())
    }

    async fn call_primary(
        &self,
        url: &str,
        record: Option<&StimulusRecord>,
    ) -> Result<UpstreamResponse, StimulusError> {
        let response = self.client.post(url, None, self.timeout).await.map_err(|source| {
            tracing::error!(url = %url, error = %source, "Unable to reach primary");
            StimulusError::PrimaryUnreachable { source, record: record.cloned() }
        })?;

        if !response.status.is_success() {
            tracing::error!(url = %url, status = %response.status, "Primary rejected fault control call");
            return Err(StimulusError::PrimaryRejected {
                status: response.status.as_u16(),
                record: record.cloned(),
            });
        }
        Ok(response)
    }
}

fn fault_url(node: &Node, path: &str, reason: Option<&str>) -> String {
    let endpoint = node.endpoint(path);
    match (reason, Url::parse(&endpoint)) {
        (Some(reason), Ok(mut url)) => {
            url.query_pairs_mut().append_pair("reason", reason);
            url.into()
        }
        _ => endpoint,
    }
}
