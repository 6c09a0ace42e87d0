//! Remote spreadsheet sync.
//!
//! Delivery is fire-and-forget: `push` always resolves, folding transport
//! errors, bad statuses and `success: false` answers into
//! `SyncOutcome::Failed`. Nothing is retried.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::error::SyncError;
use crate::logging::{log_sync_failed, log_sync_ok};
use crate::submission::SubmissionRecord;

/// Body returned by the spreadsheet endpoint.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncReceipt {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub spreadsheet_url: Option<String>,
    #[serde(default)]
    pub sheet_name: Option<String>,
    #[serde(default)]
    pub last_row: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Ok(SyncReceipt),
    Failed(String),
}

impl SyncOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, SyncOutcome::Ok(_))
    }
}

#[async_trait]
pub trait RemoteSync: Send + Sync {
    async fn push(&self, record: &SubmissionRecord) -> SyncOutcome;
}

/// POSTs the record as JSON to a spreadsheet web app.
pub struct SpreadsheetSync {
    client: Client,
    endpoint: Url,
}

impl SpreadsheetSync {
    pub fn new(endpoint: Url) -> Self {
        Self { client: Client::new(), endpoint }
    }

    async fn try_push(&self, record: &SubmissionRecord) -> Result<SyncReceipt, SyncError> {
        let body = serde_json::to_string(record)?;
        // text/plain keeps the request "simple" for the script host
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "text/plain;charset=UTF-8")
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }
        let text = resp.text().await?;
        parse_receipt(&text)
    }
}

#[async_trait]
impl RemoteSync for SpreadsheetSync {
    async fn push(&self, record: &SubmissionRecord) -> SyncOutcome {
        match self.try_push(record).await {
            Ok(receipt) => {
                log_sync_ok(&record.submission_id, receipt.sheet_name.as_deref(), receipt.last_row);
                SyncOutcome::Ok(receipt)
            }
            Err(err) => {
                let reason = err.to_string();
                log_sync_failed(&record.submission_id, &reason);
                SyncOutcome::Failed(reason)
            }
        }
    }
}

/// Used when no endpoint is configured; every push fails softly.
pub struct NullSync;

#[async_trait]
impl RemoteSync for NullSync {
    async fn push(&self, record: &SubmissionRecord) -> SyncOutcome {
        let reason = SyncError::NotConfigured.to_string();
        log_sync_failed(&record.submission_id, &reason);
        SyncOutcome::Failed(reason)
    }
}

pub fn from_config(cfg: &Config) -> Arc<dyn RemoteSync> {
    match &cfg.sync_url {
        Some(url) => Arc::new(SpreadsheetSync::new(url.clone())),
        None => Arc::new(NullSync),
    }
}

pub fn parse_receipt(body: &str) -> Result<SyncReceipt, SyncError> {
    let receipt: SyncReceipt = serde_json::from_str(body)?;
    if !receipt.success {
        return Err(SyncError::Rejected(
            receipt.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    Ok(receipt)
}
