//! Recorded AWS report provider
//!
//! Replays Cost Explorer and Invoicing responses exported per MPA:
//!
//! ```text
//! {snapshot_dir}/{mpa_id}/cost_and_usage.json
//! {snapshot_dir}/{mpa_id}/invoice_summaries.json
//! ```
//!
//! `cost_and_usage.json` is a list of recorded requests with their response.
//! `invoice_summaries.json` is a list of `InvoiceSummary` items, optionally
//! tagged with the billing period they belong to.

use async_trait::async_trait;
use aws_billing_core::models::{GroupDefinition, InvoiceSummary, Report, ReportFilter, TimePeriod};
use aws_billing_core::traits::{AwsProviderFactory, AwsReportProvider, ProviderError};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

pub const COST_AND_USAGE_FILE: &str = "cost_and_usage.json";
pub const INVOICE_SUMMARIES_FILE: &str = "invoice_summaries.json";

/// One recorded `GetCostAndUsage` call
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordedRequest {
    /// Only matched when present
    #[serde(default)]
    pub time_period: Option<TimePeriod>,
    #[serde(default)]
    pub group_by: Vec<GroupDefinition>,
    #[serde(default)]
    pub filter: Option<ReportFilter>,
    pub response: Report,
}

impl RecordedRequest {
    fn matches(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        group_by: &[GroupDefinition],
        filter_by: Option<&ReportFilter>,
    ) -> bool {
        let period_matches = self.time_period.as_ref().map_or(true, |p| {
            p.start == start_date.format("%Y-%m-%d").to_string()
                && p.end == end_date.format("%Y-%m-%d").to_string()
        });
        period_matches && self.group_by == group_by && self.filter.as_ref() == filter_by
    }
}

/// Recorded invoice summary, with an optional `Year`/`Month` tag
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordedInvoiceSummary {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(flatten)]
    pub summary: InvoiceSummary,
}

impl RecordedInvoiceSummary {
    fn matches(&self, account_id: &str, year: i32, month: u32) -> bool {
        self.summary.account_id == account_id
            && self.year.map_or(true, |y| y == year)
            && self.month.map_or(true, |m| m == month)
    }
}

/// In-memory provider answering from recorded responses
#[derive(Debug, Clone, Default)]
pub struct RecordedReportProvider {
    requests: Vec<RecordedRequest>,
    invoice_summaries: Vec<RecordedInvoiceSummary>,
}

impl RecordedReportProvider {
    pub fn new(requests: Vec<RecordedRequest>, invoice_summaries: Vec<RecordedInvoiceSummary>) -> Self {
        Self {
            requests,
            invoice_summaries,
        }
    }

    /// Load the recordings of one MPA directory
    pub async fn load(dir: &Path) -> Result<Self, ProviderError> {
        let requests = read_json_or_default(&dir.join(COST_AND_USAGE_FILE)).await?;
        let invoice_summaries = read_json_or_default(&dir.join(INVOICE_SUMMARIES_FILE)).await?;
        Ok(Self::new(requests, invoice_summaries))
    }
}

async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ProviderError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Snapshot file {} not found, treating as empty", path.display());
            return Ok(T::default());
        }
        Err(e) => {
            return Err(ProviderError::Request(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    serde_json::from_str(&raw)
        .map_err(|e| ProviderError::Request(format!("Invalid snapshot {}: {}", path.display(), e)))
}

#[async_trait]
impl AwsReportProvider for RecordedReportProvider {
    async fn get_cost_and_usage(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        group_by: &[GroupDefinition],
        filter_by: Option<&ReportFilter>,
    ) -> Result<Report, ProviderError> {
        match self
            .requests
            .iter()
            .find(|r| r.matches(start_date, end_date, group_by, filter_by))
        {
            Some(recorded) => Ok(recorded.response.clone()),
            None => {
                debug!(
                    "No recorded response for group_by={:?} filter={:?}, returning empty report",
                    group_by, filter_by
                );
                Ok(Report::default())
            }
        }
    }

    async fn list_invoice_summaries_by_account_id(
        &self,
        account_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<InvoiceSummary>, ProviderError> {
        Ok(self
            .invoice_summaries
            .iter()
            .filter(|r| r.matches(account_id, year, month))
            .map(|r| r.summary.clone())
            .collect())
    }
}

/// Resolves a `RecordedReportProvider` per MPA from a snapshot root
#[derive(Debug, Clone)]
pub struct SnapshotProviderFactory {
    snapshot_dir: PathBuf,
}

impl SnapshotProviderFactory {
    pub fn new(snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_dir: snapshot_dir.into(),
        }
    }
}

#[async_trait]
impl AwsProviderFactory for SnapshotProviderFactory {
    #[instrument(skip(self))]
    async fn connect(&self, mpa_account_id: &str) -> Result<Box<dyn AwsReportProvider>, ProviderError> {
        let dir = self.snapshot_dir.join(mpa_account_id);
        let exists = tokio::fs::try_exists(&dir).await.unwrap_or(false);
        if !exists {
            return Err(ProviderError::Credentials {
                account_id: mpa_account_id.to_string(),
                message: format!("no snapshot directory at {}", dir.display()),
            });
        }

        let provider = RecordedReportProvider::load(&dir).await?;
        info!(
            "Loaded {} recorded reports and {} invoice summaries for MPA {}",
            provider.requests.len(),
            provider.invoice_summaries.len(),
            mpa_account_id
        );
        Ok(Box::new(provider))
    }
}
