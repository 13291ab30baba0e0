//! Collaborator traits
//!
//! The billing run talks to four external systems: the AWS cost/usage/invoice
//! provider, the ledger journal API, the catalog/commerce API and a
//! notification sink. Implementations live in `aws-billing-clients`.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::error::BillingError;
use crate::models::{
    Agreement, Attachment, Authorization, GroupDefinition, InvoiceSummary, Journal, NewJournal,
    Report, ReportFilter, UploadedAttachment,
};
use crate::AppResult;

/// Errors raised by an AWS report provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Role assumption or credential resolution failed for the MPA
    #[error("Credentials error for account {account_id}: {message}")]
    Credentials { account_id: String, message: String },

    #[error("Report request failed: {0}")]
    Request(String),
}

impl From<ProviderError> for BillingError {
    fn from(err: ProviderError) -> Self {
        BillingError::Provider(err.to_string())
    }
}

/// Cost/usage and invoice reports for one MPA, scoped to its credentials
#[async_trait]
pub trait AwsReportProvider: Send + Sync {
    /// Cost and usage grouped by up to two dimensions for `[start_date, end_date)`
    async fn get_cost_and_usage(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        group_by: &[GroupDefinition],
        filter_by: Option<&ReportFilter>,
    ) -> Result<Report, ProviderError>;

    /// Invoice summaries issued to `account_id` for the given month
    async fn list_invoice_summaries_by_account_id(
        &self,
        account_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<InvoiceSummary>, ProviderError>;
}

/// Builds a provider bound to one MPA's credentials
#[async_trait]
pub trait AwsProviderFactory: Send + Sync {
    async fn connect(&self, mpa_account_id: &str) -> Result<Box<dyn AwsReportProvider>, ProviderError>;
}

/// Ledger journal API
#[async_trait]
pub trait JournalClient: Send + Sync {
    /// Find journals matching an RQL query
    async fn query(&self, rql: &str) -> AppResult<Vec<Journal>>;

    async fn create(&self, journal: &NewJournal) -> AppResult<Journal>;

    /// Upload the journal lines file
    async fn upload(&self, journal_id: &str, file: Vec<u8>, filename: &str) -> AppResult<()>;

    async fn upload_attachment(
        &self,
        journal_id: &str,
        attachment: Attachment,
    ) -> AppResult<UploadedAttachment>;
}

/// Catalog and commerce queries
#[async_trait]
pub trait CommerceClient: Send + Sync {
    /// `None` when the catalog returns no result set
    async fn get_authorizations(&self, rql: &str) -> AppResult<Option<Vec<Authorization>>>;

    async fn get_agreements_by_query(&self, rql: &str) -> AppResult<Vec<Agreement>>;
}

/// Link rendered as an action button in a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub url: String,
}

impl Button {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Notification sink for operators
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_error(&self, title: &str, text: &str, button: Option<&Button>) -> AppResult<()>;

    async fn send_success(&self, title: &str, text: &str, button: Option<&Button>) -> AppResult<()>;
}
