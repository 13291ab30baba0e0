//! Cost Explorer report requests
//!
//! Each helper issues one grouped `get_cost_and_usage` query for the billing period.

use aws_billing_core::models::report::dimensions;
use aws_billing_core::models::{BillingPeriod, GroupDefinition, Report, ReportFilter};
use aws_billing_core::traits::AwsReportProvider;
use aws_billing_core::AppResult;
use tracing::instrument;

use crate::constants::MARKETPLACE_BILLING_ENTITY;

/// Per-account reports kept in the journal's report archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccountReportType {
    RecordTypeAndService,
    ServiceAndInvoiceEntity,
}

impl AccountReportType {
    pub fn name(&self) -> &'static str {
        match self {
            AccountReportType::RecordTypeAndService => "CostByRecordTypeAndService",
            AccountReportType::ServiceAndInvoiceEntity => "CostByServiceAndInvoiceEntity",
        }
    }
}

/// Marketplace charges of every linked account of the MPA, LINKED_ACCOUNT x SERVICE
#[instrument(skip(provider))]
pub async fn marketplace_usage_report(
    provider: &dyn AwsReportProvider,
    period: BillingPeriod,
) -> AppResult<Report> {
    let group_by = [
        GroupDefinition::dimension(dimensions::LINKED_ACCOUNT),
        GroupDefinition::dimension(dimensions::SERVICE),
    ];
    let filter = ReportFilter::dimension(dimensions::BILLING_ENTITY, &[MARKETPLACE_BILLING_ENTITY]);

    Ok(provider
        .get_cost_and_usage(period.start_date(), period.end_date(), &group_by, Some(&filter))
        .await?)
}

/// Cost of one account, RECORD_TYPE x SERVICE
#[instrument(skip(provider))]
pub async fn record_type_report(
    provider: &dyn AwsReportProvider,
    period: BillingPeriod,
    account_id: &str,
) -> AppResult<Report> {
    let group_by = [
        GroupDefinition::dimension(dimensions::RECORD_TYPE),
        GroupDefinition::dimension(dimensions::SERVICE),
    ];
    account_report(provider, period, account_id, &group_by).await
}

/// Invoicing entity of each service of one account, SERVICE x INVOICING_ENTITY
#[instrument(skip(provider))]
pub async fn invoice_entity_report(
    provider: &dyn AwsReportProvider,
    period: BillingPeriod,
    account_id: &str,
) -> AppResult<Report> {
    let group_by = [
        GroupDefinition::dimension(dimensions::SERVICE),
        GroupDefinition::dimension(dimensions::INVOICING_ENTITY),
    ];
    account_report(provider, period, account_id, &group_by).await
}

async fn account_report(
    provider: &dyn AwsReportProvider,
    period: BillingPeriod,
    account_id: &str,
    group_by: &[GroupDefinition],
) -> AppResult<Report> {
    let filter = ReportFilter::dimension(dimensions::LINKED_ACCOUNT, &[account_id]);
    Ok(provider
        .get_cost_and_usage(period.start_date(), period.end_date(), group_by, Some(&filter))
        .await?)
}
