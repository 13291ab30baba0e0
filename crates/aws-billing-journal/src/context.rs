//! Per-authorization run state
//!
//! Built fresh for every authorization and threaded through the agreement and
//! account stages; nothing here outlives one authorization.

use aws_billing_core::models::{Authorization, JournalLine, OrganizationInvoices, Report};
use std::collections::BTreeMap;

use crate::reports::AccountReportType;

/// Raw reports fetched while reconciling, archived with the journal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizationReports {
    /// Marketplace usage report per MPA id
    pub marketplace_usage: BTreeMap<String, Report>,
    /// Aggregated invoices per MPA id
    pub organization_invoices: BTreeMap<String, OrganizationInvoices>,
    /// Per-account reports keyed by account id then report type name
    pub accounts: BTreeMap<String, BTreeMap<String, Report>>,
}

impl OrganizationReports {
    pub fn merge(&mut self, other: OrganizationReports) {
        self.marketplace_usage.extend(other.marketplace_usage);
        self.organization_invoices.extend(other.organization_invoices);
        for (account_id, reports) in other.accounts {
            self.accounts.entry(account_id).or_default().extend(reports);
        }
    }
}

/// Lines and reports produced for one account
#[derive(Debug, Clone, Default)]
pub struct AccountOutcome {
    pub lines: Vec<JournalLine>,
    pub reports: BTreeMap<String, Report>,
}

impl AccountOutcome {
    pub fn add_report(&mut self, report_type: AccountReportType, report: Report) {
        self.reports.insert(report_type.name().to_string(), report);
    }
}

/// Lines and reports produced for one agreement
#[derive(Debug, Clone, Default)]
pub struct AgreementOutcome {
    pub lines: Vec<JournalLine>,
    pub reports: OrganizationReports,
}

impl AgreementOutcome {
    pub fn add_account(&mut self, account_id: &str, outcome: AccountOutcome) {
        self.lines.extend(outcome.lines);
        self.reports
            .accounts
            .entry(account_id.to_string())
            .or_default()
            .extend(outcome.reports);
    }
}

/// Journal content accumulated for one authorization
#[derive(Debug, Clone)]
pub struct AuthorizationContext {
    pub authorization: Authorization,
    pub journal_id: String,
    pub lines: Vec<JournalLine>,
    pub reports: OrganizationReports,
}

impl AuthorizationContext {
    pub fn new(authorization: Authorization, journal_id: String) -> Self {
        Self {
            authorization,
            journal_id,
            lines: Vec::new(),
            reports: OrganizationReports::default(),
        }
    }

    pub fn absorb(&mut self, outcome: AgreementOutcome) {
        self.lines.extend(outcome.lines);
        self.reports.merge(outcome.reports);
    }

    pub fn invalid_lines(&self) -> Vec<&JournalLine> {
        self.lines.iter().filter(|line| !line.is_valid()).collect()
    }
}
