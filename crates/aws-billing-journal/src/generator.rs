//! Billing journal generator
//!
//! Drives one monthly run: authorizations, then agreements, then subscriptions,
//! then subscription lines. Each level has its own failure boundary. A failing
//! unit is logged and notified, and its siblings carry on.

use aws_billing_core::config::BillingConfig;
use aws_billing_core::models::{
    Agreement, Authorization, BillingPeriod, JournalDetails, NewJournal, OrganizationInvoices,
    Report, Subscription, SubscriptionLine,
};
use aws_billing_core::traits::{AwsProviderFactory, AwsReportProvider, CommerceClient, JournalClient};
use aws_billing_core::{AppResult, BillingError};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::artifacts;
use crate::constants::BILLABLE_AGREEMENT_STATUSES;
use crate::context::{AccountOutcome, AgreementOutcome, AuthorizationContext};
use crate::invoices::{build_organization_invoices, check_payment_currency};
use crate::lines::LineBuilder;
use crate::metrics::{get_services_by_account, AccountMetrics};
use crate::notify::Notifications;
use crate::processors::JournalProcessors;
use crate::reconciliation::{amount_by_account, invalid_service_lines};
use crate::reports::{self, AccountReportType};

/// External systems the generator talks to
#[derive(Clone)]
pub struct Collaborators {
    pub journals: Arc<dyn JournalClient>,
    pub commerce: Arc<dyn CommerceClient>,
    pub aws: Arc<dyn AwsProviderFactory>,
    pub notifications: Notifications,
}

/// What happened to one authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// Journal file and attachments uploaded
    Uploaded {
        journal_id: String,
        total_lines: usize,
        invalid_lines: usize,
    },
    /// No billable agreement; nothing uploaded
    NoAgreements { journal_id: String },
    /// Agreements produced no line; nothing uploaded
    NoLines { journal_id: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationSummary {
    pub authorization_id: String,
    pub outcome: AuthorizationOutcome,
}

/// Result of a monthly run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub period: BillingPeriod,
    pub authorizations: Vec<AuthorizationSummary>,
}

impl GenerationSummary {
    pub fn new(period: BillingPeriod) -> Self {
        Self {
            period,
            authorizations: Vec::new(),
        }
    }

    pub fn outcome(&self, authorization_id: &str) -> Option<&AuthorizationOutcome> {
        self.authorizations
            .iter()
            .find(|a| a.authorization_id == authorization_id)
            .map(|a| &a.outcome)
    }

    pub fn uploaded(&self) -> usize {
        self.authorizations
            .iter()
            .filter(|a| matches!(a.outcome, AuthorizationOutcome::Uploaded { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.authorizations
            .iter()
            .filter(|a| matches!(a.outcome, AuthorizationOutcome::Failed { .. }))
            .count()
    }
}

/// Inputs shared by every account of one agreement
struct AgreementScope<'a> {
    provider: &'a dyn AwsReportProvider,
    marketplace_report: &'a Report,
    invoices: &'a OrganizationInvoices,
    details: JournalDetails,
}

pub struct BillingJournalGenerator {
    clients: Collaborators,
    config: BillingConfig,
    period: BillingPeriod,
    product_ids: Vec<String>,
    processors: JournalProcessors,
    authorizations: Option<Vec<String>>,
}

impl BillingJournalGenerator {
    pub fn new(
        clients: Collaborators,
        config: BillingConfig,
        period: BillingPeriod,
        product_ids: Vec<String>,
        processors: JournalProcessors,
        authorizations: Option<Vec<String>>,
    ) -> Self {
        Self {
            clients,
            config,
            period,
            product_ids,
            processors,
            authorizations,
        }
    }

    pub fn period(&self) -> BillingPeriod {
        self.period
    }

    /// Generate and upload the journal of every matching authorization
    ///
    /// Only a failure to list authorizations is returned as an error; every
    /// other failure is recorded in the summary and notified.
    #[instrument(skip(self), fields(period = %self.period))]
    pub async fn generate_billing_journals(&self) -> AppResult<GenerationSummary> {
        let mut summary = GenerationSummary::new(self.period);

        let authorizations = match self
            .clients
            .commerce
            .get_authorizations(&self.authorizations_query())
            .await?
        {
            Some(authorizations) if !authorizations.is_empty() => authorizations,
            _ => {
                info!("No authorizations found for products {:?}", self.product_ids);
                return Ok(summary);
            }
        };

        info!(
            "Generating {} billing journals for {}",
            authorizations.len(),
            self.period
        );

        for authorization in authorizations {
            let authorization_id = authorization.id.clone();
            let outcome = match self.generate_authorization_journal(authorization).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        error_code = e.error_code(),
                        "Journal generation failed for authorization {}: {}", authorization_id, e
                    );
                    self.clients
                        .notifications
                        .error(
                            &format!("Billing journal failed for {}", authorization_id),
                            &e.to_string(),
                            None,
                        )
                        .await;
                    AuthorizationOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            summary.authorizations.push(AuthorizationSummary {
                authorization_id,
                outcome,
            });
        }

        info!(
            uploaded = summary.uploaded(),
            failed = summary.failed(),
            "Billing journal generation finished"
        );
        Ok(summary)
    }

    #[instrument(skip(self, authorization), fields(authorization_id = %authorization.id))]
    async fn generate_authorization_journal(
        &self,
        authorization: Authorization,
    ) -> AppResult<AuthorizationOutcome> {
        let journal_id = self.get_or_create_journal(&authorization).await?;

        let agreements = self
            .clients
            .commerce
            .get_agreements_by_query(&self.agreements_query(&authorization.id))
            .await?;

        if agreements.is_empty() {
            info!("No agreements found for authorization {}", authorization.id);
            return Ok(AuthorizationOutcome::NoAgreements { journal_id });
        }

        let mut context = AuthorizationContext::new(authorization, journal_id);

        for agreement in &agreements {
            match self.reconcile_agreement(&context.authorization, agreement).await {
                Ok(outcome) => context.absorb(outcome),
                Err(e) => {
                    error!(
                        agreement_id = %agreement.id,
                        error_code = e.error_code(),
                        "Agreement reconciliation failed: {}", e
                    );
                    self.clients
                        .notifications
                        .error(
                            &format!("Billing journal failed for agreement {}", agreement.id),
                            &e.to_string(),
                            None,
                        )
                        .await;
                }
            }
        }

        if context.lines.is_empty() {
            info!(
                "No journal lines generated for authorization {}",
                context.authorization.id
            );
            return Ok(AuthorizationOutcome::NoLines {
                journal_id: context.journal_id,
            });
        }

        self.upload_journal(context).await
    }

    /// Reuse the pending journal of the period, or create the next one
    async fn get_or_create_journal(&self, authorization: &Authorization) -> AppResult<String> {
        let external_id = self.period.journal_external_id();
        let journals = self
            .clients
            .journals
            .query(&journals_query(&authorization.id, &external_id))
            .await?;

        if let Some(journal) = journals.iter().find(|j| j.status.is_pending()) {
            info!("Reusing journal {} in status {:?}", journal.id, journal.status);
            return Ok(journal.id.clone());
        }

        let new_journal = NewJournal::new(
            self.period.journal_name(journals.len() + 1),
            &authorization.id,
            self.period.end_date(),
            external_id,
        );
        let journal = self.clients.journals.create(&new_journal).await?;
        info!("Created journal {} ({})", journal.id, new_journal.name);

        Ok(journal.id)
    }

    #[instrument(skip(self, authorization, agreement), fields(agreement_id = %agreement.id))]
    async fn reconcile_agreement(
        &self,
        authorization: &Authorization,
        agreement: &Agreement,
    ) -> AppResult<AgreementOutcome> {
        let mpa_id = agreement
            .mpa_id()
            .ok_or_else(|| BillingError::MissingMpaAccount(agreement.id.clone()))?;

        let provider = self.clients.aws.connect(mpa_id).await?;
        let provider = provider.as_ref();

        let marketplace_report = reports::marketplace_usage_report(provider, self.period).await?;
        let summaries = provider
            .list_invoice_summaries_by_account_id(mpa_id, self.period.year(), self.period.month())
            .await?;
        let invoices = build_organization_invoices(&summaries, &authorization.currency)?;
        check_payment_currency(&invoices, &authorization.currency)?;

        let mut outcome = AgreementOutcome::default();
        let scope = AgreementScope {
            provider,
            marketplace_report: &marketplace_report,
            invoices: &invoices,
            details: self.journal_details(agreement, mpa_id),
        };

        for subscription in &agreement.subscriptions {
            if subscription.status.is_terminated() {
                debug!("Skipping terminated subscription {}", subscription.id);
                continue;
            }
            let Some(account_id) = subscription.account_id() else {
                warn!("Subscription {} has no account id", subscription.id);
                continue;
            };

            match self.process_account(&scope, account_id, &subscription.lines).await {
                Ok(account) => outcome.add_account(account_id, account),
                Err(e) => {
                    self.notify_subscription_failure(agreement, &subscription.id, &e)
                        .await
                }
            }
        }

        if let Some(subscription) = mpa_subscription(agreement, mpa_id) {
            match self.process_account(&scope, mpa_id, &subscription.lines).await {
                Ok(account) => outcome.add_account(mpa_id, account),
                Err(e) => {
                    self.notify_subscription_failure(agreement, &subscription.id, &e)
                        .await
                }
            }
        }

        outcome
            .reports
            .marketplace_usage
            .insert(mpa_id.to_string(), marketplace_report);
        outcome
            .reports
            .organization_invoices
            .insert(mpa_id.to_string(), invoices);

        Ok(outcome)
    }

    #[instrument(skip(self, scope, lines))]
    async fn process_account(
        &self,
        scope: &AgreementScope<'_>,
        account_id: &str,
        lines: &[SubscriptionLine],
    ) -> AppResult<AccountOutcome> {
        let record_type_report =
            reports::record_type_report(scope.provider, self.period, account_id).await?;
        let invoice_entity_report =
            reports::invoice_entity_report(scope.provider, self.period, account_id).await?;

        let metrics = AccountMetrics::build(
            account_id,
            scope.marketplace_report,
            &record_type_report,
            &invoice_entity_report,
        )?;
        let builder = LineBuilder::new(&scope.details, account_id, &metrics, scope.invoices);
        let mut outcome = AccountOutcome::default();

        for line in lines {
            let Some(sku) = line.item_external_id() else {
                warn!("Subscription line {} has no item external id", line.id);
                continue;
            };
            let Some(processor) = self.processors.get(sku) else {
                debug!("No journal processor for item {}", sku);
                continue;
            };

            match processor.process(account_id, sku, &metrics, &scope.details, scope.invoices) {
                Ok(lines) => outcome.lines.extend(lines),
                Err(e) => {
                    warn!(service_name = %e.service_name, item = sku, "Billing line error: {}", e);
                    outcome
                        .lines
                        .push(builder.error_line(&e.service_name, e.amount, sku, &e.message));
                }
            }
        }

        let services = get_services_by_account(&record_type_report)?;
        let invalid = invalid_service_lines(&builder, &services, &outcome.lines);
        if !invalid.is_empty() {
            warn!("{} services of account {} are not billed", invalid.len(), account_id);
        }
        outcome.lines.extend(invalid);

        info!(
            amount = %amount_by_account(&outcome.lines, account_id),
            lines = outcome.lines.len(),
            "Account {} reconciled", account_id
        );

        outcome.add_report(AccountReportType::RecordTypeAndService, record_type_report);
        outcome.add_report(AccountReportType::ServiceAndInvoiceEntity, invoice_entity_report);
        Ok(outcome)
    }

    /// Upload the journal file, the failed lines and the report archive, then notify
    #[instrument(skip(self, context), fields(journal_id = %context.journal_id))]
    async fn upload_journal(&self, context: AuthorizationContext) -> AppResult<AuthorizationOutcome> {
        let invalid_lines = context.invalid_lines().len();
        let AuthorizationContext {
            authorization,
            journal_id,
            lines,
            reports,
        } = context;

        let content = artifacts::serialize_lines(&lines)?;
        let filename = artifacts::journal_filename(&authorization.id, self.period);
        self.clients
            .journals
            .upload(&journal_id, content, &filename)
            .await?;
        info!("Uploaded {} with {} lines", filename, lines.len());

        let failed_report = match artifacts::failed_lines_attachment(&journal_id, &lines)? {
            Some(attachment) => {
                let uploaded = self
                    .clients
                    .journals
                    .upload_attachment(&journal_id, attachment)
                    .await?;
                Some(uploaded.id)
            }
            None => None,
        };

        let archive = artifacts::reports_attachment(&journal_id, &reports)?;
        self.clients
            .journals
            .upload_attachment(&journal_id, archive)
            .await?;

        let notifications = &self.clients.notifications;
        match failed_report {
            Some(attachment_id) => {
                let button = notifications.attachment_link(&journal_id, &attachment_id);
                notifications
                    .error(
                        &format!("Billing journal {} has errors", journal_id),
                        &format!(
                            "{} of {} lines for authorization {} ({}) could not be reconciled.",
                            invalid_lines,
                            lines.len(),
                            authorization.id,
                            self.period
                        ),
                        Some(&button),
                    )
                    .await;
            }
            None => {
                let button = notifications.journal_link(&journal_id);
                notifications
                    .success(
                        &format!("Billing journal {} uploaded", journal_id),
                        &format!(
                            "{} lines uploaded for authorization {} ({}).",
                            lines.len(),
                            authorization.id,
                            self.period
                        ),
                        Some(&button),
                    )
                    .await;
            }
        }

        Ok(AuthorizationOutcome::Uploaded {
            journal_id,
            total_lines: lines.len(),
            invalid_lines,
        })
    }

    async fn notify_subscription_failure(
        &self,
        agreement: &Agreement,
        subscription_id: &str,
        err: &BillingError,
    ) {
        error!(
            agreement_id = %agreement.id,
            subscription_id,
            error_code = err.error_code(),
            "Subscription reconciliation failed: {}", err
        );
        self.clients
            .notifications
            .error(
                &format!("Billing journal failed for subscription {}", subscription_id),
                &format!("Agreement {}: {}", agreement.id, err),
                None,
            )
            .await;
    }

    fn journal_details(&self, agreement: &Agreement, mpa_id: &str) -> JournalDetails {
        JournalDetails {
            agreement_id: agreement.id.clone(),
            mpa_id: mpa_id.to_string(),
            start_date: self.period.start_date(),
            end_date: self.period.last_day(),
            segment: self.config.segment.clone(),
        }
    }

    fn authorizations_query(&self) -> String {
        let products = format!("in(product.id,({}))", self.product_ids.join(","));
        match &self.authorizations {
            Some(ids) if !ids.is_empty() => format!("and({},in(id,({})))", products, ids.join(",")),
            _ => products,
        }
    }

    fn agreements_query(&self, authorization_id: &str) -> String {
        format!(
            "and(eq(authorization.id,{}),in(status,({})),in(product.id,({})))\
             &select=subscriptions,subscriptions.lines,parameters",
            authorization_id,
            BILLABLE_AGREEMENT_STATUSES.join(","),
            self.product_ids.join(",")
        )
    }
}

fn journals_query(authorization_id: &str, external_id: &str) -> String {
    format!(
        "and(eq(authorization.id,{}),eq(externalIds.vendor,{}))",
        authorization_id, external_id
    )
}

/// Subscription whose lines bill the MPA account itself
///
/// None for split billing agreements, whose MPA usage is billed through the
/// parent agreement, and when the MPA already has its own subscription: that
/// subscription already bills the MPA, a second pass would duplicate its lines.
fn mpa_subscription<'a>(agreement: &'a Agreement, mpa_id: &str) -> Option<&'a Subscription> {
    if agreement.is_split_billing() {
        info!("Agreement {} uses split billing, MPA usage not billed", agreement.id);
        return None;
    }
    if agreement
        .subscriptions
        .iter()
        .any(|s| s.account_id() == Some(mpa_id))
    {
        return None;
    }
    agreement.first_active_subscription()
}
