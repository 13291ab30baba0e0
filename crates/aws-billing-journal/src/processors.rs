//! Item journal line processors
//!
//! One processor per subscription item SKU. A processor reads one metric family
//! of the account, drops excluded services, validates each service's discount and
//! emits a journal line for every service that passes.

use aws_billing_core::config::BillingConfig;
use aws_billing_core::error::BillingLineError;
use aws_billing_core::models::{JournalDetails, JournalLine, OrganizationInvoices};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

use crate::constants::{item_skus, services};
use crate::lines::LineBuilder;
use crate::metrics::{AccountMetrics, MetricType};
use crate::validators::{
    DefaultDiscountValidator, DefaultTrueDiscountValidator, DiscountValidator,
    SupportDiscountValidator, SupportEnterpriseDiscountValidator, UsageDiscountValidator,
};

/// Produces the journal lines billed by one subscription line
pub trait JournalLineProcessor: Send + Sync {
    fn process(
        &self,
        account_id: &str,
        item_external_id: &str,
        metrics: &AccountMetrics,
        details: &JournalDetails,
        invoices: &OrganizationInvoices,
    ) -> Result<Vec<JournalLine>, BillingLineError>;
}

/// Processors keyed by item SKU
pub type JournalProcessors = HashMap<String, Box<dyn JournalLineProcessor>>;

/// Metric driven processor configured per SKU
pub struct ItemJournalLineProcessor {
    metric: MetricType,
    exclude_services: Vec<String>,
    /// Services present in these metrics are billed by another SKU
    dynamic_exclude: Vec<MetricType>,
    validator: Box<dyn DiscountValidator>,
    discount: Decimal,
    tolerance_rate: Decimal,
}

impl ItemJournalLineProcessor {
    pub fn new(
        metric: MetricType,
        validator: Box<dyn DiscountValidator>,
        discount: Decimal,
        tolerance_rate: Decimal,
    ) -> Self {
        Self {
            metric,
            exclude_services: Vec::new(),
            dynamic_exclude: Vec::new(),
            validator,
            discount,
            tolerance_rate,
        }
    }

    pub fn exclude_services(mut self, services: &[&str]) -> Self {
        self.exclude_services = services.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn exclude_metrics(mut self, metrics: &[MetricType]) -> Self {
        self.dynamic_exclude = metrics.to_vec();
        self
    }

    pub fn marketplace() -> Self {
        Self::new(
            MetricType::Marketplace,
            Box::new(DefaultTrueDiscountValidator),
            Decimal::ZERO,
            Decimal::ZERO,
        )
        .exclude_services(&[services::TAX])
    }

    pub fn usage(discount: Decimal, tolerance_rate: Decimal) -> Self {
        Self::new(
            MetricType::Usage,
            Box::new(UsageDiscountValidator),
            discount,
            tolerance_rate,
        )
        .exclude_services(&[services::SAVINGS_PLANS_COMPUTE_USAGE])
        .exclude_metrics(&[MetricType::SavingPlans, MetricType::Marketplace])
    }

    pub fn other_services() -> Self {
        Self::new(
            MetricType::Usage,
            Box::new(DefaultTrueDiscountValidator),
            Decimal::ZERO,
            Decimal::ZERO,
        )
        .exclude_metrics(&[MetricType::Marketplace])
    }

    pub fn support(discount: Decimal, tolerance_rate: Decimal) -> Self {
        Self::new(
            MetricType::Support,
            Box::new(SupportDiscountValidator),
            discount,
            tolerance_rate,
        )
    }

    pub fn support_enterprise(discount: Decimal, tolerance_rate: Decimal) -> Self {
        Self::new(
            MetricType::Support,
            Box::new(SupportEnterpriseDiscountValidator),
            discount,
            tolerance_rate,
        )
    }

    pub fn saving_plans(discount: Decimal, tolerance_rate: Decimal) -> Self {
        Self::new(
            MetricType::SavingPlans,
            Box::new(DefaultDiscountValidator),
            discount,
            tolerance_rate,
        )
    }

    pub fn upfront(discount: Decimal, tolerance_rate: Decimal) -> Self {
        Self::new(
            MetricType::Recurring,
            Box::new(UsageDiscountValidator),
            discount,
            tolerance_rate,
        )
    }

    fn is_excluded(&self, service_name: &str, metrics: &AccountMetrics) -> bool {
        self.exclude_services.iter().any(|s| s == service_name)
            || self
                .dynamic_exclude
                .iter()
                .any(|metric| metrics.get(*metric).contains_key(service_name))
    }
}

impl JournalLineProcessor for ItemJournalLineProcessor {
    fn process(
        &self,
        account_id: &str,
        item_external_id: &str,
        metrics: &AccountMetrics,
        details: &JournalDetails,
        invoices: &OrganizationInvoices,
    ) -> Result<Vec<JournalLine>, BillingLineError> {
        let builder = LineBuilder::new(details, account_id, metrics, invoices);
        let mut lines = Vec::new();

        for (service_name, amount) in metrics.get(self.metric) {
            if self.is_excluded(service_name, metrics) {
                continue;
            }

            let valid = self
                .validator
                .validate(self.discount, *amount, service_name, metrics, self.tolerance_rate)
                .map_err(|e| BillingLineError::new(service_name.as_str(), Decimal::ZERO, e.to_string()))?;

            if !valid {
                debug!(
                    account_id,
                    service_name = %service_name,
                    item = item_external_id,
                    "Discount does not match, service skipped"
                );
                continue;
            }

            lines.push(builder.valid_line(service_name, *amount, item_external_id));
        }

        Ok(lines)
    }
}

/// Build the SKU to processor mapping for one run
pub fn journal_processors(config: &BillingConfig) -> JournalProcessors {
    let tolerance = config.tolerance_rate;
    let discounts = &config.discounts;

    let processors: Vec<(&str, ItemJournalLineProcessor)> = vec![
        (item_skus::MARKETPLACE, ItemJournalLineProcessor::marketplace()),
        (item_skus::USAGE, ItemJournalLineProcessor::usage(discounts.usage, tolerance)),
        (
            item_skus::USAGE_INCENTIVATE,
            ItemJournalLineProcessor::usage(discounts.usage_incentivate, tolerance),
        ),
        (item_skus::OTHER_SERVICES, ItemJournalLineProcessor::other_services()),
        (item_skus::SUPPORT, ItemJournalLineProcessor::support(discounts.support, tolerance)),
        (
            item_skus::SUPPORT_ENTERPRISE,
            ItemJournalLineProcessor::support_enterprise(discounts.support_enterprise, tolerance),
        ),
        (
            item_skus::SAVING_PLANS,
            ItemJournalLineProcessor::saving_plans(discounts.saving_plans, tolerance),
        ),
        (
            item_skus::SAVING_PLANS_INCENTIVATE,
            ItemJournalLineProcessor::saving_plans(discounts.saving_plans_incentivate, tolerance),
        ),
        (item_skus::UPFRONT, ItemJournalLineProcessor::upfront(discounts.upfront, tolerance)),
        (
            item_skus::UPFRONT_INCENTIVATE,
            ItemJournalLineProcessor::upfront(discounts.upfront_incentivate, tolerance),
        ),
    ];

    processors
        .into_iter()
        .map(|(sku, processor)| (sku.to_string(), Box::new(processor) as Box<dyn JournalLineProcessor>))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_billing_core::models::InvoiceEntityDetails;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    const ACCOUNT: &str = "210987654321";

    fn details() -> JournalDetails {
        JournalDetails {
            agreement_id: "AGR-1".to_string(),
            mpa_id: "123456789012".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
            segment: "COM".to_string(),
        }
    }

    fn metric(values: &[(&str, Decimal)]) -> BTreeMap<String, Decimal> {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_marketplace_accepts_and_skips_tax() {
        let mut metrics = AccountMetrics::default();
        metrics.set_metric(
            MetricType::Marketplace,
            metric(&[("Marketplace service", dec!(100)), ("Tax", dec!(21))]),
        );

        let lines = ItemJournalLineProcessor::marketplace()
            .process(ACCOUNT, item_skus::MARKETPLACE, &metrics, &details(), &OrganizationInvoices::default())
            .unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].service_name(), "Marketplace service");
        assert_eq!(lines[0].price.pp_x1, dec!(100));
        assert!(lines[0].error.is_none());
    }

    #[test]
    fn test_usage_valid_discount() {
        let mut metrics = AccountMetrics::default();
        metrics.set_metric(MetricType::Usage, metric(&[("Amazon EC2", dec!(100))]));
        metrics.set_metric(MetricType::ProviderDiscount, metric(&[("Amazon EC2", dec!(7))]));

        let lines = ItemJournalLineProcessor::usage(dec!(7), dec!(1))
            .process(ACCOUNT, item_skus::USAGE, &metrics, &details(), &OrganizationInvoices::default())
            .unwrap();

        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_valid());
        assert_eq!(lines[0].search.item.value, item_skus::USAGE);
    }

    #[test]
    fn test_usage_skips_invalid_discount() {
        let mut metrics = AccountMetrics::default();
        metrics.set_metric(MetricType::Usage, metric(&[("Amazon EC2", dec!(100))]));
        metrics.set_metric(MetricType::ProviderDiscount, metric(&[("Amazon EC2", dec!(-7))]));

        let lines = ItemJournalLineProcessor::usage(dec!(12), dec!(1))
            .process(ACCOUNT, item_skus::USAGE_INCENTIVATE, &metrics, &details(), &OrganizationInvoices::default())
            .unwrap();

        assert!(lines.is_empty());
    }

    #[test]
    fn test_usage_excludes_static_and_dynamic_services() {
        let mut metrics = AccountMetrics::default();
        metrics.set_metric(
            MetricType::Usage,
            metric(&[
                ("Amazon EC2", dec!(100)),
                (services::SAVINGS_PLANS_COMPUTE_USAGE, dec!(30)),
                ("Compute Savings Plans", dec!(20)),
                ("Marketplace service", dec!(10)),
            ]),
        );
        metrics.set_metric(MetricType::SavingPlans, metric(&[("Compute Savings Plans", dec!(20))]));
        metrics.set_metric(MetricType::Marketplace, metric(&[("Marketplace service", dec!(10))]));
        metrics.set_metric(MetricType::ProviderDiscount, metric(&[("Amazon EC2", dec!(-7))]));

        let lines = ItemJournalLineProcessor::usage(dec!(7), dec!(1))
            .process(ACCOUNT, item_skus::USAGE, &metrics, &details(), &OrganizationInvoices::default())
            .unwrap();

        let names: Vec<&str> = lines.iter().map(|l| l.service_name()).collect();
        assert_eq!(names, vec!["Amazon EC2"]);
    }

    #[test]
    fn test_other_services_bills_without_discount_check() {
        let mut metrics = AccountMetrics::default();
        metrics.set_metric(
            MetricType::Usage,
            metric(&[("Amazon EC2", dec!(100)), ("Marketplace service", dec!(10))]),
        );
        metrics.set_metric(MetricType::Marketplace, metric(&[("Marketplace service", dec!(10))]));

        let lines = ItemJournalLineProcessor::other_services()
            .process(ACCOUNT, item_skus::OTHER_SERVICES, &metrics, &details(), &OrganizationInvoices::default())
            .unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].service_name(), "Amazon EC2");
    }

    #[test]
    fn test_support_ambiguous_is_line_error() {
        let mut metrics = AccountMetrics::default();
        metrics.set_metric(
            MetricType::Support,
            metric(&[
                ("AWS Support (Business)", dec!(100)),
                ("AWS Support (Developer)", dec!(29)),
            ]),
        );

        let err = ItemJournalLineProcessor::support(dec!(7), dec!(1))
            .process(ACCOUNT, item_skus::SUPPORT, &metrics, &details(), &OrganizationInvoices::default())
            .unwrap_err();

        assert_eq!(err.amount, Decimal::ZERO);
        assert!(err.message.contains("AWS Support (Business)"));
        assert!(err.message.contains("AWS Support (Developer)"));
    }

    #[test]
    fn test_saving_plans_converts_currency() {
        let mut metrics = AccountMetrics::default();
        metrics.set_metric(MetricType::SavingPlans, metric(&[("Compute Savings Plans", dec!(100))]));
        metrics.set_metric(
            MetricType::ProviderDiscount,
            metric(&[("Compute Savings Plans", dec!(-7))]),
        );
        metrics.set_invoice_entity("Compute Savings Plans", "Amazon Web Services EMEA SARL");

        let mut invoices = OrganizationInvoices::default();
        invoices.invoice_entities.insert(
            "Amazon Web Services EMEA SARL".to_string(),
            InvoiceEntityDetails {
                invoice_id: "EUINES25-1".to_string(),
                base_currency_code: "USD".to_string(),
                payment_currency_code: "EUR".to_string(),
                exchange_rate: dec!(0.91),
            },
        );

        let lines = ItemJournalLineProcessor::saving_plans(dec!(7), dec!(1))
            .process(ACCOUNT, item_skus::SAVING_PLANS, &metrics, &details(), &invoices)
            .unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].amount(), dec!(91));
        assert_eq!(lines[0].external_ids.invoice, "EUINES25-1");
    }

    #[test]
    fn test_journal_processors_cover_every_sku() {
        let processors = journal_processors(&BillingConfig::default());
        for sku in [
            item_skus::MARKETPLACE,
            item_skus::USAGE,
            item_skus::USAGE_INCENTIVATE,
            item_skus::OTHER_SERVICES,
            item_skus::SUPPORT,
            item_skus::SUPPORT_ENTERPRISE,
            item_skus::SAVING_PLANS,
            item_skus::SAVING_PLANS_INCENTIVATE,
            item_skus::UPFRONT,
            item_skus::UPFRONT_INCENTIVATE,
        ] {
            assert!(processors.contains_key(sku), "missing processor for {}", sku);
        }
        assert_eq!(processors.len(), 10);
    }
}
