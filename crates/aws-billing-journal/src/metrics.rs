//! Report aggregation
//!
//! Reshapes grouped Cost Explorer reports into `{service_name: amount}` maps and
//! assembles them into the per-account metric view the processors read.

use aws_billing_core::models::Report;
use aws_billing_core::{AppResult, BillingError};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::constants::{record_types, services};

static EMPTY_METRIC: BTreeMap<String, Decimal> = BTreeMap::new();

/// Metric families tracked per account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricType {
    Marketplace,
    Usage,
    Support,
    Refund,
    SavingPlans,
    ProviderDiscount,
    Recurring,
}

impl MetricType {
    /// Record types read from the record-type report (marketplace has its own report)
    pub const RECORD_TYPE_METRICS: [MetricType; 6] = [
        MetricType::Usage,
        MetricType::Support,
        MetricType::Refund,
        MetricType::SavingPlans,
        MetricType::ProviderDiscount,
        MetricType::Recurring,
    ];

    /// Cost Explorer `RECORD_TYPE` value, if the metric comes from the record-type report
    pub fn record_type(&self) -> Option<&'static str> {
        match self {
            MetricType::Marketplace => None,
            MetricType::Usage => Some(record_types::USAGE),
            MetricType::Support => Some(record_types::SUPPORT),
            MetricType::Refund => Some(record_types::REFUND),
            MetricType::SavingPlans => Some(record_types::SAVING_PLAN_RECURRING_FEE),
            MetricType::ProviderDiscount => Some(record_types::SOLUTION_PROVIDER_DISCOUNT),
            MetricType::Recurring => Some(record_types::RECURRING),
        }
    }
}

/// Metrics of one linked account for the billing period
///
/// Rebuilt for every account on every run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountMetrics {
    metrics: BTreeMap<MetricType, BTreeMap<String, Decimal>>,
    service_invoice_entity: BTreeMap<String, String>,
}

impl AccountMetrics {
    /// Build the metrics of `account_id` from the MPA marketplace report and the
    /// account's record-type and invoice-entity reports
    pub fn build(
        account_id: &str,
        marketplace_report: &Report,
        record_type_report: &Report,
        invoice_entity_report: &Report,
    ) -> AppResult<Self> {
        let mut metrics = BTreeMap::new();
        metrics.insert(
            MetricType::Marketplace,
            get_metrics_by_key(marketplace_report, account_id)?,
        );
        for metric in MetricType::RECORD_TYPE_METRICS {
            if let Some(record_type) = metric.record_type() {
                metrics.insert(metric, get_metrics_by_key(record_type_report, record_type)?);
            }
        }

        Ok(Self {
            metrics,
            service_invoice_entity: get_invoice_entity_by_service(invoice_entity_report),
        })
    }

    /// `{service_name: amount}` for a metric, empty when nothing was reported
    pub fn get(&self, metric: MetricType) -> &BTreeMap<String, Decimal> {
        self.metrics.get(&metric).unwrap_or(&EMPTY_METRIC)
    }

    /// Amount of `service_name` under `metric`, zero when absent
    pub fn amount(&self, metric: MetricType, service_name: &str) -> Decimal {
        self.get(metric)
            .get(service_name)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn invoice_entity(&self, service_name: &str) -> Option<&str> {
        self.service_invoice_entity
            .get(service_name)
            .map(String::as_str)
    }

    pub fn set_metric(&mut self, metric: MetricType, values: BTreeMap<String, Decimal>) {
        self.metrics.insert(metric, values);
    }

    pub fn set_invoice_entity(&mut self, service_name: &str, invoice_entity: &str) {
        self.service_invoice_entity
            .insert(service_name.to_string(), invoice_entity.to_string());
    }
}

/// Parse a report amount that may use `,` or `.` as separator
///
/// A lone comma followed by exactly three digits is a thousands separator
/// (`"1,234"` is 1234) unless the integer part is zero (`"0,123"` is 0.123);
/// otherwise a lone comma is the decimal separator.
/// When both appear, the last one is the decimal separator.
pub fn get_report_amount(raw: &str) -> AppResult<Decimal> {
    let normalized = normalize_amount(raw.trim());
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }

    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|e| BillingError::Validation(format!("Invalid report amount '{}': {}", raw, e)))
}

fn normalize_amount(raw: &str) -> String {
    let last_dot = raw.rfind('.');
    let last_comma = raw.rfind(',');

    match (last_dot, last_comma) {
        (_, None) => raw.to_string(),
        (Some(dot), Some(comma)) if dot > comma => raw.replace(',', ""),
        (Some(_), Some(_)) => raw.replace('.', "").replace(',', "."),
        (None, Some(comma)) => {
            let fraction = &raw[comma + 1..];
            let integer = raw[..comma].trim_start_matches(['-', '+']);
            let single = raw.matches(',').count() == 1;
            // "0,123" has no thousands to group
            let zero_integer = integer.chars().all(|c| c == '0');
            if single && (fraction.len() != 3 || zero_integer) {
                raw.replace(',', ".")
            } else {
                raw.replace(',', "")
            }
        }
    }
}

/// `{second_key: amount}` for every group whose keys contain `key`
///
/// Zero amounts are skipped. When several time buckets report the same second
/// key, the last one wins.
pub fn get_metrics_by_key(report: &Report, key: &str) -> AppResult<BTreeMap<String, Decimal>> {
    let mut result = BTreeMap::new();

    for group in report.groups() {
        if !group.keys.iter().any(|k| k == key) {
            continue;
        }
        let (Some(name), Some(raw)) = (group.secondary_key(), group.unblended_amount()) else {
            continue;
        };
        let amount = get_report_amount(raw)?;
        if amount.is_zero() {
            continue;
        }
        result.insert(name.to_string(), amount);
    }

    Ok(result)
}

/// `{service_name: invoicing_entity}` from a SERVICE x INVOICING_ENTITY report
pub fn get_invoice_entity_by_service(report: &Report) -> BTreeMap<String, String> {
    report
        .groups()
        .filter_map(|group| match group.keys.as_slice() {
            [service, entity, ..] => Some((service.clone(), entity.clone())),
            _ => None,
        })
        .collect()
}

/// Positive amount per service across every record type except tax
///
/// This is the cost observed for the account; each service in it must end up in
/// a journal line, valid or not.
pub fn get_services_by_account(record_type_report: &Report) -> AppResult<BTreeMap<String, Decimal>> {
    let mut result: BTreeMap<String, Decimal> = BTreeMap::new();

    for group in record_type_report.groups() {
        let [record_type, service, ..] = group.keys.as_slice() else {
            continue;
        };
        if record_type == record_types::TAX || service == services::TAX {
            continue;
        }
        let Some(raw) = group.unblended_amount() else {
            continue;
        };
        let amount = get_report_amount(raw)?;
        if amount > Decimal::ZERO {
            *result.entry(service.clone()).or_insert(Decimal::ZERO) += amount;
        }
    }

    Ok(result)
}
