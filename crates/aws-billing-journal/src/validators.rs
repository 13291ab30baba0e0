//! Partner discount validators
//!
//! A validator decides whether the discount AWS applied to a service matches the
//! rate expected for the SKU billing it. Failing services are not billed by the
//! processor; they surface later as unmatched services.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::metrics::{AccountMetrics, MetricType};

/// Raised when a validator cannot decide
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscountValidationError {
    /// More than one support product is billed to the account
    #[error("Multiple support metrics found: {}", .metrics.join(", "))]
    AmbiguousSupport { metrics: Vec<String> },
}

/// Strategy checking a service's observed discount against the expected one
pub trait DiscountValidator: Send + Sync {
    /// `discount` and `tolerance_rate` are percentages
    fn validate(
        &self,
        discount: Decimal,
        amount: Decimal,
        service_name: &str,
        metrics: &AccountMetrics,
        tolerance_rate: Decimal,
    ) -> Result<bool, DiscountValidationError>;
}

/// `|part| / total * 100`, zero when `total` is zero
pub fn discount_percentage(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    part.abs() / total * Decimal::ONE_HUNDRED
}

/// Whether an observed discount matches the expected one
pub fn is_within_tolerance(provider_discount: Decimal, discount: Decimal, tolerance_rate: Decimal) -> bool {
    if discount.is_zero() && !provider_discount.is_zero() {
        return false;
    }
    (provider_discount - discount).abs() <= tolerance_rate
}

/// Accepts everything; marketplace charges carry no partner discount
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTrueDiscountValidator;

impl DiscountValidator for DefaultTrueDiscountValidator {
    fn validate(
        &self,
        _discount: Decimal,
        _amount: Decimal,
        _service_name: &str,
        _metrics: &AccountMetrics,
        _tolerance_rate: Decimal,
    ) -> Result<bool, DiscountValidationError> {
        Ok(true)
    }
}

/// Provider discount of the service relative to its own amount
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDiscountValidator;

impl DiscountValidator for DefaultDiscountValidator {
    fn validate(
        &self,
        discount: Decimal,
        amount: Decimal,
        service_name: &str,
        metrics: &AccountMetrics,
        tolerance_rate: Decimal,
    ) -> Result<bool, DiscountValidationError> {
        let service_discount = metrics.amount(MetricType::ProviderDiscount, service_name);
        let provider_discount = discount_percentage(service_discount, amount);
        Ok(is_within_tolerance(provider_discount, discount, tolerance_rate))
    }
}

/// Provider discount relative to usage plus recurring fees of the service
///
/// Usage and recurring charges share a single discount line in the reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageDiscountValidator;

impl DiscountValidator for UsageDiscountValidator {
    fn validate(
        &self,
        discount: Decimal,
        _amount: Decimal,
        service_name: &str,
        metrics: &AccountMetrics,
        tolerance_rate: Decimal,
    ) -> Result<bool, DiscountValidationError> {
        let service_discount = metrics.amount(MetricType::ProviderDiscount, service_name);
        let total = metrics.amount(MetricType::Usage, service_name)
            + metrics.amount(MetricType::Recurring, service_name);
        let provider_discount = discount_percentage(service_discount, total);
        Ok(is_within_tolerance(provider_discount, discount, tolerance_rate))
    }
}

fn single_support_amount(metrics: &AccountMetrics) -> Result<Decimal, DiscountValidationError> {
    let support = metrics.get(MetricType::Support);
    if support.len() > 1 {
        return Err(DiscountValidationError::AmbiguousSupport {
            metrics: support.keys().cloned().collect(),
        });
    }
    Ok(support.values().next().copied().unwrap_or(Decimal::ZERO))
}

fn validate_support(
    numerator: MetricType,
    discount: Decimal,
    service_name: &str,
    metrics: &AccountMetrics,
) -> Result<bool, DiscountValidationError> {
    let support_amount = single_support_amount(metrics)?;
    let support_discount =
        discount_percentage(metrics.amount(numerator, service_name), support_amount).round();
    Ok(support_discount == discount)
}

/// Refund-based discount, exact match on the rounded percentage
#[derive(Debug, Clone, Copy, Default)]
pub struct SupportDiscountValidator;

impl DiscountValidator for SupportDiscountValidator {
    fn validate(
        &self,
        discount: Decimal,
        _amount: Decimal,
        service_name: &str,
        metrics: &AccountMetrics,
        _tolerance_rate: Decimal,
    ) -> Result<bool, DiscountValidationError> {
        validate_support(MetricType::Refund, discount, service_name, metrics)
    }
}

/// Like [`SupportDiscountValidator`] but reads the provider discount metric
#[derive(Debug, Clone, Copy, Default)]
pub struct SupportEnterpriseDiscountValidator;

impl DiscountValidator for SupportEnterpriseDiscountValidator {
    fn validate(
        &self,
        discount: Decimal,
        _amount: Decimal,
        service_name: &str,
        metrics: &AccountMetrics,
        _tolerance_rate: Decimal,
    ) -> Result<bool, DiscountValidationError> {
        validate_support(MetricType::ProviderDiscount, discount, service_name, metrics)
    }
}
