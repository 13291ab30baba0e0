//! Unmatched service detection
//!
//! Every service with positive cost on an account must appear in the journal,
//! either billed by a subscription line or recorded as an error line.

use aws_billing_core::models::{JournalLine, ITEM_NOT_FOUND};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::lines::LineBuilder;
use crate::metrics::MetricType;

const DISCOUNT_SCALE: u32 = 2;

/// Partner discount applied to a service, as a percentage of its amount
///
/// Diagnostic only: not clamped, it may be negative or exceed 100.
pub fn implied_discount(provider_discount: Decimal, amount: Decimal) -> Decimal {
    if amount.is_zero() {
        return Decimal::ZERO;
    }
    (-provider_discount / amount * Decimal::ONE_HUNDRED)
        .round_dp(DISCOUNT_SCALE)
        .normalize()
}

/// Error lines for the services of `services_by_account` that no line of the
/// account references
pub fn invalid_service_lines(
    builder: &LineBuilder<'_>,
    services_by_account: &BTreeMap<String, Decimal>,
    account_lines: &[JournalLine],
) -> Vec<JournalLine> {
    services_by_account
        .iter()
        .filter(|(service_name, _)| {
            !account_lines.iter().any(|line| {
                line.account_id() == builder.account_id && line.service_name() == service_name.as_str()
            })
        })
        .map(|(service_name, amount)| {
            let provider_discount = builder
                .metrics
                .amount(MetricType::ProviderDiscount, service_name);
            let discount = implied_discount(provider_discount, *amount);
            let message = format!(
                "Service {} with amount {} and discount {}% did not match any subscription item",
                service_name, amount, discount
            );
            builder.error_line(service_name, *amount, ITEM_NOT_FOUND, &message)
        })
        .collect()
}

/// Sum of every line (valid or not) billed to `account_id`
pub fn amount_by_account(lines: &[JournalLine], account_id: &str) -> Decimal {
    lines
        .iter()
        .filter(|line| line.account_id() == account_id)
        .map(JournalLine::amount)
        .sum()
}
