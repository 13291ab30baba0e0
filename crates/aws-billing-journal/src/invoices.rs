//! Organization invoice aggregation

use aws_billing_core::models::{InvoiceEntityDetails, InvoiceSummary, OrganizationInvoices};
use aws_billing_core::{AppResult, BillingError};
use rust_decimal::Decimal;
use tracing::debug;

use crate::metrics::get_report_amount;

/// Aggregate the invoice summaries of an MPA into per-entity details and totals
///
/// `currency` is the authorization currency, used to pick the exchange rate.
/// When an entity has several invoices the last one provides the invoice id.
pub fn build_organization_invoices(
    summaries: &[InvoiceSummary],
    currency: &str,
) -> AppResult<OrganizationInvoices> {
    let mut invoices = OrganizationInvoices::default();

    for summary in summaries {
        let entity = &summary.entity.invoicing_entity;
        let exchange_rate = resolve_exchange_rate(summaries, entity, currency)?;

        invoices.invoice_entities.insert(
            entity.clone(),
            InvoiceEntityDetails {
                invoice_id: summary.invoice_id.clone(),
                base_currency_code: summary.base_currency_amount.currency_code.clone(),
                payment_currency_code: summary.payment_currency_amount.currency_code.clone(),
                exchange_rate,
            },
        );

        invoices.total_amount += get_report_amount(&summary.payment_currency_amount.total_amount)?;
        invoices.total_amount_before_tax +=
            get_report_amount(&summary.payment_currency_amount.total_amount_before_tax)?;
        invoices.base_total_amount += get_report_amount(&summary.base_currency_amount.total_amount)?;
        invoices.base_total_amount_before_tax +=
            get_report_amount(&summary.base_currency_amount.total_amount_before_tax)?;
    }

    debug!(
        entities = invoices.invoice_entities.len(),
        total_amount = %invoices.total_amount,
        "Organization invoices aggregated"
    );

    Ok(invoices)
}

/// Exchange rate from base to payment currency for `entity`
///
/// Takes the highest rate among the entity's invoices paid in `currency`; falls
/// back to the highest rate among every invoice paid in `currency`, else zero.
pub fn resolve_exchange_rate(
    summaries: &[InvoiceSummary],
    entity: &str,
    currency: &str,
) -> AppResult<Decimal> {
    let paid_in_currency = summaries
        .iter()
        .filter(|s| s.payment_currency_amount.currency_code == currency);

    let mut entity_rate: Option<Decimal> = None;
    let mut any_rate: Option<Decimal> = None;

    for summary in paid_in_currency {
        let rate = invoice_rate(summary)?;
        any_rate = Some(any_rate.map_or(rate, |r| r.max(rate)));
        if summary.entity.invoicing_entity == entity {
            entity_rate = Some(entity_rate.map_or(rate, |r| r.max(rate)));
        }
    }

    Ok(entity_rate.or(any_rate).unwrap_or(Decimal::ZERO))
}

fn invoice_rate(summary: &InvoiceSummary) -> AppResult<Decimal> {
    match &summary.payment_currency_amount.currency_exchange_details {
        Some(details) => get_report_amount(&details.rate),
        None => Ok(Decimal::ZERO),
    }
}

/// Every invoice entity must be paid in the authorization currency
pub fn check_payment_currency(invoices: &OrganizationInvoices, currency: &str) -> AppResult<()> {
    for (entity, details) in &invoices.invoice_entities {
        if details.payment_currency_code != currency {
            return Err(BillingError::CurrencyMismatch {
                currency: currency.to_string(),
                entity: entity.clone(),
                payment_currency: details.payment_currency_code.clone(),
            });
        }
    }
    Ok(())
}
