//! Invoice summary models
//!
//! `InvoiceSummary` mirrors the AWS Invoicing `ListInvoiceSummaries` item.
//! `OrganizationInvoices` is the per-MPA aggregation the processors use to
//! resolve invoice ids and exchange rates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// AWS invoice summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceSummary {
    pub account_id: String,
    pub invoice_id: String,
    pub entity: InvoiceEntity,
    pub payment_currency_amount: CurrencyAmount,
    pub base_currency_amount: CurrencyAmount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceEntity {
    pub invoicing_entity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurrencyAmount {
    pub currency_code: String,
    #[serde(default)]
    pub total_amount: String,
    #[serde(default)]
    pub total_amount_before_tax: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_exchange_details: Option<CurrencyExchangeDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurrencyExchangeDetails {
    pub rate: String,
}

/// Invoice data resolved for one invoicing entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceEntityDetails {
    pub invoice_id: String,
    pub base_currency_code: String,
    pub payment_currency_code: String,
    pub exchange_rate: Decimal,
}

impl InvoiceEntityDetails {
    /// Whether amounts for this entity must be converted to the payment currency
    #[inline]
    pub fn needs_conversion(&self) -> bool {
        self.payment_currency_code != self.base_currency_code
    }
}

/// Invoices of an organization for one billing period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationInvoices {
    pub invoice_entities: BTreeMap<String, InvoiceEntityDetails>,
    /// Sum of payment currency totals
    pub total_amount: Decimal,
    pub total_amount_before_tax: Decimal,
    /// Sum of base currency totals
    pub base_total_amount: Decimal,
    pub base_total_amount_before_tax: Decimal,
}

impl OrganizationInvoices {
    pub fn entity(&self, invoice_entity: &str) -> Option<&InvoiceEntityDetails> {
        self.invoice_entities.get(invoice_entity)
    }
}
