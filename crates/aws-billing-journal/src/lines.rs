//! Journal line construction for one account

use aws_billing_core::models::{InvoiceEntityDetails, JournalDetails, JournalLine, OrganizationInvoices};
use rust_decimal::Decimal;

use crate::metrics::AccountMetrics;

/// Decimal places kept after currency conversion
const CONVERTED_AMOUNT_SCALE: u32 = 6;

/// Convert a base currency amount into the entity's payment currency
///
/// Amounts are left untouched when the entity is unknown or bills in its base currency.
pub fn convert_amount(amount: Decimal, invoice: Option<&InvoiceEntityDetails>) -> Decimal {
    match invoice {
        Some(details) if details.needs_conversion() => {
            (amount * details.exchange_rate).round_dp(CONVERTED_AMOUNT_SCALE)
        }
        _ => amount,
    }
}

/// Builds the journal lines of one account, resolving invoice and currency per service
pub struct LineBuilder<'a> {
    pub details: &'a JournalDetails,
    pub account_id: &'a str,
    pub metrics: &'a AccountMetrics,
    pub invoices: &'a OrganizationInvoices,
}

impl<'a> LineBuilder<'a> {
    pub fn new(
        details: &'a JournalDetails,
        account_id: &'a str,
        metrics: &'a AccountMetrics,
        invoices: &'a OrganizationInvoices,
    ) -> Self {
        Self {
            details,
            account_id,
            metrics,
            invoices,
        }
    }

    /// Line billing `amount` of `service_name` under the `item_external_id` SKU
    pub fn valid_line(&self, service_name: &str, amount: Decimal, item_external_id: &str) -> JournalLine {
        let invoice_entity = self.metrics.invoice_entity(service_name).unwrap_or_default();
        let invoice = self.invoices.entity(invoice_entity);

        JournalLine::new(
            self.details,
            self.account_id,
            service_name,
            convert_amount(amount, invoice),
        )
        .item(item_external_id)
        .invoice(
            invoice_entity,
            invoice.map(|i| i.invoice_id.as_str()).unwrap_or_default(),
        )
    }

    /// Reconciliation failure record for `service_name`
    pub fn error_line(
        &self,
        service_name: &str,
        amount: Decimal,
        item_external_id: &str,
        message: &str,
    ) -> JournalLine {
        self.valid_line(service_name, amount, item_external_id)
            .with_error(message)
    }
}
