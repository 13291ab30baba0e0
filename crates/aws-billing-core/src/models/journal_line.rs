//! Journal line model
//!
//! One entry of a billing journal file. Lines are written as newline-delimited
//! JSON in the shape the ledger expects.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::journal::JournalDetails;

/// Search value used when a service could not be linked to any catalog item
pub const ITEM_NOT_FOUND: &str = "Item not found";

const ITEM_CRITERIA: &str = "item.externalIds.vendor";
const SUBSCRIPTION_CRITERIA: &str = "subscription.externalIds.vendor";

/// A billing journal line
///
/// A line with `error` set is a reconciliation failure record, not a charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLine {
    pub description: Description,
    pub external_ids: LineExternalIds,
    pub period: Period,
    pub price: Price,
    pub quantity: u32,
    pub search: Search,
    pub segment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `value1` is the service name, `value2` is `"{account_id}/{invoice_entity}"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub value1: String,
    pub value2: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineExternalIds {
    pub invoice: String,
    /// Agreement id
    pub reference: String,
    /// MPA account id
    pub vendor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(rename = "PPx1", with = "rust_decimal::serde::float")]
    pub pp_x1: Decimal,
    #[serde(rename = "unitPP", with = "rust_decimal::serde::float")]
    pub unit_pp: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Search {
    pub item: SearchCriteria,
    pub subscription: SearchCriteria,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub criteria: String,
    pub value: String,
}

impl JournalLine {
    /// Create a valid line for `service_name` on `account_id`, priced at `amount`
    ///
    /// The item search value defaults to `ITEM_NOT_FOUND` and the invoice fields are
    /// empty until set with [`JournalLine::item`] and [`JournalLine::invoice`].
    pub fn new(details: &JournalDetails, account_id: &str, service_name: &str, amount: Decimal) -> Self {
        Self {
            description: Description {
                value1: service_name.to_string(),
                value2: format!("{}/", account_id),
            },
            external_ids: LineExternalIds {
                invoice: String::new(),
                reference: details.agreement_id.clone(),
                vendor: details.mpa_id.clone(),
            },
            period: Period {
                start: details.start_date,
                end: details.end_date,
            },
            price: Price {
                pp_x1: amount,
                unit_pp: amount,
            },
            quantity: 1,
            search: Search {
                item: SearchCriteria {
                    criteria: ITEM_CRITERIA.to_string(),
                    value: ITEM_NOT_FOUND.to_string(),
                },
                subscription: SearchCriteria {
                    criteria: SUBSCRIPTION_CRITERIA.to_string(),
                    value: account_id.to_string(),
                },
            },
            segment: details.segment.clone(),
            error: None,
        }
    }

    /// Link the line to the catalog item with the given vendor external id
    pub fn item(mut self, item_external_id: &str) -> Self {
        self.search.item.value = item_external_id.to_string();
        self
    }

    /// Set the invoicing entity and invoice id
    pub fn invoice(mut self, invoice_entity: &str, invoice_id: &str) -> Self {
        let account_id = self.account_id().to_string();
        self.description.value2 = format!("{}/{}", account_id, invoice_entity);
        self.external_ids.invoice = invoice_id.to_string();
        self
    }

    /// Mark the line as a reconciliation failure
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    #[inline]
    pub fn service_name(&self) -> &str {
        &self.description.value1
    }

    /// Account component of `description.value2`
    pub fn account_id(&self) -> &str {
        self.description
            .value2
            .split_once('/')
            .map(|(account, _)| account)
            .unwrap_or(&self.description.value2)
    }

    #[inline]
    pub fn amount(&self) -> Decimal {
        self.price.pp_x1
    }

    /// Serialize to a single JSON line terminated by `\n`
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
