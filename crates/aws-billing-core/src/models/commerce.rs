//! Catalog and commerce models
//!
//! Authorizations, agreements and subscriptions as returned by the marketplace
//! platform. Only the fields the billing run reads are modelled.

use serde::{Deserialize, Serialize};

/// Agreement fulfillment parameter holding the responsibility transfer type
pub const TRANSFER_TYPE_PARAMETER: &str = "transferType";

/// Transfer type whose MPA usage is billed through the split parent agreement
pub const SPLIT_BILLING: &str = "split_billing";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: String,
}

/// Catalog authorization: the unit a journal is created for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub external_ids: VendorIds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub external_id: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(default)]
    pub ordering: Vec<Parameter>,
    #[serde(default)]
    pub fulfillment: Vec<Parameter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Updating,
    Terminating,
    Terminated,
    Expired,
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    #[inline]
    pub fn is_terminated(&self) -> bool {
        matches!(self, SubscriptionStatus::Terminated | SubscriptionStatus::Expired)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub id: String,
    #[serde(default)]
    pub external_ids: VendorIds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionLine {
    pub id: String,
    pub item: ItemRef,
}

impl SubscriptionLine {
    /// Item SKU used to pick the journal line processor
    pub fn item_external_id(&self) -> Option<&str> {
        self.item.external_ids.vendor.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub status: SubscriptionStatus,
    /// `vendor` holds the AWS account id billed by this subscription
    #[serde(default)]
    pub external_ids: VendorIds,
    #[serde(default)]
    pub lines: Vec<SubscriptionLine>,
}

impl Subscription {
    pub fn account_id(&self) -> Option<&str> {
        self.external_ids.vendor.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    /// `vendor` holds the MPA account id
    #[serde(default)]
    pub external_ids: VendorIds,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Agreement {
    pub fn mpa_id(&self) -> Option<&str> {
        self.external_ids.vendor.as_deref().filter(|id| !id.is_empty())
    }

    pub fn fulfillment_parameter(&self, external_id: &str) -> Option<&str> {
        self.parameters
            .fulfillment
            .iter()
            .find(|p| p.external_id == external_id)
            .and_then(|p| p.value.as_deref())
    }

    pub fn is_split_billing(&self) -> bool {
        self.fulfillment_parameter(TRANSFER_TYPE_PARAMETER) == Some(SPLIT_BILLING)
    }

    /// First subscription that is not terminated
    pub fn first_active_subscription(&self) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| !s.status.is_terminated())
    }
}
