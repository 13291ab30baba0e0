//! Cost Explorer report types
//!
//! These mirror the `GetCostAndUsage` response and request shapes. Reports are
//! read-only input; amounts are kept as the strings AWS returns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cost Explorer dimensions used by the reconciliation
pub mod dimensions {
    pub const LINKED_ACCOUNT: &str = "LINKED_ACCOUNT";
    pub const SERVICE: &str = "SERVICE";
    pub const RECORD_TYPE: &str = "RECORD_TYPE";
    pub const INVOICING_ENTITY: &str = "INVOICING_ENTITY";
    pub const BILLING_ENTITY: &str = "BILLING_ENTITY";
}

pub const UNBLENDED_COST: &str = "UnblendedCost";

/// Response of a cost and usage query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Report {
    #[serde(default)]
    pub results_by_time: Vec<ResultByTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultByTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_period: Option<TimePeriod>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimePeriod {
    pub start: String,
    pub end: String,
}

/// One grouped row: two dimension keys and the requested metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Group {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricValue {
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Group {
    /// Build a group with an `UnblendedCost` amount
    pub fn unblended(key0: &str, key1: &str, amount: &str) -> Self {
        let mut metrics = BTreeMap::new();
        metrics.insert(
            UNBLENDED_COST.to_string(),
            MetricValue {
                amount: amount.to_string(),
                unit: Some("USD".to_string()),
            },
        );
        Self {
            keys: vec![key0.to_string(), key1.to_string()],
            metrics,
        }
    }

    /// Raw `UnblendedCost` amount, if present
    pub fn unblended_amount(&self) -> Option<&str> {
        self.metrics.get(UNBLENDED_COST).map(|m| m.amount.as_str())
    }

    /// Second dimension value (the one reports are keyed by)
    pub fn secondary_key(&self) -> Option<&str> {
        self.keys.get(1).map(String::as_str)
    }
}

impl Report {
    /// Single time bucket report, handy for fixtures
    pub fn from_groups(groups: Vec<Group>) -> Self {
        Self {
            results_by_time: vec![ResultByTime {
                time_period: None,
                groups,
                estimated: None,
            }],
        }
    }

    /// Iterate every group of every time bucket
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.results_by_time.iter().flat_map(|r| r.groups.iter())
    }
}

/// `GroupBy` entry of a cost and usage request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupDefinition {
    #[serde(rename = "Type")]
    pub group_type: String,
    pub key: String,
}

impl GroupDefinition {
    pub fn dimension(key: &str) -> Self {
        Self {
            group_type: "DIMENSION".to_string(),
            key: key.to_string(),
        }
    }
}

/// `Filter` of a cost and usage request, restricted to one dimension
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportFilter {
    pub dimensions: DimensionValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DimensionValues {
    pub key: String,
    pub values: Vec<String>,
}

impl ReportFilter {
    pub fn dimension(key: &str, values: &[&str]) -> Self {
        Self {
            dimensions: DimensionValues {
                key: key.to_string(),
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_cost_explorer_response() {
        let raw = r#"{
            "ResultsByTime": [{
                "TimePeriod": {"Start": "2025-05-01", "End": "2025-06-01"},
                "Groups": [
                    {"Keys": ["Usage", "Amazon EC2"],
                     "Metrics": {"UnblendedCost": {"Amount": "12.5", "Unit": "USD"}}}
                ],
                "Estimated": false
            }],
            "DimensionValueAttributes": []
        }"#;

        let report: Report = serde_json::from_str(raw).unwrap();
        let group = report.groups().next().unwrap();
        assert_eq!(group.keys, vec!["Usage", "Amazon EC2"]);
        assert_eq!(group.unblended_amount(), Some("12.5"));
        assert_eq!(group.secondary_key(), Some("Amazon EC2"));
    }

    #[test]
    fn test_serialize_request_shapes() {
        let group_by = GroupDefinition::dimension(dimensions::SERVICE);
        let filter = ReportFilter::dimension(dimensions::LINKED_ACCOUNT, &["210987654321"]);

        let json = serde_json::to_string(&group_by).unwrap();
        assert_eq!(json, r#"{"Type":"DIMENSION","Key":"SERVICE"}"#);

        let json = serde_json::to_string(&filter).unwrap();
        assert_eq!(
            json,
            r#"{"Dimensions":{"Key":"LINKED_ACCOUNT","Values":["210987654321"]}}"#
        );
    }
}
