//! Ledger journal models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::commerce::VendorIds;

/// Journal lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalStatus {
    Draft,
    Validating,
    Validated,
    Review,
    Error,
    Accepted,
    Completed,
    Deleted,
    #[serde(other)]
    Unknown,
}

impl JournalStatus {
    /// A pending journal can still receive uploads and is reused by the next run
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            JournalStatus::Draft
                | JournalStatus::Validating
                | JournalStatus::Validated
                | JournalStatus::Review
                | JournalStatus::Error
        )
    }
}

/// Journal container as returned by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: JournalStatus,
    #[serde(default)]
    pub external_ids: VendorIds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRef {
    pub id: String,
}

/// Payload for creating a journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJournal {
    pub name: String,
    pub authorization: AuthorizationRef,
    pub due_date: NaiveDate,
    pub external_ids: VendorIds,
}

impl NewJournal {
    pub fn new(name: String, authorization_id: &str, due_date: NaiveDate, vendor_id: String) -> Self {
        Self {
            name,
            authorization: AuthorizationRef {
                id: authorization_id.to_string(),
            },
            due_date,
            external_ids: VendorIds {
                vendor: Some(vendor_id),
            },
        }
    }
}

/// File attached to a journal
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub name: String,
    pub description: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedAttachment {
    pub id: String,
}

/// Values shared by every line of one agreement's journal output
#[derive(Debug, Clone, PartialEq)]
pub struct JournalDetails {
    pub agreement_id: String,
    pub mpa_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub segment: String,
}
