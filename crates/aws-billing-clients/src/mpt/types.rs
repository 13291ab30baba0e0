//! Marketplace Platform wire types

use serde::{Deserialize, Serialize};

/// One page of a collection response
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "$meta", default)]
    pub meta: Option<Meta>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn total(&self) -> Option<u64> {
        self.meta
            .as_ref()
            .and_then(|m| m.pagination.as_ref())
            .map(|p| p.total)
    }
}

#[derive(Debug, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
    pub total: u64,
}

/// Metadata part of an attachment upload
#[derive(Debug, Serialize)]
pub struct AttachmentMetadata<'a> {
    pub name: &'a str,
    pub description: &'a str,
}
