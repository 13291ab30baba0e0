//! Marketplace Platform integration
//!
//! `MptClient` implements both the ledger (`JournalClient`) and the catalog
//! (`CommerceClient`) contracts over the platform's public REST API.
//!
//! # Usage
//!
//! ```rust,ignore
//! use aws_billing_clients::mpt::MptClient;
//!
//! let client = MptClient::new("https://api.platform.softwareone.com", "token", 30, 100)?;
//! let journals = client.query("eq(status,Draft)").await?;
//! ```

mod client;
mod commerce;
mod journals;
mod types;

pub use client::{MptClient, MptError};
