//! AWS Billing Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the AWS billing reconciliation system. It includes:
//!
//! - Domain models (JournalLine, Report, InvoiceSummary, Agreement, etc.)
//! - Collaborator traits for the AWS report provider, ledger, catalog and notifications
//! - Unified error handling
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::BillingError;

/// Result type alias using BillingError
pub type AppResult<T> = Result<T, BillingError>;
