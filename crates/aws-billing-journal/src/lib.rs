//! Billing journal generation for AWS reseller accounts
//!
//! This crate reconciles AWS cost, usage and invoice reports against marketplace
//! subscriptions and produces the monthly billing journal of every authorization.
//!
//! # Architecture
//!
//! - `metrics` reshapes Cost Explorer reports into per-account metric maps
//! - `invoices` aggregates invoice summaries and resolves exchange rates
//! - `validators` check partner discounts against the expected SKU rate
//! - `processors` turn one subscription line SKU into journal lines
//! - `reconciliation` flags observed cost that no line accounts for
//! - `generator` drives the run: authorizations, agreements, subscriptions, uploads
//!
//! Every level of the run is isolated: a failing authorization, agreement or
//! subscription is notified and skipped, never aborting its siblings.

pub mod artifacts;
pub mod constants;
pub mod context;
pub mod generator;
pub mod invoices;
pub mod lines;
pub mod metrics;
pub mod notify;
pub mod processors;
pub mod reconciliation;
pub mod reports;
pub mod validators;

pub use generator::{
    AuthorizationOutcome, AuthorizationSummary, BillingJournalGenerator, Collaborators,
    GenerationSummary,
};
pub use metrics::{AccountMetrics, MetricType};
pub use notify::Notifications;
pub use processors::{journal_processors, ItemJournalLineProcessor, JournalLineProcessor, JournalProcessors};
pub use validators::{DiscountValidationError, DiscountValidator};
