//! Domain models for AWS billing reconciliation
//!
//! This module contains all the core domain models used throughout the application.

pub mod commerce;
pub mod invoice;
pub mod journal;
pub mod journal_line;
pub mod period;
pub mod report;

pub use commerce::{
    Agreement, Authorization, ItemRef, Parameter, Parameters, Subscription, SubscriptionLine,
    SubscriptionStatus, VendorIds,
};
pub use invoice::{
    CurrencyAmount, CurrencyExchangeDetails, InvoiceEntity, InvoiceEntityDetails, InvoiceSummary,
    OrganizationInvoices,
};
pub use journal::{
    Attachment, Journal, JournalDetails, JournalStatus, NewJournal, UploadedAttachment,
};
pub use journal_line::{
    Description, JournalLine, LineExternalIds, Period, Price, Search, SearchCriteria,
    ITEM_NOT_FOUND,
};
pub use period::BillingPeriod;
pub use report::{DimensionValues, Group, GroupDefinition, MetricValue, Report, ReportFilter, ResultByTime, TimePeriod};
