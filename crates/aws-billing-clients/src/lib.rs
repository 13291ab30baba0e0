//! Concrete collaborators for the AWS billing run
//!
//! - `mpt`: Marketplace Platform REST client (ledger journals, catalog and commerce)
//! - `teams`: Microsoft Teams webhook notifier, with a log-only fallback
//! - `snapshot`: AWS report provider replaying recorded Cost Explorer and invoice data

pub mod mpt;
pub mod snapshot;
pub mod teams;

pub use mpt::{MptClient, MptError};
pub use snapshot::{RecordedReportProvider, SnapshotProviderFactory};
pub use teams::{LogNotifier, TeamsNotifier};
