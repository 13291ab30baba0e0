//! Unified error handling for AWS billing reconciliation
//!
//! `BillingError` covers the failures that stop a unit of work (authorization,
//! agreement or subscription). Line-level reconciliation failures are carried by
//! `BillingLineError` and never abort anything: the generator turns them into
//! error journal lines.

use rust_decimal::Decimal;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum BillingError {
    // ==================== Collaborator Errors ====================
    #[error("AWS provider error: {0}")]
    Provider(String),

    #[error("Ledger API error: {0}")]
    Ledger(String),

    #[error("Commerce API error: {0}")]
    Commerce(String),

    #[error("Notification error: {0}")]
    Notification(String),

    // ==================== Reconciliation Errors ====================
    #[error(
        "Currency mismatch: authorization currency {currency} does not match payment currency \
         {payment_currency} of invoice entity {entity}"
    )]
    CurrencyMismatch {
        currency: String,
        entity: String,
        payment_currency: String,
    },

    #[error("Agreement {0} has no MPA account id")]
    MissingMpaAccount(String),

    #[error("Invalid billing period: {0}")]
    InvalidPeriod(String),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    // ==================== Internal Errors ====================
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Returns a stable error code for logs and notifications
    pub fn error_code(&self) -> &'static str {
        match self {
            BillingError::Provider(_) => "provider_error",
            BillingError::Ledger(_) => "ledger_error",
            BillingError::Commerce(_) => "commerce_error",
            BillingError::Notification(_) => "notification_error",
            BillingError::CurrencyMismatch { .. } => "currency_mismatch",
            BillingError::MissingMpaAccount(_) => "missing_mpa_account",
            BillingError::InvalidPeriod(_) => "invalid_period",
            BillingError::Validation(_) => "validation_error",
            BillingError::Serialization(_) => "serialization_error",
            BillingError::Archive(_) => "archive_error",
            BillingError::Config(_) => "config_error",
            BillingError::Internal(_) => "internal_error",
        }
    }
}

/// A journal line that could not be produced for a service.
///
/// Raised by item processors; the generator converts it into an error
/// `JournalLine` carrying `message`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct BillingLineError {
    pub service_name: String,
    pub amount: Decimal,
    pub message: String,
}

impl BillingLineError {
    pub fn new(service_name: impl Into<String>, amount: Decimal, message: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            amount,
            message: message.into(),
        }
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for BillingError {
    fn from(err: serde_json::Error) -> Self {
        BillingError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for BillingError {
    fn from(err: std::io::Error) -> Self {
        BillingError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for BillingError {
    fn from(err: config::ConfigError) -> Self {
        BillingError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for BillingError {
    fn from(err: validator::ValidationErrors) -> Self {
        BillingError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BillingError::MissingMpaAccount("AGR-1".to_string()).error_code(),
            "missing_mpa_account"
        );
        assert_eq!(
            BillingError::CurrencyMismatch {
                currency: "EUR".to_string(),
                entity: "Amazon Web Services EMEA SARL".to_string(),
                payment_currency: "USD".to_string(),
            }
            .error_code(),
            "currency_mismatch"
        );
    }

    #[test]
    fn test_currency_mismatch_message() {
        let err = BillingError::CurrencyMismatch {
            currency: "EUR".to_string(),
            entity: "AWS Inc.".to_string(),
            payment_currency: "USD".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("EUR"));
        assert!(message.contains("AWS Inc."));
    }

    #[test]
    fn test_line_error_display_is_message() {
        let err = BillingLineError::new("AWS Support (Business)", dec!(0), "ambiguous support");
        assert_eq!(err.to_string(), "ambiguous support");
        assert_eq!(err.amount, dec!(0));
    }
}
