//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use validator::{Validate, ValidationError};

use crate::error::BillingError;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub mpt: MptConfig,
    #[validate(nested)]
    #[serde(default)]
    pub notifications: NotificationsConfig,
    pub aws: AwsConfig,
    #[validate(nested)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Marketplace Platform API configuration
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct MptConfig {
    /// API base URL (e.g. "https://api.platform.softwareone.com")
    #[validate(url)]
    pub api_base_url: String,

    /// Bearer token for the API
    pub api_token: String,

    /// Portal base URL used for links in notifications
    #[validate(url)]
    pub portal_base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Page size used when listing collections
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size() -> u32 {
    100
}

/// Notification sink configuration
#[derive(Debug, Deserialize, Clone, Default, Validate)]
pub struct NotificationsConfig {
    /// Microsoft Teams incoming webhook. Notifications are only logged when absent.
    #[validate(url)]
    pub teams_webhook_url: Option<String>,
}

/// AWS report provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AwsConfig {
    /// Root directory of recorded Cost Explorer and invoice snapshots, one folder per MPA
    pub snapshot_dir: String,
}

/// Billing-specific configuration
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct BillingConfig {
    /// Product ids whose authorizations and agreements are billed
    #[validate(length(min = 1))]
    pub product_ids: Vec<String>,

    /// Allowed distance, in percentage points, between expected and observed discount
    #[serde(default = "default_tolerance_rate")]
    #[validate(custom(function = "validate_non_negative"))]
    pub tolerance_rate: Decimal,

    /// Journal line segment
    #[serde(default = "default_segment")]
    pub segment: String,

    /// Expected partner discount per SKU family
    #[serde(default)]
    pub discounts: DiscountConfig,
}

fn default_tolerance_rate() -> Decimal {
    Decimal::ONE
}

fn default_segment() -> String {
    "COM".to_string()
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("negative"));
    }
    Ok(())
}

/// Expected partner discount rates, in percent
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DiscountConfig {
    pub usage: Decimal,
    pub usage_incentivate: Decimal,
    pub support: Decimal,
    pub support_enterprise: Decimal,
    pub saving_plans: Decimal,
    pub saving_plans_incentivate: Decimal,
    pub upfront: Decimal,
    pub upfront_incentivate: Decimal,
}

impl Default for DiscountConfig {
    fn default() -> Self {
        Self {
            usage: Decimal::from(7),
            usage_incentivate: Decimal::from(12),
            support: Decimal::from(7),
            support_enterprise: Decimal::from(35),
            saving_plans: Decimal::from(7),
            saving_plans_incentivate: Decimal::from(12),
            upfront: Decimal::from(7),
            upfront_incentivate: Decimal::from(12),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            product_ids: Vec::new(),
            tolerance_rate: default_tolerance_rate(),
            segment: default_segment(),
            discounts: DiscountConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config files
    pub fn load() -> Result<Self, BillingError> {
        dotenvy::dotenv().ok();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("mpt.timeout_secs", 30)?
            .set_default("mpt.page_size", 100)?
            .set_default("billing.tolerance_rate", 1)?
            .set_default("billing.segment", "COM")?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with AWS_BILLING_ prefix
            .add_source(
                Environment::with_prefix("AWS_BILLING")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("billing.product_ids")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, BillingError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("AWS_BILLING").separator("__"))
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }
}
