//! AWS billing journal generator
//!
//! Reconciles one month of AWS cost and invoice data against marketplace
//! subscriptions and uploads a billing journal per authorization.

use anyhow::Context;
use aws_billing_clients::{LogNotifier, MptClient, SnapshotProviderFactory, TeamsNotifier};
use aws_billing_core::config::LogConfig;
use aws_billing_core::models::BillingPeriod;
use aws_billing_core::traits::Notifier;
use aws_billing_core::AppConfig;
use aws_billing_journal::{journal_processors, BillingJournalGenerator, Collaborators, Notifications};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::env;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "aws-billing", version, about = "AWS billing journal generation")]
struct Cli {
    /// Configuration file, instead of config/default + config/{RUN_MODE}
    #[arg(long, global = true, env = "AWS_BILLING_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate the billing journals of one month
    GenerateJournals {
        /// Billing year, defaults to the previous month's year
        #[arg(long, requires = "month")]
        year: Option<i32>,

        /// Billing month (1-12), defaults to the previous month
        #[arg(long, requires = "year")]
        month: Option<u32>,

        /// Product ids to bill, defaults to billing.product_ids
        #[arg(long = "product-id")]
        product_ids: Vec<String>,

        /// Restrict the run to these authorization ids
        #[arg(long = "authorization")]
        authorizations: Vec<String>,
    },
}

fn init_tracing(log: &LogConfig) {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| log.level.clone());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "aws_billing={},aws_billing_journal={},aws_billing_clients={},aws_billing_core={},reqwest=warn",
            log_level, log_level, log_level, log_level
        ))
    });

    let json_layer = log.json.then(|| fmt::layer().json().with_target(true));
    let text_layer = (!log.json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn notifier(config: &AppConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    match &config.notifications.teams_webhook_url {
        Some(url) => Ok(Arc::new(
            TeamsNotifier::new(url, config.mpt.timeout_secs).context("Failed to create Teams notifier")?,
        )),
        None => {
            warn!("No Teams webhook configured, notifications are only logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;

    init_tracing(&config.log);

    info!("Starting AWS billing v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::GenerateJournals {
            year,
            month,
            product_ids,
            authorizations,
        } => {
            let period = match (year, month) {
                (Some(year), Some(month)) => BillingPeriod::new(year, month)?,
                _ => BillingPeriod::previous(Utc::now().date_naive()),
            };
            let product_ids = if product_ids.is_empty() {
                config.billing.product_ids.clone()
            } else {
                product_ids
            };
            let authorizations = (!authorizations.is_empty()).then_some(authorizations);

            let mpt = Arc::new(MptClient::from_config(&config.mpt).context("Failed to create MPT client")?);
            info!("MPT client configured for {}", mpt.base_url());

            let clients = Collaborators {
                journals: mpt.clone(),
                commerce: mpt,
                aws: Arc::new(SnapshotProviderFactory::new(&config.aws.snapshot_dir)),
                notifications: Notifications::new(notifier(&config)?, config.mpt.portal_base_url.clone()),
            };

            let generator = BillingJournalGenerator::new(
                clients,
                config.billing.clone(),
                period,
                product_ids,
                journal_processors(&config.billing),
                authorizations,
            );

            info!("Generating billing journals for {}", generator.period());
            let summary = generator
                .generate_billing_journals()
                .await
                .context("Billing journal generation failed")?;

            for authorization in &summary.authorizations {
                info!(
                    "Authorization {}: {:?}",
                    authorization.authorization_id, authorization.outcome
                );
            }
            if summary.failed() > 0 {
                error!(
                    "{} of {} authorizations failed for {}",
                    summary.failed(),
                    summary.authorizations.len(),
                    summary.period
                );
            }
            info!(
                "Done: {} journals uploaded for {}",
                summary.uploaded(),
                summary.period
            );
        }
    }

    Ok(())
}
