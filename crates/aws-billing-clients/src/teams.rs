//! Microsoft Teams webhook notifier

use async_trait::async_trait;
use aws_billing_core::traits::{Button, Notifier};
use aws_billing_core::{AppResult, BillingError};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

const ERROR_COLOR: &str = "DF3422";
const SUCCESS_COLOR: &str = "00FF00";

#[derive(Debug, Serialize)]
struct MessageCard<'a> {
    #[serde(rename = "@type")]
    card_type: &'static str,
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "themeColor")]
    theme_color: &'static str,
    summary: &'a str,
    title: &'a str,
    text: &'a str,
    #[serde(rename = "potentialAction", skip_serializing_if = "Vec::is_empty")]
    potential_action: Vec<OpenUriAction<'a>>,
}

#[derive(Debug, Serialize)]
struct OpenUriAction<'a> {
    #[serde(rename = "@type")]
    action_type: &'static str,
    name: &'a str,
    targets: Vec<UriTarget<'a>>,
}

#[derive(Debug, Serialize)]
struct UriTarget<'a> {
    os: &'static str,
    uri: &'a str,
}

impl<'a> MessageCard<'a> {
    fn new(theme_color: &'static str, title: &'a str, text: &'a str, button: Option<&'a Button>) -> Self {
        let potential_action = button
            .map(|b| OpenUriAction {
                action_type: "OpenUri",
                name: &b.label,
                targets: vec![UriTarget {
                    os: "default",
                    uri: &b.url,
                }],
            })
            .into_iter()
            .collect();

        Self {
            card_type: "MessageCard",
            context: "https://schema.org/extensions",
            theme_color,
            summary: title,
            title,
            text,
            potential_action,
        }
    }
}

/// Posts MessageCards to an incoming webhook
pub struct TeamsNotifier {
    http_client: Client,
    webhook_url: String,
}

impl TeamsNotifier {
    pub fn new(webhook_url: &str, timeout_secs: u64) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BillingError::Config(format!("Failed to build Teams client: {}", e)))?;

        Ok(Self {
            http_client,
            webhook_url: webhook_url.to_string(),
        })
    }

    async fn post(&self, card: &MessageCard<'_>) -> AppResult<()> {
        let response = self
            .http_client
            .post(&self.webhook_url)
            .json(card)
            .send()
            .await
            .map_err(|e| BillingError::Notification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Teams webhook rejected message: status={}, body={}", status, body);
            return Err(BillingError::Notification(format!(
                "Teams webhook returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TeamsNotifier {
    #[instrument(skip(self, text, button))]
    async fn send_error(&self, title: &str, text: &str, button: Option<&Button>) -> AppResult<()> {
        self.post(&MessageCard::new(ERROR_COLOR, title, text, button)).await
    }

    #[instrument(skip(self, text, button))]
    async fn send_success(&self, title: &str, text: &str, button: Option<&Button>) -> AppResult<()> {
        self.post(&MessageCard::new(SUCCESS_COLOR, title, text, button)).await
    }
}

/// Writes notifications to the log when no webhook is configured
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_error(&self, title: &str, text: &str, button: Option<&Button>) -> AppResult<()> {
        warn!(
            "{}: {}{}",
            title,
            text,
            button.map(|b| format!(" ({})", b.url)).unwrap_or_default()
        );
        Ok(())
    }

    async fn send_success(&self, title: &str, text: &str, button: Option<&Button>) -> AppResult<()> {
        info!(
            "{}: {}{}",
            title,
            text,
            button.map(|b| format!(" ({})", b.url)).unwrap_or_default()
        );
        Ok(())
    }
}
