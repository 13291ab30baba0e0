//! Operator notifications
//!
//! Delivery is best effort: a failed notification is logged and the run goes on.

use aws_billing_core::traits::{Button, Notifier};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct Notifications {
    notifier: Arc<dyn Notifier>,
    portal_base_url: String,
}

impl Notifications {
    pub fn new(notifier: Arc<dyn Notifier>, portal_base_url: impl Into<String>) -> Self {
        Self {
            notifier,
            portal_base_url: portal_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn error(&self, title: &str, text: &str, button: Option<&Button>) {
        if let Err(e) = self.notifier.send_error(title, text, button).await {
            warn!(error = %e, title, "Failed to deliver error notification");
        }
    }

    pub async fn success(&self, title: &str, text: &str, button: Option<&Button>) {
        if let Err(e) = self.notifier.send_success(title, text, button).await {
            warn!(error = %e, title, "Failed to deliver success notification");
        }
    }

    /// Link to a journal in the portal
    pub fn journal_link(&self, journal_id: &str) -> Button {
        Button::new(
            format!("Open journal {}", journal_id),
            format!("{}/billing/journals/{}", self.portal_base_url, journal_id),
        )
    }

    /// Link to one attachment of a journal
    pub fn attachment_link(&self, journal_id: &str, attachment_id: &str) -> Button {
        Button::new(
            "Open failed journal lines",
            format!(
                "{}/billing/journals/{}/attachments/{}",
                self.portal_base_url, journal_id, attachment_id
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use aws_billing_core::{AppResult, BillingError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FailingNotifier {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send_error(&self, _title: &str, _text: &str, _button: Option<&Button>) -> AppResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(BillingError::Notification("webhook unreachable".to_string()))
        }

        async fn send_success(&self, _title: &str, _text: &str, _button: Option<&Button>) -> AppResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(BillingError::Notification("webhook unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_delivery_failures_are_swallowed() {
        let notifier = Arc::new(FailingNotifier::default());
        let notifications = Notifications::new(notifier.clone(), "https://portal.example.com");

        notifications.error("Billing journal", "failed", None).await;
        notifications.success("Billing journal", "done", None).await;

        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_links() {
        let notifications = Notifications::new(
            Arc::new(FailingNotifier::default()),
            "https://portal.example.com/",
        );

        assert_eq!(
            notifications.journal_link("BJO-1234").url,
            "https://portal.example.com/billing/journals/BJO-1234"
        );
        assert_eq!(
            notifications.attachment_link("BJO-1234", "JOA-1").url,
            "https://portal.example.com/billing/journals/BJO-1234/attachments/JOA-1"
        );
    }
}
