//! Webhook delivery of qualified leads

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use lead_agent_config::NotificationConfig;
use lead_agent_core::{Error, LeadNotification, Notifier, Result};
use lead_agent_orchestrator::LogNotifier;

/// POSTs the lead as JSON to a configured URL
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Notification(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, lead: &LeadNotification) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .json(lead)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout
                } else {
                    Error::Notification(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Notification(format!(
                "webhook returned {}: {}",
                status, body
            )));
        }

        tracing::info!(
            session_id = %lead.session_id,
            status = status.as_u16(),
            "Lead delivered to webhook"
        );
        Ok(format!("webhook:{}", status.as_u16()))
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

/// Webhook notifier when a URL is configured, log notifier otherwise
pub fn create_notifier(config: &NotificationConfig) -> Result<Arc<dyn Notifier>> {
    let notifier: Arc<dyn Notifier> =
        match config.webhook_url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => {
                tracing::info!(url = %url, "Delivering qualified leads to webhook");
                let timeout = Duration::from_secs(config.webhook_timeout_secs);
                Arc::new(WebhookNotifier::new(url, timeout)?)
            }
            None => Arc::new(LogNotifier),
        };
    Ok(notifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_notifier_without_url() {
        let notifier = create_notifier(&NotificationConfig::default()).unwrap();
        assert_eq!(notifier.name(), "log");

        let config = NotificationConfig {
            webhook_url: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(create_notifier(&config).unwrap().name(), "log");
    }

    #[test]
    fn test_webhook_notifier_with_url() {
        let config = NotificationConfig {
            webhook_url: Some("http://localhost:9/leads".into()),
            ..Default::default()
        };
        assert_eq!(create_notifier(&config).unwrap().name(), "webhook");
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_an_error() {
        let notifier =
            WebhookNotifier::new("http://127.0.0.1:9/leads", Duration::from_secs(2)).unwrap();
        let state = lead_agent_core::ConversationState::new("s1");
        let result = notifier.notify(&LeadNotification::from_state(&state)).await;
        assert!(result.is_err());
    }
}
