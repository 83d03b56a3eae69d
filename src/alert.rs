//! Operator Alerts
//!
//! Fire-and-forget webhook notifications for the situations an operator must
//! see: a round trip stranded in the intermediate asset, and the end-of-run
//! summary. Delivery failures are logged and never propagate - alerting must
//! not take the bot down.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

use serde::Serialize;
use tracing::{error, info, warn};

/// Simple webhook payload (Discord-compatible `content` field)
#[derive(Serialize)]
struct AlertPayload {
    content: String,
}

/// Webhook alerter; a missing URL disables it
pub struct OperatorAlerter {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl OperatorAlerter {
    pub fn new(webhook_url: Option<String>) -> Self {
        if webhook_url.is_some() {
            info!("operator alerts enabled");
        } else {
            warn!("ALERT_WEBHOOK not set - operator alerts disabled");
        }
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Leg 1 confirmed but the round trip did not complete: the account holds
    /// the stable asset and needs manual intervention.
    pub async fn stranded_trade(&self, venue_id: &str, route: &str, reason: &str) {
        self.send(format!(
            "STRANDED TRADE on {venue_id}: {route} aborted after leg 1 ({reason}). \
             Account holds the intermediate asset - manual unwind required."
        ))
        .await;
    }

    /// End-of-run summary, sent when configured.
    pub async fn session_end(&self, summary_line: &str) {
        self.send(format!("Session complete: {summary_line}")).await;
    }

    async fn send(&self, content: String) {
        let Some(url) = &self.webhook_url else {
            return;
        };
        let payload = AlertPayload { content };
        match self.client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                error!(status = %response.status(), "alert webhook rejected the payload");
            }
            Err(e) => {
                error!(error = %e, "alert webhook delivery failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_alerter_sends_nothing_and_never_errors() {
        let alerter = OperatorAlerter::new(None);
        assert!(!alerter.is_enabled());
        // No URL: both calls are no-ops
        alerter.stranded_trade("base", "route", "revert").await;
        alerter.session_end("0 trades").await;
    }

    #[test]
    fn payload_serializes_to_a_content_field() {
        let json = serde_json::to_string(&AlertPayload {
            content: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"content":"hello"}"#);
    }
}
