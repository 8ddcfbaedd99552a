//! Discord webhook notifier
//!
//! Fire-and-forget delivery. Failures are logged and swallowed; trading
//! never blocks on an alert.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::ports::notifier::Notifier;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    http: Client,
    webhook_url: Option<String>,
}

impl DiscordNotifier {
    /// A notifier with no webhook URL is a no-op
    pub fn new(webhook_url: Option<String>) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, webhook_url }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    async fn post(&self, content: String) {
        let Some(url) = &self.webhook_url else {
            return;
        };
        let body = json!({ "content": content });
        match self.http.post(url).json(&body).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(status = %response.status(), "discord webhook rejected");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("discord webhook delivery failed: {}", err);
            }
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn emergency_exit(&self, count: usize, reason: &str) {
        self.post(format!(
            ":rotating_light: **EMERGENCY EXIT** closing {} position(s), reason: {}",
            count, reason
        ))
        .await;
    }

    async fn position_closed(&self, id: &str, name: &str, reason: &str, pnl: f64, fees: f64) {
        let emoji = if pnl >= 0.0 { ":white_check_mark:" } else { ":small_red_triangle_down:" };
        self.post(format!(
            "{} closed `{}` on {} ({}) pnl {:+.4} SOL, fees {:.4} SOL",
            emoji, id, name, reason, pnl, fees
        ))
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_notifier_is_silent() {
        // No webhook configured: both calls return without any request
        let notifier = DiscordNotifier::disabled();
        notifier.emergency_exit(3, "daily_loss_limit").await;
        notifier
            .position_closed("pos-1", "WIF-SOL", "take_profit", 0.15, 0.05)
            .await;
    }
}
