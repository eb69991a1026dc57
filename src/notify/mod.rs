//! Rotation summary notifications.
//!
//! The summary embeds the new plaintext credentials, matching the original
//! operational workflow. That is a documented risk, not a feature worth
//! defaulting to: the notifier only runs when insecure audit mode is
//! explicitly requested, and only after the inventory and audit log have
//! been persisted, so a send failure never discards saved state.

use chrono::Utc;

use crate::models::RotationRecord;

pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }

    /// POST one JSON summary covering all rotations performed in this run.
    pub async fn send_rotation_summary(&self, records: &[RotationRecord]) -> anyhow::Result<()> {
        let payload = serde_json::json!({
            "subject": format!("Device credentials updated ({})", Utc::now().format("%m-%d-%Y")),
            "rotations": records,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("HTTP request failed: {}", e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "(could not read response body)".to_string());
            Err(anyhow::anyhow!(
                "HTTP {} {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                body
            ))
        }
    }
}
