use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
};

/// Outbound notification mail over a JSON email API. Every caller treats
/// delivery as best-effort: failures are logged, never propagated into the
/// business transition that triggered them.
#[derive(Clone)]
pub struct Mailer {
    http: Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl Mailer {
    pub fn new(config: &AppConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!(to = %to, subject = %subject, "email api key not configured, skipping send");
            return Ok(());
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "text": body,
            }))
            .send()
            .await
            .map_err(|err| AppError::external("email", err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::external(
                "email",
                format!("status {status}: {detail}"),
            ));
        }

        Ok(())
    }

    /// Send and swallow the outcome. Used inside order transitions where the
    /// notification must never fail the transition itself.
    pub async fn send_best_effort(&self, to: &str, subject: &str, body: &str) {
        if let Err(err) = self.send(to, subject, body).await {
            tracing::warn!(to = %to, subject = %subject, error = %err, "notification email failed");
        }
    }
}
