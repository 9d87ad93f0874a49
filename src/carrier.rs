use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::config::AppConfig;

/// Uniform envelope for every carrier call: `success` plus either `data` or
/// the carrier's error message verbatim. One attempt per call; a 401 triggers
/// a single re-authentication and retry, nothing else is retried.
#[derive(Debug, Serialize, ToSchema)]
pub struct CarrierResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CarrierFailure>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CarrierFailure {
    pub message: String,
}

impl<T> CarrierResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CarrierFailure {
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Agency {
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    #[serde(rename = "provinceCode")]
    pub province_code: String,
    #[serde(rename = "postalCode")]
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrackingEvent {
    pub date: String,
    pub status: String,
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackingData {
    #[serde(rename = "trackingNumber")]
    pub tracking_number: String,
    pub events: Vec<TrackingEvent>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportShipmentRequest {
    #[serde(rename = "customerId")]
    pub customer_id: String,
    #[serde(rename = "sellerName")]
    pub seller_name: String,
    #[serde(rename = "recipientName")]
    pub recipient_name: String,
    #[serde(rename = "recipientEmail")]
    pub recipient_email: String,
    pub address: String,
    #[serde(rename = "postalCode")]
    pub postal_code: String,
    #[serde(rename = "weightGrams")]
    pub weight_grams: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportShipmentData {
    #[serde(rename = "trackingNumber")]
    pub tracking_number: String,
    #[serde(rename = "shippingId")]
    pub shipping_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthData {
    token: String,
}

/// Authenticated REST client for the national postal carrier. The bearer
/// token lives inside the client (shared via `AppState`), not in a
/// module-level static, and is reused until a 401 forces re-authentication.
#[derive(Clone)]
pub struct CarrierClient {
    http: Client,
    base_url: String,
    user: String,
    password: String,
    pub customer_id: String,
    token: Arc<RwLock<Option<String>>>,
}

impl CarrierClient {
    pub fn new(config: &AppConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: config.carrier_base_url.trim_end_matches('/').to_string(),
            user: config.carrier_user.clone(),
            password: config.carrier_password.clone(),
            customer_id: config.carrier_customer_id.clone(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn authenticate(&self) -> CarrierResponse<String> {
        match self.fetch_token().await {
            Ok(token) => CarrierResponse::ok(token),
            Err(message) => CarrierResponse::err(message),
        }
    }

    pub async fn get_agencies(
        &self,
        province_code: &str,
        postal_code: Option<&str>,
    ) -> CarrierResponse<Vec<Agency>> {
        let mut url = format!(
            "{}/agencies?provinceCode={}",
            self.base_url, province_code
        );
        if let Some(cp) = postal_code {
            url.push_str(&format!("&postalCode={cp}"));
        }
        self.get_json(&url).await
    }

    pub async fn get_tracking(&self, tracking_number: &str) -> CarrierResponse<TrackingData> {
        let url = format!(
            "{}/shipping/tracking?trackingNumber={}",
            self.base_url, tracking_number
        );
        self.get_json(&url).await
    }

    pub async fn import_shipment(
        &self,
        request: &ImportShipmentRequest,
    ) -> CarrierResponse<ImportShipmentData> {
        let url = format!("{}/shipping/import", self.base_url);
        match self.send_with_auth(|token| self.http.post(&url).bearer_auth(token).json(request)).await
        {
            Ok(data) => CarrierResponse::ok(data),
            Err(message) => CarrierResponse::err(message),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> CarrierResponse<T> {
        match self
            .send_with_auth(|token| self.http.get(url).bearer_auth(token))
            .await
        {
            Ok(data) => CarrierResponse::ok(data),
            Err(message) => CarrierResponse::err(message),
        }
    }

    async fn send_with_auth<T, F>(&self, build: F) -> Result<T, String>
    where
        T: DeserializeOwned,
        F: Fn(&str) -> reqwest::RequestBuilder,
    {
        let token = self.bearer_token().await?;
        let response = build(&token).send().await.map_err(|err| err.to_string())?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            // Cached token expired: re-authenticate once and retry.
            self.token.write().await.take();
            let token = self.bearer_token().await?;
            build(&token).send().await.map_err(|err| err.to_string())?
        } else {
            response
        };

        let status = response.status();
        let body = response.text().await.map_err(|err| err.to_string())?;
        if !status.is_success() {
            return Err(carrier_message(&body, status.as_u16()));
        }
        serde_json::from_str(&body).map_err(|err| format!("invalid carrier response: {err}"))
    }

    async fn bearer_token(&self) -> Result<String, String> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        self.fetch_token().await
    }

    async fn fetch_token(&self) -> Result<String, String> {
        let url = format!("{}/token", self.base_url);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await
            .map_err(|err| err.to_string())?;

        let status = response.status();
        let body = response.text().await.map_err(|err| err.to_string())?;
        if !status.is_success() {
            return Err(carrier_message(&body, status.as_u16()));
        }

        let auth: AuthData = serde_json::from_str(&body)
            .map_err(|err| format!("invalid carrier token response: {err}"))?;
        *self.token.write().await = Some(auth.token.clone());
        Ok(auth.token)
    }
}

/// Pull the carrier's own message out of an error body when it is JSON,
/// otherwise pass the raw body through verbatim.
fn carrier_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    if body.trim().is_empty() {
        format!("carrier returned status {status}")
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_message_prefers_json_message_field() {
        let body = r#"{"message":"Invalid customer id"}"#;
        assert_eq!(carrier_message(body, 400), "Invalid customer id");
    }

    #[test]
    fn carrier_message_falls_back_to_raw_body() {
        assert_eq!(carrier_message("service down", 503), "service down");
        assert_eq!(carrier_message("", 503), "carrier returned status 503");
    }

    #[test]
    fn envelope_shapes() {
        let ok = CarrierResponse::ok(1);
        assert!(ok.success && ok.data == Some(1) && ok.error.is_none());

        let err: CarrierResponse<i32> = CarrierResponse::err("boom");
        assert!(!err.success && err.data.is_none());
        assert_eq!(err.error.unwrap().message, "boom");
    }
}
