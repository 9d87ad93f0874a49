use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertSettingRequest {
    pub value: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingValue {
    pub key: String,
    pub value: Value,
    /// False when the stored row is absent and the built-in default applied.
    pub stored: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VacationSubscribeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVacationPeriodRequest {
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub ends_at: chrono::DateTime<chrono::Utc>,
    pub message: Option<String>,
}
