use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::settings::{SettingValue, UpsertSettingRequest},
    error::AppResult,
    response::ApiResponse,
    services::settings_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{key}", get(get_setting).put(upsert_setting))
}

#[utoipa::path(
    get,
    path = "/api/settings/{key}",
    params(("key" = String, Path, description = "Setting key: store, contact, home, shipping_options")),
    responses(
        (status = 200, description = "Stored value or built-in default", body = ApiResponse<SettingValue>),
        (status = 404, description = "Unknown key")
    ),
    tag = "Settings"
)]
pub async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<SettingValue>>> {
    let resp = settings_service::get_setting(&state, &key).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/settings/{key}",
    params(("key" = String, Path, description = "Setting key")),
    request_body = UpsertSettingRequest,
    responses(
        (status = 200, description = "Setting stored", body = ApiResponse<SettingValue>),
        (status = 400, description = "Unknown key")
    ),
    tag = "Settings"
)]
pub async fn upsert_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<UpsertSettingRequest>,
) -> AppResult<Json<ApiResponse<SettingValue>>> {
    let resp = settings_service::upsert_setting(&state, &key, payload.value).await?;
    Ok(Json(resp))
}
