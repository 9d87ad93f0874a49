use axum::{Json, Router, extract::State, routing::{get, post}};

use crate::{
    dto::settings::{CreateVacationPeriodRequest, VacationSubscribeRequest},
    error::AppResult,
    models::VacationPeriod,
    response::ApiResponse,
    services::vacation_service::{self, VacationBanner},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(banner))
        .route("/subscribe", post(subscribe))
        .route("/periods", post(create_period))
}

#[utoipa::path(
    get,
    path = "/api/vacation",
    responses(
        (status = 200, description = "Active closure window, if any", body = ApiResponse<VacationBanner>)
    ),
    tag = "Vacation"
)]
pub async fn banner(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<VacationBanner>>> {
    let resp = vacation_service::banner(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/vacation/subscribe",
    request_body = VacationSubscribeRequest,
    responses(
        (status = 200, description = "Subscribed for reopening notice"),
        (status = 400, description = "Invalid email"),
        (status = 409, description = "Store is not on vacation")
    ),
    tag = "Vacation"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<VacationSubscribeRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = vacation_service::subscribe(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/vacation/periods",
    request_body = CreateVacationPeriodRequest,
    responses(
        (status = 200, description = "Closure window created", body = ApiResponse<VacationPeriod>),
        (status = 400, description = "Invalid period")
    ),
    tag = "Vacation"
)]
pub async fn create_period(
    State(state): State<AppState>,
    Json(payload): Json<CreateVacationPeriodRequest>,
) -> AppResult<Json<ApiResponse<VacationPeriod>>> {
    let resp = vacation_service::create_period(&state, payload).await?;
    Ok(Json(resp))
}
