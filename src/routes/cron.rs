use axum::{
    Json, Router,
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    services::{
        tracking_service::{self, SweepSummary},
        vacation_service::{self, ReopeningSummary},
    },
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CronQuery {
    pub secret: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tracking-notifications", get(tracking_notifications))
        .route("/vacation-reopening", get(vacation_reopening))
}

/// Scheduler entry points accept the secret either as a bearer token or as a
/// `?secret=` query parameter. An unconfigured secret locks the routes.
fn authorize(configured: &str, headers: &HeaderMap, query_secret: Option<&str>) -> AppResult<()> {
    if configured.is_empty() {
        tracing::warn!("CRON_SECRET not configured, rejecting cron request");
        return Err(AppError::Forbidden);
    }

    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    if bearer == Some(configured) || query_secret == Some(configured) {
        return Ok(());
    }
    Err(AppError::Forbidden)
}

#[utoipa::path(
    get,
    path = "/api/cron/tracking-notifications",
    params(("secret" = Option<String>, Query, description = "Cron secret (alternative to bearer token)")),
    responses(
        (status = 200, description = "Sweep summary", body = ApiResponse<SweepSummary>),
        (status = 403, description = "Bad or missing secret")
    ),
    tag = "Cron"
)]
pub async fn tracking_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CronQuery>,
) -> AppResult<Json<ApiResponse<SweepSummary>>> {
    authorize(&state.config.cron_secret, &headers, query.secret.as_deref())?;
    let summary = tracking_service::run_sweep(&state).await?;
    Ok(Json(ApiResponse::success(
        "Sweep",
        summary,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/cron/vacation-reopening",
    params(("secret" = Option<String>, Query, description = "Cron secret (alternative to bearer token)")),
    responses(
        (status = 200, description = "Notification summary", body = ApiResponse<ReopeningSummary>),
        (status = 403, description = "Bad or missing secret")
    ),
    tag = "Cron"
)]
pub async fn vacation_reopening(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CronQuery>,
) -> AppResult<Json<ApiResponse<ReopeningSummary>>> {
    authorize(&state.config.cron_secret, &headers, query.secret.as_deref())?;
    let summary = vacation_service::notify_reopened(&state).await?;
    Ok(Json(ApiResponse::success(
        "Reapertura",
        summary,
        Some(Meta::empty()),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_authorizes() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer s3cret"));
        assert!(authorize("s3cret", &headers, None).is_ok());
    }

    #[test]
    fn query_secret_authorizes() {
        let headers = HeaderMap::new();
        assert!(authorize("s3cret", &headers, Some("s3cret")).is_ok());
    }

    #[test]
    fn wrong_or_missing_secret_is_forbidden() {
        let headers = HeaderMap::new();
        assert!(matches!(
            authorize("s3cret", &headers, Some("nope")),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            authorize("s3cret", &headers, None),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn unconfigured_secret_locks_the_routes() {
        let headers = HeaderMap::new();
        assert!(matches!(
            authorize("", &headers, Some("")),
            Err(AppError::Forbidden)
        ));
    }
}
