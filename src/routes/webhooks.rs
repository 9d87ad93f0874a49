use axum::{
    Json, Router,
    extract::{Query, State},
    http::HeaderMap,
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::webhooks::{WebhookAck, WebhookQuery},
    error::{AppError, AppResult},
    payments::{map_provider_status, verify_webhook_signature},
    response::{ApiResponse, Meta},
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/mercado-pago", post(mercado_pago))
}

#[utoipa::path(
    post,
    path = "/api/webhooks/mercado-pago",
    params(
        ("data.id" = Option<String>, Query, description = "Payment id"),
        ("type" = Option<String>, Query, description = "Event type")
    ),
    responses(
        (status = 200, description = "Webhook processed", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Invalid or missing signature")
    ),
    tag = "Webhooks"
)]
pub async fn mercado_pago(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WebhookQuery>,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    if query.event_type.as_deref() != Some("payment") {
        return Ok(ack(false));
    }

    let data_id = query
        .data_id
        .ok_or_else(|| AppError::Validation("Missing data.id".into()))?;

    let signature = headers.get("x-signature").and_then(|v| v.to_str().ok());
    let request_id = headers.get("x-request-id").and_then(|v| v.to_str().ok());
    verify_webhook_signature(
        state.config.mp_webhook_secret.as_deref(),
        signature,
        request_id,
        Some(&data_id),
    )?;

    let payment = state.payments.fetch_payment(&data_id).await?;
    let status = map_provider_status(&payment.status);

    let Some(order_id) = payment
        .external_reference
        .as_deref()
        .and_then(|reference| Uuid::parse_str(reference).ok())
    else {
        tracing::warn!(payment_id = payment.id, "payment without usable external reference");
        return Ok(ack(false));
    };

    let applied = match order_service::apply_payment_status(&state, order_id, status).await {
        Ok(applied) => applied,
        Err(AppError::NotFound(_)) => {
            tracing::warn!(payment_id = payment.id, order_id = %order_id, "webhook references unknown order");
            false
        }
        Err(err) => return Err(err),
    };

    Ok(ack(applied))
}

fn ack(applied: bool) -> Json<ApiResponse<WebhookAck>> {
    Json(ApiResponse::success(
        "Webhook",
        WebhookAck {
            received: true,
            applied,
        },
        Some(Meta::empty()),
    ))
}
