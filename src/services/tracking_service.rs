use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;

use crate::{
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    error::AppResult,
    models::OrderStatus,
    state::AppState,
};

// Spacing between carrier calls; the tracking endpoint rate-limits bursts.
const CALL_DELAY: Duration = Duration::from_millis(400);

#[derive(Debug, Serialize, ToSchema)]
pub struct SweepSummary {
    pub checked: i64,
    pub updated: i64,
    pub failed: i64,
}

/// One sequential pass over every undelivered order that has a tracking
/// number. A failure on one order is logged and the sweep moves on.
pub async fn run_sweep(state: &AppState) -> AppResult<SweepSummary> {
    let orders = Orders::find()
        .filter(OrderCol::TrackingNumber.is_not_null())
        .filter(
            OrderCol::Status.is_not_in([
                OrderStatus::Delivered.as_str(),
                OrderStatus::Cancelled.as_str(),
            ]),
        )
        .order_by_asc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let mut summary = SweepSummary {
        checked: 0,
        updated: 0,
        failed: 0,
    };

    for (index, order) in orders.into_iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(CALL_DELAY).await;
        }
        let Some(tracking_number) = order.tracking_number.clone() else {
            continue;
        };
        summary.checked += 1;

        let response = state.carrier.get_tracking(&tracking_number).await;
        let Some(data) = response.data else {
            let message = response
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "empty carrier response".into());
            tracing::warn!(order_id = %order.id, tracking = %tracking_number, error = %message, "tracking fetch failed");
            summary.failed += 1;
            continue;
        };

        let latest = data
            .events
            .last()
            .map(|event| format!("{} ({})", event.status, event.date));
        if latest.is_none() || latest == order.last_tracking_event {
            continue;
        }

        let customer_email = order.customer_email.clone();
        let order_id = order.id;
        let mut active: OrderActive = order.into();
        active.last_tracking_event = Set(latest.clone());
        active.updated_at = Set(Utc::now().into());
        if let Err(err) = active.update(&state.orm).await {
            tracing::warn!(order_id = %order_id, error = %err, "tracking event update failed");
            summary.failed += 1;
            continue;
        }
        summary.updated += 1;

        state
            .mailer
            .send_best_effort(
                &customer_email,
                "Novedades de tu envío",
                &format!(
                    "Tu pedido {} tiene una novedad: {}",
                    order_id,
                    latest.unwrap_or_default()
                ),
            )
            .await;
    }

    tracing::info!(
        checked = summary.checked,
        updated = summary.updated,
        failed = summary.failed,
        "tracking sweep finished"
    );
    Ok(summary)
}
