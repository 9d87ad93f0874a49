use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::settings::{CreateVacationPeriodRequest, VacationSubscribeRequest},
    entity::{
        vacation_periods::{
            ActiveModel as PeriodActive, Column as PeriodCol, Entity as VacationPeriods,
            Model as PeriodModel,
        },
        vacation_subscribers::{
            ActiveModel as SubscriberActive, Column as SubCol, Entity as VacationSubscribers,
        },
    },
    error::{AppError, AppResult},
    models::VacationPeriod,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct VacationBanner {
    pub active: bool,
    pub period: Option<VacationPeriod>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReopeningSummary {
    pub notified: i64,
    pub failed: i64,
}

pub async fn banner(state: &AppState) -> AppResult<ApiResponse<VacationBanner>> {
    let now = Utc::now();
    let period = VacationPeriods::find()
        .filter(PeriodCol::StartsAt.lte(now))
        .filter(PeriodCol::EndsAt.gte(now))
        .order_by_desc(PeriodCol::StartsAt)
        .one(&state.orm)
        .await?;

    let data = VacationBanner {
        active: period.is_some(),
        period: period.map(period_from_entity),
    };
    Ok(ApiResponse::success("Vacaciones", data, Some(Meta::empty())))
}

pub async fn create_period(
    state: &AppState,
    payload: CreateVacationPeriodRequest,
) -> AppResult<ApiResponse<VacationPeriod>> {
    if payload.ends_at <= payload.starts_at {
        return Err(AppError::Validation(
            "El fin del período debe ser posterior al inicio".into(),
        ));
    }

    let period = PeriodActive {
        id: Set(Uuid::new_v4()),
        starts_at: Set(payload.starts_at.into()),
        ends_at: Set(payload.ends_at.into()),
        message: Set(payload.message),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Período creado",
        period_from_entity(period),
        Some(Meta::empty()),
    ))
}

/// Attach an email to the active closure window. Duplicate subscriptions for
/// the same period are accepted silently.
pub async fn subscribe(
    state: &AppState,
    payload: VacationSubscribeRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if !payload.email.contains('@') {
        return Err(AppError::Validation("Email inválido".into()));
    }

    let now = Utc::now();
    let period = VacationPeriods::find()
        .filter(PeriodCol::StartsAt.lte(now))
        .filter(PeriodCol::EndsAt.gte(now))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Conflict("La tienda no está cerrada por vacaciones".into()))?;

    sqlx::query(
        r#"
        INSERT INTO vacation_subscribers (id, period_id, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (period_id, email) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(period.id)
    .bind(payload.email.trim())
    .execute(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Te avisamos cuando volvamos",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Reopening sweep: for every period that already ended, email each
/// not-yet-notified subscriber once. Send failures keep the flag unset so the
/// next sweep retries them.
pub async fn notify_reopened(state: &AppState) -> AppResult<ReopeningSummary> {
    let now = Utc::now();
    let ended: Vec<Uuid> = VacationPeriods::find()
        .filter(PeriodCol::EndsAt.lt(now))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    if ended.is_empty() {
        return Ok(ReopeningSummary {
            notified: 0,
            failed: 0,
        });
    }

    let pending = VacationSubscribers::find()
        .filter(SubCol::PeriodId.is_in(ended))
        .filter(SubCol::Notified.eq(false))
        .all(&state.orm)
        .await?;

    let mut notified = 0;
    let mut failed = 0;
    for subscriber in pending {
        match state
            .mailer
            .send(
                &subscriber.email,
                "¡Volvimos!",
                "La tienda está abierta de nuevo. Te esperamos.",
            )
            .await
        {
            Ok(()) => {
                let mut active: SubscriberActive = subscriber.into();
                active.notified = Set(true);
                active.update(&state.orm).await?;
                notified += 1;
            }
            Err(err) => {
                tracing::warn!(email = %subscriber.email, error = %err, "reopening notification failed");
                failed += 1;
            }
        }
    }

    Ok(ReopeningSummary { notified, failed })
}

fn period_from_entity(model: PeriodModel) -> VacationPeriod {
    VacationPeriod {
        id: model.id,
        starts_at: model.starts_at.with_timezone(&Utc),
        ends_at: model.ends_at.with_timezone(&Utc),
        message: model.message,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
