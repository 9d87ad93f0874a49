use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    carrier::{Agency, CarrierResponse, TrackingData},
    dto::shipping::{AgencyQuery, RateQuery, RateQuoteList},
    error::AppResult,
    models::ShippingOption,
    response::{ApiResponse, Meta},
    services::{settings_service, shipping_service},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ShippingOptionList {
    pub items: Vec<ShippingOption>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rates", get(quote_rates))
        .route("/options", get(shipping_options))
        .route("/agencies", get(list_agencies))
        .route("/tracking/{number}", get(get_tracking))
}

#[utoipa::path(
    get,
    path = "/api/shipping/rates",
    params(
        ("postal_code" = String, Query, description = "Destination postal code, e.g. 1050 or C1050"),
        ("weight" = Option<f64>, Query, description = "Package weight in kg")
    ),
    responses(
        (status = 200, description = "Zone rates", body = ApiResponse<RateQuoteList>),
        (status = 400, description = "Malformed postal code")
    ),
    tag = "Shipping"
)]
pub async fn quote_rates(
    Query(query): Query<RateQuery>,
) -> AppResult<Json<ApiResponse<RateQuoteList>>> {
    let quotes = shipping_service::quote_rates(&query.postal_code, query.weight)?;
    Ok(Json(ApiResponse::success(
        "Tarifas",
        quotes,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/shipping/options",
    responses(
        (status = 200, description = "Checkout shipping options", body = ApiResponse<ShippingOptionList>)
    ),
    tag = "Shipping"
)]
pub async fn shipping_options(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ShippingOptionList>>> {
    let items = settings_service::shipping_options(&state).await?;
    Ok(Json(ApiResponse::success(
        "Opciones de envío",
        ShippingOptionList { items },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/shipping/agencies",
    params(
        ("province_code" = String, Query, description = "Province code, e.g. B"),
        ("postal_code" = Option<String>, Query, description = "Narrow by postal code")
    ),
    responses(
        (status = 200, description = "Carrier agencies", body = CarrierResponse<Vec<Agency>>)
    ),
    tag = "Shipping"
)]
pub async fn list_agencies(
    State(state): State<AppState>,
    Query(query): Query<AgencyQuery>,
) -> Json<CarrierResponse<Vec<Agency>>> {
    let response = state
        .carrier
        .get_agencies(&query.province_code, query.postal_code.as_deref())
        .await;
    Json(response)
}

#[utoipa::path(
    get,
    path = "/api/shipping/tracking/{number}",
    params(("number" = String, Path, description = "Carrier tracking number")),
    responses(
        (status = 200, description = "Tracking events", body = CarrierResponse<TrackingData>)
    ),
    tag = "Shipping"
)]
pub async fn get_tracking(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Json<CarrierResponse<TrackingData>> {
    let response = state.carrier.get_tracking(&number).await;
    Json(response)
}
