use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RateQuery {
    pub postal_code: String,
    /// Package weight in kilograms; scales standard/express tiers.
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RateQuote {
    pub service: String,
    pub name: String,
    pub price: i64,
    pub estimated_days: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RateQuoteList {
    pub zone: String,
    pub quotes: Vec<RateQuote>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AgencyQuery {
    pub province_code: String,
    pub postal_code: Option<String>,
}
