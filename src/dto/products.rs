use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Product, Variant};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVariantRequest {
    pub color: String,
    pub size: String,
    pub stock: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub sale_price: Option<i64>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub variants: Vec<CreateVariantRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub sale_price: Option<i64>,
    pub on_sale: Option<bool>,
    pub stock: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductWithVariants {
    pub product: Product,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogStats {
    pub products: i64,
    pub units_in_stock: i64,
    pub out_of_stock: i64,
    pub on_sale: i64,
}
