use utoipa::OpenApi;
use utoipa::openapi::OpenApi as OpenApiSpec;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    carrier::{Agency, CarrierFailure, CarrierResponse, ImportShipmentData, TrackingData, TrackingEvent},
    dto::{
        orders::{CreateOrderRequest, OrderItemInput, OrderList, OrderWithItems, RegisterShipmentRequest, TransferProofRequest},
        products::{CatalogStats, CreateProductRequest, CreateVariantRequest, ProductList, ProductWithVariants, UpdateProductRequest},
        settings::{CreateVacationPeriodRequest, SettingValue, UpsertSettingRequest, VacationSubscribeRequest},
        shipping::{RateQuote, RateQuoteList},
        webhooks::WebhookAck,
    },
    models::{Order, OrderItem, OrderStatus, Product, ShippingOption, VacationPeriod, Variant},
    response::{ApiResponse, Meta},
    routes::{cron, health, orders, params, products as product_routes, settings, shipping, vacation, webhooks},
    services::{tracking_service::SweepSummary, vacation_service::{ReopeningSummary, VacationBanner}},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        product_routes::list_products,
        product_routes::catalog_stats,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        product_routes::adjust_inventory,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::mark_processed,
        orders::mark_delivered,
        orders::cancel_order,
        orders::confirm_transfer,
        orders::approve_transfer,
        orders::register_shipment,
        shipping::quote_rates,
        shipping::shipping_options,
        shipping::list_agencies,
        shipping::get_tracking,
        settings::get_setting,
        settings::upsert_setting,
        vacation::banner,
        vacation::subscribe,
        vacation::create_period,
        webhooks::mercado_pago,
        cron::tracking_notifications,
        cron::vacation_reopening
    ),
    components(
        schemas(
            Product,
            Variant,
            Order,
            OrderItem,
            OrderStatus,
            ShippingOption,
            VacationPeriod,
            CreateProductRequest,
            CreateVariantRequest,
            UpdateProductRequest,
            ProductList,
            ProductWithVariants,
            CatalogStats,
            product_routes::InventoryAdjustRequest,
            CreateOrderRequest,
            OrderItemInput,
            OrderList,
            OrderWithItems,
            TransferProofRequest,
            RegisterShipmentRequest,
            RateQuote,
            RateQuoteList,
            shipping::ShippingOptionList,
            Agency,
            TrackingEvent,
            TrackingData,
            ImportShipmentData,
            CarrierFailure,
            CarrierResponse<Vec<Agency>>,
            CarrierResponse<TrackingData>,
            SettingValue,
            UpsertSettingRequest,
            VacationSubscribeRequest,
            CreateVacationPeriodRequest,
            VacationBanner,
            ReopeningSummary,
            SweepSummary,
            WebhookAck,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<ProductWithVariants>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<RateQuoteList>,
            ApiResponse<SettingValue>,
            ApiResponse<VacationBanner>,
            ApiResponse<WebhookAck>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Orders", description = "Order lifecycle endpoints"),
        (name = "Shipping", description = "Rate calculator and carrier endpoints"),
        (name = "Settings", description = "Store settings endpoints"),
        (name = "Vacation", description = "Vacation mode endpoints"),
        (name = "Webhooks", description = "Payment provider callbacks"),
        (name = "Cron", description = "Scheduler entry points"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
