pub mod audit_logs;
pub mod order_items;
pub mod orders;
pub mod product_variants;
pub mod products;
pub mod settings;
pub mod vacation_periods;
pub mod vacation_subscribers;

pub use audit_logs::Entity as AuditLogs;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_variants::Entity as ProductVariants;
pub use products::Entity as Products;
pub use settings::Entity as Settings;
pub use vacation_periods::Entity as VacationPeriods;
pub use vacation_subscribers::Entity as VacationSubscribers;
