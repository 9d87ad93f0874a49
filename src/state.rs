use crate::{
    carrier::CarrierClient,
    config::AppConfig,
    db::{DbPool, OrmConn},
    mailer::Mailer,
    payments::PaymentsClient,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: AppConfig,
    pub carrier: CarrierClient,
    pub payments: PaymentsClient,
    pub mailer: Mailer,
}
