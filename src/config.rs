use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub carrier_base_url: String,
    pub carrier_user: String,
    pub carrier_password: String,
    pub carrier_customer_id: String,
    pub mp_base_url: String,
    pub mp_access_token: String,
    pub mp_webhook_secret: Option<String>,
    pub cron_secret: String,
    pub email_api_url: String,
    pub email_api_key: Option<String>,
    pub email_from: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let carrier_base_url = env::var("CARRIER_BASE_URL")
            .unwrap_or_else(|_| "https://api.correoargentino.com.ar/micorreo/v1".to_string());
        let carrier_user = env::var("CARRIER_USER").unwrap_or_default();
        let carrier_password = env::var("CARRIER_PASSWORD").unwrap_or_default();
        let carrier_customer_id = env::var("CARRIER_CUSTOMER_ID").unwrap_or_default();

        let mp_base_url =
            env::var("MP_BASE_URL").unwrap_or_else(|_| "https://api.mercadopago.com".to_string());
        let mp_access_token = env::var("MP_ACCESS_TOKEN").unwrap_or_default();
        let mp_webhook_secret = env::var("MP_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());

        let cron_secret = env::var("CRON_SECRET").unwrap_or_default();

        let email_api_url = env::var("EMAIL_API_URL")
            .unwrap_or_else(|_| "https://api.resend.com/emails".to_string());
        let email_api_key = env::var("EMAIL_API_KEY").ok().filter(|s| !s.is_empty());
        let email_from =
            env::var("EMAIL_FROM").unwrap_or_else(|_| "tienda@example.com".to_string());

        Ok(Self {
            database_url,
            host,
            port,
            carrier_base_url,
            carrier_user,
            carrier_password,
            carrier_customer_id,
            mp_base_url,
            mp_access_token,
            mp_webhook_secret,
            cron_secret,
            email_api_url,
            email_api_key,
            email_from,
        })
    }
}
