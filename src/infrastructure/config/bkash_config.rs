use std::sync::Arc;

/// bKash tokenized-checkout credentials and endpoint
#[derive(Debug, Clone)]
pub struct BkashConfig {
    /// App key issued by the merchant portal
    pub app_key: String,

    /// App secret issued by the merchant portal
    pub app_secret: String,

    /// Checkout username (token grant header)
    pub username: String,

    /// Checkout password (token grant header)
    pub password: String,

    /// API base URL
    pub base_url: String,
}

impl BkashConfig {
    pub fn from_env() -> Arc<Self> {
        Arc::new(Self {
            app_key: std::env::var("BKASH_APP_KEY")
                .expect("BKASH_APP_KEY must be set"),
            app_secret: std::env::var("BKASH_APP_SECRET")
                .expect("BKASH_APP_SECRET must be set"),
            username: std::env::var("BKASH_USERNAME")
                .expect("BKASH_USERNAME must be set"),
            password: std::env::var("BKASH_PASSWORD")
                .expect("BKASH_PASSWORD must be set"),
            base_url: std::env::var("BKASH_BASE_URL")
                .unwrap_or_else(|_| "https://tokenized.sandbox.bka.sh/v1.2.0-beta".to_string()),
        })
    }
}
