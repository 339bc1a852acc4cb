use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_api_key: String,
    pub app_jwt_secret: String,
    pub payment_gateway_url: String,
    pub payment_merchant_code: String,
    pub payment_hash_secret: String,
    pub payment_return_url: String,
    pub notify_webhook_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            store_url: env::var("STORE_URL")
                .unwrap_or_else(|_| {
                    warn!("STORE_URL not set, using empty value");
                    String::new()
                }),
            store_api_key: env::var("STORE_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("STORE_API_KEY not set, using empty value");
                    String::new()
                }),
            app_jwt_secret: env::var("APP_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("APP_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            payment_gateway_url: env::var("PAYMENT_GATEWAY_URL")
                .unwrap_or_else(|_| {
                    warn!("PAYMENT_GATEWAY_URL not set, using sandbox default");
                    "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string()
                }),
            payment_merchant_code: env::var("PAYMENT_MERCHANT_CODE")
                .unwrap_or_else(|_| {
                    warn!("PAYMENT_MERCHANT_CODE not set, using empty value");
                    String::new()
                }),
            payment_hash_secret: env::var("PAYMENT_HASH_SECRET")
                .unwrap_or_else(|_| {
                    warn!("PAYMENT_HASH_SECRET not set, using empty value");
                    String::new()
                }),
            payment_return_url: env::var("PAYMENT_RETURN_URL")
                .unwrap_or_else(|_| {
                    warn!("PAYMENT_RETURN_URL not set, using default");
                    "http://localhost:3000/payments/return".to_string()
                }),
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL")
                .unwrap_or_else(|_| {
                    warn!("NOTIFY_WEBHOOK_URL not set, notifications disabled");
                    String::new()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.store_url.is_empty()
            && !self.store_api_key.is_empty()
            && !self.app_jwt_secret.is_empty()
    }

    pub fn is_payment_configured(&self) -> bool {
        !self.payment_gateway_url.is_empty()
            && !self.payment_merchant_code.is_empty()
            && !self.payment_hash_secret.is_empty()
    }

    pub fn is_notifier_configured(&self) -> bool {
        !self.notify_webhook_url.is_empty()
    }
}
