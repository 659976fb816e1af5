use std::time::Duration;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sqlx::PgPool;

use crate::{
    ApiConfig, config::Environment, currency::ExchangeRateClient, payment::PaymentGateway,
};

/// Token settings needed by the auth extractors
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
}

#[derive(Clone, Debug)]
pub struct ApiState {
    pub pool: PgPool,
    pub auth: AuthConfig,
    pub cookie_key: Key,
    pub environment: Environment,
    pub bcrypt_cost: u32,
    /// `None` when the gateway credentials are not configured
    pub payment_gateway: Option<PaymentGateway>,
    pub exchange_rates: ExchangeRateClient,
}

impl ApiState {
    pub fn new(config: &ApiConfig, pool: PgPool) -> anyhow::Result<Self> {
        let cookie_key = Key::from(config.cookie_secret.as_bytes());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        let payment_gateway = match (&config.payment_api_key, &config.payment_api_secret) {
            (Some(key), Some(secret)) => Some(PaymentGateway::new(
                http.clone(),
                &config.payment_api_url,
                key,
                secret,
            )),
            _ => {
                tracing::warn!(
                    "Payment gateway not configured (missing PAYMENT_API_KEY / PAYMENT_API_SECRET)"
                );
                None
            }
        };

        let exchange_rates = ExchangeRateClient::new(http, &config.exchange_rate_api_url);

        Ok(Self {
            pool,
            auth: AuthConfig {
                access_token_secret: config.access_token_secret.clone(),
                refresh_token_secret: config.refresh_token_secret.clone(),
                access_token_expiry_minutes: config.access_token_expiry_minutes,
                refresh_token_expiry_days: config.refresh_token_expiry_days,
            },
            cookie_key,
            environment: config.env,
            bcrypt_cost: config.bcrypt_cost,
            payment_gateway,
            exchange_rates,
        })
    }

    /// The payment gateway, or the error returned when it is not configured
    pub fn gateway(&self) -> Result<&PaymentGateway, crate::ApiError> {
        self.payment_gateway.as_ref().ok_or_else(|| {
            crate::ApiError::Config(
                "Payment configuration error: API credentials not found".to_string(),
            )
        })
    }
}

impl FromRef<ApiState> for Key {
    fn from_ref(state: &ApiState) -> Self {
        state.cookie_key.clone()
    }
}

impl FromRef<ApiState> for AuthConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.auth.clone()
    }
}
