use serde::Deserialize;
use thiserror::Error;

/// Deployment environment, read from `ENV`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration, loaded from environment variables (and `.env` in development)
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    pub database_url: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    /// Keys the private cookie jar, at least 64 bytes
    pub cookie_secret: String,

    #[serde(default)]
    pub env: Environment,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma separated list of origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,

    #[serde(default = "default_access_token_expiry_minutes")]
    pub access_token_expiry_minutes: i64,
    #[serde(default = "default_refresh_token_expiry_days")]
    pub refresh_token_expiry_days: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_payment_api_url")]
    pub payment_api_url: String,
    pub payment_api_key: Option<String>,
    pub payment_api_secret: Option<String>,

    #[serde(default = "default_exchange_rate_api_url")]
    pub exchange_rate_api_url: String,
}

const fn default_port() -> u16 {
    3000
}

fn default_allowed_origins() -> String {
    "http://localhost:3001".to_string()
}

const fn default_access_token_expiry_minutes() -> i64 {
    15
}

const fn default_refresh_token_expiry_days() -> i64 {
    30
}

const fn default_bcrypt_cost() -> u32 {
    10
}

const fn default_db_max_connections() -> u32 {
    10
}

fn default_payment_api_url() -> String {
    "https://epay.guiddini.dz/api".to_string()
}

fn default_exchange_rate_api_url() -> String {
    "https://api.exchangerate-api.com/v4/latest".to_string()
}

impl ApiConfig {
    /// Load and validate the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_secret.len() < 32 {
            return Err(ConfigError::Invalid(
                "ACCESS_TOKEN_SECRET must be at least 32 characters".to_string(),
            ));
        }
        if self.refresh_token_secret.len() < 32 {
            return Err(ConfigError::Invalid(
                "REFRESH_TOKEN_SECRET must be at least 32 characters".to_string(),
            ));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(ConfigError::Invalid(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ".to_string(),
            ));
        }
        // axum-extra's Key::from panics below 64 bytes
        if self.cookie_secret.len() < 64 {
            return Err(ConfigError::Invalid(
                "COOKIE_SECRET must be at least 64 bytes".to_string(),
            ));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid(
                "BCRYPT_COST must be between 4 and 31".to_string(),
            ));
        }
        Ok(())
    }

    pub fn parsed_allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}
