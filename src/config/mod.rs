use std::env;
use std::fmt::{self, Debug, Formatter};

use thiserror::Error;

pub const DEFAULT_TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";
pub const DEFAULT_SP_API_ENDPOINT: &str = "https://sellingpartnerapi-na.amazon.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Stand-in printed for secrets in `Debug` output.
pub(crate) const REDACTED: &str = "<redacted>";

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    /// `None` leaves every route open.
    pub api_key: Option<String>,
    pub amazon: AmazonConfig,
}

#[derive(Clone)]
pub struct AmazonConfig {
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub marketplace_id: String,
    pub token_url: String,
    pub sp_api_endpoint: String,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &REDACTED)
            .field("database_max_connections", &self.database_max_connections)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("amazon", &self.amazon)
            .finish()
    }
}

impl Debug for AmazonConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmazonConfig")
            .field("refresh_token", &REDACTED)
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &REDACTED)
            .field("region", &self.region)
            .field("marketplace_id", &self.marketplace_id)
            .field("token_url", &self.token_url)
            .field("sp_api_endpoint", &self.sp_api_endpoint)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port_var = get("PORT")
            .map(|v| ("PORT", v))
            .or_else(|| get("SERVER_PORT").map(|v| ("SERVER_PORT", v)));
        let server_port = match port_var {
            Some((key, v)) => v
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value: v })?,
            None => 4000,
        };
        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                value: v,
            })?,
            None => 10,
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            database_max_connections,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port,
            api_key: get("API_KEY"),
            amazon: AmazonConfig {
                refresh_token: require("AMAZON_REFRESH_TOKEN")?,
                client_id: require("AMAZON_CLIENT_ID")?,
                client_secret: require("AMAZON_CLIENT_SECRET")?,
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
                region: get("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                marketplace_id: get("MARKETPLACE_ID").unwrap_or_else(|| "ATVPDKIKX0DER".to_string()),
                token_url: get("AMAZON_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
                sp_api_endpoint: get("SP_API_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_SP_API_ENDPOINT.to_string()),
            },
        })
    }
}
