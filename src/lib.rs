use std::sync::Arc;

use crate::config::Config;
use marketplace::{
    Clock, LwaCredentials, MarketplaceClient, MarketplaceError, SigV4Signer, SystemClock,
    TokenCache,
};
use sqlx::PgPool;

pub mod config;
pub mod error;
pub mod extract;
pub mod marketplace;
pub mod middleware;
pub mod router;
pub mod routes;

/// Signing service name for Selling Partner API calls.
const SP_API_SERVICE: &str = "execute-api";

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub marketplace: Arc<MarketplaceClient>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Result<Self, MarketplaceError> {
        Self::with_clock(pool, config, Arc::new(SystemClock))
    }

    /// Wires the token cache and marketplace client around one shared clock
    /// and HTTP client.
    pub fn with_clock(
        pool: PgPool,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, MarketplaceError> {
        let http = reqwest::Client::new();
        let amazon = &config.amazon;

        let tokens = Arc::new(TokenCache::new(
            http.clone(),
            amazon.token_url.clone(),
            LwaCredentials {
                refresh_token: amazon.refresh_token.clone(),
                client_id: amazon.client_id.clone(),
                client_secret: amazon.client_secret.clone(),
            },
            clock.clone(),
        ));
        let signer = SigV4Signer::new(
            amazon.access_key_id.clone(),
            amazon.secret_access_key.clone(),
            amazon.region.clone(),
            SP_API_SERVICE,
        );
        let marketplace = MarketplaceClient::new(
            http,
            &amazon.sp_api_endpoint,
            amazon.marketplace_id.clone(),
            signer,
            tokens,
            clock,
        )?;

        Ok(Self {
            pool,
            config,
            marketplace: Arc::new(marketplace),
        })
    }
}
