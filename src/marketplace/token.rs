use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use super::{Clock, MarketplaceError, ProviderFailure};
use crate::config::REDACTED;

/// Seconds shaved off the provider-reported lifetime so the token is renewed
/// before the provider rejects it.
pub const EARLY_RENEWAL_SECS: i64 = 300;

/// Login-with-Amazon credentials used for the refresh-token grant.
#[derive(Clone)]
pub struct LwaCredentials {
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
}

impl Debug for LwaCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LwaCredentials")
            .field("refresh_token", &REDACTED)
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Process-wide holder of the marketplace access token.
///
/// `get_token` serves the cached value while it is unexpired and performs a
/// refresh-token exchange otherwise. Refreshes are serialised: a caller that
/// waited on an in-flight refresh re-reads the cache before going to the
/// network, so a burst of callers on an empty cache costs one exchange.
pub struct TokenCache {
    http: reqwest::Client,
    token_url: String,
    credentials: LwaCredentials,
    clock: Arc<dyn Clock>,
    current: RwLock<Option<CachedToken>>,
    refresh: Mutex<()>,
}

impl TokenCache {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        credentials: LwaCredentials,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            credentials,
            clock,
            current: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub async fn get_token(&self) -> Result<String, MarketplaceError> {
        if let Some(token) = self.fresh_token().await {
            tracing::debug!("Using cached marketplace access token");
            return Ok(token);
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        let fetched = self.exchange().await?;
        let value = fetched.value.clone();
        *self.current.write().await = Some(fetched);

        Ok(value)
    }

    /// Snapshot of the cached token, expired or not.
    pub async fn cached(&self) -> Option<CachedToken> {
        self.current.read().await.clone()
    }

    pub async fn invalidate(&self) {
        *self.current.write().await = None;
    }

    async fn fresh_token(&self) -> Option<String> {
        let now = self.clock.now();
        self.current
            .read()
            .await
            .as_ref()
            .filter(|t| t.is_valid_at(now))
            .map(|t| t.value.clone())
    }

    async fn exchange(&self) -> Result<CachedToken, MarketplaceError> {
        tracing::info!("Refreshing marketplace access token");

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];

        let resp = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| MarketplaceError::TokenFetch(e.into()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| MarketplaceError::TokenFetch(e.into()))?;

        if !status.is_success() {
            tracing::error!("Token exchange rejected - Status: {}, Body: {}", status, body);
            return Err(MarketplaceError::TokenFetch(ProviderFailure::Status {
                status: status.as_u16(),
                body,
            }));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            MarketplaceError::TokenFetch(ProviderFailure::Transport(format!(
                "unreadable token response: {}",
                e
            )))
        })?;

        if parsed.expires_in <= EARLY_RENEWAL_SECS {
            tracing::warn!(
                "Provider token lifetime {}s is within the {}s renewal margin; it will not be reused",
                parsed.expires_in,
                EARLY_RENEWAL_SECS
            );
        }

        let expires_at = parsed
            .expires_in
            .checked_sub(EARLY_RENEWAL_SECS)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                MarketplaceError::TokenFetch(ProviderFailure::Transport(format!(
                    "invalid expires_in {} in token response",
                    parsed.expires_in
                )))
            })?;

        Ok(CachedToken {
            value: parsed.access_token,
            expires_at,
        })
    }
}
