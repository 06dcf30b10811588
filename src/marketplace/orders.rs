use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::{Url, header};
use serde_json::Value;

use super::signing::canonical_query;
use super::{Clock, MarketplaceError, ProviderFailure, SigV4Signer, SigningRequest, TokenCache};

pub const ORDERS_PATH: &str = "/orders/v0/orders";

/// How far back the order listing reaches, recomputed on every call.
const LISTING_WINDOW_DAYS: i64 = 30;

/// Query parameters of one `getOrders` page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdersQuery {
    pub marketplace_id: String,
    pub created_after: DateTime<Utc>,
    pub next_token: Option<String>,
}

impl OrdersQuery {
    pub fn new(marketplace_id: &str, now: DateTime<Utc>, next_token: Option<&str>) -> Self {
        Self {
            marketplace_id: marketplace_id.to_string(),
            created_after: now - Duration::days(LISTING_WINDOW_DAYS),
            next_token: next_token.map(str::to_string),
        }
    }

    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("MarketplaceIds".to_string(), self.marketplace_id.clone()),
            (
                "CreatedAfter".to_string(),
                self.created_after
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        ];
        if let Some(token) = &self.next_token {
            pairs.push(("NextToken".to_string(), token.clone()));
        }
        pairs
    }
}

/// Signed client for the Selling Partner orders endpoint.
pub struct MarketplaceClient {
    http: reqwest::Client,
    endpoint: String,
    host: String,
    marketplace_id: String,
    signer: SigV4Signer,
    tokens: Arc<TokenCache>,
    clock: Arc<dyn Clock>,
}

impl MarketplaceClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        marketplace_id: impl Into<String>,
        signer: SigV4Signer,
        tokens: Arc<TokenCache>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, MarketplaceError> {
        let url = Url::parse(endpoint)
            .map_err(|e| MarketplaceError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

        // Only ORDERS_PATH is signed, so the endpoint must be a bare origin.
        if url.path() != "/" || url.query().is_some() {
            return Err(MarketplaceError::InvalidEndpoint(format!(
                "{}: endpoint must not carry a path or query",
                endpoint
            )));
        }

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(MarketplaceError::InvalidEndpoint(endpoint.to_string())),
        };

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            host,
            marketplace_id: marketplace_id.into(),
            signer,
            tokens,
            clock,
        })
    }

    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    /// Fetches one page of orders created in the last 30 days. `next_token`
    /// continues a previous listing; `None` starts from the first page.
    pub async fn list_orders(&self, next_token: Option<&str>) -> Result<Value, MarketplaceError> {
        let access_token = self.tokens.get_token().await?;

        let now = self.clock.now();
        let pairs = OrdersQuery::new(&self.marketplace_id, now, next_token).pairs();
        let signed = self.signer.sign(
            &SigningRequest {
                method: "GET",
                host: &self.host,
                path: ORDERS_PATH,
                query: &pairs,
            },
            now,
        );

        let url = format!("{}{}?{}", self.endpoint, ORDERS_PATH, canonical_query(&pairs));
        tracing::debug!("Fetching marketplace orders: {}", url);

        let resp = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, signed.authorization)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-access-token", access_token)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| MarketplaceError::MarketplaceFetch(e.into()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| MarketplaceError::MarketplaceFetch(e.into()))?;

        if !status.is_success() {
            tracing::error!("Marketplace orders rejected - Status: {}, Body: {}", status, body);
            return Err(MarketplaceError::MarketplaceFetch(ProviderFailure::Status {
                status: status.as_u16(),
                body,
            }));
        }

        serde_json::from_str(&body).map_err(|e| {
            MarketplaceError::MarketplaceFetch(ProviderFailure::Transport(format!(
                "unreadable orders response: {}",
                e
            )))
        })
    }
}
