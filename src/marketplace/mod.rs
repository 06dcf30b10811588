//! Amazon Selling Partner integration: the LWA token cache and the
//! SigV4-signed order listing built on top of it.

mod clock;
mod orders;
mod signing;
mod token;

use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use orders::{MarketplaceClient, ORDERS_PATH, OrdersQuery};
pub use signing::{SignedHeaders, SigV4Signer, SigningRequest};
pub use token::{CachedToken, EARLY_RENEWAL_SECS, LwaCredentials, TokenCache};

/// Why a call to a provider endpoint did not produce a usable response.
#[derive(Debug, Error)]
pub enum ProviderFailure {
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl ProviderFailure {
    /// Provider payload for non-2xx answers, transport message otherwise.
    pub fn detail(&self) -> &str {
        match self {
            ProviderFailure::Status { body, .. } => body,
            ProviderFailure::Transport(msg) => msg,
        }
    }
}

impl From<reqwest::Error> for ProviderFailure {
    fn from(e: reqwest::Error) -> Self {
        ProviderFailure::Transport(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("access token exchange failed: {0}")]
    TokenFetch(ProviderFailure),

    #[error("marketplace order request failed: {0}")]
    MarketplaceFetch(ProviderFailure),

    #[error("invalid endpoint {0}")]
    InvalidEndpoint(String),
}
