use axum::extract::{Json, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AppState, error::Result};

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(rename = "NextToken", alias = "nextToken")]
    pub next_token: Option<String>,
}

#[axum::debug_handler]
pub async fn access_token(State(state): State<AppState>) -> Result<Json<AccessTokenResponse>> {
    let access_token = state.marketplace.tokens().get_token().await?;

    Ok(Json(AccessTokenResponse { access_token }))
}

#[axum::debug_handler]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Value>> {
    let next_token = query.next_token.as_deref().filter(|t| !t.is_empty());
    let payload = state.marketplace.list_orders(next_token).await?;

    Ok(Json(payload))
}
