use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    AppState,
    middleware::{api_key_guard, log_errors},
    routes,
};

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            get(routes::order::list_orders).post(routes::order::create_order),
        )
        .route(
            "/orders/{id}",
            get(routes::order::get_order)
                .put(routes::order::update_order)
                .delete(routes::order::delete_order),
        )
}

pub fn marketplace_routes() -> Router<AppState> {
    Router::new()
        .route("/amazon-token", get(routes::marketplace::access_token))
        .route("/amazon-orders", get(routes::marketplace::list_orders))
}

pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .merge(order_routes())
        .merge(marketplace_routes())
        .layer(from_fn_with_state(state.clone(), api_key_guard));

    Router::new()
        .route("/", get(routes::root))
        .merge(protected_routes)
        .layer(from_fn(log_errors))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AmazonConfig, Config};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use httpmock::prelude::*;
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::util::ServiceExt;

    fn test_config(api_key: Option<&str>, server: &MockServer) -> Config {
        Config {
            database_url: "postgres://localhost/unused".to_string(),
            database_max_connections: 1,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            api_key: api_key.map(str::to_string),
            amazon: AmazonConfig {
                refresh_token: "Atzr|refresh".to_string(),
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                access_key_id: "AKID".to_string(),
                secret_access_key: "aws-secret".to_string(),
                region: "us-east-1".to_string(),
                marketplace_id: "ATVPDKIKX0DER".to_string(),
                token_url: server.url("/auth/o2/token"),
                sp_api_endpoint: server.base_url(),
            },
        }
    }

    fn create_test_app(api_key: Option<&str>, server: &MockServer) -> Router {
        let config = test_config(api_key, server);
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        create_router(AppState::new(pool, config).unwrap())
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_is_public() {
        let server = MockServer::start_async().await;
        let app = create_test_app(Some("k"), &server);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_api_key_rejected() {
        let server = MockServer::start_async().await;
        let app = create_test_app(Some("k"), &server);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/amazon-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Unauthorized: Invalid API key" })
        );
    }

    #[tokio::test]
    async fn test_wrong_api_key_rejected_before_validation() {
        let server = MockServer::start_async().await;
        let app = create_test_app(Some("k"), &server);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/orders")
                    .header("x-api-key", "wrong")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"customer_name":"","status":"","total_amount":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_amazon_token_endpoint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/o2/token");
                then.status(200)
                    .json_body(json!({ "access_token": "Atza|abc", "expires_in": 3600 }));
            })
            .await;
        let app = create_test_app(Some("k"), &server);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/amazon-token")
                    .header("x-api-key", "k")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "access_token": "Atza|abc" }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_amazon_token_failure_is_500() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/o2/token");
                then.status(400)
                    .json_body(json!({ "error": "invalid_grant" }));
            })
            .await;
        let app = create_test_app(None, &server);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/amazon-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Failed to get Amazon access token" })
        );
    }

    #[tokio::test]
    async fn test_amazon_orders_passes_next_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/o2/token");
                then.status(200)
                    .json_body(json!({ "access_token": "Atza|abc", "expires_in": 3600 }));
            })
            .await;
        let orders = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/orders/v0/orders")
                    .query_param("NextToken", "page-2")
                    .header("x-amz-access-token", "Atza|abc");
                then.status(200)
                    .json_body(json!({ "payload": { "Orders": [] } }));
            })
            .await;
        let app = create_test_app(None, &server);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/amazon-orders?NextToken=page-2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "payload": { "Orders": [] } }));
        orders.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_order_validation() {
        let server = MockServer::start_async().await;
        let app = create_test_app(None, &server);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/orders")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"customer_name":"Ada","status":"pending","total_amount":-5}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "total_amount must be a non-negative number" })
        );
    }

    #[tokio::test]
    async fn test_create_order_missing_field_is_json_400() {
        let server = MockServer::start_async().await;
        let app = create_test_app(None, &server);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/orders")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"customer_name":"Ada","status":"pending"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("total_amount"));
    }

    #[tokio::test]
    async fn test_non_numeric_order_id_is_json_400() {
        let server = MockServer::start_async().await;
        let app = create_test_app(None, &server);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/orders/abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }
}
