use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub order_id: i32,
    pub customer_name: String,
    pub status: String,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /orders` and `PUT /orders/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    pub customer_name: String,
    pub status: String,
    pub total_amount: f64,
}

impl OrderRequest {
    /// Returns the first problem found, if any.
    pub fn validate(&self) -> Option<String> {
        if self.customer_name.trim().is_empty() {
            return Some("customer_name is required".to_string());
        }
        if self.status.trim().is_empty() {
            return Some("status is required".to_string());
        }
        if !self.total_amount.is_finite() || self.total_amount < 0.0 {
            return Some("total_amount must be a non-negative number".to_string());
        }
        None
    }
}

const ORDER_COLUMNS: &str = "order_id, customer_name, status, total_amount, created_at";

impl Order {
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders ORDER BY created_at DESC, order_id DESC",
            ORDER_COLUMNS
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, order_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE order_id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, req: &OrderRequest) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (customer_name, status, total_amount, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(req.customer_name.trim())
        .bind(req.status.trim())
        .bind(req.total_amount)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        order_id: i32,
        req: &OrderRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET customer_name = $2, status = $3, total_amount = $4
            WHERE order_id = $1
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(req.customer_name.trim())
        .bind(req.status.trim())
        .bind(req.total_amount)
        .fetch_optional(pool)
        .await
    }

    /// Returns whether a row was removed.
    pub async fn delete(pool: &PgPool, order_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(order_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, status: &str, total: f64) -> OrderRequest {
        OrderRequest {
            customer_name: name.to_string(),
            status: status.to_string(),
            total_amount: total,
        }
    }

    #[test]
    fn test_valid_request() {
        assert_eq!(request("Ada", "pending", 12.5).validate(), None);
        assert_eq!(request("Ada", "pending", 0.0).validate(), None);
    }

    #[test]
    fn test_blank_fields_rejected() {
        assert!(request("  ", "pending", 1.0).validate().is_some());
        assert!(request("Ada", "", 1.0).validate().is_some());
    }

    #[test]
    fn test_bad_amounts_rejected() {
        assert!(request("Ada", "pending", -0.01).validate().is_some());
        assert!(request("Ada", "pending", f64::NAN).validate().is_some());
        assert!(request("Ada", "pending", f64::INFINITY).validate().is_some());
    }
}
