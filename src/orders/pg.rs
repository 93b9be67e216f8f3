use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};

use super::OrderStore;
use crate::errors::AssistantError;
use crate::query::check_input;
use crate::types::{OrderStatus, OrderSummary, UserId};

pub struct PgOrderStore {
    pool: Pool<Postgres>,
    table: String,
}

#[derive(FromRow, Debug)]
struct OrderRow {
    id: String,
    user_id: String,
    status: String,
    placed_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for OrderSummary {
    type Error = AssistantError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| anyhow::anyhow!("order {}: {}", row.id, e))?;
        Ok(OrderSummary {
            id: row.id,
            user_id: row.user_id,
            status,
            placed_at: row.placed_at,
        })
    }
}

impl PgOrderStore {
    pub fn new(pool: Pool<Postgres>, table: &str) -> Result<Self, AssistantError> {
        check_input(table)?;
        Ok(PgOrderStore {
            pool,
            table: table.to_string(),
        })
    }
}

pub fn orders_by_user_query(table: &str) -> String {
    format!(
        "
        SELECT id::text AS id, user_id::text AS user_id, status::text AS status,
            placed_at::timestamptz AS placed_at
        FROM {table}
        WHERE lower(user_id::text) = $1
        ORDER BY placed_at DESC
        "
    )
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn find_orders_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<OrderSummary>, AssistantError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&orders_by_user_query(&self.table))
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(OrderSummary::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_orders_query_sorted_desc() {
        let q = orders_by_user_query("orders");
        assert!(q.contains("FROM orders"));
        assert!(q.contains("ORDER BY placed_at DESC"));
        // ids are bound lowercased, so the column is folded too
        assert!(q.contains("WHERE lower(user_id::text) = $1"));
    }

    #[test]
    fn test_row_conversion() {
        let row = OrderRow {
            id: "o1".to_string(),
            user_id: "64b7f0c2a1e4d3b2c1a09f8e".to_string(),
            status: "Shipped".to_string(),
            placed_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let summary = OrderSummary::try_from(row).unwrap();
        assert_eq!(summary.status, OrderStatus::Shipped);
    }

    #[test]
    fn test_row_conversion_unknown_status() {
        let row = OrderRow {
            id: "o2".to_string(),
            user_id: "64b7f0c2a1e4d3b2c1a09f8e".to_string(),
            status: "Lost".to_string(),
            placed_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        assert!(OrderSummary::try_from(row).is_err());
    }
}
