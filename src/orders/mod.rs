pub mod pg;

use async_trait::async_trait;
use std::sync::RwLock;

use crate::errors::AssistantError;
use crate::types::{OrderSummary, UserId};

pub use pg::PgOrderStore;

/// Read-only view of the order collection.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// All orders owned by `user_id`, newest `placed_at` first.
    async fn find_orders_by_user(&self, user_id: &UserId)
        -> Result<Vec<OrderSummary>, AssistantError>;
}

/// Sorts newest first; ties keep their incoming order.
pub fn sort_most_recent_first(orders: &mut [OrderSummary]) {
    orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<Vec<OrderSummary>>,
}

impl InMemoryOrderStore {
    pub fn new(orders: Vec<OrderSummary>) -> Self {
        InMemoryOrderStore {
            orders: RwLock::new(orders),
        }
    }

    pub fn insert(&self, order: OrderSummary) -> Result<(), AssistantError> {
        self.orders
            .write()
            .map_err(|_| anyhow::anyhow!("order store lock poisoned"))?
            .push(order);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_orders_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<OrderSummary>, AssistantError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| anyhow::anyhow!("order store lock poisoned"))?;
        let mut found: Vec<OrderSummary> = orders
            .iter()
            .filter(|o| o.user_id.eq_ignore_ascii_case(user_id.as_str()))
            .cloned()
            .collect();
        sort_most_recent_first(&mut found);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderStatus;
    use chrono::{TimeZone, Utc};

    const USER: &str = "64b7f0c2a1e4d3b2c1a09f8e";
    const OTHER: &str = "64b7f0c2a1e4d3b2c1a09f8f";

    fn order(id: &str, user: &str, status: OrderStatus, day: u32) -> OrderSummary {
        OrderSummary {
            id: id.to_string(),
            user_id: user.to_string(),
            status,
            placed_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_filters_by_user_and_sorts_desc() {
        let store = InMemoryOrderStore::new(vec![
            order("a", USER, OrderStatus::Shipped, 1),
            order("b", OTHER, OrderStatus::Pending, 9),
            order("c", USER, OrderStatus::Pending, 5),
            order("d", USER, OrderStatus::Cancelled, 3),
        ]);
        let found = store
            .find_orders_by_user(&UserId::parse(USER).unwrap())
            .await
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d", "a"]);
    }

    #[tokio::test]
    async fn test_insert_then_find() {
        let store = InMemoryOrderStore::default();
        let user = UserId::parse(USER).unwrap();
        assert!(store.find_orders_by_user(&user).await.unwrap().is_empty());
        store.insert(order("x", USER, OrderStatus::Shipped, 2)).unwrap();
        assert_eq!(store.find_orders_by_user(&user).await.unwrap().len(), 1);
    }
}
