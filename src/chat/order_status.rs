use handlebars::Handlebars;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::AssistantError;
use crate::orders::{sort_most_recent_first, OrderStore};
use crate::service::with_timeout;
use crate::types::UserId;

/// Replaced with the storefront base url before a reply leaves the service.
pub const FRONTEND_URL_PLACEHOLDER: &str = "FRONTEND_URL";

pub const LOGIN_PROMPT: &str = "Please log in to check the status of your orders.";
pub const NO_ORDERS: &str = "You have no orders yet.";

const SINGLE_ORDER_TEMPLATE: &str = "You have 1 order. Its current status is <b>{{status}}</b>. <a href=\"{{frontend_url}}/orders/{{order_id}}\">View your order</a>";
const MULTIPLE_ORDERS_TEMPLATE: &str = "You have {{count}} orders. Your most recent order is <b>{{status}}</b>. <a href=\"{{frontend_url}}/orders\">View all your orders</a>";

pub struct OrderStatusResponder {
    store: Arc<dyn OrderStore>,
    timeout: Duration,
    handlebars: Handlebars<'static>,
}

impl OrderStatusResponder {
    pub fn new(store: Arc<dyn OrderStore>, timeout: Duration) -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        OrderStatusResponder {
            store,
            timeout,
            handlebars,
        }
    }

    /// Summarizes the caller's orders, or asks them to log in when the id is
    /// missing or malformed. Store failures are returned, not papered over.
    pub async fn respond(&self, user_id: Option<&str>) -> Result<String, AssistantError> {
        let user = match user_id.and_then(UserId::parse) {
            Some(u) => u,
            None => {
                log::debug!("order status requested without a valid user id");
                return Ok(LOGIN_PROMPT.to_string());
            }
        };

        let mut orders = with_timeout(
            "order lookup",
            self.timeout,
            self.store.find_orders_by_user(&user),
        )
        .await?;
        // do not rely on the store having sorted
        sort_most_recent_first(&mut orders);
        log::debug!("found {} orders for user {}", orders.len(), user);

        let reply = match orders.as_slice() {
            [] => NO_ORDERS.to_string(),
            [only] => self.handlebars.render_template(
                SINGLE_ORDER_TEMPLATE,
                &serde_json::json!({
                    "status": only.status.to_string(),
                    "order_id": only.id,
                    "frontend_url": FRONTEND_URL_PLACEHOLDER,
                }),
            )?,
            [latest, ..] => self.handlebars.render_template(
                MULTIPLE_ORDERS_TEMPLATE,
                &serde_json::json!({
                    "count": orders.len(),
                    "status": latest.status.to_string(),
                    "frontend_url": FRONTEND_URL_PLACEHOLDER,
                }),
            )?,
        };
        Ok(reply)
    }
}
