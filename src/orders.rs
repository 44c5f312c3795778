use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use tracing::info;

use crate::cart::CartStore;
use crate::error::ApiError;
use crate::group::GroupStore;
use crate::http::{unwrap_envelope, Api};
use crate::session::SessionProvider;

/// Kitchen-side lifecycle of an order. Independent of payment status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    PendingPayment,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub item_id: i64,
    #[serde(default)]
    pub variation_id: Option<i64>,
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default)]
    pub add_ons_total: Decimal,
}

/// Immutable once created; only explicit status-changing calls touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub restaurant_id: Option<i64>,
    #[serde(default)]
    pub order_group_id: Option<i64>,
    #[serde(default)]
    pub order_status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Client for order creation and the few explicit status-changing calls.
pub struct OrdersClient {
    api: Arc<dyn Api>,
    session: Arc<SessionProvider>,
    carts: Arc<CartStore>,
    groups: Arc<GroupStore>,
}

impl OrdersClient {
    pub fn new(
        api: Arc<dyn Api>,
        session: Arc<SessionProvider>,
        carts: Arc<CartStore>,
        groups: Arc<GroupStore>,
    ) -> Self {
        Self {
            api,
            session,
            carts,
            groups,
        }
    }

    /// Turns the active cart into an order. Checks the empty-cart and
    /// minimum-order preconditions locally, then clears the cart store on
    /// success — the cart is finalized and gone from this client's view.
    pub async fn create_order(&self) -> Result<i64, ApiError> {
        let state = self.carts.snapshot();
        let has_items = state
            .cart
            .as_ref()
            .map(|cart| !cart.items.is_empty())
            .unwrap_or(false);
        if !has_items {
            return Err(ApiError::Api("cart is empty".into()));
        }
        if state.totals.total < state.min_order_amount {
            return Err(ApiError::Api(format!(
                "minimum order amount is {}",
                state.min_order_amount
            )));
        }

        #[derive(Serialize)]
        struct CreateOrderRequest {
            session_id: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            order_group_id: Option<i64>,
        }
        #[derive(Deserialize)]
        struct CreateOrderResponse {
            #[serde(rename = "orderId")]
            order_id: i64,
        }

        let request = CreateOrderRequest {
            session_id: self.session.session_id().await,
            order_group_id: self.groups.current().map(|group| group.id),
        };
        let value = self
            .api
            .post("orders/create", serde_json::to_value(&request)?)
            .await?;
        let response: CreateOrderResponse = unwrap_envelope(value)?;

        self.carts.clear();
        info!(order_id = response.order_id, "order created");
        Ok(response.order_id)
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Order, ApiError> {
        let value = self.api.get(&format!("orders/{order_id}")).await?;
        unwrap_envelope(value)
    }

    /// Reports a completed UPI payment for server-side verification.
    pub async fn confirm_payment(&self, order_id: i64) -> Result<(), ApiError> {
        self.api
            .post(&format!("orders/{order_id}/confirm-payment"), json!({}))
            .await?;
        Ok(())
    }

    /// Pickup orders: tells the kitchen when the diner expects to arrive.
    pub async fn notify_pickup_ready(
        &self,
        order_id: i64,
        eta_minutes: u32,
    ) -> Result<(), ApiError> {
        self.api
            .post(
                &format!("orders/{order_id}/pickup-ready"),
                json!({ "eta_minutes": eta_minutes }),
            )
            .await?;
        Ok(())
    }
}
