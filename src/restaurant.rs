use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cart::dto::OrderType;
use crate::error::ApiError;
use crate::http::{unwrap_envelope, Api};

/// Restaurant profile fields the ordering flow needs. Charges and the
/// minimum order amount feed the cart view; everything else stays on the
/// server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub minimum_order_amount: Decimal,
    #[serde(default)]
    pub delivery_charge: Decimal,
    #[serde(default)]
    pub packaging_charge: Decimal,
    #[serde(default)]
    pub payment_acceptance_type: Option<OrderType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Read-only client for restaurant profiles and menus.
#[derive(Clone)]
pub struct RestaurantClient {
    api: Arc<dyn Api>,
}

impl RestaurantClient {
    pub fn new(api: Arc<dyn Api>) -> Self {
        Self { api }
    }

    pub async fn fetch_restaurant(&self, restaurant_id: i64) -> Result<Restaurant, ApiError> {
        let value = self.api.get(&format!("restaurants/{restaurant_id}")).await?;
        unwrap_envelope(value)
    }

    /// Menu items for a restaurant. The endpoint has been seen returning a
    /// bare array as well as an `{ "items": [...] }` object; both decode.
    pub async fn fetch_items(&self, restaurant_id: i64) -> Result<Vec<MenuItem>, ApiError> {
        let value = self
            .api
            .get(&format!("restaurants/{restaurant_id}/items"))
            .await?;
        let value: Value = match value {
            Value::Object(mut map) => match map.remove("data") {
                Some(inner) => inner,
                None => Value::Object(map),
            },
            other => other,
        };
        let items = match value {
            Value::Array(_) => serde_json::from_value(value)?,
            Value::Object(mut map) => match map.remove("items") {
                Some(items) => serde_json::from_value(items)?,
                None => return Err(ApiError::Api("malformed menu items response".into())),
            },
            _ => return Err(ApiError::Api("malformed menu items response".into())),
        };
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Harness;
    use serde_json::json;

    #[tokio::test]
    async fn fetch_restaurant_defaults_missing_charges() {
        let harness = Harness::new();
        harness.api.stub(
            "restaurants/10",
            Ok(json!({ "id": 10, "name": "Udupi Grand", "minimum_order_amount": 100.0 })),
        );
        let client = RestaurantClient::new(harness.api.clone());

        let restaurant = client.fetch_restaurant(10).await.unwrap();
        assert_eq!(restaurant.minimum_order_amount, Decimal::from(100));
        assert_eq!(restaurant.delivery_charge, Decimal::ZERO);
        assert_eq!(restaurant.payment_acceptance_type, None);
    }

    #[tokio::test]
    async fn fetch_items_accepts_both_shapes() {
        let harness = Harness::new();
        harness.api.stub(
            "restaurants/10/items",
            Ok(json!({ "items": [{ "id": 5, "name": "Masala Dosa", "price": 150.0 }] })),
        );
        harness.api.stub(
            "restaurants/10/items",
            Ok(json!([{ "id": 5, "name": "Masala Dosa", "price": 150.0 }])),
        );
        let client = RestaurantClient::new(harness.api.clone());

        let wrapped = client.fetch_items(10).await.unwrap();
        let bare = client.fetch_items(10).await.unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(wrapped[0].name, "Masala Dosa");
        assert!(wrapped[0].is_active);
    }
}
