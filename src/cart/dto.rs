use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the diner pays: up front when placing, or at the end of the visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    PayAndPlace,
    PayAtEnd,
}

/// One addon picked for a cart line, as `{id, quantity}` pairs on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonSelection {
    pub id: i64,
    pub quantity: u32,
}

/// One line in a cart. `price` is the server-resolved line price; the
/// client never recomputes it authoritatively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    #[serde(default)]
    pub cart_id: i64,
    pub item_id: i64,
    #[serde(default)]
    pub variation_id: Option<i64>,
    #[serde(default)]
    pub addon_items: Vec<AddonSelection>,
    pub quantity: u32,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub item_name: Option<String>,
}

/// The order-in-progress for one session at one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub restaurant_id: i64,
    #[serde(default)]
    pub is_finalized: bool,
    #[serde(default)]
    pub order_group_id: Option<i64>,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TotalsBreakdown {
    pub item_total: Decimal,
    pub delivery_charge: Decimal,
    pub packaging_charge: Decimal,
    pub service_charge: Decimal,
    pub tax_amount: Decimal,
}

/// Server-computed totals, displayed verbatim. The invariant
/// `total = subtotal + charges + tax - discount` holds server-side; the
/// client treats the whole object as opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub delivery_charge: Decimal,
    pub packaging_charge: Decimal,
    pub service_charge: Decimal,
    pub tax_amount: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub breakdown: TotalsBreakdown,
}

/// `POST /cart` — fetch-or-create, also used for order-type switches with
/// `force` set.
#[derive(Debug, Clone, Serialize)]
pub struct CartRequest {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

/// `POST /cart/items`.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemsRequest {
    pub session_id: String,
    pub restaurant_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_group_id: Option<i64>,
}

/// `POST /cart/add-item`.
#[derive(Debug, Clone, Serialize)]
pub struct AddItemRequest {
    pub session_id: String,
    pub restaurant_id: i64,
    pub item_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub addon_items: Vec<AddonSelection>,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_group_id: Option<i64>,
}

/// `POST /cart/remove-item`.
#[derive(Debug, Clone, Serialize)]
pub struct RemoveItemRequest {
    pub session_id: String,
    pub restaurant_id: i64,
    pub cart_item_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_group_id: Option<i64>,
}

/// `POST /cart/apply-coupon` and `/cart/remove-coupon`.
#[derive(Debug, Clone, Serialize)]
pub struct CouponRequest {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<i64>,
    pub coupon_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_group_id: Option<i64>,
}

/// `POST /cart/set-instructions`.
#[derive(Debug, Clone, Serialize)]
pub struct InstructionsRequest {
    pub session_id: String,
    pub restaurant_id: i64,
    pub cooking_instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_group_id: Option<i64>,
}

/// Common shape of every cart-mutation response.
#[derive(Debug, Clone, Deserialize)]
pub struct CartEnvelope {
    #[serde(default)]
    pub cart: Option<Cart>,
    #[serde(default)]
    pub totals: CartTotals,
    #[serde(rename = "minOrderAmount", default)]
    pub min_order_amount: Decimal,
    #[serde(rename = "isLoggedIn", default)]
    pub is_logged_in: bool,
}

/// `POST /cart/items` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemsResponse {
    #[serde(rename = "cartItems", default)]
    pub cart_items: Vec<CartItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_decodes_camel_case_totals() {
        let value = json!({
            "cart": { "id": 1, "restaurant_id": 10, "items": [] },
            "totals": {
                "subtotal": 300.0,
                "deliveryCharge": 20.0,
                "taxAmount": 15.0,
                "total": 335.0,
                "breakdown": { "itemTotal": 300.0, "deliveryCharge": 20.0 }
            },
            "minOrderAmount": 100.0,
            "isLoggedIn": false
        });
        let envelope: CartEnvelope = serde_json::from_value(value).unwrap();
        assert_eq!(envelope.totals.subtotal, Decimal::from(300));
        assert_eq!(envelope.totals.delivery_charge, Decimal::from(20));
        assert_eq!(envelope.totals.total, Decimal::from(335));
        assert_eq!(envelope.totals.breakdown.item_total, Decimal::from(300));
        assert_eq!(envelope.min_order_amount, Decimal::from(100));
        assert!(!envelope.is_logged_in);
    }

    #[test]
    fn add_item_request_omits_empty_optionals() {
        let request = AddItemRequest {
            session_id: "s".into(),
            restaurant_id: 10,
            item_id: 5,
            variation_id: None,
            addon_items: vec![],
            quantity: 2,
            order_type: None,
            order_group_id: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("variation_id"));
        assert!(!object.contains_key("addon_items"));
        assert!(!object.contains_key("order_group_id"));
        assert_eq!(object["quantity"], json!(2));
    }

    #[test]
    fn order_type_wire_names() {
        assert_eq!(
            serde_json::to_value(OrderType::PayAndPlace).unwrap(),
            json!("PAY_AND_PLACE")
        );
        assert_eq!(
            serde_json::to_value(OrderType::PayAtEnd).unwrap(),
            json!("PAY_AT_END")
        );
    }
}
