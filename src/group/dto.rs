use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::cart::dto::Cart;
use crate::orders::{OrderStatus, PaymentStatus};

/// Where a shared order is being served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    #[default]
    Table,
    Pickup,
    Delivery,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    #[default]
    Active,
    PendingPayment,
    Closed,
    #[serde(other)]
    Unknown,
}

impl GroupStatus {
    /// Closed groups accept no further additions.
    pub fn is_closed(&self) -> bool {
        matches!(self, GroupStatus::Closed)
    }
}

/// One line of a member's already-placed order inside a group snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOrderItem {
    #[serde(default)]
    pub item_name: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// A member order as it appears inside a group snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOrder {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub order_status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub items: Vec<GroupOrderItem>,
}

/// Server snapshot of a shared table/pickup/delivery order. Always replaced
/// whole in the store; the client never patches individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub id: i64,
    pub restaurant_id: i64,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub location_type: LocationType,
    #[serde(default)]
    pub location_details: Option<Value>,
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub group_status: GroupStatus,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub participant_count: Option<u32>,
    #[serde(default)]
    pub orders: Vec<GroupOrder>,
    #[serde(default)]
    pub pending_carts: Vec<Cart>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub server_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub group_expected_ready_time: Option<OffsetDateTime>,
}

/// `POST /order-groups/create`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateGroupRequest {
    pub restaurant_id: i64,
    pub location_type: LocationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_details: Option<Value>,
}

/// `POST /order-groups/auto-join-or-create`.
#[derive(Debug, Clone, Serialize)]
pub struct AutoJoinRequest {
    pub restaurant_id: i64,
    pub table_id: String,
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_decodes_with_minimal_fields() {
        let snapshot: GroupSnapshot =
            serde_json::from_value(json!({ "id": 12, "restaurant_id": 10 })).unwrap();
        assert_eq!(snapshot.id, 12);
        assert_eq!(snapshot.location_type, LocationType::Table);
        assert_eq!(snapshot.group_status, GroupStatus::Active);
        assert!(snapshot.orders.is_empty());
    }

    #[test]
    fn unknown_group_status_does_not_fail_decoding() {
        let snapshot: GroupSnapshot = serde_json::from_value(json!({
            "id": 12,
            "restaurant_id": 10,
            "group_status": "finalized"
        }))
        .unwrap();
        assert_eq!(snapshot.group_status, GroupStatus::Unknown);
    }

    #[test]
    fn location_type_wire_names() {
        assert_eq!(
            serde_json::to_value(LocationType::Delivery).unwrap(),
            json!("DELIVERY")
        );
        let parsed: LocationType = serde_json::from_value(json!("PICKUP")).unwrap();
        assert_eq!(parsed, LocationType::Pickup);
    }
}
