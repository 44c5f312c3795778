//! Shared fakes and fixtures for the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::cart::{CartClient, CartStore};
use crate::error::{ApiError, ConflictCartInfo};
use crate::group::dto::GroupSnapshot;
use crate::group::{GroupClient, GroupStore};
use crate::http::Api;
use crate::orders::OrdersClient;
use crate::session::SessionProvider;
use crate::storage::MemoryStore;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

/// Scripted stand-in for the HTTP transport. Responses are queued per path
/// and consumed in order; any call without a queued response fails loudly.
#[derive(Default)]
pub struct FakeApi {
    responses: Mutex<HashMap<String, VecDeque<Result<Value, ApiError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stub(&self, path: &str, response: Result<Value, ApiError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.path == path)
            .count()
    }

    fn respond(&self, method: &'static str, path: &str, body: Value) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(ApiError::Api(format!("unexpected {method} {path}"))))
    }
}

#[async_trait]
impl Api for FakeApi {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.respond("GET", path, Value::Null)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.respond("POST", path, body)
    }

    async fn delete(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.respond("DELETE", path, body)
    }
}

/// Cart-mutation response with a single line item, or an empty cart when
/// `quantity` is zero.
pub fn cart_response(restaurant_id: i64, quantity: u32, subtotal: f64, total: f64, min: f64) -> Value {
    let items = if quantity == 0 {
        json!([])
    } else {
        json!([{ "id": 100, "item_id": 5, "quantity": quantity, "price": subtotal }])
    };
    json!({
        "cart": { "id": 1, "restaurant_id": restaurant_id, "items": items },
        "totals": { "subtotal": subtotal, "total": total },
        "minOrderAmount": min,
        "isLoggedIn": false
    })
}

pub fn conflict_error(cart_ids: &[i64]) -> ApiError {
    ApiError::ConflictCart(
        cart_ids
            .iter()
            .map(|&id| ConflictCartInfo {
                id,
                restaurant: Some("Udupi Grand".into()),
                restaurant_id: Some(10),
                total: None,
            })
            .collect(),
    )
}

pub fn snapshot(id: i64, restaurant_id: i64, table_id: Option<&str>) -> GroupSnapshot {
    serde_json::from_value(json!({
        "id": id,
        "restaurant_id": restaurant_id,
        "table_id": table_id,
        "group_status": "active"
    }))
    .unwrap()
}

pub fn enveloped_snapshot(id: i64, restaurant_id: i64, table_id: Option<&str>) -> Value {
    json!({
        "success": true,
        "data": serde_json::to_value(snapshot(id, restaurant_id, table_id)).unwrap()
    })
}

/// One fake transport plus the stores and session every client shares,
/// mirroring how `TablesideClient` wires the real thing.
pub struct Harness {
    pub api: Arc<FakeApi>,
    pub kv: Arc<MemoryStore>,
    pub session: Arc<SessionProvider>,
    pub carts: Arc<CartStore>,
    pub groups: Arc<GroupStore>,
}

impl Harness {
    pub fn new() -> Self {
        let api = Arc::new(FakeApi::new());
        let kv = Arc::new(MemoryStore::new());
        let session = Arc::new(SessionProvider::new(kv.clone()));
        Self {
            api,
            kv,
            session,
            carts: Arc::new(CartStore::new()),
            groups: Arc::new(GroupStore::new()),
        }
    }

    pub fn cart_client(&self) -> CartClient {
        CartClient::new(
            self.api.clone(),
            self.carts.clone(),
            self.groups.clone(),
            self.session.clone(),
            self.kv.clone(),
        )
    }

    pub fn group_client(&self) -> GroupClient {
        self.group_client_with_interval(Duration::from_millis(10))
    }

    pub fn group_client_with_interval(&self, poll_interval: Duration) -> GroupClient {
        GroupClient::new(
            self.api.clone(),
            self.groups.clone(),
            self.session.clone(),
            poll_interval,
        )
    }

    pub fn orders_client(&self) -> OrdersClient {
        OrdersClient::new(
            self.api.clone(),
            self.session.clone(),
            self.carts.clone(),
            self.groups.clone(),
        )
    }

    /// Puts the harness into a group without going through the transport.
    pub async fn join_group(&self, group_id: i64, restaurant_id: i64) {
        let seq = self.groups.begin();
        self.groups
            .join_order_group(seq, snapshot(group_id, restaurant_id, Some("4B")));
    }
}
