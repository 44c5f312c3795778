//! Client SDK for a QR-code restaurant ordering API.
//!
//! Implements the client half of the shared-cart / group-order workflow:
//! a stable anonymous session identity, wholesale-replace state stores for
//! the active cart and the current order group, synchronization clients for
//! the cart/group/order endpoints, and the structured conflict flows
//! (`cart_conflict`, `active_cart_exists`, `active_ordergroup_exists`).
//!
//! The server is authoritative for every entity; the stores here are caches
//! that are replaced whole from each successful response, never merged
//! field by field. Stale responses are detected with per-store sequence
//! numbers and dropped.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;

pub mod cart;
pub mod config;
pub mod conflict;
pub mod error;
pub mod group;
pub mod http;
pub mod orders;
pub mod restaurant;
pub mod session;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod testutil;

pub use crate::cart::{AddItemOutcome, CartClient, CartState, CartStore, CreateCartOutcome};
pub use crate::config::ClientConfig;
pub use crate::conflict::{ConflictDecision, RetryPolicy};
pub use crate::error::ApiError;
pub use crate::group::{GroupClient, GroupStore};
pub use crate::http::{Api, HttpApi};
pub use crate::orders::OrdersClient;
pub use crate::restaurant::RestaurantClient;
pub use crate::session::SessionProvider;
pub use crate::state::{Liveness, LivenessToken};

use crate::storage::{FileStore, KvStore};

/// Everything wired together: one transport, one session identity, one cart
/// store and one group store shared by all clients.
pub struct TablesideClient {
    http: Arc<HttpApi>,
    pub session: Arc<SessionProvider>,
    pub cart_store: Arc<CartStore>,
    pub group_store: Arc<GroupStore>,
    pub carts: CartClient,
    pub groups: GroupClient,
    pub orders: OrdersClient,
    pub restaurants: RestaurantClient,
}

impl TablesideClient {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let http = Arc::new(HttpApi::new(config).context("init http transport")?);
        let api: Arc<dyn Api> = http.clone();

        let kv: Arc<dyn KvStore> = Arc::new(FileStore::new(config.storage_path.clone()));
        let session = Arc::new(SessionProvider::new(Arc::clone(&kv)));
        let cart_store = Arc::new(CartStore::new());
        let group_store = Arc::new(GroupStore::new());

        let carts = CartClient::new(
            Arc::clone(&api),
            Arc::clone(&cart_store),
            Arc::clone(&group_store),
            Arc::clone(&session),
            Arc::clone(&kv),
        );
        let groups = GroupClient::new(
            Arc::clone(&api),
            Arc::clone(&group_store),
            Arc::clone(&session),
            config.poll_interval(),
        );
        let orders = OrdersClient::new(
            Arc::clone(&api),
            Arc::clone(&session),
            Arc::clone(&cart_store),
            Arc::clone(&group_store),
        );
        let restaurants = RestaurantClient::new(api);

        Ok(Self {
            http,
            session,
            cart_store,
            group_store,
            carts,
            groups,
            orders,
            restaurants,
        })
    }

    /// Flips to `true` the first time any request comes back 401. The whole
    /// session is invalid at that point, not just the originating call.
    pub fn session_expired(&self) -> watch::Receiver<bool> {
        self.http.session_expired()
    }
}

/// Loads `.env` and installs a `tracing` subscriber, honoring `RUST_LOG`
/// and `LOG_FORMAT=json`. Optional; embedding applications that already
/// have a subscriber can skip this.
pub fn init() {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tableside_client=debug".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .try_init()
            .ok();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .try_init()
            .ok();
    }
}
