use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, warn};

use crate::cart::dto::{
    AddItemRequest, AddonSelection, CartEnvelope, CartItem, CartItemsRequest, CartItemsResponse,
    CartRequest, CartTotals, CouponRequest, InstructionsRequest, OrderType, RemoveItemRequest,
};
use crate::cart::store::{CartState, CartStore};
use crate::conflict::{ConflictDecision, RetryPolicy};
use crate::error::{ApiError, ConflictCartInfo};
use crate::group::GroupStore;
use crate::http::Api;
use crate::restaurant::RestaurantClient;
use crate::session::SessionProvider;
use crate::state::{LivenessToken, Seq};
use crate::storage::{keys, KvStore};

/// Item details for an add-to-cart action; session, restaurant and group
/// context are filled in by the client.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub item_id: i64,
    pub variation_id: Option<i64>,
    pub addon_items: Vec<AddonSelection>,
    pub quantity: u32,
}

impl NewCartItem {
    pub fn new(item_id: i64, quantity: u32) -> Self {
        Self {
            item_id,
            variation_id: None,
            addon_items: Vec::new(),
            quantity,
        }
    }
}

/// A `cart_conflict` waiting on the user. Holds the exact request that
/// failed so the retry re-issues it unchanged.
#[derive(Debug)]
pub struct PendingAdd {
    request: AddItemRequest,
    pub carts: Vec<ConflictCartInfo>,
}

/// An `active_cart_exists` waiting on a confirm/cancel decision. Confirming
/// re-issues the create with `force: true`; no carts are deleted.
#[derive(Debug)]
pub struct PendingCreate {
    request: CartRequest,
    pub existing: ConflictCartInfo,
}

#[derive(Debug)]
pub enum AddItemOutcome {
    Committed(CartState),
    Conflict(PendingAdd),
}

#[derive(Debug)]
pub enum CreateCartOutcome {
    Committed(CartState),
    Conflict(PendingCreate),
}

/// Synchronization client for the cart endpoints. Every mutation sends full
/// context and commits the server's response wholesale through the store;
/// nothing is applied optimistically.
pub struct CartClient {
    api: Arc<dyn Api>,
    store: Arc<CartStore>,
    groups: Arc<GroupStore>,
    session: Arc<SessionProvider>,
    kv: Arc<dyn KvStore>,
    restaurants: RestaurantClient,
    retry: RetryPolicy,
}

impl CartClient {
    pub fn new(
        api: Arc<dyn Api>,
        store: Arc<CartStore>,
        groups: Arc<GroupStore>,
        session: Arc<SessionProvider>,
        kv: Arc<dyn KvStore>,
    ) -> Self {
        Self {
            restaurants: RestaurantClient::new(Arc::clone(&api)),
            api,
            store,
            groups,
            session,
            kv,
            retry: RetryPolicy::once(),
        }
    }

    fn group_id(&self) -> Option<i64> {
        self.groups.current().map(|group| group.id)
    }

    /// Fetch-or-create the cart for this session and commit the response.
    pub async fn fetch_cart(
        &self,
        restaurant_id: Option<i64>,
        order_type: Option<OrderType>,
    ) -> Result<CartState, ApiError> {
        let request = CartRequest {
            session_id: self.session.session_id().await,
            restaurant_id,
            order_type,
            order_group_id: self.group_id(),
            force: None,
        };
        let seq = self.store.begin();
        self.send_cart(&request, seq).await
    }

    /// Full cart view for a restaurant page: cart, its line items, and the
    /// restaurant's minimum order amount, merged and committed as one
    /// state. Responses are only committed while `live` is alive.
    pub async fn fetch_active_cart(
        &self,
        restaurant_id: i64,
        live: &LivenessToken,
    ) -> Result<CartState, ApiError> {
        let session_id = self.session.session_id().await;
        let order_group_id = self.group_id();
        let seq = self.store.begin();

        let request = CartRequest {
            session_id: session_id.clone(),
            restaurant_id: Some(restaurant_id),
            order_type: None,
            order_group_id,
            force: None,
        };
        let value = self.api.post("cart", serde_json::to_value(&request)?).await?;
        let envelope: CartEnvelope = serde_json::from_value(value)?;

        let Some(mut cart) = envelope.cart else {
            return Ok(self.commit_if_live(
                seq,
                live,
                None,
                envelope.totals,
                envelope.min_order_amount,
            ));
        };

        let items_request = CartItemsRequest {
            session_id,
            restaurant_id,
            order_group_id,
        };
        let items: CartItemsResponse = serde_json::from_value(
            self.api
                .post("cart/items", serde_json::to_value(&items_request)?)
                .await?,
        )?;
        cart.items = items.cart_items;

        let totals = if envelope.totals.total.is_zero() && !cart.items.is_empty() {
            provisional_totals(&cart.items, &envelope.totals)
        } else {
            envelope.totals
        };

        let mut min_order_amount = envelope.min_order_amount;
        match self.restaurants.fetch_restaurant(restaurant_id).await {
            Ok(restaurant) if min_order_amount.is_zero() => {
                min_order_amount = restaurant.minimum_order_amount;
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, restaurant_id, "restaurant fetch failed during cart merge"),
        }

        Ok(self.commit_if_live(seq, live, Some(cart), totals, min_order_amount))
    }

    /// Explicit cart creation, surfacing `active_cart_exists` as a pending
    /// confirm/cancel decision.
    pub async fn create_or_switch_cart(
        &self,
        restaurant_id: i64,
        order_type: Option<OrderType>,
    ) -> Result<CreateCartOutcome, ApiError> {
        let request = CartRequest {
            session_id: self.session.session_id().await,
            restaurant_id: Some(restaurant_id),
            order_type,
            order_group_id: self.group_id(),
            force: None,
        };
        let seq = self.store.begin();
        match self.send_cart(&request, seq).await {
            Ok(state) => Ok(CreateCartOutcome::Committed(state)),
            Err(ApiError::ConflictActiveCart(existing)) => Ok(CreateCartOutcome::Conflict(
                PendingCreate {
                    request,
                    existing: *existing,
                },
            )),
            Err(e) => Err(e),
        }
    }

    /// The "proceed" half of the `active_cart_exists` dialog: re-issue the
    /// original create with the force flag set.
    pub async fn confirm_switch(&self, pending: PendingCreate) -> Result<CartState, ApiError> {
        let mut request = pending.request;
        request.force = Some(true);
        let seq = self.store.begin();
        self.send_cart(&request, seq).await
    }

    /// Adds an item. A `cart_conflict` is returned as a pending decision,
    /// not an error: the store is untouched until the user resolves it.
    pub async fn add_item(
        &self,
        restaurant_id: i64,
        order_type: Option<OrderType>,
        item: NewCartItem,
    ) -> Result<AddItemOutcome, ApiError> {
        let request = AddItemRequest {
            session_id: self.session.session_id().await,
            restaurant_id,
            item_id: item.item_id,
            variation_id: item.variation_id,
            addon_items: item.addon_items,
            quantity: item.quantity,
            order_type,
            order_group_id: self.group_id(),
        };
        let seq = self.store.begin();
        match self.send_add(&request, seq).await {
            Ok(state) => Ok(AddItemOutcome::Committed(state)),
            Err(ApiError::ConflictCart(carts)) => {
                Ok(AddItemOutcome::Conflict(PendingAdd { request, carts }))
            }
            Err(e) => Err(e),
        }
    }

    /// Resolves a pending `cart_conflict`. Keeping the existing cart does
    /// nothing; delete-and-retry deletes each conflicting cart once, then
    /// re-issues the original add-item exactly as many times as the retry
    /// policy allows (once by default). A conflict surviving that budget is
    /// reported as a generic failure, never looped on.
    pub async fn resolve_cart_conflict(
        &self,
        pending: PendingAdd,
        decision: ConflictDecision,
    ) -> Result<Option<CartState>, ApiError> {
        match decision {
            ConflictDecision::KeepExisting => Ok(None),
            ConflictDecision::DeleteAndRetry => {
                for cart in &pending.carts {
                    self.api
                        .delete(
                            &format!("cart/{}", cart.id),
                            json!({ "session_id": pending.request.session_id }),
                        )
                        .await?;
                }
                let seq = self.store.begin();
                let mut retry = 1u32; // the original add was attempt zero
                loop {
                    if !self.retry.allows(retry) {
                        return Err(ApiError::Api("cart conflict persisted after retry".into()));
                    }
                    match self.send_add(&pending.request, seq).await {
                        Ok(state) => return Ok(Some(state)),
                        Err(ApiError::ConflictCart(_)) => retry += 1,
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }

    pub async fn remove_item(
        &self,
        restaurant_id: i64,
        cart_item_id: i64,
    ) -> Result<CartState, ApiError> {
        let request = RemoveItemRequest {
            session_id: self.session.session_id().await,
            restaurant_id,
            cart_item_id,
            order_group_id: self.group_id(),
        };
        let seq = self.store.begin();
        let value = self
            .api
            .post("cart/remove-item", serde_json::to_value(&request)?)
            .await?;
        self.commit_envelope(seq, serde_json::from_value(value)?)
    }

    pub async fn apply_coupon(
        &self,
        restaurant_id: Option<i64>,
        coupon_code: &str,
    ) -> Result<CartState, ApiError> {
        let request = CouponRequest {
            session_id: self.session.session_id().await,
            restaurant_id,
            coupon_code: coupon_code.to_string(),
            order_group_id: self.group_id(),
        };
        let seq = self.store.begin();
        let value = self
            .api
            .post("cart/apply-coupon", serde_json::to_value(&request)?)
            .await?;
        let state = self.commit_envelope(seq, serde_json::from_value(value)?)?;
        if let Err(e) = self.kv.set(keys::SELECTED_COUPON, coupon_code).await {
            warn!(error = %e, "failed to persist applied coupon");
        }
        Ok(state)
    }

    pub async fn remove_coupon(
        &self,
        restaurant_id: Option<i64>,
        coupon_code: &str,
    ) -> Result<CartState, ApiError> {
        let request = CouponRequest {
            session_id: self.session.session_id().await,
            restaurant_id,
            coupon_code: coupon_code.to_string(),
            order_group_id: self.group_id(),
        };
        let seq = self.store.begin();
        let value = self
            .api
            .post("cart/remove-coupon", serde_json::to_value(&request)?)
            .await?;
        let state = self.commit_envelope(seq, serde_json::from_value(value)?)?;
        if let Err(e) = self.kv.remove(keys::SELECTED_COUPON).await {
            warn!(error = %e, "failed to clear persisted coupon");
        }
        Ok(state)
    }

    /// Last coupon code applied on this device, if any.
    pub async fn applied_coupon(&self) -> Option<String> {
        self.kv.get(keys::SELECTED_COUPON).await.ok().flatten()
    }

    /// Attaches cooking instructions to the cart. The response is an ack,
    /// not a cart replacement.
    pub async fn set_instructions(
        &self,
        restaurant_id: i64,
        instructions: &str,
    ) -> Result<(), ApiError> {
        let request = InstructionsRequest {
            session_id: self.session.session_id().await,
            restaurant_id,
            cooking_instructions: instructions.to_string(),
            order_group_id: self.group_id(),
        };
        self.api
            .post("cart/set-instructions", serde_json::to_value(&request)?)
            .await?;
        Ok(())
    }

    /// Order type lives on the cart, so changing it re-creates the cart
    /// with the force flag set.
    pub async fn change_order_type(
        &self,
        restaurant_id: i64,
        order_type: OrderType,
    ) -> Result<CartState, ApiError> {
        let request = CartRequest {
            session_id: self.session.session_id().await,
            restaurant_id: Some(restaurant_id),
            order_type: Some(order_type),
            order_group_id: self.group_id(),
            force: Some(true),
        };
        let seq = self.store.begin();
        self.send_cart(&request, seq).await
    }

    pub async fn delete_cart(&self, cart_id: i64) -> Result<(), ApiError> {
        let session_id = self.session.session_id().await;
        self.api
            .delete(&format!("cart/{cart_id}"), json!({ "session_id": session_id }))
            .await?;
        Ok(())
    }

    async fn send_cart(&self, request: &CartRequest, seq: Seq) -> Result<CartState, ApiError> {
        let value = self.api.post("cart", serde_json::to_value(request)?).await?;
        self.commit_envelope(seq, serde_json::from_value(value)?)
    }

    async fn send_add(&self, request: &AddItemRequest, seq: Seq) -> Result<CartState, ApiError> {
        let value = self
            .api
            .post("cart/add-item", serde_json::to_value(request)?)
            .await?;
        self.commit_envelope(seq, serde_json::from_value(value)?)
    }

    fn commit_envelope(&self, seq: Seq, envelope: CartEnvelope) -> Result<CartState, ApiError> {
        Ok(self.commit_state(
            seq,
            envelope.cart,
            envelope.totals,
            envelope.min_order_amount,
        ))
    }

    fn commit_state(
        &self,
        seq: Seq,
        cart: Option<crate::cart::dto::Cart>,
        totals: CartTotals,
        min_order_amount: Decimal,
    ) -> CartState {
        let state = CartState {
            cart,
            totals,
            min_order_amount,
        };
        if !self
            .store
            .update_cart(seq, state.cart.clone(), state.totals.clone(), state.min_order_amount)
        {
            debug!("dropping stale cart response");
        }
        state
    }

    fn commit_if_live(
        &self,
        seq: Seq,
        live: &LivenessToken,
        cart: Option<crate::cart::dto::Cart>,
        totals: CartTotals,
        min_order_amount: Decimal,
    ) -> CartState {
        if live.is_live() {
            self.commit_state(seq, cart, totals, min_order_amount)
        } else {
            debug!("view gone; cart response not committed");
            CartState {
                cart,
                totals,
                min_order_amount,
            }
        }
    }
}

/// Display-only fallback when the server response carries items but no
/// totals breakdown: line prices summed, plus whatever charges the server
/// did send. Never a substitute for the authoritative totals — any later
/// server response replaces it wholesale.
pub fn provisional_totals(items: &[CartItem], server: &CartTotals) -> CartTotals {
    let subtotal: Decimal = items.iter().map(|item| item.price).sum();
    let total = subtotal + server.delivery_charge + server.packaging_charge;
    CartTotals {
        subtotal,
        delivery_charge: server.delivery_charge,
        packaging_charge: server.packaging_charge,
        total,
        ..Default::default()
    }
}
