use rust_decimal::Decimal;

use crate::cart::dto::{Cart, CartTotals};
use crate::state::{Seq, StateCell};

/// Snapshot of everything the cart views render from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    pub cart: Option<Cart>,
    pub totals: CartTotals,
    pub min_order_amount: Decimal,
}

/// The single source of truth for the active cart. Mutated only by
/// [`update_cart`](CartStore::update_cart), which replaces all three fields
/// at once — no field from the previous state survives a commit.
#[derive(Debug)]
pub struct CartStore {
    cell: StateCell<CartState>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    pub fn new() -> Self {
        Self {
            cell: StateCell::new(CartState::default()),
        }
    }

    /// Sequence ticket for the next cart mutation.
    pub fn begin(&self) -> Seq {
        self.cell.begin()
    }

    /// Wholesale replacement from a server response. Returns false when the
    /// ticket is stale and the response was dropped.
    pub fn update_cart(
        &self,
        seq: Seq,
        cart: Option<Cart>,
        totals: CartTotals,
        min_order_amount: Decimal,
    ) -> bool {
        self.cell.commit(
            seq,
            CartState {
                cart,
                totals,
                min_order_amount,
            },
        )
    }

    /// Local reset, used after an order is created from the cart or the
    /// cart is deleted.
    pub fn clear(&self) {
        self.cell.replace(CartState::default());
    }

    pub fn snapshot(&self) -> CartState {
        self.cell.get()
    }

    pub fn cart(&self) -> Option<Cart> {
        self.cell.get().cart
    }

    pub fn totals(&self) -> CartTotals {
        self.cell.get().totals
    }

    pub fn min_order_amount(&self) -> Decimal {
        self.cell.get().min_order_amount
    }
}
