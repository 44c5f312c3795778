pub mod client;
pub mod dto;
pub mod store;

pub use client::{
    provisional_totals, AddItemOutcome, CartClient, CreateCartOutcome, NewCartItem, PendingAdd,
    PendingCreate,
};
pub use store::{CartState, CartStore};
