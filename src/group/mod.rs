pub mod client;
pub mod dto;
pub mod store;

pub use client::{GroupClient, GroupLocation};
pub use store::GroupStore;
