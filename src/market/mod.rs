//! Item catalog and shopping carts.

mod catalog;
mod service;

pub use catalog::{find_item, items, Item};
pub use service::{CartError, CartItem, MarketService};
