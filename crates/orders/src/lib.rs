//! Checkout orders domain module.
//!
//! This crate contains the `Order` aggregate and its `OrderItem` lines,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod order;
pub mod order_item;

pub use order::Order;
pub use order_item::{MAX_AMOUNT, OrderItem};
