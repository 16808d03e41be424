//! Products domain module.
//!
//! Catalog products with a name and a unit price. Order items snapshot these
//! values when they are created (no IO, no storage).

pub mod product;

pub use product::Product;
