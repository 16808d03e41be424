//! Customer domain module.
//!
//! Customers are referenced by orders through their identifier only; this
//! crate owns their attributes and lifecycle rules (no IO, no storage).

pub mod address;
pub mod customer;

pub use address::Address;
pub use customer::Customer;
