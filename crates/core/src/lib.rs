//! Domain building blocks shared by the checkout crates: ids, errors, entity traits.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::AggregateRoot;
pub use entity::Entity;
pub use error::{DomainError, DomainResult, ensure_not_blank};
pub use id::{CustomerId, OrderId, OrderItemId, ProductId};
pub use value_object::ValueObject;
