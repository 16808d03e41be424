//! SQLite-backed repositories.
//!
//! Each repository maps between domain types and explicit row structs; no
//! domain type knows about its table layout.

pub mod customer;
pub mod order;
pub mod product;

pub use customer::CustomerRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;

use checkout_core::Entity;

use crate::error::RepositoryError;

/// Persistence boundary for an entity or aggregate root.
///
/// Every call is an independent unit of work. `update` replaces the stored
/// state of the entity with the given value as a whole.
#[async_trait::async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Insert a new entity. Fails with a persistence error when the id is
    /// already taken or a referenced row is missing.
    async fn create(&self, entity: &T) -> Result<(), RepositoryError>;

    /// Replace the stored state of an existing entity.
    async fn update(&self, entity: &T) -> Result<(), RepositoryError>;

    /// Load one entity by id.
    async fn find(&self, id: &T::Id) -> Result<T, RepositoryError>;

    /// Load every stored entity.
    async fn find_all(&self) -> Result<Vec<T>, RepositoryError>;
}
