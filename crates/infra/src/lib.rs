//! Infrastructure layer: SQLite store handle, repositories, configuration.

pub mod config;
pub mod db;
pub mod error;
pub mod repository;

pub use config::{ConfigError, DatabaseConfig};
pub use db::Database;
pub use error::{PersistenceCause, RepositoryError};
pub use repository::{CustomerRepository, OrderRepository, ProductRepository, Repository};
