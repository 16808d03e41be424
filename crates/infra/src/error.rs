//! Repository error model and SQLx error mapping.
//!
//! SQLx errors are mapped to `RepositoryError` as follows:
//!
//! | SQLx Error | `ErrorKind` | RepositoryError |
//! |------------|-------------|-----------------|
//! | Database | `UniqueViolation` | `Persistence` / `DuplicateKey` |
//! | Database | `ForeignKeyViolation` | `Persistence` / `MissingReference` |
//! | Database | any other | `Persistence` / `Storage` |
//! | PoolClosed, Io, ... | N/A | `Persistence` / `Storage` |
//!
//! `NotFound` is never produced by the mapping itself: repositories use
//! `fetch_optional` and raise it explicitly with the entity name and id.

use thiserror::Error;
use tracing::debug;

use checkout_core::DomainError;

/// Why a write or read against the store failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceCause {
    /// A primary key or unique constraint rejected the row.
    DuplicateKey,
    /// A foreign key points at a row that does not exist.
    MissingReference,
    /// Any other storage failure (connection, IO, constraint, ...).
    Storage,
}

impl core::fmt::Display for PersistenceCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::DuplicateKey => "duplicate key",
            Self::MissingReference => "missing reference",
            Self::Storage => "storage error",
        };
        f.write_str(s)
    }
}

/// Repository operation error.
///
/// These are **infrastructure errors** as opposed to domain errors
/// (validation, invariants), which are raised before anything reaches a
/// repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No row matches the requested identifier.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The store rejected or failed the operation.
    #[error("{operation} failed ({cause}): {message}")]
    Persistence {
        operation: &'static str,
        cause: PersistenceCause,
        message: String,
    },

    /// A stored row cannot be turned back into a valid domain object.
    #[error("invalid {entity} record {id}: {message}")]
    InvalidRecord {
        entity: &'static str,
        id: String,
        message: String,
    },
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_record(
        entity: &'static str,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRecord {
            entity,
            id: id.into(),
            message: message.into(),
        }
    }

    /// Wrap a domain rule violation found while rebuilding a stored record.
    pub fn from_domain(entity: &'static str, id: impl Into<String>, err: DomainError) -> Self {
        Self::invalid_record(entity, id, err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the persistence cause, if this is a persistence failure.
    pub fn persistence_cause(&self) -> Option<PersistenceCause> {
        match self {
            Self::Persistence { cause, .. } => Some(*cause),
            _ => None,
        }
    }
}

/// Map SQLx errors to `RepositoryError`.
pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            debug!(operation, message = db_err.message(), "database operation failed");

            let cause = match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => PersistenceCause::DuplicateKey,
                sqlx::error::ErrorKind::ForeignKeyViolation => PersistenceCause::MissingReference,
                _ => PersistenceCause::Storage,
            };

            RepositoryError::Persistence {
                operation,
                cause,
                message: db_err.message().to_string(),
            }
        }
        sqlx::Error::PoolClosed => RepositoryError::Persistence {
            operation,
            cause: PersistenceCause::Storage,
            message: "connection pool closed".to_string(),
        },
        other => {
            debug!(operation, error = %other, "sqlx operation failed");
            RepositoryError::Persistence {
                operation,
                cause: PersistenceCause::Storage,
                message: other.to_string(),
            }
        }
    }
}

/// Convert an unsigned domain amount into the store's signed integer column.
pub(crate) fn to_column(
    entity: &'static str,
    id: &str,
    field: &str,
    value: u64,
) -> Result<i64, RepositoryError> {
    i64::try_from(value).map_err(|_| {
        RepositoryError::invalid_record(entity, id, format!("{field} {value} exceeds column range"))
    })
}

/// Convert a signed integer column back into an unsigned domain value.
pub(crate) fn from_column<T>(
    entity: &'static str,
    id: &str,
    field: &str,
    value: i64,
) -> Result<T, RepositoryError>
where
    T: TryFrom<i64>,
{
    T::try_from(value).map_err(|_| {
        RepositoryError::invalid_record(entity, id, format!("{field} {value} out of range"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_closed_maps_to_storage_failure() {
        let err = map_sqlx_error("insert_order", sqlx::Error::PoolClosed);
        assert_eq!(err.persistence_cause(), Some(PersistenceCause::Storage));
        assert_eq!(
            err.to_string(),
            "insert_order failed (storage error): connection pool closed"
        );
    }

    #[test]
    fn not_found_names_entity_and_id() {
        let err = RepositoryError::not_found("order", "42");
        assert!(err.is_not_found());
        assert_eq!(err.persistence_cause(), None);
        assert_eq!(err.to_string(), "order not found: 42");
    }

    #[test]
    fn column_conversions_reject_out_of_range_values() {
        assert_eq!(to_column("order", "1", "total", 2100).unwrap(), 2100);
        assert!(to_column("order", "1", "total", u64::MAX).is_err());

        let quantity: u32 = from_column("order_item", "1", "quantity", 3).unwrap();
        assert_eq!(quantity, 3);
        assert!(from_column::<u32>("order_item", "1", "quantity", -1).is_err());
        assert!(from_column::<u64>("product", "1", "price", -5).is_err());
    }
}
