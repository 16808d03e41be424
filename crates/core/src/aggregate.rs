//! Aggregate root trait.

use crate::entity::Entity;

/// Aggregate root marker.
///
/// An aggregate root is the only entity of its cluster that outside code may
/// hold a reference to. Child entities are reachable through it and are
/// persisted together with it as one unit.
pub trait AggregateRoot: Entity {}
