//! Value objects: compared by their fields, owned by an entity.

/// Marker for types with no identity of their own.
///
/// Two addresses with the same street, number, zip and city are the same
/// address. Holders replace a value object wholesale instead of mutating it,
/// e.g. `Customer::change_address`.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
