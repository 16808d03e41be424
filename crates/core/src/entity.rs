//! Entity trait: identity that survives attribute changes.

/// Entity marker + identity accessor.
///
/// Renaming a customer or repricing a product changes attributes, never the
/// identity returned here.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
