//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Products and sale events are entities: two records with equal fields but
/// different ids are distinct (duplicate product names are separate lots).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
