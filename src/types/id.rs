//! Typed entity identifiers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Repository-assigned numeric identifier, typed by the entity it names.
///
/// Wraps the raw integer the repository hands out and carries the entity
/// type as a phantom marker, so a frame id cannot be passed where a
/// sprite id is expected. Serializes as the plain integer so archive
/// rows keep their original wire shape.
pub struct Id<E> {
    raw: i64,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Id<E> {
    /// Wrap a raw repository id.
    pub fn new(raw: i64) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// The raw integer value.
    pub fn raw(self) -> i64 {
        self.raw
    }

    /// Erase the entity type, e.g. for kind-dependent references.
    pub fn erase(self) -> RawId {
        RawId(self.raw)
    }
}

// Manual impls: derives would put unwanted bounds on `E`.

impl<E> Clone for Id<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Id<E> {}

impl<E> PartialEq for Id<E> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<E> Eq for Id<E> {}

impl<E> PartialOrd for Id<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Id<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<E> Hash for Id<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<E> fmt::Debug for Id<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.raw)
    }
}

impl<E> fmt::Display for Id<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<E> Serialize for Id<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.raw)
    }
}

impl<'de, E> Deserialize<'de> for Id<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::new)
    }
}

/// An entity id with the entity type erased.
///
/// Used where the referenced table depends on runtime data, such as a
/// scene object's kind-dependent `referenceId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RawId(pub i64);

impl RawId {
    /// Reinterpret as an id of a concrete entity type.
    pub fn typed<E>(self) -> Id<E> {
        Id::new(self.0)
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Frame, Sprite};

    #[test]
    fn ids_of_different_entities_are_distinct_types() {
        let frame_id: Id<Frame> = Id::new(7);
        let sprite_id: Id<Sprite> = Id::new(7);
        // Same raw value, not comparable across types; erased values are.
        assert_eq!(frame_id.erase(), sprite_id.erase());
    }

    #[test]
    fn serializes_as_plain_integer() {
        let id: Id<Frame> = Id::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: Id<Frame> = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ordering_follows_raw_value() {
        let a: Id<Frame> = Id::new(1);
        let b: Id<Frame> = Id::new(2);
        assert!(a < b);
    }
}
