//! Entity payloads and identifiers.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Domain fields carried by an entity.
///
/// A single store holds one payload type, usually an enum with one variant
/// per concrete entity type. [`Payload::kind`] names that concrete type; the
/// engine uses it to find the kind's declared state set, its transition
/// table and the visitor operation registered for it.
///
/// `Clone` must produce a deep, independent copy. Payloads that share
/// interior-mutable data (`Rc<RefCell<_>>`, `Arc<Mutex<_>>`) break undo,
/// because a memento would alias the live value instead of copying it.
///
/// # Example
///
/// ```rust
/// use rewind::core::Payload;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Shape {
///     Circle { radius: f64 },
///     Group { label: String },
/// }
///
/// impl Payload for Shape {
///     fn kind(&self) -> &str {
///         match self {
///             Self::Circle { .. } => "Circle",
///             Self::Group { .. } => "Group",
///         }
///     }
/// }
///
/// assert_eq!(Shape::Circle { radius: 1.0 }.kind(), "Circle");
/// ```
pub trait Payload:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Name of the concrete entity type this payload belongs to.
    fn kind(&self) -> &str;
}

/// Unique identifier of an entity inside one store.
///
/// Identifiers are allocated sequentially. Undoing a creation rewinds the
/// allocator, so redoing it hands out the same identifier again.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value, for hosts that log or persist identifiers.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_displays_with_hash_prefix() {
        let id = EntityId::new(7);
        assert_eq!(id.to_string(), "#7");
        assert_eq!(format!("{:?}", id), "#7");
        assert_eq!(id.get(), 7);
    }

    #[test]
    fn entity_id_serializes_as_number() {
        let json = serde_json::to_string(&EntityId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntityId::new(42));
    }

    #[test]
    fn entity_ids_order_by_allocation() {
        assert!(EntityId::new(1) < EntityId::new(2));
    }
}
