//! Guard predicates for controlling state transitions.
//!
//! Guards are pure boolean functions over an entity's payload. A transition
//! whose guard rejects the current payload fails without touching the entity.

use super::payload::Payload;
use std::fmt;
use std::sync::Arc;

/// Pure predicate that determines if a transition can run.
///
/// # Example
///
/// ```rust
/// use rewind::core::{Guard, Payload};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// struct Account {
///     balance: i64,
/// }
///
/// impl Payload for Account {
///     fn kind(&self) -> &str {
///         "Account"
///     }
/// }
///
/// let solvent = Guard::new(|a: &Account| a.balance >= 0);
///
/// assert!(solvent.check(&Account { balance: 10 }));
/// assert!(!solvent.check(&Account { balance: -1 }));
/// ```
pub struct Guard<P: Payload> {
    predicate: Arc<dyn Fn(&P) -> bool + Send + Sync>,
}

impl<P: Payload> Guard<P> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Check if the guard allows a transition for this payload.
    pub fn check(&self, payload: &P) -> bool {
        (self.predicate)(payload)
    }
}

impl<P: Payload> Clone for Guard<P> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<P: Payload> fmt::Debug for Guard<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    struct Counter {
        count: i64,
    }

    impl Payload for Counter {
        fn kind(&self) -> &str {
            "Counter"
        }
    }

    #[test]
    fn guard_allows_matching_payloads() {
        let guard = Guard::new(|c: &Counter| c.count < 3);

        assert!(guard.check(&Counter { count: 0 }));
        assert!(!guard.check(&Counter { count: 3 }));
    }

    #[test]
    fn guard_is_deterministic() {
        let payload = Counter { count: 2 };
        let guard = Guard::new(|c: &Counter| c.count % 2 == 0);

        assert_eq!(guard.check(&payload), guard.check(&payload));
    }

    #[test]
    fn cloned_guard_shares_predicate() {
        let guard = Guard::new(|c: &Counter| c.count > 0);
        let cloned = guard.clone();

        assert_eq!(
            guard.check(&Counter { count: 1 }),
            cloned.check(&Counter { count: 1 })
        );
        assert!(!cloned.check(&Counter { count: 0 }));
    }
}
