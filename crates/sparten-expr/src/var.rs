//! Index variables: named handles for abstract iteration axes.
//!
//! An [`IndexVar`] stands for one axis of iteration in an index expression.
//! Identity is the shared handle, not the name: two variables are equal iff
//! they were cloned from the same creation, and distinct variables may carry
//! the same display name without colliding.
//!
//! # Examples
//!
//! ```
//! use sparten_expr::IndexVar;
//!
//! let i = IndexVar::named("i");
//! let j = IndexVar::named("i");
//! assert_ne!(i, j);          // same name, different axes
//! assert_eq!(i, i.clone());  // clones share the handle
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use sparten_core::fresh_name;

struct VarContent {
    name: String,
}

/// An abstract iteration axis, compared by handle identity.
#[derive(Clone)]
pub struct IndexVar {
    content: Arc<VarContent>,
}

impl IndexVar {
    /// Creates a fresh variable with an auto-generated name (`i0`, `i1`, …).
    pub fn new() -> Self {
        Self::named(fresh_name('i'))
    }

    /// Creates a fresh variable with the given display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            content: Arc::new(VarContent { name: name.into() }),
        }
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.content.name
    }
}

impl Default for IndexVar {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for IndexVar {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.content, &other.content)
    }
}

impl Eq for IndexVar {}

impl Hash for IndexVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.content) as usize).hash(state);
    }
}

impl PartialOrd for IndexVar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexVar {
    /// Arbitrary but stable: compares the underlying handle addresses.
    fn cmp(&self, other: &Self) -> Ordering {
        Arc::as_ptr(&self.content).cmp(&Arc::as_ptr(&other.content))
    }
}

impl fmt::Debug for IndexVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IndexVar").field(&self.name()).finish()
    }
}

impl fmt::Display for IndexVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_not_name() {
        let a = IndexVar::named("i");
        let b = IndexVar::named("i");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn test_auto_names_are_distinct() {
        let a = IndexVar::new();
        let b = IndexVar::new();
        assert_ne!(a.name(), b.name());
        assert!(a.name().starts_with('i'));
    }

    #[test]
    fn test_ordering_is_stable() {
        let a = IndexVar::named("a");
        let b = IndexVar::named("b");
        let first = a.cmp(&b);
        assert_eq!(a.cmp(&b), first);
        assert_eq!(b.cmp(&a), first.reverse());
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_hash_follows_identity() {
        let a = IndexVar::named("i");
        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&a));
        assert!(!set.contains(&IndexVar::named("i")));
    }

    #[test]
    fn test_display() {
        assert_eq!(IndexVar::named("row").to_string(), "row");
    }
}
