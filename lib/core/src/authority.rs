//! Granted authority sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The distinct role names granted to one authenticated identity.
///
/// Derived on every login and never stored. An empty set is a valid value
/// and is what a failed role lookup degrades to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantedAuthorities(BTreeSet<String>);

impl GrantedAuthorities {
    /// Creates an empty authority set.
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns true if the named authority is present.
    #[must_use]
    pub fn contains(&self, authority: &str) -> bool {
        self.0.contains(authority)
    }

    /// Returns a new set holding every authority of `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).cloned().collect())
    }

    /// Adds an authority, returning false if it was already present.
    pub fn insert(&mut self, authority: impl Into<String>) -> bool {
        self.0.insert(authority.into())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the authorities in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for GrantedAuthorities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for GrantedAuthorities {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
