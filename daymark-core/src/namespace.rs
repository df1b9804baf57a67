//! Data source namespaces.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::UNION_NAMESPACE;

/// Opaque name of a data source contributing day-level availability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceKey(String);

impl NamespaceKey {
    pub fn new(name: impl Into<String>) -> Self {
        NamespaceKey(name.into())
    }

    /// The namespace holding the union of every source.
    pub fn union() -> Self {
        NamespaceKey(UNION_NAMESPACE.to_string())
    }

    pub fn is_union(&self) -> bool {
        self.0 == UNION_NAMESPACE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NamespaceKey {
    fn from(name: &str) -> Self {
        NamespaceKey::new(name)
    }
}

/// The named sources a calendar shows badges for. The union namespace is
/// implied and never listed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamespaceSet {
    named: Vec<NamespaceKey>,
}

impl NamespaceSet {
    pub fn new<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<NamespaceKey>,
    {
        let mut named: Vec<NamespaceKey> = Vec::new();
        for key in names.into_iter().map(Into::into) {
            if !key.is_union() && !named.contains(&key) {
                named.push(key);
            }
        }
        NamespaceSet { named }
    }

    /// Named namespaces, in configuration order.
    pub fn named(&self) -> &[NamespaceKey] {
        &self.named
    }

    /// The union namespace followed by the named ones.
    pub fn all(&self) -> impl Iterator<Item = NamespaceKey> + '_ {
        std::iter::once(NamespaceKey::union()).chain(self.named.iter().cloned())
    }
}
