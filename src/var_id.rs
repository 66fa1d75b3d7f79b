//! Identifiers for named variables and persisted values.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Identifies a variable in a model and the value it persists into a simulation run.
///
/// `Named` ids are stable across runs and compare by content. `Unique` ids are fresh
/// opaque tokens, one per allocation, used for internal per-timestep state that has no
/// caller-visible name. Ordering follows the string representation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum VarId {
    Named(Arc<str>),
    Unique(uuid::Uuid),
}

impl VarId {
    #[must_use]
    pub fn named(name: &str) -> Self {
        VarId::Named(Arc::from(name))
    }

    /// A new id distinct from every other id.
    #[must_use]
    pub fn unique() -> Self {
        VarId::Unique(uuid::Uuid::new_v4())
    }

    /// Derives a child id, e.g. `cost` -> `cost_dist`.
    #[must_use]
    pub fn subvar(&self, suffix: &str) -> Self {
        VarId::named(&format!("{self}_{suffix}"))
    }

    #[must_use]
    pub fn is_unique(&self) -> bool {
        matches!(self, VarId::Unique(_))
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarId::Named(name) => f.write_str(name),
            VarId::Unique(id) => write!(f, "#{id}"),
        }
    }
}

impl fmt::Debug for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarId({self})")
    }
}

impl Ord for VarId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (VarId::Named(a), VarId::Named(b)) => a.cmp(b),
            (VarId::Unique(a), VarId::Unique(b)) => a.cmp(b),
            _ => self
                .to_string()
                .cmp(&other.to_string())
                .then_with(|| self.is_unique().cmp(&other.is_unique())),
        }
    }
}

impl PartialOrd for VarId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for VarId {
    fn from(name: &str) -> Self {
        VarId::named(name)
    }
}

impl From<String> for VarId {
    fn from(name: String) -> Self {
        VarId::Named(Arc::from(name))
    }
}

impl From<&VarId> for VarId {
    fn from(id: &VarId) -> Self {
        id.clone()
    }
}
