//! Entity identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static ID_SOURCE: AtomicU64 = AtomicU64::new(1);

/// Identifier of a scene entity (node, bone, material or scene).
///
/// Ids are handed out from a process-wide counter and never reused, so a
/// component value can hold one as a reference and detect when the target
/// has gone away.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub fn new() -> Self {
        Self(ID_SOURCE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn from_raw(raw: u64) -> Self {
        ID_SOURCE.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
