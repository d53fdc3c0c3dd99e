//! Entity summaries for listings

use tessera_core::{EntityId, EntityKind};

/// Snapshot of one entity, for listings and reports
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    /// Parent entity name (if any)
    pub parent: Option<String>,
    /// Library file the entity is linked from (if any)
    pub library: Option<String>,
    /// Attached component ids, dependencies flagged with `true`
    pub components: Vec<(String, bool)>,
}

impl EntityInfo {
    pub fn direct_components(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .filter(|(_, dep)| !dep)
            .map(|(id, _)| id.as_str())
    }
}
