//! Per-entity component storage

use tessera_schema::ComponentInstance;

/// One attached component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSlot {
    pub instance: ComponentInstance,
    /// Attached implicitly because another component depends on it
    pub is_dependency: bool,
}

/// Ordered list of the components attached to one entity.
///
/// A schema id appears at most once; insertion order is kept so export
/// output is stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityComponents {
    slots: Vec<ComponentSlot>,
}

impl EntityComponents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, schema_id: &str) -> bool {
        self.position(schema_id).is_some()
    }

    pub fn get(&self, schema_id: &str) -> Option<&ComponentInstance> {
        self.slot(schema_id).map(|s| &s.instance)
    }

    pub fn get_mut(&mut self, schema_id: &str) -> Option<&mut ComponentInstance> {
        self.slot_mut(schema_id).map(|s| &mut s.instance)
    }

    pub fn slot(&self, schema_id: &str) -> Option<&ComponentSlot> {
        self.slots.iter().find(|s| s.instance.schema_id == schema_id)
    }

    pub fn slot_mut(&mut self, schema_id: &str) -> Option<&mut ComponentSlot> {
        self.slots
            .iter_mut()
            .find(|s| s.instance.schema_id == schema_id)
    }

    pub fn is_dependency(&self, schema_id: &str) -> bool {
        self.slot(schema_id).map(|s| s.is_dependency).unwrap_or(false)
    }

    /// Append an instance, replacing any existing one with the same schema
    /// id in place
    pub fn insert(&mut self, instance: ComponentInstance, is_dependency: bool) {
        let slot = ComponentSlot {
            instance,
            is_dependency,
        };
        match self.position(&slot.instance.schema_id) {
            Some(i) => self.slots[i] = slot,
            None => self.slots.push(slot),
        }
    }

    pub fn remove(&mut self, schema_id: &str) -> Option<ComponentSlot> {
        self.position(schema_id).map(|i| self.slots.remove(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentSlot> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ComponentSlot> {
        self.slots.iter_mut()
    }

    pub fn schema_ids(&self) -> Vec<&str> {
        self.slots
            .iter()
            .map(|s| s.instance.schema_id.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn position(&self, schema_id: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.instance.schema_id == schema_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tessera_schema::Version;

    fn instance(id: &str) -> ComponentInstance {
        ComponentInstance {
            schema_id: id.to_string(),
            version: Version::new(1, 0, 0),
            values: BTreeMap::new(),
        }
    }

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut comps = EntityComponents::new();
        comps.insert(instance("link"), false);
        comps.insert(instance("networked"), true);
        comps.insert(instance("link"), false);
        assert_eq!(comps.schema_ids(), vec!["link", "networked"]);
        assert!(comps.is_dependency("networked"));
        assert!(!comps.is_dependency("link"));
    }

    #[test]
    fn test_remove() {
        let mut comps = EntityComponents::new();
        comps.insert(instance("visible"), false);
        assert!(comps.remove("visible").is_some());
        assert!(comps.remove("visible").is_none());
        assert!(comps.is_empty());
    }
}
