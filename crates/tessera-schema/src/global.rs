//! Process-wide registry slot.
//!
//! The registry is built once when the plugin is enabled and torn down when
//! it is disabled. Readers take a cheap `Arc` clone and keep using it even if
//! the slot is rebuilt underneath them.

use crate::registry::SchemaRegistry;
use std::sync::{Arc, RwLock};

static REGISTRY: RwLock<Option<Arc<SchemaRegistry>>> = RwLock::new(None);

/// Install `registry` as the process-wide registry, replacing any previous one
pub fn build(registry: SchemaRegistry) -> Arc<SchemaRegistry> {
    let shared = Arc::new(registry);
    let mut slot = REGISTRY.write().unwrap_or_else(|e| e.into_inner());
    if slot.is_some() {
        log::info!("Replacing component registry");
    }
    *slot = Some(Arc::clone(&shared));
    log::info!("Component registry built with {} schemas", shared.schema_ids().len());
    shared
}

pub fn current() -> Option<Arc<SchemaRegistry>> {
    REGISTRY
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Empty the slot. Returns whether a registry was installed.
pub fn teardown() -> bool {
    let previous = REGISTRY.write().unwrap_or_else(|e| e.into_inner()).take();
    if previous.is_some() {
        log::info!("Component registry torn down");
    }
    previous.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::SchemaDefinition;

    #[test]
    fn test_build_and_teardown() {
        let mut registry = SchemaRegistry::new();
        registry.register(SchemaDefinition::new("visible", "Visible")).unwrap();

        let built = build(registry);
        let held = current().unwrap();
        assert!(Arc::ptr_eq(&built, &held));

        assert!(teardown());
        assert!(current().is_none());
        assert!(!teardown());

        // Readers holding the old registry keep a valid view
        assert!(held.contains("visible"));
    }
}
