//! Adding and removing components with their dependency closure

use crate::world::SceneWorld;
use tessera_core::{EntityId, Result, TesseraError};
use tessera_schema::{AttachContext, ComponentInstance, SchemaRegistry};

impl SceneWorld {
    /// Attach a component the user asked for, along with any dependencies it
    /// declares that are not attached yet.
    ///
    /// Fails with `AlreadyPresent` if the component is already attached,
    /// whether directly or as a dependency.
    pub fn add_component(
        &mut self,
        registry: &SchemaRegistry,
        id: EntityId,
        schema_id: &str,
    ) -> Result<()> {
        if self.has_component(id, schema_id)? {
            return Err(TesseraError::AlreadyPresent(schema_id.to_string()));
        }
        self.attach(registry, id, schema_id, false)
    }

    /// Attach a component unless it is already there. Returns whether it was
    /// added. Used by import and migration, where repeats are expected.
    pub fn ensure_component(
        &mut self,
        registry: &SchemaRegistry,
        id: EntityId,
        schema_id: &str,
    ) -> Result<bool> {
        if self.has_component(id, schema_id)? {
            return Ok(false);
        }
        self.attach(registry, id, schema_id, false)?;
        Ok(true)
    }

    /// Make sure a component another one relies on is attached, marked as a
    /// dependency when it is new
    pub fn ensure_dependency(
        &mut self,
        registry: &SchemaRegistry,
        id: EntityId,
        schema_id: &str,
    ) -> Result<bool> {
        if self.has_component(id, schema_id)? {
            return Ok(false);
        }
        self.attach(registry, id, schema_id, true)?;
        Ok(true)
    }

    /// Detach a component. Each of its dependencies is detached too when
    /// nothing left on the entity still lists it, however it was attached.
    pub fn remove_component(
        &mut self,
        registry: &SchemaRegistry,
        id: EntityId,
        schema_id: &str,
    ) -> Result<()> {
        let comps = self
            .components
            .get_mut(&id)
            .ok_or_else(|| TesseraError::EntityNotFound(id.to_string()))?;
        comps
            .remove(schema_id)
            .ok_or_else(|| TesseraError::ComponentNotFound(schema_id.to_string()))?;

        let deps = registry
            .get_schema(schema_id)
            .map(|s| s.dependencies.clone())
            .unwrap_or_default();
        for dep in deps {
            let attached = self.has_component(id, &dep)?;
            if attached && !self.is_dependency_required(registry, id, &dep) {
                log::debug!("Removing unused dependency '{}' from {}", dep, id);
                self.remove_component(registry, id, &dep)?;
            }
        }
        Ok(())
    }

    /// Whether any component still attached to the entity lists `dep` as a
    /// dependency
    pub fn is_dependency_required(
        &self,
        registry: &SchemaRegistry,
        id: EntityId,
        dep: &str,
    ) -> bool {
        let Some(comps) = self.components.get(&id) else {
            return false;
        };
        comps.iter().any(|slot| {
            registry
                .get_schema(&slot.instance.schema_id)
                .map(|s| s.dependencies.iter().any(|d| d == dep))
                .unwrap_or(false)
        })
    }

    pub fn has_component(&self, id: EntityId, schema_id: &str) -> Result<bool> {
        self.components
            .get(&id)
            .map(|c| c.has(schema_id))
            .ok_or_else(|| TesseraError::EntityNotFound(id.to_string()))
    }

    fn attach(
        &mut self,
        registry: &SchemaRegistry,
        id: EntityId,
        schema_id: &str,
        as_dependency: bool,
    ) -> Result<()> {
        let kind = self
            .kind(id)
            .ok_or_else(|| TesseraError::EntityNotFound(id.to_string()))?;
        let entry = registry
            .get(schema_id)
            .ok_or_else(|| TesseraError::SchemaNotFound(schema_id.to_string()))?;
        if !registry.supports(kind, schema_id) {
            return Err(TesseraError::UnsupportedHost {
                schema: entry.definition.display_name.clone(),
                kind: kind.to_string(),
            });
        }

        let instance = ComponentInstance::with_defaults(&entry.definition, registry);
        self.insert_instance(id, instance, as_dependency)?;

        for dep in &entry.definition.dependencies {
            if self.has_component(id, dep)? {
                continue;
            }
            if let Err(e) = self.attach(registry, id, dep, true) {
                log::warn!(
                    "Could not attach dependency '{}' of '{}' to {}: {}",
                    dep,
                    schema_id,
                    id,
                    e
                );
            }
        }

        if let Some(behavior) = &entry.behavior {
            let linked = self.is_linked(id);
            let name = self.get_name(id).unwrap_or_default().to_string();
            if let Some(instance) = self.get_instance_mut(id, schema_id) {
                let mut ctx = AttachContext {
                    host: tessera_schema::HostInfo {
                        kind,
                        name: &name,
                        linked,
                    },
                    instance,
                };
                behavior.on_attach(&mut ctx);
            }
        }
        Ok(())
    }
}
