//! SceneWorld - entities with stable ids, kinds and ordered component lists

use crate::component::EntityComponents;
use crate::entity::EntityInfo;
use bimap::BiMap;
use std::collections::{BTreeMap, HashMap};
use tessera_core::{EntityId, EntityKind, Result, TesseraError};
use tessera_schema::{
    validate_value, ComponentInstance, HostInfo, ReferenceLookup, SchemaRegistry, Value,
};

/// Marks an entity whose data lives in another (library) file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linked {
    pub library: String,
}

/// An image asset that image and texture references can name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageAsset {
    pub uri: Option<String>,
    pub mime_type: Option<String>,
}

/// The authoring scene
///
/// Wraps hecs::World with:
/// - Stable EntityId mapping
/// - Entity kinds and linked-library markers stored as hecs components
/// - Ordered component lists per entity
/// - Named entity lookup and a parent hierarchy
pub struct SceneWorld {
    world: hecs::World,
    id_map: BiMap<EntityId, hecs::Entity>,
    name_map: HashMap<String, EntityId>,
    names: HashMap<EntityId, String>,
    /// Spawn order, which is also sibling order
    order: Vec<EntityId>,
    pub(crate) components: HashMap<EntityId, EntityComponents>,
    /// child -> parent
    parents: HashMap<EntityId, EntityId>,
    images: BTreeMap<String, ImageAsset>,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneWorld {
    pub fn new() -> Self {
        Self {
            world: hecs::World::new(),
            id_map: BiMap::new(),
            name_map: HashMap::new(),
            names: HashMap::new(),
            order: Vec::new(),
            components: HashMap::new(),
            parents: HashMap::new(),
            images: BTreeMap::new(),
        }
    }

    /// Spawn a new entity of the given kind
    pub fn spawn(&mut self, name: impl Into<String>, kind: EntityKind) -> Result<EntityId> {
        let id = EntityId::new();
        self.spawn_with_id(id, name, kind)?;
        Ok(id)
    }

    /// Spawn an entity with a specific id (for loading documents)
    pub fn spawn_with_id(
        &mut self,
        id: EntityId,
        name: impl Into<String>,
        kind: EntityKind,
    ) -> Result<()> {
        let name = name.into();
        if self.name_map.contains_key(&name) {
            return Err(TesseraError::DuplicateEntityName(name));
        }
        if self.id_map.contains_left(&id) {
            return Err(TesseraError::DuplicateEntityName(id.to_string()));
        }

        let hecs_entity = self.world.spawn((kind,));
        self.id_map.insert(id, hecs_entity);
        self.name_map.insert(name.clone(), id);
        self.names.insert(id, name);
        self.order.push(id);
        self.components.insert(id, EntityComponents::new());
        Ok(())
    }

    /// Despawn an entity and everything attached to it. Children are
    /// reparented to the root.
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        let hecs_entity = self
            .id_map
            .get_by_left(&id)
            .copied()
            .ok_or_else(|| TesseraError::EntityNotFound(id.to_string()))?;

        self.world
            .despawn(hecs_entity)
            .map_err(|_| TesseraError::EntityNotFound(id.to_string()))?;

        self.id_map.remove_by_left(&id);
        if let Some(name) = self.names.remove(&id) {
            self.name_map.remove(&name);
        }
        self.order.retain(|e| *e != id);
        self.components.remove(&id);
        self.parents.remove(&id);
        self.parents.retain(|_, parent| *parent != id);
        Ok(())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.id_map.contains_left(&id)
    }

    pub fn get_id(&self, name: &str) -> Option<EntityId> {
        self.name_map.get(name).copied()
    }

    pub fn get_name(&self, id: EntityId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// `name` if free, otherwise `name.001`, `name.002`, ...
    pub fn unique_name(&self, name: &str) -> String {
        if !self.name_map.contains_key(name) {
            return name.to_string();
        }
        (1..)
            .map(|n| format!("{}.{:03}", name, n))
            .find(|candidate| !self.name_map.contains_key(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    pub fn kind(&self, id: EntityId) -> Option<EntityKind> {
        let entity = self.id_map.get_by_left(&id)?;
        self.world.get::<&EntityKind>(*entity).ok().map(|k| *k)
    }

    /// Mark an entity as linked from a library file
    pub fn set_linked(&mut self, id: EntityId, library: impl Into<String>) -> Result<()> {
        let entity = self.hecs_entity(id)?;
        self.world
            .insert_one(
                entity,
                Linked {
                    library: library.into(),
                },
            )
            .map_err(|_| TesseraError::EntityNotFound(id.to_string()))
    }

    pub fn library(&self, id: EntityId) -> Option<String> {
        let entity = self.id_map.get_by_left(&id)?;
        self.world
            .get::<&Linked>(*entity)
            .ok()
            .map(|l| l.library.clone())
    }

    pub fn is_linked(&self, id: EntityId) -> bool {
        self.id_map
            .get_by_left(&id)
            .map(|e| self.world.satisfies::<&Linked>(*e).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Every linked entity with its library, in spawn order
    pub fn linked_entities(&self) -> Vec<(EntityId, String)> {
        let mut linked: Vec<(EntityId, String)> = self
            .world
            .query::<&Linked>()
            .iter()
            .filter_map(|(entity, link)| {
                self.id_map
                    .get_by_right(&entity)
                    .map(|id| (*id, link.library.clone()))
            })
            .collect();
        linked.sort_by_key(|(id, _)| self.order.iter().position(|o| o == id));
        linked
    }

    /// The view of an entity handed to schema hooks
    pub fn host_info(&self, id: EntityId) -> Option<HostInfo<'_>> {
        Some(HostInfo {
            kind: self.kind(id)?,
            name: self.get_name(id)?,
            linked: self.is_linked(id),
        })
    }

    /// All entity ids in spawn order
    pub fn entities(&self) -> &[EntityId] {
        &self.order
    }

    /// Entity ids of one kind in spawn order
    pub fn entities_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.kind(*id) == Some(kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) -> Result<()> {
        if !self.contains(child) {
            return Err(TesseraError::EntityNotFound(child.to_string()));
        }
        if !self.contains(parent) {
            return Err(TesseraError::EntityNotFound(parent.to_string()));
        }
        self.parents.insert(child, parent);
        Ok(())
    }

    pub fn set_parent_by_name(&mut self, child: &str, parent: &str) -> Result<()> {
        let child_id = self
            .get_id(child)
            .ok_or_else(|| TesseraError::EntityNotFound(child.to_string()))?;
        let parent_id = self
            .get_id(parent)
            .ok_or_else(|| TesseraError::EntityNotFound(parent.to_string()))?;
        self.set_parent(child_id, parent_id)
    }

    pub fn get_parent(&self, child: EntityId) -> Option<EntityId> {
        self.parents.get(&child).copied()
    }

    /// Children in spawn order
    pub fn get_children(&self, parent: EntityId) -> Vec<EntityId> {
        self.order
            .iter()
            .copied()
            .filter(|c| self.parents.get(c) == Some(&parent))
            .collect()
    }

    pub fn components(&self, id: EntityId) -> Option<&EntityComponents> {
        self.components.get(&id)
    }

    pub fn components_mut(&mut self, id: EntityId) -> Option<&mut EntityComponents> {
        self.components.get_mut(&id)
    }

    pub fn get_instance(&self, id: EntityId, schema_id: &str) -> Option<&ComponentInstance> {
        self.components.get(&id).and_then(|c| c.get(schema_id))
    }

    pub fn get_instance_mut(
        &mut self,
        id: EntityId,
        schema_id: &str,
    ) -> Option<&mut ComponentInstance> {
        self.components.get_mut(&id).and_then(|c| c.get_mut(schema_id))
    }

    /// Store an instance as-is, bypassing dependency resolution and attach
    /// hooks. Used when restoring persisted data.
    pub fn insert_instance(
        &mut self,
        id: EntityId,
        instance: ComponentInstance,
        is_dependency: bool,
    ) -> Result<()> {
        let comps = self
            .components
            .get_mut(&id)
            .ok_or_else(|| TesseraError::EntityNotFound(id.to_string()))?;
        comps.insert(instance, is_dependency);
        Ok(())
    }

    /// Set one property of an attached component after checking its type
    pub fn set_value(
        &mut self,
        registry: &SchemaRegistry,
        id: EntityId,
        schema_id: &str,
        property: &str,
        value: Value,
    ) -> Result<()> {
        let schema = registry
            .get_schema(schema_id)
            .ok_or_else(|| TesseraError::SchemaNotFound(schema_id.to_string()))?;
        let prop = schema.get_property(property).ok_or_else(|| {
            TesseraError::mismatch(format!("a property of {}", schema_id), property)
        })?;
        validate_value(&prop.ty, &value, registry)?;

        let instance = self
            .get_instance_mut(id, schema_id)
            .ok_or_else(|| TesseraError::ComponentNotFound(schema_id.to_string()))?;
        instance.set(property, value);
        Ok(())
    }

    pub fn add_image(&mut self, name: impl Into<String>, asset: ImageAsset) {
        self.images.insert(name.into(), asset);
    }

    pub fn image(&self, name: &str) -> Option<&ImageAsset> {
        self.images.get(name)
    }

    pub fn images(&self) -> impl Iterator<Item = (&str, &ImageAsset)> {
        self.images.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn all_entities(&self) -> Vec<EntityInfo> {
        self.order
            .iter()
            .filter_map(|id| {
                Some(EntityInfo {
                    id: *id,
                    name: self.get_name(*id)?.to_string(),
                    kind: self.kind(*id)?,
                    parent: self
                        .get_parent(*id)
                        .and_then(|p| self.get_name(p))
                        .map(String::from),
                    library: self.library(*id),
                    components: self
                        .components
                        .get(id)
                        .map(|c| {
                            c.iter()
                                .map(|s| (s.instance.schema_id.clone(), s.is_dependency))
                                .collect()
                        })
                        .unwrap_or_default(),
                })
            })
            .collect()
    }

    fn hecs_entity(&self, id: EntityId) -> Result<hecs::Entity> {
        self.id_map
            .get_by_left(&id)
            .copied()
            .ok_or_else(|| TesseraError::EntityNotFound(id.to_string()))
    }
}

impl ReferenceLookup for SceneWorld {
    fn entity_named(&self, name: &str) -> Option<EntityId> {
        self.get_id(name)
    }

    fn entity_name(&self, id: EntityId) -> Option<String> {
        self.get_name(id).map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_schema::{PropertyDef, PropertyType, SchemaDefinition};

    #[test]
    fn test_spawn_and_get() {
        let mut world = SceneWorld::new();
        let id = world.spawn("Cube", EntityKind::Node).unwrap();
        assert_eq!(world.get_id("Cube"), Some(id));
        assert_eq!(world.get_name(id), Some("Cube"));
        assert_eq!(world.kind(id), Some(EntityKind::Node));
        assert!(world.components(id).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_name() {
        let mut world = SceneWorld::new();
        world.spawn("Cube", EntityKind::Node).unwrap();
        assert!(matches!(
            world.spawn("Cube", EntityKind::Material),
            Err(TesseraError::DuplicateEntityName(_))
        ));
        assert_eq!(world.unique_name("Cube"), "Cube.001");
        assert_eq!(world.unique_name("Sphere"), "Sphere");
    }

    #[test]
    fn test_despawn_reparents_children() {
        let mut world = SceneWorld::new();
        let room = world.spawn("Room", EntityKind::Node).unwrap();
        let door = world.spawn("Door", EntityKind::Node).unwrap();
        world.set_parent(door, room).unwrap();
        world.despawn(room).unwrap();
        assert!(world.get_id("Room").is_none());
        assert_eq!(world.get_parent(door), None);
        assert_eq!(world.entities(), &[door]);
    }

    #[test]
    fn test_children_in_spawn_order() {
        let mut world = SceneWorld::new();
        let arm = world.spawn("Armature", EntityKind::Node).unwrap();
        let a = world.spawn("Hip", EntityKind::Bone).unwrap();
        let b = world.spawn("Spine", EntityKind::Bone).unwrap();
        world.set_parent_by_name("Spine", "Armature").unwrap();
        world.set_parent_by_name("Hip", "Armature").unwrap();
        assert_eq!(world.get_children(arm), vec![a, b]);
        assert_eq!(world.entities_of_kind(EntityKind::Bone), vec![a, b]);
    }

    #[test]
    fn test_linked_marker() {
        let mut world = SceneWorld::new();
        let a = world.spawn("Local", EntityKind::Node).unwrap();
        let b = world.spawn("Shared", EntityKind::Node).unwrap();
        world.set_linked(b, "props.toml").unwrap();
        assert!(!world.is_linked(a));
        assert!(world.is_linked(b));
        assert_eq!(world.library(b).as_deref(), Some("props.toml"));
        assert_eq!(world.linked_entities(), vec![(b, "props.toml".to_string())]);
        assert!(world.host_info(b).unwrap().linked);
    }

    #[test]
    fn test_set_value_checks_type() {
        let mut registry = SchemaRegistry::new();
        let schema = SchemaDefinition::new("fog", "Fog")
            .property(PropertyDef::new("density", PropertyType::Float));
        registry.register(schema.clone()).unwrap();

        let mut world = SceneWorld::new();
        let id = world.spawn("Cube", EntityKind::Node).unwrap();
        world
            .insert_instance(id, ComponentInstance::with_defaults(&schema, &registry), false)
            .unwrap();

        world
            .set_value(&registry, id, "fog", "density", Value::Float(0.2))
            .unwrap();
        assert_eq!(
            world.get_instance(id, "fog").unwrap().get_f64("density"),
            Some(0.2)
        );
        assert!(world
            .set_value(&registry, id, "fog", "density", Value::Bool(true))
            .is_err());
        assert!(world
            .set_value(&registry, id, "fog", "colour", Value::Float(1.0))
            .is_err());
    }
}
