//! Scene loading from TOML files

use crate::format::{ComponentDef, SceneFile};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tessera_core::{EntityId, Result, TesseraError};
use tessera_ecs::{ImageAsset, SceneWorld};
use tessera_schema::{
    default_value, value_from_toml, ComponentInstance, SchemaRegistry, Value, Version,
};

/// Load a scene from a TOML file
pub fn load_scene<P: AsRef<Path>>(
    path: P,
    registry: &SchemaRegistry,
) -> Result<(SceneWorld, SceneFile)> {
    let content = fs::read_to_string(path)?;
    load_scene_string(&content, registry)
}

/// Load a scene from a TOML string.
///
/// Components keep the version they were saved with and attach hooks do not
/// run; call the migration engine afterwards to bring them up to date.
pub fn load_scene_string(
    content: &str,
    registry: &SchemaRegistry,
) -> Result<(SceneWorld, SceneFile)> {
    let scene_file: SceneFile = toml::from_str(content)?;
    let mut world = SceneWorld::new();

    for (name, image) in &scene_file.images {
        world.add_image(
            name.clone(),
            ImageAsset {
                uri: image.uri.clone(),
                mime_type: image.mime_type.clone(),
            },
        );
    }

    // First pass: create all entities so references can resolve
    for entity_def in &scene_file.entities {
        world.spawn(entity_def.name.clone(), entity_def.kind)?;
    }

    // Second pass: hierarchy, links and component data
    for entity_def in &scene_file.entities {
        let id = world
            .get_id(&entity_def.name)
            .ok_or_else(|| TesseraError::EntityNotFound(entity_def.name.clone()))?;

        if let Some(parent) = &entity_def.parent {
            world.set_parent_by_name(&entity_def.name, parent)?;
        }
        if let Some(library) = &entity_def.library {
            world.set_linked(id, library.clone())?;
        }

        for comp in &entity_def.components {
            match restore_component(&world, registry, id, comp) {
                Ok(instance) => world.insert_instance(id, instance, comp.dependency)?,
                Err(e) => log::warn!(
                    "Dropping component '{}' on '{}': {}",
                    comp.id,
                    entity_def.name,
                    e
                ),
            }
        }
    }

    Ok((world, scene_file))
}

fn restore_component(
    world: &SceneWorld,
    registry: &SchemaRegistry,
    owner: EntityId,
    comp: &ComponentDef,
) -> Result<ComponentInstance> {
    let schema = registry
        .get_schema(&comp.id)
        .ok_or_else(|| TesseraError::UnknownComponent(comp.id.clone()))?;
    let version = Version::parse(&comp.version)?;

    // Data older than the schema keeps its gaps until migration has run, so
    // steps only ever see values that were actually saved
    let outdated = version < schema.version;

    let mut values = BTreeMap::new();
    for prop in &schema.properties {
        let value = match comp.values.get(&prop.name) {
            Some(raw) => value_from_toml(&prop.ty, raw, registry, world).unwrap_or_else(|e| {
                log::warn!(
                    "{}.{} on {}: {}, using default",
                    comp.id,
                    prop.name,
                    owner,
                    e
                );
                default_value(&prop.ty, prop.default.as_ref(), registry)
            }),
            None if outdated => continue,
            None => default_value(&prop.ty, prop.default.as_ref(), registry),
        };
        values.insert(prop.name.clone(), value);
    }

    // Keys the current schema no longer declares are kept untyped so
    // migration steps can still read them
    for (key, raw) in &comp.values {
        if schema.get_property(key).is_none() {
            values.insert(key.clone(), untyped_value(raw));
        }
    }

    Ok(ComponentInstance {
        schema_id: comp.id.clone(),
        version,
        values,
    })
}

fn untyped_value(raw: &toml::Value) -> Value {
    match raw {
        toml::Value::Integer(i) => Value::Int(*i),
        toml::Value::Float(f) => Value::Float(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => {
            if items.iter().all(|v| v.is_float() || v.is_integer()) && !items.is_empty() {
                Value::Vector(
                    items
                        .iter()
                        .filter_map(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
                        .collect(),
                )
            } else {
                Value::Array(items.iter().map(untyped_value).collect())
            }
        }
        toml::Value::Table(t) => Value::Nested(
            t.iter()
                .map(|(k, v)| (k.clone(), untyped_value(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::EntityKind;
    use tessera_schema::{PropertyDef, PropertyType, ReferenceTarget, SchemaDefinition, Target};

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                SchemaDefinition::new("link", "Link")
                    .property(PropertyDef::new("href", PropertyType::String))
                    .property(
                        PropertyDef::new("target", PropertyType::reference(ReferenceTarget::Node)),
                    ),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_load_scene_string() {
        let toml_str = r#"
[scene]
name = "Lobby"

[[entities]]
name = "Room"
kind = "node"

[[entities]]
name = "Door"
kind = "node"
parent = "Room"

[[entities.components]]
id = "link"
version = "0.9.0"

[entities.components.values]
href = "https://example.org"
target = { entity = "Room" }
legacyFlag = true
"#;

        let registry = registry();
        let (world, scene) = load_scene_string(toml_str, &registry).unwrap();

        assert_eq!(scene.scene.name, "Lobby");
        assert_eq!(world.len(), 2);
        let room = world.get_id("Room").unwrap();
        let door = world.get_id("Door").unwrap();
        assert_eq!(world.get_parent(door), Some(room));

        let link = world.get_instance(door, "link").unwrap();
        assert_eq!(link.version, Version::new(0, 9, 0));
        assert_eq!(link.get("href"), Some(&Value::String("https://example.org".into())));
        assert_eq!(link.get("target"), Some(&Value::Reference(Some(Target::Entity(room)))));
        assert_eq!(link.get("legacyFlag"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_unknown_component_is_dropped() {
        let toml_str = r#"
[scene]
name = "Lobby"

[[entities]]
name = "Cube"
kind = "node"

[[entities.components]]
id = "teleporter"
version = "1.0.0"
"#;
        let (world, _) = load_scene_string(toml_str, &registry()).unwrap();
        let cube = world.get_id("Cube").unwrap();
        assert!(world.components(cube).unwrap().is_empty());
        assert_eq!(world.kind(cube), Some(EntityKind::Node));
    }

    #[test]
    fn test_bad_value_falls_back_to_default() {
        let toml_str = r#"
[scene]
name = "Lobby"

[[entities]]
name = "Cube"
kind = "node"

[[entities.components]]
id = "link"
version = "1.0.0"
values = { href = 42 }
"#;
        let (world, _) = load_scene_string(toml_str, &registry()).unwrap();
        let cube = world.get_id("Cube").unwrap();
        assert_eq!(
            world.get_instance(cube, "link").unwrap().get("href"),
            Some(&Value::String(String::new()))
        );
    }

    #[test]
    fn test_outdated_component_keeps_gaps() {
        let toml_str = r#"
[scene]
name = "Lobby"

[[entities]]
name = "Door"
kind = "node"

[[entities.components]]
id = "link"
version = "0.1.0"
values = { href = "https://example.org" }
"#;
        let (world, _) = load_scene_string(toml_str, &registry()).unwrap();
        let link = world.get_instance(world.get_id("Door").unwrap(), "link").unwrap();
        assert!(link.get("href").is_some());
        assert_eq!(link.get("target"), None);
    }
}
