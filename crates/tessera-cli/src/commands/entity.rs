//! Entity component editing commands

use super::{load_registry, resolve_schema_id};
use anyhow::{Context, Result};
use clap::Subcommand;
use tessera_ecs::SceneWorld;
use tessera_scene::{load_scene, save_scene, SceneFile};
use tessera_schema::{value_from_toml, SchemaRegistry};

#[derive(Subcommand)]
pub enum EntityCommands {
    /// Attach a component and its dependencies to an entity
    Add {
        /// Entity name
        entity: String,

        /// Component id or display name
        component: String,

        /// Path to scene file
        #[arg(long)]
        scene: String,

        /// Extra schema directories
        #[arg(long)]
        schemas: Vec<String>,
    },

    /// Detach a component, along with dependencies nothing else needs
    Remove {
        /// Entity name
        entity: String,

        /// Component id or display name
        component: String,

        /// Path to scene file
        #[arg(long)]
        scene: String,

        /// Extra schema directories
        #[arg(long)]
        schemas: Vec<String>,
    },

    /// Set one component property
    Set {
        /// Entity name
        entity: String,

        /// Component id or display name
        component: String,

        /// Property name
        property: String,

        /// Value as TOML (e.g. 2.5, [1.0, 0.0, 0.0], { entity = "Door" });
        /// anything that does not parse is taken as a string
        value: String,

        /// Path to scene file
        #[arg(long)]
        scene: String,

        /// Extra schema directories
        #[arg(long)]
        schemas: Vec<String>,
    },

    /// List entities and their components
    List {
        /// Path to scene file
        #[arg(long)]
        scene: String,

        /// Extra schema directories
        #[arg(long)]
        schemas: Vec<String>,
    },
}

pub fn run(cmd: EntityCommands) -> Result<()> {
    match cmd {
        EntityCommands::Add {
            entity,
            component,
            scene,
            schemas,
        } => add(&entity, &component, &scene, &schemas),

        EntityCommands::Remove {
            entity,
            component,
            scene,
            schemas,
        } => remove(&entity, &component, &scene, &schemas),

        EntityCommands::Set {
            entity,
            component,
            property,
            value,
            scene,
            schemas,
        } => set(&entity, &component, &property, &value, &scene, &schemas),

        EntityCommands::List { scene, schemas } => list(&scene, &schemas),
    }
}

fn open(scene_path: &str, registry: &SchemaRegistry) -> Result<(SceneWorld, SceneFile)> {
    load_scene(scene_path, registry).with_context(|| format!("Failed to load scene {}", scene_path))
}

fn find(world: &SceneWorld, name: &str) -> Result<tessera_core::EntityId> {
    world
        .get_id(name)
        .with_context(|| format!("Entity '{}' not found", name))
}

fn add(entity: &str, component: &str, scene_path: &str, schemas: &[String]) -> Result<()> {
    let (_, registry) = load_registry(schemas)?;
    let (mut world, scene_file) = open(scene_path, &registry)?;
    let id = find(&world, entity)?;
    let schema_id = resolve_schema_id(&registry, component)?;

    let before = world.components(id).map(|c| c.len()).unwrap_or(0);
    world
        .add_component(&registry, id, &schema_id)
        .with_context(|| format!("Failed to add {} to '{}'", schema_id, entity))?;
    let after = world.components(id).map(|c| c.len()).unwrap_or(0);

    save_scene(scene_path, &world, &scene_file.scene.name).context("Failed to save scene")?;
    println!("Added {} to '{}'", schema_id, entity);
    if after > before + 1 {
        println!("  with {} dependencies", after - before - 1);
    }
    Ok(())
}

fn remove(entity: &str, component: &str, scene_path: &str, schemas: &[String]) -> Result<()> {
    let (_, registry) = load_registry(schemas)?;
    let (mut world, scene_file) = open(scene_path, &registry)?;
    let id = find(&world, entity)?;
    let schema_id = resolve_schema_id(&registry, component)?;

    if world
        .components(id)
        .map(|c| c.is_dependency(&schema_id))
        .unwrap_or(false)
        && world.is_dependency_required(&registry, id, &schema_id)
    {
        anyhow::bail!(
            "{} on '{}' is required by another component; remove that one instead",
            schema_id,
            entity
        );
    }

    world
        .remove_component(&registry, id, &schema_id)
        .with_context(|| format!("Failed to remove {} from '{}'", schema_id, entity))?;
    save_scene(scene_path, &world, &scene_file.scene.name).context("Failed to save scene")?;
    println!("Removed {} from '{}'", schema_id, entity);
    Ok(())
}

/// Parse a command-line value as TOML, falling back to a plain string
fn parse_value(text: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("value = {}", text))
        .ok()
        .and_then(|mut t| t.remove("value"))
        .unwrap_or_else(|| toml::Value::String(text.to_string()))
}

fn set(
    entity: &str,
    component: &str,
    property: &str,
    value: &str,
    scene_path: &str,
    schemas: &[String],
) -> Result<()> {
    let (_, registry) = load_registry(schemas)?;
    let (mut world, scene_file) = open(scene_path, &registry)?;
    let id = find(&world, entity)?;
    let schema_id = resolve_schema_id(&registry, component)?;
    let prop = registry
        .get_schema(&schema_id)
        .and_then(|s| s.get_property(property))
        .with_context(|| format!("{} has no property '{}'", schema_id, property))?;

    let raw = parse_value(value);
    let parsed = value_from_toml(&prop.ty, &raw, &registry, &world)
        .with_context(|| format!("Invalid value for {}.{}", schema_id, property))?;
    world
        .set_value(&registry, id, &schema_id, property, parsed)
        .with_context(|| format!("Failed to set {}.{} on '{}'", schema_id, property, entity))?;

    save_scene(scene_path, &world, &scene_file.scene.name).context("Failed to save scene")?;
    println!("Set {}.{} on '{}'", schema_id, property, entity);
    Ok(())
}

fn list(scene_path: &str, schemas: &[String]) -> Result<()> {
    let (_, registry) = load_registry(schemas)?;
    let (world, _) = open(scene_path, &registry)?;

    for info in world.all_entities() {
        print!("{} \"{}\"", info.kind, info.name);
        if let Some(parent) = &info.parent {
            print!(" (parent: {})", parent);
        }
        if let Some(library) = &info.library {
            print!(" [linked from {}]", library);
        }
        println!();

        for (schema_id, is_dependency) in &info.components {
            let stored = world.get_instance(info.id, schema_id).map(|i| i.version.clone());
            let current = registry.get_schema(schema_id).map(|s| s.version.clone());
            let mut line = format!("  - {}", schema_id);
            if let Some(stored) = &stored {
                line.push_str(&format!(" v{}", stored));
            }
            if *is_dependency {
                line.push_str(" [dependency]");
            }
            match (&stored, &current) {
                (Some(stored), Some(current)) if stored < current => {
                    line.push_str(&format!(" (needs migration to v{})", current))
                }
                (_, None) => line.push_str(" (unknown component)"),
                _ => {}
            }
            println!("{}", line);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("2.5"), toml::Value::Float(2.5));
        assert_eq!(parse_value("hull"), toml::Value::String("hull".into()));
        assert_eq!(parse_value("\"a b\""), toml::Value::String("a b".into()));
        assert!(parse_value("[1.0, 0.0, 0.0]").is_array());
        assert!(parse_value("{ entity = \"Door\" }").is_table());
    }
}
