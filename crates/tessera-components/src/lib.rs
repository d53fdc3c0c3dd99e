//! Tessera Components - the built-in component set
//!
//! Schemas ship as TOML files compiled into the crate. Components that need
//! code (fresh network ids, data migrations, a glTF form that differs from
//! the authoring form, or names written by older tools) get it from the
//! behavior and hook tables here.

mod behaviors;
mod gather;
mod import;
mod legacy;

pub use behaviors::new_network_id;

use std::path::Path;
use tessera_core::Result;
use tessera_interchange::InterchangeHooks;
use tessera_schema::{ComponentSchemaFile, SchemaRegistry};

/// Rigidbody collision groups, in `collisionMask` order
pub const COLLISION_GROUPS: [&str; 5] = [
    "objects",
    "triggers",
    "environment",
    "avatars",
    "media-frames",
];

const BUILTIN_SCHEMAS: [(&str, &str); 5] = [
    ("object", include_str!("../schemas/object.toml")),
    ("media", include_str!("../schemas/media.toml")),
    ("physics", include_str!("../schemas/physics.toml")),
    ("scene", include_str!("../schemas/scene.toml")),
    ("animation", include_str!("../schemas/animation.toml")),
];

/// Register every built-in schema with its behavior. Returns the ids in
/// registration order.
pub fn register_builtins(registry: &mut SchemaRegistry) -> Result<Vec<String>> {
    let mut loaded = Vec::new();
    for (group, content) in BUILTIN_SCHEMAS {
        for schema in ComponentSchemaFile::parse(content)? {
            let id = schema.id.clone();
            match behaviors::behavior_for(&id) {
                Some(behavior) => registry.register_with(schema, behavior)?,
                None => registry.register(schema)?,
            }
            loaded.push(id);
        }
        log::debug!("Registered built-in {} components", group);
    }
    Ok(loaded)
}

pub fn builtin_registry() -> Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    register_builtins(&mut registry)?;
    Ok(registry)
}

/// Built-ins followed by the `components/*.toml` files of each user
/// directory. A user schema reusing a built-in id is an error.
pub fn registry_with_user_paths(paths: &[impl AsRef<Path>]) -> Result<SchemaRegistry> {
    let mut registry = builtin_registry()?;
    for path in paths {
        let loaded = registry.load_directory(path)?;
        log::info!(
            "Loaded {} user components from {}",
            loaded.len(),
            path.as_ref().display()
        );
    }
    Ok(registry)
}

/// Gather overrides and import handlers for the built-in set, including the
/// legacy component names
pub fn builtin_hooks() -> InterchangeHooks {
    let hooks = gather::register(InterchangeHooks::new());
    let hooks = import::register(hooks);
    legacy::register(hooks)
}
