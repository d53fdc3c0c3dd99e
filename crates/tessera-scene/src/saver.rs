//! Scene saving to TOML files

use crate::format::{ComponentDef, EntityDef, ImageDef, SceneFile};
use std::fs;
use std::path::Path;
use tessera_core::Result;
use tessera_ecs::SceneWorld;
use tessera_schema::value_to_toml;

/// Save a world to a scene file
pub fn save_scene<P: AsRef<Path>>(
    path: P,
    world: &SceneWorld,
    name: impl Into<String>,
) -> Result<()> {
    let content = save_scene_string(world, name)?;
    fs::write(path, content)?;
    Ok(())
}

/// Save a world to a TOML string
pub fn save_scene_string(world: &SceneWorld, name: impl Into<String>) -> Result<String> {
    let scene_file = world_to_scene_file(world, name);
    let content = toml::to_string_pretty(&scene_file)?;
    Ok(content)
}

/// Convert a SceneWorld to a SceneFile, keeping spawn order
pub fn world_to_scene_file(world: &SceneWorld, name: impl Into<String>) -> SceneFile {
    let mut scene = SceneFile::new(name);
    scene.scene.saved_with = Some(env!("CARGO_PKG_VERSION").to_string());

    for (image_name, asset) in world.images() {
        scene.images.insert(
            image_name.to_string(),
            ImageDef {
                uri: asset.uri.clone(),
                mime_type: asset.mime_type.clone(),
            },
        );
    }

    for info in world.all_entities() {
        let components = world
            .components(info.id)
            .map(|comps| {
                comps
                    .iter()
                    .map(|slot| ComponentDef {
                        id: slot.instance.schema_id.clone(),
                        version: slot.instance.version.to_string(),
                        dependency: slot.is_dependency,
                        values: slot
                            .instance
                            .values
                            .iter()
                            .filter_map(|(k, v)| value_to_toml(v, world).map(|t| (k.clone(), t)))
                            .collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        scene.entities.push(EntityDef {
            name: info.name,
            kind: info.kind,
            parent: info.parent,
            library: info.library,
            components,
        });
    }

    scene
}
