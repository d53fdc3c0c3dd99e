//! Tessera Scene - TOML persistence of authoring scenes
//!
//! Component data is stored together with the schema version it was written
//! with, so documents saved by older tools can be migrated after loading.

mod format;
mod loader;
mod saver;

pub use format::{ComponentDef, EntityDef, ImageDef, SceneFile, SceneMetadata};
pub use loader::{load_scene, load_scene_string};
pub use saver::{save_scene, save_scene_string, world_to_scene_file};
