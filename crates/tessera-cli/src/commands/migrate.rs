//! Component data migration command

use super::load_registry;
use anyhow::{Context, Result};
use tessera_migrate::{migrate_document, MigrationScope};
use tessera_scene::{load_scene, save_scene};

pub fn run(scene_path: &str, local: bool, write: bool, schemas: &[String]) -> Result<()> {
    let (_, registry) = load_registry(schemas)?;
    let (mut world, scene_file) = load_scene(scene_path, &registry)
        .with_context(|| format!("Failed to load scene {}", scene_path))?;

    let scope = if local {
        MigrationScope::Local
    } else {
        MigrationScope::Global
    };
    let report = migrate_document(&mut world, &registry, scope);
    if report.is_empty() {
        println!("All components are up to date");
        return Ok(());
    }
    for line in report.lines() {
        println!("{}", line);
    }

    if write {
        save_scene(scene_path, &world, &scene_file.scene.name).context("Failed to save scene")?;
        println!("Saved migrated scene to {}", scene_path);
    } else {
        println!("Dry run; pass --write to save the migrated scene");
    }
    if report.error_count() > 0 {
        anyhow::bail!("{} components failed to migrate", report.error_count());
    }
    Ok(())
}
