//! Scene to glTF export command

use super::load_registry;
use anyhow::{Context, Result};
use tessera_components::builtin_hooks;
use tessera_interchange::export_document;
use tessera_migrate::{migrate_document, MigrationScope};
use tessera_scene::load_scene;

pub struct ExportArgs {
    pub scene: String,
    pub output: String,
    pub schemas: Vec<String>,
    pub no_components: bool,
    pub z_up: bool,
}

pub fn run(args: ExportArgs) -> Result<()> {
    let (config, registry) = load_registry(&args.schemas)?;
    let (mut world, _) = load_scene(&args.scene, &registry)
        .with_context(|| format!("Failed to load scene {}", args.scene))?;

    // Exported data must match the current schemas
    let report = migrate_document(&mut world, &registry, MigrationScope::Global);
    for line in report.lines() {
        println!("{}", line);
    }

    let mut settings = config.export.clone();
    if args.no_components {
        settings.enabled = false;
    }
    if args.z_up {
        settings.y_up = false;
    }

    let output = export_document(&world, &registry, &builtin_hooks(), &settings)
        .context("Failed to export scene")?;
    for warning in &output.diagnostics {
        println!("Warning: {}", warning);
    }
    output
        .document
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output))?;

    println!(
        "Exported {} nodes and {} materials to {}",
        output.document.nodes.len(),
        output.document.materials.len(),
        args.output
    );
    Ok(())
}
