//! glTF to scene import command

use super::load_registry;
use anyhow::{Context, Result};
use std::path::Path;
use tessera_components::builtin_hooks;
use tessera_interchange::{import_document, Document};
use tessera_scene::save_scene;

pub struct ImportArgs {
    pub input: String,
    pub output: String,
    pub schemas: Vec<String>,
    pub no_components: bool,
    pub z_up: bool,
}

pub fn run(args: ImportArgs) -> Result<()> {
    let (config, registry) = load_registry(&args.schemas)?;
    let document =
        Document::load(&args.input).with_context(|| format!("Failed to read {}", args.input))?;

    let mut settings = config.import.clone();
    if args.no_components {
        settings.enabled = false;
    }
    if args.z_up {
        settings.y_up = false;
    }

    let output = import_document(&document, &registry, &builtin_hooks(), &settings)
        .context("Failed to import document")?;
    if !output.report.is_empty() {
        println!("Import report:");
        for entry in &output.report.entries {
            println!("  {}", entry);
        }
    }

    let name = Path::new(&args.input)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Imported".to_string());
    save_scene(&args.output, &output.world, name)
        .with_context(|| format!("Failed to write {}", args.output))?;

    println!(
        "Imported {} entities into {}",
        output.world.len(),
        args.output
    );
    Ok(())
}
