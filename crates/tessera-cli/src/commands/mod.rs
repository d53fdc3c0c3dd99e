//! CLI command implementations

pub mod entity;
pub mod export;
pub mod import;
pub mod migrate;
pub mod schema;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tessera_interchange::TesseraConfig;
use tessera_schema::{global, SchemaRegistry};

/// Layered config plus the process registry: built-ins, then configured
/// schema directories, then the ones given on the command line
pub fn load_registry(schemas: &[String]) -> Result<(TesseraConfig, Arc<SchemaRegistry>)> {
    let config = TesseraConfig::load().context("Failed to load configuration")?;
    let mut paths: Vec<PathBuf> = config.schema_paths.clone();
    paths.extend(schemas.iter().map(PathBuf::from));
    log::debug!("User schema directories: {:?}", paths);
    for path in &paths {
        if !path.exists() {
            anyhow::bail!("Schemas directory not found: {}", path.display());
        }
    }

    let registry = tessera_components::registry_with_user_paths(&paths)
        .context("Failed to load component schemas")?;
    Ok((config, global::build(registry)))
}

/// Find a schema by id or display name
pub fn resolve_schema_id(registry: &SchemaRegistry, name: &str) -> Result<String> {
    if registry.contains(name) {
        return Ok(name.to_string());
    }
    registry
        .lookup_by_display_name(name)
        .map(|s| s.definition.id.clone())
        .with_context(|| format!("Unknown component: {}", name))
}
