//! Schema registry for loading and managing component schemas

use crate::behavior::{ComponentBehavior, MigrationStep};
use crate::component::{ComponentSchemaFile, SchemaDefinition};
use semver::Version;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tessera_core::{EntityKind, Result, TesseraError};

/// A schema together with the behavior bound to it
#[derive(Clone)]
pub struct RegisteredSchema {
    pub definition: SchemaDefinition,
    pub behavior: Option<Arc<dyn ComponentBehavior>>,
    pub migrations: Vec<MigrationStep>,
}

impl fmt::Debug for RegisteredSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredSchema")
            .field("definition", &self.definition)
            .field("behavior", &self.behavior.is_some())
            .field("migrations", &self.migrations)
            .finish()
    }
}

/// Registry of every component schema known to the process.
///
/// Schemas keep their registration order, which drives menus and export
/// order. Each applicable entity kind gets one attachment slot per schema.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: Vec<RegisteredSchema>,
    index: HashMap<String, usize>,
    slots: HashMap<EntityKind, Vec<String>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a data-only schema
    pub fn register(&mut self, schema: SchemaDefinition) -> Result<()> {
        self.insert(schema, None)
    }

    /// Register a schema with hooks and migration steps
    pub fn register_with(
        &mut self,
        schema: SchemaDefinition,
        behavior: Arc<dyn ComponentBehavior>,
    ) -> Result<()> {
        self.insert(schema, Some(behavior))
    }

    fn insert(
        &mut self,
        schema: SchemaDefinition,
        behavior: Option<Arc<dyn ComponentBehavior>>,
    ) -> Result<()> {
        if self.index.contains_key(&schema.id) {
            return Err(TesseraError::DuplicateSchema(schema.id));
        }
        let migrations = behavior
            .as_ref()
            .map(|b| b.migrations())
            .unwrap_or_default();
        check_migration_coverage(&schema, &migrations)?;

        for kind in &schema.applicable_kinds {
            self.slots.entry(*kind).or_default().push(schema.id.clone());
        }
        self.index.insert(schema.id.clone(), self.schemas.len());
        log::debug!("Registered component schema '{}' v{}", schema.id, schema.version);
        self.schemas.push(RegisteredSchema {
            definition: schema,
            behavior,
            migrations,
        });
        Ok(())
    }

    /// Remove a schema and its attachment slots
    pub fn unregister(&mut self, id: &str) -> Result<RegisteredSchema> {
        let pos = self
            .index
            .remove(id)
            .ok_or_else(|| TesseraError::SchemaNotFound(id.to_string()))?;
        let removed = self.schemas.remove(pos);
        for ids in self.slots.values_mut() {
            ids.retain(|s| s != id);
        }
        self.index = self
            .schemas
            .iter()
            .enumerate()
            .map(|(i, s)| (s.definition.id.clone(), i))
            .collect();
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredSchema> {
        self.index.get(id).map(|&i| &self.schemas[i])
    }

    pub fn get_schema(&self, id: &str) -> Option<&SchemaDefinition> {
        self.get(id).map(|r| &r.definition)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// First schema registered with this display name
    pub fn lookup_by_display_name(&self, name: &str) -> Option<&RegisteredSchema> {
        let mut matches = self
            .schemas
            .iter()
            .filter(|s| s.definition.display_name == name);
        let first = matches.next()?;
        if let Some(other) = matches.next() {
            log::warn!(
                "Display name '{}' is ambiguous ('{}' and '{}'); using '{}'",
                name,
                first.definition.id,
                other.definition.id,
                first.definition.id
            );
        }
        Some(first)
    }

    /// All schemas in registration order
    pub fn list_schemas(&self) -> impl Iterator<Item = &RegisteredSchema> {
        self.schemas.iter()
    }

    pub fn schema_ids(&self) -> Vec<&str> {
        self.schemas.iter().map(|s| s.definition.id.as_str()).collect()
    }

    /// Schemas a user may add to an entity of this kind
    pub fn addable_schemas(&self, kind: EntityKind) -> Vec<&SchemaDefinition> {
        self.schemas
            .iter()
            .map(|s| &s.definition)
            .filter(|d| !d.dependency_only && d.applies_to(kind))
            .collect()
    }

    /// Attachment slots (schema ids) for an entity kind
    pub fn slots(&self, kind: EntityKind) -> &[String] {
        self.slots.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn supports(&self, kind: EntityKind, id: &str) -> bool {
        self.slots(kind).iter().any(|s| s == id)
    }

    /// Load schemas from each directory in order
    pub fn load_from_directories(paths: &[impl AsRef<Path>]) -> Result<Self> {
        let mut registry = Self::new();
        for path in paths {
            registry.load_directory(path)?;
        }
        Ok(registry)
    }

    /// Load every `path/components/*.toml` file into this registry
    pub fn load_directory<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<String>> {
        let components_path = path.as_ref().join("components");
        let mut loaded = Vec::new();
        if !components_path.exists() {
            return Ok(loaded);
        }
        let mut files: Vec<_> = fs::read_dir(&components_path)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().map(|e| e == "toml").unwrap_or(false))
            .collect();
        files.sort();
        for file_path in files {
            loaded.extend(self.load_component_file(&file_path)?);
        }
        Ok(loaded)
    }

    /// Load component schemas from a TOML file
    pub fn load_component_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<String>> {
        let content = fs::read_to_string(path)?;
        self.load_component_string(&content)
    }

    /// Load component schemas from a TOML string, returning their ids
    pub fn load_component_string(&mut self, content: &str) -> Result<Vec<String>> {
        let mut loaded = Vec::new();
        for schema in ComponentSchemaFile::parse(content)? {
            loaded.push(schema.id.clone());
            self.register(schema)?;
        }
        Ok(loaded)
    }
}

/// Steps must be contiguous, start at 0.0.0 and end at the schema version.
/// No steps at all means a version bump with no data change.
fn check_migration_coverage(schema: &SchemaDefinition, steps: &[MigrationStep]) -> Result<()> {
    let gap = |reason: String| TesseraError::MigrationGap {
        schema: schema.id.clone(),
        version: schema.version.to_string(),
        reason,
    };
    if steps.is_empty() {
        return Ok(());
    }

    let mut expected = Version::new(0, 0, 0);
    for step in steps {
        if step.since != expected {
            return Err(gap(format!(
                "step starts at {} but {} is not covered",
                step.since, expected
            )));
        }
        if step.since >= step.until {
            return Err(gap(format!("empty step [{}, {})", step.since, step.until)));
        }
        expected = step.until.clone();
    }
    if expected != schema.version {
        return Err(gap(format!("last step ends at {}", expected)));
    }
    Ok(())
}
