//! Scene file format definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tessera_core::EntityKind;

/// Root structure of a scene TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    pub scene: SceneMetadata,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<String, ImageDef>,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

/// Scene metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Version of the tool that last saved the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_with: Option<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// One entity and its components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Library file this entity is linked from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    #[serde(default)]
    pub components: Vec<ComponentDef>,
}

/// Stored component data, tagged with the schema version it was written with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDef {
    pub id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dependency: bool,
    #[serde(default)]
    pub values: toml::Table,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl SceneFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            scene: SceneMetadata {
                name: name.into(),
                version: default_version(),
                description: None,
                saved_with: None,
            },
            images: BTreeMap::new(),
            entities: Vec::new(),
        }
    }
}
