//! The parts of a glTF document that component data touches.
//!
//! Everything else (meshes, accessors, animations...) is carried through
//! untouched in the flattened `other` maps.

use crate::EXTENSION_NAME;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tessera_core::Result;

pub type JsonMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub asset: Asset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<SceneDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<MaterialDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<TextureDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skins: Vec<SkinDef>,
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub extensions: JsonMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_used: Vec<String>,
    #[serde(flatten)]
    pub other: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(flatten)]
    pub other: JsonMap,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            version: "2.0".to_string(),
            generator: None,
            other: JsonMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<usize>,
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub extensions: JsonMap,
    #[serde(flatten)]
    pub other: JsonMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub extensions: JsonMap,
    #[serde(flatten)]
    pub other: JsonMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub extensions: JsonMap,
    #[serde(flatten)]
    pub other: JsonMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(flatten)]
    pub other: JsonMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<usize>,
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub extensions: JsonMap,
    #[serde(flatten)]
    pub other: JsonMap,
}

impl TextureDef {
    /// Image index, also looking at the RGBE extension used for HDR maps
    pub fn image_source(&self) -> Option<usize> {
        self.source.or_else(|| {
            self.extensions
                .get("MOZ_texture_rgbe")
                .and_then(|ext| ext.get("source"))
                .and_then(|s| s.as_u64())
                .and_then(|s| usize::try_from(s).ok())
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkinDef {
    #[serde(default)]
    pub joints: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<usize>,
    #[serde(flatten)]
    pub other: JsonMap,
}

impl Document {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// The root payload of the component extension, if present
    pub fn component_extension(&self) -> Option<&JsonMap> {
        self.extensions.get(EXTENSION_NAME).and_then(|v| v.as_object())
    }
}

/// The component block inside an `extensions` object
pub fn component_block(extensions: &JsonMap) -> Option<&JsonMap> {
    extensions.get(EXTENSION_NAME).and_then(|v| v.as_object())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_survive() {
        let raw = r#"{
            "asset": {"version": "2.0", "copyright": "me"},
            "nodes": [{"name": "Cube", "mesh": 0, "extensions": {"MOZ_hubs_components": {"visible": {"visible": true}}}}],
            "meshes": [{"primitives": []}]
        }"#;
        let doc = Document::from_json_str(raw).unwrap();
        assert_eq!(doc.nodes[0].name.as_deref(), Some("Cube"));
        assert!(doc.nodes[0].other.contains_key("mesh"));
        assert!(doc.other.contains_key("meshes"));
        assert!(doc.asset.other.contains_key("copyright"));
        assert!(component_block(&doc.nodes[0].extensions)
            .unwrap()
            .contains_key("visible"));

        let again = Document::from_json_str(&doc.to_json_string().unwrap()).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn test_rgbe_texture_source() {
        let tex: TextureDef =
            serde_json::from_str(r#"{"extensions": {"MOZ_texture_rgbe": {"source": 2}}}"#).unwrap();
        assert_eq!(tex.image_source(), Some(2));
    }
}
