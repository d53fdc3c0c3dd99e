//! Layered configuration
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `TESSERA_GLTF_YUP`, `TESSERA_EXPORT_ENABLED`
//! 2. Project-local: `.tessera/config.toml`
//! 3. Global: `~/.tessera/config.toml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_core::{Result, TesseraError};

/// Options for writing component data into a document
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    /// Write the component extension at all
    pub enabled: bool,
    /// Convert vectors the runtime reads in glTF's Y-up space
    pub y_up: bool,
    /// Written as `exporterVersion` in the root payload
    pub exporter_version: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            y_up: true,
            exporter_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Options for reading component data out of a document
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSettings {
    pub enabled: bool,
    pub y_up: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            y_up: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportSection {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub y_up: Option<bool>,
    #[serde(default)]
    pub exporter_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSection {
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemasSection {
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TesseraConfigFile {
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub import: ImportSection,
    #[serde(default)]
    pub schemas: SchemasSection,
}

/// Resolved configuration with environment overrides applied
#[derive(Debug, Clone, Default)]
pub struct TesseraConfig {
    pub export: ExportSettings,
    pub import: ImportSettings,
    /// Extra directories holding `components/*.toml` schema files
    pub schema_paths: Vec<PathBuf>,
}

impl TesseraConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = TesseraConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = PathBuf::from(".tessera/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        Self::apply_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(Self::resolve(config))
    }

    /// Load config from a specific file path only
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(Self::resolve(config))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".tessera").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<TesseraConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            TesseraError::TomlParse(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge_into(base: &mut TesseraConfigFile, overlay: TesseraConfigFile) {
        if overlay.export.enabled.is_some() {
            base.export.enabled = overlay.export.enabled;
        }
        if overlay.export.y_up.is_some() {
            base.export.y_up = overlay.export.y_up;
        }
        if overlay.export.exporter_version.is_some() {
            base.export.exporter_version = overlay.export.exporter_version;
        }
        if overlay.import.enabled.is_some() {
            base.import.enabled = overlay.import.enabled;
        }
        for path in overlay.schemas.paths {
            if !base.schemas.paths.contains(&path) {
                base.schemas.paths.push(path);
            }
        }
    }

    fn apply_overrides(config: &mut TesseraConfigFile, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(flag) = lookup("TESSERA_GLTF_YUP").as_deref().and_then(parse_bool) {
            config.export.y_up = Some(flag);
        }
        if let Some(flag) = lookup("TESSERA_EXPORT_ENABLED")
            .as_deref()
            .and_then(parse_bool)
        {
            config.export.enabled = Some(flag);
        }
    }

    fn resolve(file: TesseraConfigFile) -> Self {
        let export_defaults = ExportSettings::default();
        let y_up = file.export.y_up.unwrap_or(export_defaults.y_up);
        TesseraConfig {
            export: ExportSettings {
                enabled: file.export.enabled.unwrap_or(export_defaults.enabled),
                y_up,
                exporter_version: file
                    .export
                    .exporter_version
                    .unwrap_or(export_defaults.exporter_version),
            },
            import: ImportSettings {
                enabled: file.import.enabled.unwrap_or(true),
                y_up,
            },
            schema_paths: file.schemas.paths,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            log::warn!("Ignoring unrecognized boolean '{}'", raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(content: &str) -> TesseraConfigFile {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[export]
y_up = false
exporter_version = "2.1.0"

[import]
enabled = false

[schemas]
paths = ["/opt/components"]
"#,
        )
        .unwrap();

        let config = TesseraConfig::load_from_file(&path).unwrap();
        assert_eq!(config.export.exporter_version, "2.1.0");
        assert!(!config.import.enabled);
        assert_eq!(config.schema_paths, vec![PathBuf::from("/opt/components")]);
    }

    #[test]
    fn test_project_layer_wins_over_global() {
        let mut base = parse("[export]\ny_up = false\nenabled = false\n[schemas]\npaths = [\"a\"]");
        let overlay = parse("[export]\ny_up = true\n[schemas]\npaths = [\"a\", \"b\"]");
        TesseraConfig::merge_into(&mut base, overlay);

        let config = TesseraConfig::resolve(base);
        assert!(config.export.y_up);
        assert!(config.import.y_up);
        // unset in the overlay, so the global value stays
        assert!(!config.export.enabled);
        assert_eq!(
            config.schema_paths,
            vec![PathBuf::from("a"), PathBuf::from("b")]
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([("TESSERA_GLTF_YUP", "0"), ("TESSERA_EXPORT_ENABLED", "maybe")]);
        let mut file = parse("[export]\nenabled = false");
        TesseraConfig::apply_overrides(&mut file, |key| env.get(key).map(|v| v.to_string()));

        let config = TesseraConfig::resolve(file);
        assert!(!config.export.y_up);
        // unparseable values leave the file setting alone
        assert!(!config.export.enabled);
    }

    #[test]
    fn test_defaults() {
        let config = TesseraConfig::resolve(TesseraConfigFile::default());
        assert!(config.export.enabled);
        assert!(config.export.y_up);
        assert_eq!(config.export.exporter_version, env!("CARGO_PKG_VERSION"));
        assert!(config.schema_paths.is_empty());
    }
}
