//! Error types for Tessera

use thiserror::Error;

/// Coarse grouping of errors, used to decide how far a failure propagates.
///
/// Schema errors are fatal for the schema being registered. Value errors are
/// recovered per property, import errors per component, migration errors per
/// component instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Schema,
    Value,
    Import,
    Migration,
    World,
    Io,
}

/// The main error type for Tessera operations
#[derive(Debug, Error)]
pub enum TesseraError {
    #[error("Duplicate schema id: {0}")]
    DuplicateSchema(String),

    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Migration steps for {schema} do not cover [0.0.0, {version}): {reason}")]
    MigrationGap {
        schema: String,
        version: String,
        reason: String,
    },

    #[error("Schema parse error: {0}")]
    SchemaParse(String),

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Dangling reference: {0}")]
    DanglingReference(String),

    #[error("Reference to {0} is not positioned yet")]
    UnresolvedReference(String),

    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Migration of {schema} failed: {message}")]
    MigrationFailed { schema: String, message: String },

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Duplicate entity name: {0}")]
    DuplicateEntityName(String),

    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Component already present: {0}")]
    AlreadyPresent(String),

    #[error("{kind}s don't support {schema} components")]
    UnsupportedHost { schema: String, kind: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl TesseraError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateSchema(_)
            | Self::SchemaNotFound(_)
            | Self::MigrationGap { .. }
            | Self::SchemaParse(_) => ErrorCategory::Schema,
            Self::TypeMismatch { .. }
            | Self::DanglingReference(_)
            | Self::UnresolvedReference(_) => ErrorCategory::Value,
            Self::UnknownComponent(_) | Self::InvalidDocument(_) => ErrorCategory::Import,
            Self::MigrationFailed { .. } => ErrorCategory::Migration,
            Self::EntityNotFound(_)
            | Self::DuplicateEntityName(_)
            | Self::ComponentNotFound(_)
            | Self::AlreadyPresent(_)
            | Self::UnsupportedHost { .. } => ErrorCategory::World,
            Self::Io(_) | Self::TomlParse(_) | Self::TomlSer(_) | Self::Json(_) => {
                ErrorCategory::Io
            }
        }
    }

    /// Shorthand for building a `TypeMismatch`
    pub fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }
}

/// Result type alias for Tessera operations
pub type Result<T> = std::result::Result<T, TesseraError>;

impl From<toml::de::Error> for TesseraError {
    fn from(err: toml::de::Error) -> Self {
        TesseraError::TomlParse(err.to_string())
    }
}

impl From<toml::ser::Error> for TesseraError {
    fn from(err: toml::ser::Error) -> Self {
        TesseraError::TomlSer(err.to_string())
    }
}

impl From<serde_json::Error> for TesseraError {
    fn from(err: serde_json::Error) -> Self {
        TesseraError::Json(err.to_string())
    }
}

impl From<semver::Error> for TesseraError {
    fn from(err: semver::Error) -> Self {
        TesseraError::SchemaParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            TesseraError::DuplicateSchema("link".into()).category(),
            ErrorCategory::Schema
        );
        assert_eq!(
            TesseraError::mismatch("vec3", "string").category(),
            ErrorCategory::Value
        );
        assert_eq!(
            TesseraError::UnknownComponent("foo".into()).category(),
            ErrorCategory::Import
        );
        assert_eq!(
            TesseraError::MigrationFailed {
                schema: "rigidbody".into(),
                message: "boom".into()
            }
            .category(),
            ErrorCategory::Migration
        );
    }

    #[test]
    fn test_unsupported_host_message() {
        let err = TesseraError::UnsupportedHost {
            schema: "Spot Light".into(),
            kind: "bone".into(),
        };
        assert_eq!(err.to_string(), "bones don't support Spot Light components");
    }
}
