//! Component schema definitions

use semver::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use tessera_core::{ColorSpace, EntityKind, Result, TesseraError};

/// Physical unit of a vector or scalar property, carried for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Length,
    Acceleration,
    Velocity,
    Rotation,
    Time,
    Mass,
}

/// Semantic subtype of a vector property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorSubtype {
    Xyz,
    Translation,
    Euler,
    /// Color held in linear space in memory
    Color,
    /// Color held in sRGB gamma space in memory
    ColorGamma,
}

/// What a reference property points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceTarget {
    /// A node or a bone
    Node,
    Material,
    Image,
    Texture,
}

impl ReferenceTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Material => "material",
            Self::Image => "image",
            Self::Texture => "texture",
        }
    }
}

/// Presentation grouping for the add-component menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Object,
    Scene,
    Elements,
    Animation,
    Avatar,
    Misc,
    Lights,
    Media,
}

/// The type of a property in a component schema
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
    Int,
    Float,
    Bool,
    String,
    Enum {
        items: Vec<String>,
    },
    Vector {
        size: usize,
        unit: Option<Unit>,
        subtype: Option<VectorSubtype>,
        /// Components are whole numbers (e.g. a shadow map resolution)
        integer: bool,
    },
    Reference {
        target: ReferenceTarget,
    },
    Array {
        element: Box<PropertyType>,
    },
    /// A record laid out by another registered schema
    Nested {
        schema: String,
    },
}

impl PropertyType {
    pub fn vector(size: usize) -> Self {
        Self::Vector {
            size,
            unit: None,
            subtype: None,
            integer: false,
        }
    }

    pub fn vec3_with_unit(unit: Unit) -> Self {
        Self::Vector {
            size: 3,
            unit: Some(unit),
            subtype: None,
            integer: false,
        }
    }

    pub fn color(size: usize, space: ColorSpace) -> Self {
        let subtype = match space {
            ColorSpace::Linear => VectorSubtype::Color,
            ColorSpace::Gamma => VectorSubtype::ColorGamma,
        };
        Self::Vector {
            size,
            unit: None,
            subtype: Some(subtype),
            integer: false,
        }
    }

    pub fn reference(target: ReferenceTarget) -> Self {
        Self::Reference { target }
    }

    pub fn enumeration(items: &[&str]) -> Self {
        Self::Enum {
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// In-memory color space, if this is a color vector
    pub fn color_space(&self) -> Option<ColorSpace> {
        match self {
            Self::Vector {
                subtype: Some(VectorSubtype::Color),
                ..
            } => Some(ColorSpace::Linear),
            Self::Vector {
                subtype: Some(VectorSubtype::ColorGamma),
                ..
            } => Some(ColorSpace::Gamma),
            _ => None,
        }
    }

    pub fn is_color(&self) -> bool {
        self.color_space().is_some()
    }

    pub fn type_name(&self) -> String {
        match self {
            Self::Int => "int".into(),
            Self::Float => "float".into(),
            Self::Bool => "bool".into(),
            Self::String => "string".into(),
            Self::Enum { .. } => "enum".into(),
            Self::Vector { size, .. } if self.is_color() => format!("color{}", size),
            Self::Vector {
                size,
                integer: true,
                ..
            } => format!("ivec{}", size),
            Self::Vector { size, .. } => format!("vec{}", size),
            Self::Reference { target } => format!("ref<{}>", target.as_str()),
            Self::Array { element } => format!("array<{}>", element.type_name()),
            Self::Nested { schema } => format!("nested<{}>", schema),
        }
    }
}

/// A single declared property
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: String,
    pub ty: PropertyType,
    pub default: Option<toml::Value>,
    pub description: Option<String>,
}

impl PropertyDef {
    pub fn new(name: &str, ty: PropertyType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            default: None,
            description: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<toml::Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A component schema: what can be attached, where, and what it holds
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    /// `None` for schemas that only exist as dependencies
    pub category: Option<Category>,
    pub applicable_kinds: Vec<EntityKind>,
    pub properties: Vec<PropertyDef>,
    pub dependencies: Vec<String>,
    pub version: Version,
    pub dependency_only: bool,
}

impl SchemaDefinition {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            description: None,
            category: None,
            applicable_kinds: vec![EntityKind::Node],
            properties: Vec::new(),
            dependencies: Vec::new(),
            version: Version::new(1, 0, 0),
            dependency_only: false,
        }
    }

    pub fn kinds(mut self, kinds: &[EntityKind]) -> Self {
        self.applicable_kinds = kinds.to_vec();
        self
    }

    pub fn property(mut self, def: PropertyDef) -> Self {
        self.properties.push(def);
        self
    }

    pub fn depends_on(mut self, id: &str) -> Self {
        self.dependencies.push(id.to_string());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn get_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn applies_to(&self, kind: EntityKind) -> bool {
        self.applicable_kinds.contains(&kind)
    }
}

/// TOML file format for component schemas
#[derive(Debug, Deserialize)]
pub struct ComponentSchemaFile {
    pub component: BTreeMap<String, ComponentSchemaDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct ComponentSchemaDefinition {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub kinds: Option<Vec<EntityKind>>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dependency_only: bool,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

/// Property definition as it appears in TOML files
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default)]
    pub items: Option<Vec<String>>,
    #[serde(default)]
    pub unit: Option<Unit>,
    #[serde(default)]
    pub subtype: Option<VectorSubtype>,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub default: Option<toml::Value>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ComponentSchemaFile {
    /// Parse every `[component.<id>]` table, in id order
    pub fn parse(content: &str) -> Result<Vec<SchemaDefinition>> {
        let file: ComponentSchemaFile = toml::from_str(content)?;
        file.component
            .into_iter()
            .map(|(id, def)| def.into_schema(id))
            .collect()
    }
}

impl ComponentSchemaDefinition {
    pub fn into_schema(self, id: String) -> Result<SchemaDefinition> {
        let version = match &self.version {
            Some(v) => Version::parse(v)?,
            None => Version::new(1, 0, 0),
        };
        let properties = self
            .properties
            .into_iter()
            .map(|p| p.into_property_def(&id))
            .collect::<Result<Vec<_>>>()?;

        Ok(SchemaDefinition {
            display_name: self.display_name.unwrap_or_else(|| id.clone()),
            description: self.description,
            category: self.category,
            applicable_kinds: self.kinds.unwrap_or_else(|| vec![EntityKind::Node]),
            properties,
            dependencies: self.dependencies,
            version,
            dependency_only: self.dependency_only,
            id,
        })
    }
}

impl PropertyDefinition {
    fn into_property_def(self, schema_id: &str) -> Result<PropertyDef> {
        let ty = parse_property_type(
            &self.property_type,
            &self,
            self.element.as_deref(),
        )
        .map_err(|e| TesseraError::SchemaParse(format!("{}.{}: {}", schema_id, self.name, e)))?;

        Ok(PropertyDef {
            name: self.name,
            ty,
            default: self.default,
            description: self.description,
        })
    }
}

fn parse_property_type(
    type_str: &str,
    def: &PropertyDefinition,
    array_element: Option<&str>,
) -> std::result::Result<PropertyType, String> {
    let vector = |size: usize, integer: bool| PropertyType::Vector {
        size,
        unit: def.unit,
        subtype: def.subtype,
        integer,
    };
    let color = |size: usize, subtype: VectorSubtype| PropertyType::Vector {
        size,
        unit: None,
        subtype: Some(subtype),
        integer: false,
    };

    let ty = match type_str {
        "int" => PropertyType::Int,
        "float" => PropertyType::Float,
        "bool" => PropertyType::Bool,
        "string" => PropertyType::String,
        "enum" => match &def.items {
            Some(items) if !items.is_empty() => PropertyType::Enum {
                items: items.clone(),
            },
            _ => return Err("enum properties need a non-empty `items` list".into()),
        },
        "vec2" => vector(2, false),
        "vec3" => vector(3, false),
        "vec4" => vector(4, false),
        "ivec2" => vector(2, true),
        "ivec3" => vector(3, true),
        "color" => color(3, VectorSubtype::Color),
        "color4" => color(4, VectorSubtype::Color),
        "color_gamma" => color(3, VectorSubtype::ColorGamma),
        "color_gamma4" => color(4, VectorSubtype::ColorGamma),
        "node" => PropertyType::reference(ReferenceTarget::Node),
        "material" => PropertyType::reference(ReferenceTarget::Material),
        "image" => PropertyType::reference(ReferenceTarget::Image),
        "texture" => PropertyType::reference(ReferenceTarget::Texture),
        "nested" => match &def.schema {
            Some(schema) => PropertyType::Nested {
                schema: schema.clone(),
            },
            None => return Err("nested properties need a `schema`".into()),
        },
        "array" => {
            let element = array_element.ok_or("array properties need an `element` type")?;
            if element == "array" {
                return Err("arrays of arrays are not supported".into());
            }
            PropertyType::Array {
                element: Box::new(parse_property_type(element, def, None)?),
            }
        }
        other => return Err(format!("unknown property type '{}'", other)),
    };
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<SchemaDefinition> {
        let file: ComponentSchemaFile = toml::from_str(toml_str)?;
        let (id, def) = file.component.into_iter().next().unwrap();
        def.into_schema(id)
    }

    #[test]
    fn test_parse_vector_with_unit() {
        let schema = parse(
            r#"
[component.media-frame]
display_name = "Media Frame"
category = "elements"
dependencies = ["networked"]

[[component.media-frame.properties]]
name = "bounds"
type = "vec3"
unit = "length"
default = [1.0, 1.0, 1.0]
"#,
        )
        .unwrap();

        assert_eq!(schema.display_name, "Media Frame");
        assert_eq!(schema.category, Some(Category::Elements));
        assert_eq!(schema.applicable_kinds, vec![EntityKind::Node]);
        assert_eq!(schema.version, Version::new(1, 0, 0));
        let bounds = schema.get_property("bounds").unwrap();
        assert_eq!(bounds.ty, PropertyType::vec3_with_unit(Unit::Length));
    }

    #[test]
    fn test_parse_colors_and_references() {
        let schema = parse(
            r#"
[component.environment-settings]
kinds = ["scene"]
version = "1.0.0"

[[component.environment-settings.properties]]
name = "backgroundColor"
type = "color4"

[[component.environment-settings.properties]]
name = "envMapTexture"
type = "texture"

[[component.environment-settings.properties]]
name = "targets"
type = "array"
element = "node"
"#,
        )
        .unwrap();

        assert_eq!(schema.property_names(), vec!["backgroundColor", "envMapTexture", "targets"]);
        assert_eq!(
            schema.properties[0].ty.color_space(),
            Some(ColorSpace::Linear)
        );
        assert_eq!(
            schema.properties[1].ty,
            PropertyType::reference(ReferenceTarget::Texture)
        );
        assert_eq!(schema.properties[2].ty.type_name(), "array<ref<node>>");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = parse(
            r#"
[component.broken]
[[component.broken.properties]]
name = "x"
type = "quaternion"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("broken.x"));
    }

    #[test]
    fn test_enum_needs_items() {
        assert!(parse(
            r#"
[component.e]
[[component.e.properties]]
name = "mode"
type = "enum"
"#,
        )
        .is_err());
    }
}
