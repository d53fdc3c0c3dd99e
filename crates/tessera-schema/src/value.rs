//! Live property values and their TOML representation

use crate::component::{PropertyType, ReferenceTarget};
use crate::registry::SchemaRegistry;
use std::collections::BTreeMap;
use tessera_core::{EntityId, Result, TesseraError};

/// Maximum depth of nested schemas expanded when building default values
const MAX_NESTING: usize = 8;

/// What a reference property currently points at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A node, bone or material entity
    Entity(EntityId),
    /// An image asset, by name
    Image(String),
    /// A texture sampling an image asset, by image name
    Texture(String),
}

/// A live property value held by a component instance
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Enum(String),
    Vector(Vec<f64>),
    /// `None` is an empty reference slot
    Reference(Option<Target>),
    Array(Vec<Value>),
    Nested(BTreeMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
            Value::Vector(_) => "vector",
            Value::Reference(_) => "reference",
            Value::Array(_) => "array",
            Value::Nested(_) => "nested",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_target(&self) -> Option<&Target> {
        match self {
            Value::Reference(Some(t)) => Some(t),
            _ => None,
        }
    }

    /// The value a property of type `ty` holds when no default is declared
    pub fn zero(ty: &PropertyType, registry: &SchemaRegistry) -> Value {
        zero_at_depth(ty, registry, 0)
    }
}

fn zero_at_depth(ty: &PropertyType, registry: &SchemaRegistry, depth: usize) -> Value {
    match ty {
        PropertyType::Int => Value::Int(0),
        PropertyType::Float => Value::Float(0.0),
        PropertyType::Bool => Value::Bool(false),
        PropertyType::String => Value::String(String::new()),
        PropertyType::Enum { items } => Value::Enum(items.first().cloned().unwrap_or_default()),
        PropertyType::Vector { size, .. } if ty.is_color() => Value::Vector(vec![1.0; *size]),
        PropertyType::Vector { size, .. } => Value::Vector(vec![0.0; *size]),
        PropertyType::Reference { .. } => Value::Reference(None),
        PropertyType::Array { .. } => Value::Array(Vec::new()),
        PropertyType::Nested { schema } => {
            let mut fields = BTreeMap::new();
            if depth < MAX_NESTING {
                if let Some(entry) = registry.get(schema) {
                    for prop in &entry.definition.properties {
                        fields.insert(
                            prop.name.clone(),
                            default_at_depth(&prop.ty, prop.default.as_ref(), registry, depth + 1),
                        );
                    }
                }
            }
            Value::Nested(fields)
        }
    }
}

/// Resolve a declared default, falling back to the zero value when it is
/// missing or does not fit the property type
pub fn default_value(
    ty: &PropertyType,
    declared: Option<&toml::Value>,
    registry: &SchemaRegistry,
) -> Value {
    default_at_depth(ty, declared, registry, 0)
}

fn default_at_depth(
    ty: &PropertyType,
    declared: Option<&toml::Value>,
    registry: &SchemaRegistry,
    depth: usize,
) -> Value {
    if let Some(raw) = declared {
        match value_from_toml(ty, raw, registry, &NoReferences) {
            Ok(v) => return v,
            Err(e) => log::warn!("Ignoring default {} for {}: {}", raw, ty.type_name(), e),
        }
    }
    zero_at_depth(ty, registry, depth)
}

/// Maps entity references to and from the names used in persisted files
pub trait ReferenceLookup {
    fn entity_named(&self, name: &str) -> Option<EntityId>;
    fn entity_name(&self, id: EntityId) -> Option<String>;
}

/// Lookup for contexts that cannot hold entity references (schema defaults)
pub struct NoReferences;

impl ReferenceLookup for NoReferences {
    fn entity_named(&self, _name: &str) -> Option<EntityId> {
        None
    }

    fn entity_name(&self, _id: EntityId) -> Option<String> {
        None
    }
}

/// Parse a TOML value as a property of type `ty`.
///
/// Entity references are written as `{ entity = "Name" }`, assets as
/// `{ image = "name" }` or `{ texture = "name" }`.
pub fn value_from_toml(
    ty: &PropertyType,
    raw: &toml::Value,
    registry: &SchemaRegistry,
    refs: &dyn ReferenceLookup,
) -> Result<Value> {
    let mismatch = || TesseraError::mismatch(ty.type_name(), raw.type_str());
    match (ty, raw) {
        (PropertyType::Int, toml::Value::Integer(i)) => Ok(Value::Int(*i)),
        (PropertyType::Float, toml::Value::Float(f)) => Ok(Value::Float(*f)),
        (PropertyType::Float, toml::Value::Integer(i)) => Ok(Value::Float(*i as f64)),
        (PropertyType::Bool, toml::Value::Boolean(b)) => Ok(Value::Bool(*b)),
        (PropertyType::String, toml::Value::String(s)) => Ok(Value::String(s.clone())),
        (PropertyType::Enum { items }, toml::Value::String(s)) => {
            if items.contains(s) {
                Ok(Value::Enum(s.clone()))
            } else {
                Err(TesseraError::mismatch(
                    format!("one of {:?}", items),
                    s.clone(),
                ))
            }
        }
        (PropertyType::Vector { size, .. }, toml::Value::Array(items)) => {
            if items.len() != *size {
                return Err(mismatch());
            }
            let mut out = Vec::with_capacity(*size);
            for item in items {
                match item {
                    toml::Value::Float(f) => out.push(*f),
                    toml::Value::Integer(i) => out.push(*i as f64),
                    _ => return Err(mismatch()),
                }
            }
            Ok(Value::Vector(out))
        }
        (PropertyType::Reference { target }, toml::Value::Table(t)) => {
            if t.is_empty() {
                return Ok(Value::Reference(None));
            }
            let (key, name) = t
                .iter()
                .next()
                .and_then(|(k, v)| v.as_str().map(|n| (k.as_str(), n)))
                .ok_or_else(mismatch)?;
            let resolved = match (target, key) {
                (ReferenceTarget::Node | ReferenceTarget::Material, "entity") => {
                    let id = refs.entity_named(name).ok_or_else(|| {
                        TesseraError::DanglingReference(format!("entity '{}'", name))
                    })?;
                    Target::Entity(id)
                }
                (ReferenceTarget::Image, "image") => Target::Image(name.to_string()),
                (ReferenceTarget::Texture, "texture") => Target::Texture(name.to_string()),
                _ => return Err(mismatch()),
            };
            Ok(Value::Reference(Some(resolved)))
        }
        (PropertyType::Array { element }, toml::Value::Array(items)) => items
            .iter()
            .map(|item| value_from_toml(element, item, registry, refs))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        (PropertyType::Nested { schema }, toml::Value::Table(t)) => {
            let entry = registry
                .get(schema)
                .ok_or_else(|| TesseraError::SchemaNotFound(schema.clone()))?;
            let mut fields = BTreeMap::new();
            for prop in &entry.definition.properties {
                let value = match t.get(&prop.name) {
                    Some(v) => value_from_toml(&prop.ty, v, registry, refs)?,
                    None => default_value(&prop.ty, prop.default.as_ref(), registry),
                };
                fields.insert(prop.name.clone(), value);
            }
            Ok(Value::Nested(fields))
        }
        _ => Err(mismatch()),
    }
}

/// Render a value as TOML. Empty references and references to entities the
/// lookup cannot name render as `None` so the key is left out.
pub fn value_to_toml(value: &Value, refs: &dyn ReferenceLookup) -> Option<toml::Value> {
    let out = match value {
        Value::Int(i) => toml::Value::Integer(*i),
        Value::Float(f) => toml::Value::Float(*f),
        Value::Bool(b) => toml::Value::Boolean(*b),
        Value::String(s) | Value::Enum(s) => toml::Value::String(s.clone()),
        Value::Vector(v) => toml::Value::Array(v.iter().map(|f| toml::Value::Float(*f)).collect()),
        Value::Reference(None) => return None,
        Value::Reference(Some(target)) => {
            let (key, name) = match target {
                Target::Entity(id) => ("entity", refs.entity_name(*id)?),
                Target::Image(name) => ("image", name.clone()),
                Target::Texture(name) => ("texture", name.clone()),
            };
            let mut table = toml::map::Map::new();
            table.insert(key.to_string(), toml::Value::String(name));
            toml::Value::Table(table)
        }
        Value::Array(items) => {
            toml::Value::Array(items.iter().filter_map(|v| value_to_toml(v, refs)).collect())
        }
        Value::Nested(fields) => {
            let mut table = toml::map::Map::new();
            for (k, v) in fields {
                if let Some(v) = value_to_toml(v, refs) {
                    table.insert(k.clone(), v);
                }
            }
            toml::Value::Table(table)
        }
    };
    Some(out)
}
