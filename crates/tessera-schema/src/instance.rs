//! Component instances

use crate::component::SchemaDefinition;
use crate::registry::SchemaRegistry;
use crate::value::{default_value, Value};
use semver::Version;
use std::collections::BTreeMap;

/// The live data of one component attached to one entity.
///
/// `version` is the schema version the data was last written or migrated
/// with. It can lag the registered schema until migration runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInstance {
    pub schema_id: String,
    pub version: Version,
    pub values: BTreeMap<String, Value>,
}

impl ComponentInstance {
    /// Create an instance at the schema's current version with every
    /// property set to its default
    pub fn with_defaults(schema: &SchemaDefinition, registry: &SchemaRegistry) -> Self {
        let values = schema
            .properties
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    default_value(&p.ty, p.default.as_ref(), registry),
                )
            })
            .collect();
        Self {
            schema_id: schema.id.clone(),
            version: schema.version.clone(),
            values,
        }
    }

    /// Give every declared property the instance does not hold its schema
    /// default. Returns the names that were filled in.
    pub fn fill_defaults(
        &mut self,
        schema: &SchemaDefinition,
        registry: &SchemaRegistry,
    ) -> Vec<String> {
        let mut filled = Vec::new();
        for prop in &schema.properties {
            if !self.values.contains_key(&prop.name) {
                self.values.insert(
                    prop.name.clone(),
                    default_value(&prop.ty, prop.default.as_ref(), registry),
                );
                filled.push(prop.name.clone());
            }
        }
        filled
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_vector(&self, name: &str) -> Option<&[f64]> {
        self.get(name).and_then(Value::as_vector)
    }

    /// Swap two axes of a vector property in place; no-op when the
    /// property is missing or too short
    pub fn swap_axes(&mut self, name: &str, a: usize, b: usize) -> bool {
        match self.values.get_mut(name) {
            Some(Value::Vector(v)) if v.len() > a.max(b) => {
                v.swap(a, b);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{PropertyDef, PropertyType, Unit};

    #[test]
    fn test_defaults_and_version() {
        let registry = SchemaRegistry::new();
        let schema = SchemaDefinition::new("physics-shape", "Physics Shape")
            .version(Version::new(1, 0, 1))
            .property(
                PropertyDef::new("halfExtents", PropertyType::vec3_with_unit(Unit::Length))
                    .with_default(toml::Value::Array(vec![
                        toml::Value::Float(0.5),
                        toml::Value::Float(0.5),
                        toml::Value::Float(0.5),
                    ])),
            )
            .property(PropertyDef::new("fit", PropertyType::enumeration(&["all", "manual"])));

        let instance = ComponentInstance::with_defaults(&schema, &registry);
        assert_eq!(instance.version, Version::new(1, 0, 1));
        assert_eq!(instance.get_vector("halfExtents"), Some(&[0.5, 0.5, 0.5][..]));
        assert_eq!(instance.get("fit"), Some(&Value::Enum("all".into())));
    }

    #[test]
    fn test_swap_axes() {
        let mut instance = ComponentInstance {
            schema_id: "rigidbody".into(),
            version: Version::new(1, 0, 0),
            values: BTreeMap::from([("gravity".to_string(), Value::Vector(vec![0.0, -9.8, 1.0]))]),
        };
        assert!(instance.swap_axes("gravity", 1, 2));
        assert_eq!(instance.get_vector("gravity"), Some(&[0.0, 1.0, -9.8][..]));
        assert!(!instance.swap_axes("missing", 1, 2));
    }

    #[test]
    fn test_fill_defaults_keeps_stored_values() {
        let registry = SchemaRegistry::new();
        let schema = SchemaDefinition::new("fog", "Fog")
            .property(PropertyDef::new("near", PropertyType::Float).with_default(toml::Value::Float(1.0)))
            .property(PropertyDef::new("far", PropertyType::Float).with_default(toml::Value::Float(100.0)));
        let mut instance = ComponentInstance {
            schema_id: "fog".into(),
            version: Version::new(0, 1, 0),
            values: BTreeMap::from([("far".to_string(), Value::Float(40.0))]),
        };

        assert_eq!(instance.fill_defaults(&schema, &registry), vec!["near".to_string()]);
        assert_eq!(instance.get_f64("near"), Some(1.0));
        assert_eq!(instance.get_f64("far"), Some(40.0));
        assert!(instance.fill_defaults(&schema, &registry).is_empty());
    }
}
