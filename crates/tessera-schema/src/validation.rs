//! Validation of live values against property types

use crate::component::{PropertyType, ReferenceTarget, SchemaDefinition};
use crate::instance::ComponentInstance;
use crate::registry::SchemaRegistry;
use crate::value::{Target, Value};
use tessera_core::{Result, TesseraError};

/// Check every property of an instance against its schema
pub fn validate_instance(
    schema: &SchemaDefinition,
    instance: &ComponentInstance,
    registry: &SchemaRegistry,
) -> Result<()> {
    for prop in &schema.properties {
        if let Some(value) = instance.values.get(&prop.name) {
            validate_value(&prop.ty, value, registry)
                .map_err(|e| TesseraError::mismatch(format!("{}.{}", schema.id, prop.name), e.to_string()))?;
        }
    }
    Ok(())
}

/// Check that `value` has the shape `ty` declares
pub fn validate_value(ty: &PropertyType, value: &Value, registry: &SchemaRegistry) -> Result<()> {
    match (ty, value) {
        (PropertyType::Int, Value::Int(_)) => Ok(()),
        (PropertyType::Float, Value::Float(_) | Value::Int(_)) => Ok(()),
        (PropertyType::Bool, Value::Bool(_)) => Ok(()),
        (PropertyType::String, Value::String(_)) => Ok(()),
        (PropertyType::Enum { items }, Value::Enum(s)) => {
            if items.contains(s) {
                Ok(())
            } else {
                Err(TesseraError::mismatch(format!("one of {:?}", items), s.clone()))
            }
        }
        (PropertyType::Vector { size, .. }, Value::Vector(v)) => {
            if v.len() == *size {
                Ok(())
            } else {
                Err(TesseraError::mismatch(
                    ty.type_name(),
                    format!("vector of {}", v.len()),
                ))
            }
        }
        (PropertyType::Reference { .. }, Value::Reference(None)) => Ok(()),
        (PropertyType::Reference { target }, Value::Reference(Some(t))) => {
            let fits = matches!(
                (target, t),
                (ReferenceTarget::Node | ReferenceTarget::Material, Target::Entity(_))
                    | (ReferenceTarget::Image, Target::Image(_))
                    | (ReferenceTarget::Texture, Target::Texture(_))
            );
            if fits {
                Ok(())
            } else {
                Err(TesseraError::mismatch(ty.type_name(), format!("{:?}", t)))
            }
        }
        (PropertyType::Array { element }, Value::Array(items)) => {
            for item in items {
                validate_value(element, item, registry)?;
            }
            Ok(())
        }
        (PropertyType::Nested { schema }, Value::Nested(fields)) => {
            let nested = registry
                .get_schema(schema)
                .ok_or_else(|| TesseraError::SchemaNotFound(schema.clone()))?;
            for (name, field) in fields {
                let prop = nested.get_property(name).ok_or_else(|| {
                    TesseraError::mismatch(format!("a field of {}", schema), name.clone())
                })?;
                validate_value(&prop.ty, field, registry)?;
            }
            Ok(())
        }
        _ => Err(TesseraError::mismatch(ty.type_name(), value.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::PropertyDef;
    use std::collections::BTreeMap;

    #[test]
    fn test_scalar_checks() {
        let registry = SchemaRegistry::new();
        assert!(validate_value(&PropertyType::Float, &Value::Int(3), &registry).is_ok());
        assert!(validate_value(&PropertyType::Int, &Value::Float(3.0), &registry).is_err());
        assert!(validate_value(&PropertyType::String, &Value::Bool(true), &registry).is_err());
    }

    #[test]
    fn test_enum_membership() {
        let registry = SchemaRegistry::new();
        let ty = PropertyType::enumeration(&["box", "sphere"]);
        assert!(validate_value(&ty, &Value::Enum("box".into()), &registry).is_ok());
        assert!(validate_value(&ty, &Value::Enum("cone".into()), &registry).is_err());
    }

    #[test]
    fn test_reference_kinds() {
        let registry = SchemaRegistry::new();
        let ty = PropertyType::reference(ReferenceTarget::Texture);
        assert!(validate_value(&ty, &Value::Reference(None), &registry).is_ok());
        assert!(validate_value(
            &ty,
            &Value::Reference(Some(Target::Texture("sky".into()))),
            &registry
        )
        .is_ok());
        assert!(validate_value(
            &ty,
            &Value::Reference(Some(Target::Image("sky".into()))),
            &registry
        )
        .is_err());
    }

    #[test]
    fn test_validate_instance_names_property() {
        let registry = SchemaRegistry::new();
        let schema = SchemaDefinition::new("fog", "Fog")
            .property(PropertyDef::new("density", PropertyType::Float));
        let instance = ComponentInstance {
            schema_id: "fog".into(),
            version: schema.version.clone(),
            values: BTreeMap::from([("density".to_string(), Value::String("thick".into()))]),
        };
        let err = validate_instance(&schema, &instance, &registry).unwrap_err();
        assert!(err.to_string().contains("fog.density"));
    }
}
