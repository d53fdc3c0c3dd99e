//! Conversion between live property values and interchange records

use crate::context::{ExportContext, ImportContext};
use crate::record::{LinkKind, Record, RecordMap};
use std::collections::BTreeMap;
use tessera_core::{Color, ColorSpace, EntityKind, Result, TesseraError};
use tessera_schema::{default_value, PropertyType, ReferenceTarget, Target, Value};

const AXES: [&str; 4] = ["x", "y", "z", "w"];

/// Encode `value`, declared as `ty`, into a record.
///
/// A node reference to an entity that has no position yet fails with
/// `UnresolvedReference`; the caller defers it until positions are known.
pub fn encode(value: &Value, ty: &PropertyType, ctx: &mut ExportContext<'_>) -> Result<Record> {
    let mismatch = || TesseraError::mismatch(ty.type_name(), value.type_name());
    match (ty, value) {
        (PropertyType::Int, Value::Int(i)) => Ok(Record::Int(*i)),
        (PropertyType::Float, Value::Float(f)) => Ok(Record::Float(*f)),
        (PropertyType::Float, Value::Int(i)) => Ok(Record::Float(*i as f64)),
        (PropertyType::Bool, Value::Bool(b)) => Ok(Record::Bool(*b)),
        (PropertyType::String, Value::String(s)) => Ok(Record::String(s.clone())),
        (PropertyType::Enum { .. }, Value::Enum(s)) => Ok(Record::String(s.clone())),
        (
            PropertyType::Vector {
                size,
                unit,
                subtype,
                integer,
            },
            Value::Vector(v),
        ) => {
            if v.len() != *size {
                return Err(mismatch());
            }
            if let Some(space) = ty.color_space() {
                return encode_color(v, space).ok_or_else(mismatch);
            }
            let number = |f: f64| {
                if *integer {
                    Record::Int(f.round() as i64)
                } else {
                    Record::Float(f)
                }
            };
            if unit.is_none() && subtype.is_none() {
                Ok(Record::List(v.iter().map(|f| number(*f)).collect()))
            } else {
                Ok(Record::Map(
                    AXES.iter()
                        .zip(v.iter())
                        .map(|(axis, f)| (axis.to_string(), number(*f)))
                        .collect(),
                ))
            }
        }
        (PropertyType::Reference { .. }, Value::Reference(None)) => Ok(Record::Null),
        (PropertyType::Reference { target }, Value::Reference(Some(t))) => {
            encode_reference(*target, t, ctx)
        }
        (PropertyType::Array { element }, Value::Array(items)) => items
            .iter()
            .map(|item| encode(item, element, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Record::List),
        (PropertyType::Nested { schema }, Value::Nested(fields)) => {
            let registry = ctx.registry;
            let nested = registry
                .get_schema(schema)
                .ok_or_else(|| TesseraError::SchemaNotFound(schema.clone()))?;
            let mut out = RecordMap::new();
            for prop in &nested.properties {
                let record = match fields.get(&prop.name) {
                    Some(v) => encode(v, &prop.ty, ctx)?,
                    None => {
                        let fallback = default_value(&prop.ty, prop.default.as_ref(), registry);
                        encode(&fallback, &prop.ty, ctx)?
                    }
                };
                out.insert(prop.name.clone(), record);
            }
            Ok(Record::Map(out))
        }
        _ => Err(mismatch()),
    }
}

/// Decode a record as a property of type `ty`
pub fn decode(record: &Record, ty: &PropertyType, ctx: &ImportContext<'_>) -> Result<Value> {
    let mismatch = || TesseraError::mismatch(ty.type_name(), record.type_name());
    match (ty, record) {
        (PropertyType::Int, Record::Int(i)) => Ok(Value::Int(*i)),
        (PropertyType::Int, Record::Float(f)) if f.fract() == 0.0 => Ok(Value::Int(*f as i64)),
        (PropertyType::Float, Record::Float(f)) => Ok(Value::Float(*f)),
        (PropertyType::Float, Record::Int(i)) => Ok(Value::Float(*i as f64)),
        (PropertyType::Bool, Record::Bool(b)) => Ok(Value::Bool(*b)),
        (PropertyType::String, Record::String(s)) => Ok(Value::String(s.clone())),
        (PropertyType::Enum { items }, Record::String(s)) => {
            if items.contains(s) {
                Ok(Value::Enum(s.clone()))
            } else {
                Err(TesseraError::mismatch(format!("one of {:?}", items), s.clone()))
            }
        }
        (PropertyType::Vector { size, .. }, _) => {
            if let Some(space) = ty.color_space() {
                let hex = record.as_str().ok_or_else(mismatch)?;
                let color = Color::from_hex(hex)
                    .ok_or_else(|| TesseraError::mismatch("#rrggbb color", hex))?;
                let color = match space {
                    ColorSpace::Linear => color.to_linear(),
                    ColorSpace::Gamma => color,
                };
                return Ok(Value::Vector(color.to_vec(*size)));
            }
            decode_vector(record, *size).map(Value::Vector).ok_or_else(mismatch)
        }
        (PropertyType::Reference { .. }, Record::Null) => Ok(Value::Reference(None)),
        (PropertyType::Reference { target }, _) => decode_reference(*target, record, ctx)
            .map(|t| Value::Reference(Some(t))),
        (PropertyType::Array { element }, Record::List(items)) => items
            .iter()
            .map(|item| decode(item, element, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        (PropertyType::Nested { schema }, Record::Map(map)) => {
            let nested = ctx
                .registry
                .get_schema(schema)
                .ok_or_else(|| TesseraError::SchemaNotFound(schema.clone()))?;
            let mut fields = BTreeMap::new();
            for prop in &nested.properties {
                let value = match map.get(&prop.name) {
                    Some(r) => decode(r, &prop.ty, ctx)?,
                    None => default_value(&prop.ty, prop.default.as_ref(), ctx.registry),
                };
                fields.insert(prop.name.clone(), value);
            }
            Ok(Value::Nested(fields))
        }
        _ => Err(mismatch()),
    }
}

fn encode_color(channels: &[f64], space: ColorSpace) -> Option<Record> {
    let color = Color::from_slice(channels)?;
    let srgb = match space {
        ColorSpace::Linear => color.to_srgb(),
        ColorSpace::Gamma => color,
    };
    Some(Record::String(srgb.to_hex()))
}

fn decode_vector(record: &Record, size: usize) -> Option<Vec<f64>> {
    match record {
        Record::List(items) if items.len() == size => {
            items.iter().map(Record::as_f64).collect()
        }
        Record::Map(map) => AXES[..size.min(4)]
            .iter()
            .map(|axis| map.get(axis).and_then(Record::as_f64))
            .collect(),
        _ => None,
    }
}

fn encode_reference(
    target: ReferenceTarget,
    value: &Target,
    ctx: &mut ExportContext<'_>,
) -> Result<Record> {
    match (target, value) {
        (ReferenceTarget::Node, Target::Entity(id)) => {
            let kind = ctx
                .world
                .kind(*id)
                .ok_or_else(|| TesseraError::DanglingReference(format!("entity {}", id)))?;
            if !matches!(kind, EntityKind::Node | EntityKind::Bone) {
                return Err(TesseraError::mismatch("node or bone", kind.as_str()));
            }
            match ctx.node_index(*id) {
                Some(index) => Ok(Record::Reference {
                    kind: LinkKind::Node,
                    index,
                }),
                None => Err(TesseraError::UnresolvedReference(id.to_string())),
            }
        }
        (ReferenceTarget::Material, Target::Entity(id)) => {
            let kind = ctx
                .world
                .kind(*id)
                .ok_or_else(|| TesseraError::DanglingReference(format!("entity {}", id)))?;
            if kind != EntityKind::Material {
                return Err(TesseraError::mismatch("material", kind.as_str()));
            }
            ctx.material_index(*id)
                .map(|i| Record::Int(i as i64))
                .ok_or_else(|| TesseraError::UnresolvedReference(id.to_string()))
        }
        (ReferenceTarget::Image, Target::Image(name)) => Ok(Record::Reference {
            kind: LinkKind::Image,
            index: ctx.image_index(name),
        }),
        (ReferenceTarget::Texture, Target::Texture(name)) => Ok(Record::Reference {
            kind: LinkKind::Texture,
            index: ctx.texture_index(name),
        }),
        _ => Err(TesseraError::mismatch(
            format!("ref<{}>", target.as_str()),
            format!("{:?}", value),
        )),
    }
}

fn decode_reference(
    target: ReferenceTarget,
    record: &Record,
    ctx: &ImportContext<'_>,
) -> Result<Target> {
    let dangling = |what: &str, index: usize| {
        TesseraError::DanglingReference(format!("{} index {}", what, index))
    };
    match (target, record) {
        (
            ReferenceTarget::Node,
            Record::Reference {
                kind: LinkKind::Node,
                index,
            },
        ) => ctx
            .nodes
            .get(*index)
            .map(|id| Target::Entity(*id))
            .ok_or_else(|| dangling("node", *index)),
        (ReferenceTarget::Material, Record::Int(i)) => {
            let index = usize::try_from(*i).map_err(|_| TesseraError::mismatch("material index", i.to_string()))?;
            ctx.materials
                .get(index)
                .map(|id| Target::Entity(*id))
                .ok_or_else(|| dangling("material", index))
        }
        (
            ReferenceTarget::Image,
            Record::Reference {
                kind: LinkKind::Image,
                index,
            },
        ) => ctx
            .images
            .get(*index)
            .map(|name| Target::Image(name.clone()))
            .ok_or_else(|| dangling("image", *index)),
        (
            ReferenceTarget::Texture,
            Record::Reference {
                kind: LinkKind::Texture,
                index,
            },
        ) => ctx
            .textures
            .get(*index)
            .and_then(|name| name.clone())
            .map(Target::Texture)
            .ok_or_else(|| dangling("texture", *index)),
        _ => Err(TesseraError::mismatch(
            format!("ref<{}>", target.as_str()),
            record.type_name(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportSettings, ImportSettings};
    use tessera_ecs::SceneWorld;
    use tessera_schema::{PropertyDef, SchemaDefinition, SchemaRegistry, Unit};

    fn round_trip(value: &Value, ty: &PropertyType) -> (Record, Value) {
        let registry = SchemaRegistry::new();
        let world = SceneWorld::new();
        let settings = ExportSettings::default();
        let mut ctx = ExportContext::new(&registry, &world, &settings);
        let record = encode(value, ty, &mut ctx).unwrap();

        let import_settings = ImportSettings::default();
        let import = ImportContext::new(&registry, &import_settings);
        let back = decode(&record, ty, &import).unwrap();
        (record, back)
    }

    #[test]
    fn test_vector_with_unit_encodes_as_map() {
        let ty = PropertyType::vec3_with_unit(Unit::Length);
        let value = Value::Vector(vec![1.0, 2.0, 3.0]);
        let (record, back) = round_trip(&value, &ty);
        assert_eq!(
            record.to_json(),
            serde_json::json!({"x": 1.0, "y": 2.0, "z": 3.0})
        );
        assert_eq!(back, value);
    }

    #[test]
    fn test_plain_vector_encodes_as_list() {
        let ty = PropertyType::vector(2);
        let (record, back) = round_trip(&Value::Vector(vec![0.5, 4.0]), &ty);
        assert_eq!(record, Record::List(vec![Record::Float(0.5), Record::Float(4.0)]));
        assert_eq!(back, Value::Vector(vec![0.5, 4.0]));
    }

    #[test]
    fn test_integer_vector() {
        let ty = PropertyType::Vector {
            size: 2,
            unit: None,
            subtype: None,
            integer: true,
        };
        let (record, back) = round_trip(&Value::Vector(vec![512.0, 512.0]), &ty);
        assert_eq!(record.to_json(), serde_json::json!([512, 512]));
        assert_eq!(back, Value::Vector(vec![512.0, 512.0]));
    }

    #[test]
    fn test_linear_color_round_trip() {
        let ty = PropertyType::color(3, ColorSpace::Linear);
        let value = Value::Vector(vec![0.5, 0.0, 1.0]);
        let (record, back) = round_trip(&value, &ty);

        let hex = record.as_str().unwrap();
        assert_eq!(hex.len(), 7);
        assert!(hex.starts_with('#'));
        assert_eq!(hex, "#bc00ff");

        let channels = back.as_vector().unwrap();
        for (got, want) in channels.iter().zip([0.5, 0.0, 1.0]) {
            assert!((got - want).abs() <= 1.0 / 255.0, "{} vs {}", got, want);
        }
    }

    #[test]
    fn test_gamma_color_is_written_as_is() {
        let ty = PropertyType::color(4, ColorSpace::Gamma);
        let (record, back) = round_trip(&Value::Vector(vec![1.0, 0.0, 0.0, 0.5]), &ty);
        assert_eq!(record, Record::String("#ff0000".into()));
        // alpha does not travel
        assert_eq!(back, Value::Vector(vec![1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_decode_rejects_wrong_shapes() {
        let registry = SchemaRegistry::new();
        let settings = ImportSettings::default();
        let ctx = ImportContext::new(&registry, &settings);

        let vec3 = PropertyType::vec3_with_unit(Unit::Length);
        assert!(decode(&Record::List(vec![Record::Int(1)]), &vec3, &ctx).is_err());
        assert!(decode(&Record::String("#12".into()), &PropertyType::color(3, ColorSpace::Linear), &ctx).is_err());
        assert!(decode(&Record::String("cone".into()), &PropertyType::enumeration(&["box"]), &ctx).is_err());
        assert!(matches!(
            decode(&Record::Bool(true), &PropertyType::String, &ctx),
            Err(TesseraError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_node_references() {
        let registry = SchemaRegistry::new();
        let mut world = SceneWorld::new();
        let a = world.spawn("A", EntityKind::Node).unwrap();
        let b = world.spawn("B", EntityKind::Bone).unwrap();
        let mat = world.spawn("M", EntityKind::Material).unwrap();
        let settings = ExportSettings::default();
        let mut ctx = ExportContext::new(&registry, &world, &settings);
        ctx.assign_node(a);

        let ty = PropertyType::reference(ReferenceTarget::Node);
        let to_a = Value::Reference(Some(Target::Entity(a)));
        let to_b = Value::Reference(Some(Target::Entity(b)));
        let to_mat = Value::Reference(Some(Target::Entity(mat)));
        let gone = Value::Reference(Some(Target::Entity(tessera_core::EntityId::new())));

        assert_eq!(
            encode(&to_a, &ty, &mut ctx).unwrap(),
            Record::Reference {
                kind: LinkKind::Node,
                index: 0
            }
        );
        assert!(matches!(
            encode(&to_b, &ty, &mut ctx),
            Err(TesseraError::UnresolvedReference(_))
        ));
        assert!(matches!(
            encode(&to_mat, &ty, &mut ctx),
            Err(TesseraError::TypeMismatch { .. })
        ));
        assert!(matches!(
            encode(&gone, &ty, &mut ctx),
            Err(TesseraError::DanglingReference(_))
        ));
    }

    #[test]
    fn test_decode_references() {
        let registry = SchemaRegistry::new();
        let settings = ImportSettings::default();
        let mut ctx = ImportContext::new(&registry, &settings);
        let node = tessera_core::EntityId::new();
        ctx.nodes.push(node);
        ctx.images.push("sky".into());
        ctx.textures.push(Some("sky".into()));

        let node_ty = PropertyType::reference(ReferenceTarget::Node);
        let tex_ty = PropertyType::reference(ReferenceTarget::Texture);
        let node_ref = Record::Reference {
            kind: LinkKind::Node,
            index: 0,
        };
        assert_eq!(
            decode(&node_ref, &node_ty, &ctx).unwrap(),
            Value::Reference(Some(Target::Entity(node)))
        );
        assert_eq!(decode(&Record::Null, &node_ty, &ctx).unwrap(), Value::Reference(None));
        assert!(matches!(
            decode(
                &Record::Reference {
                    kind: LinkKind::Node,
                    index: 9
                },
                &node_ty,
                &ctx
            ),
            Err(TesseraError::DanglingReference(_))
        ));
        // a node reference where a texture is expected
        assert!(matches!(
            decode(&node_ref, &tex_ty, &ctx),
            Err(TesseraError::TypeMismatch { .. })
        ));
        assert_eq!(
            decode(
                &Record::Reference {
                    kind: LinkKind::Texture,
                    index: 0
                },
                &tex_ty,
                &ctx
            )
            .unwrap(),
            Value::Reference(Some(Target::Texture("sky".into())))
        );
    }

    #[test]
    fn test_nested_array_round_trip() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                SchemaDefinition::new("clip", "Clip")
                    .property(PropertyDef::new("name", PropertyType::String))
                    .property(PropertyDef::new("loop", PropertyType::Bool).with_default(true)),
            )
            .unwrap();
        let ty = PropertyType::Array {
            element: Box::new(PropertyType::Nested {
                schema: "clip".into(),
            }),
        };
        let value = Value::Array(vec![Value::Nested(BTreeMap::from([
            ("name".to_string(), Value::String("idle".into())),
            ("loop".to_string(), Value::Bool(false)),
        ]))]);

        let world = SceneWorld::new();
        let settings = ExportSettings::default();
        let mut ctx = ExportContext::new(&registry, &world, &settings);
        let record = encode(&value, &ty, &mut ctx).unwrap();
        assert_eq!(
            record.to_json(),
            serde_json::json!([{"name": "idle", "loop": false}])
        );

        let import_settings = ImportSettings::default();
        let import = ImportContext::new(&registry, &import_settings);
        assert_eq!(decode(&record, &ty, &import).unwrap(), value);
    }
}
