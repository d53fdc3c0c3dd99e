//! Import handlers that undo what the gather overrides do to a record
//! before the generic apply runs

use crate::COLLISION_GROUPS;
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::{EntityKind, Result, TesseraError};
use tessera_interchange::{ImportHandler, ImportTarget, InterchangeHooks, Record, RecordMap};
use tessera_schema::{Target, Value};

fn expect_map(record: &Record) -> Result<&RecordMap> {
    record
        .as_map()
        .ok_or_else(|| TesseraError::mismatch("map", record.type_name()))
}

/// Copy of `record` with one field rewritten in place
fn with_field(record: &Record, key: &str, f: impl FnOnce(&mut Record)) -> Record {
    let mut out = record.clone();
    if let Some(field) = out.as_map_mut().and_then(|m| m.get_mut(key)) {
        f(field);
    }
    out
}

/// Swap the Y and Z entries of a vector record, list or map shaped
fn swap_yz(record: &mut Record) {
    match record {
        Record::List(items) if items.len() >= 3 => items.swap(1, 2),
        Record::Map(map) => {
            let y = map.remove("y");
            let z = map.remove("z");
            if let Some(z) = z {
                map.insert("y", z);
            }
            if let Some(y) = y {
                map.insert("z", y);
            }
        }
        _ => {}
    }
}

fn scale(record: &mut Record, factor: f64) {
    let scale_one = |r: &mut Record| {
        if let Some(f) = r.as_f64() {
            *r = Record::Float(f * factor);
        }
    };
    match record {
        Record::List(items) => items.iter_mut().for_each(scale_one),
        Record::Map(map) => {
            let keys: Vec<String> = map.keys().map(str::to_string).collect();
            for key in keys {
                if let Some(r) = map.get_mut(&key) {
                    scale_one(r);
                }
            }
        }
        _ => {}
    }
}

/// Moves vectors written in document space back to authoring space
struct DocumentSpaceImport {
    schema_id: &'static str,
    vectors: &'static [&'static str],
    /// Vectors exported at twice their stored size
    doubled: &'static [&'static str],
}

impl DocumentSpaceImport {
    fn restore(&self, record: &Record, y_up: bool) -> Record {
        let mut out = record.clone();
        for name in self.vectors {
            out = with_field(&out, name, |field| {
                if y_up {
                    swap_yz(field);
                }
                if self.doubled.contains(name) {
                    scale(field, 0.5);
                }
            });
        }
        out
    }
}

impl ImportHandler for DocumentSpaceImport {
    fn import(&self, target: &mut ImportTarget<'_>, record: &Record) -> Result<()> {
        expect_map(record)?;
        let restored = self.restore(record, target.ctx.settings.y_up);
        target.ensure(self.schema_id)?;
        target.apply(self.schema_id, &restored)
    }
}

/// Collision masks travel as a list of group names
struct RigidBodyImport {
    vectors: DocumentSpaceImport,
}

fn mask_from_names(record: &mut Record) {
    let Some(items) = record.as_list() else {
        return;
    };
    if !items.iter().all(|r| r.as_str().is_some()) {
        return;
    }
    let mask: Vec<Record> = COLLISION_GROUPS
        .iter()
        .map(|group| Record::Bool(items.iter().any(|r| r.as_str() == Some(*group))))
        .collect();
    *record = Record::List(mask);
}

impl ImportHandler for RigidBodyImport {
    fn import(&self, target: &mut ImportTarget<'_>, record: &Record) -> Result<()> {
        expect_map(record)?;
        let record = with_field(record, "collisionMask", mask_from_names);
        self.vectors.import(target, &record)
    }
}

/// Rebuilds the track list from the comma separated `clip` string
struct LoopAnimationImport;

fn track(name: &str) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("name".to_string(), Value::String(name.to_string()));
    fields.insert("trackName".to_string(), Value::String(name.to_string()));
    fields.insert("actionName".to_string(), Value::String(name.to_string()));
    fields.insert("trackType".to_string(), Value::Enum("object".to_string()));
    Value::Nested(fields)
}

impl ImportHandler for LoopAnimationImport {
    fn import(&self, target: &mut ImportTarget<'_>, record: &Record) -> Result<()> {
        let mut rest = expect_map(record)?.clone();
        let clip = rest.remove("clip");
        target.ensure("loop-animation")?;
        target.apply("loop-animation", &Record::Map(rest))?;

        match clip {
            Some(Record::String(clip)) => {
                let tracks = clip
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(track)
                    .collect();
                if let Some(instance) = target.instance_mut("loop-animation") {
                    instance.set("tracks", Value::Array(tracks));
                }
            }
            Some(other) => {
                let host = target.host();
                target.note(format!(
                    "Skipping loop-animation.clip on {}: expected string, got {}",
                    host,
                    other.type_name()
                ));
            }
            None => {}
        }
        Ok(())
    }
}

/// A `srcNode` pointing at a bone becomes the bone's owning node plus the
/// bone name
struct VideoTextureTargetImport;

impl ImportHandler for VideoTextureTargetImport {
    fn import(&self, target: &mut ImportTarget<'_>, record: &Record) -> Result<()> {
        target.ensure("video-texture-target")?;
        target.apply("video-texture-target", record)?;

        let source = target
            .world
            .get_instance(target.entity, "video-texture-target")
            .and_then(|i| i.get("srcNode"))
            .and_then(Value::as_target)
            .cloned();
        let Some(Target::Entity(bone)) = source else {
            return Ok(());
        };
        if target.world.kind(bone) != Some(EntityKind::Bone) {
            return Ok(());
        }

        let mut owner = target.world.get_parent(bone);
        while let Some(id) = owner {
            if target.world.kind(id) != Some(EntityKind::Bone) {
                break;
            }
            owner = target.world.get_parent(id);
        }
        let bone_name = target.world.get_name(bone).unwrap_or_default().to_string();
        match owner.filter(|id| target.world.kind(*id) == Some(EntityKind::Node)) {
            Some(node) => {
                if let Some(instance) = target.instance_mut("video-texture-target") {
                    instance.set("srcNode", Value::Reference(Some(Target::Entity(node))));
                    instance.set("bone", Value::String(bone_name));
                }
            }
            None => {
                let host = target.host();
                target.note(format!(
                    "Bone '{}' used by video-texture-target on {} has no owning node",
                    bone_name, host
                ));
            }
        }
        Ok(())
    }
}

/// Audio and video records may carry the audio params inline; those keys
/// go to the `audio-params` dependency
struct MediaImport {
    schema_id: &'static str,
}

impl ImportHandler for MediaImport {
    fn import(&self, target: &mut ImportTarget<'_>, record: &Record) -> Result<()> {
        let map = expect_map(record)?;
        let registry = target.registry();
        let own = registry.get_schema(self.schema_id);
        let params = registry.get_schema("audio-params");

        let mut main = RecordMap::new();
        let mut inline = RecordMap::new();
        for (key, value) in map.iter() {
            let is_param = params.is_some_and(|p| p.get_property(key).is_some())
                && !own.is_some_and(|s| s.get_property(key).is_some());
            if is_param {
                inline.insert(key, value.clone());
            } else {
                main.insert(key, value.clone());
            }
        }

        target.ensure(self.schema_id)?;
        target.apply(self.schema_id, &Record::Map(main))?;
        if !inline.is_empty() {
            target
                .world
                .ensure_dependency(registry, target.entity, "audio-params")?;
            target.apply("audio-params", &Record::Map(inline))?;
        }
        Ok(())
    }
}

pub(crate) fn register(hooks: InterchangeHooks) -> InterchangeHooks {
    hooks
        .with_import(
            "media-frame",
            Arc::new(DocumentSpaceImport {
                schema_id: "media-frame",
                vectors: &["bounds"],
                doubled: &["bounds"],
            }),
        )
        .with_import(
            "physics-shape",
            Arc::new(DocumentSpaceImport {
                schema_id: "physics-shape",
                vectors: &["offset", "halfExtents"],
                doubled: &[],
            }),
        )
        .with_import(
            "rigidbody",
            Arc::new(RigidBodyImport {
                vectors: DocumentSpaceImport {
                    schema_id: "rigidbody",
                    vectors: &["angularFactor", "gravity"],
                    doubled: &[],
                },
            }),
        )
        .with_import("loop-animation", Arc::new(LoopAnimationImport))
        .with_import("video-texture-target", Arc::new(VideoTextureTargetImport))
        .with_import("audio", Arc::new(MediaImport { schema_id: "audio" }))
        .with_import("video", Arc::new(MediaImport { schema_id: "video" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_map(x: f64, y: f64, z: f64) -> Record {
        let mut map = RecordMap::new();
        map.insert("x", Record::Float(x));
        map.insert("y", Record::Float(y));
        map.insert("z", Record::Float(z));
        Record::Map(map)
    }

    #[test]
    fn test_swap_yz_shapes() {
        let mut list = Record::List(vec![Record::Int(1), Record::Int(2), Record::Int(3)]);
        swap_yz(&mut list);
        assert_eq!(
            list,
            Record::List(vec![Record::Int(1), Record::Int(3), Record::Int(2)])
        );

        let mut map = vec_map(1.0, 2.0, 3.0);
        swap_yz(&mut map);
        let map = map.as_map().unwrap();
        assert_eq!(map.get("y"), Some(&Record::Float(3.0)));
        assert_eq!(map.get("z"), Some(&Record::Float(2.0)));
    }

    #[test]
    fn test_media_frame_restore() {
        let handler = DocumentSpaceImport {
            schema_id: "media-frame",
            vectors: &["bounds"],
            doubled: &["bounds"],
        };
        let mut payload = RecordMap::new();
        payload.insert("bounds", vec_map(2.0, 6.0, 4.0));
        let restored = handler.restore(&Record::Map(payload), true);
        let bounds = restored.as_map().unwrap().get("bounds").unwrap().as_map().unwrap();
        assert_eq!(bounds.get("x"), Some(&Record::Float(1.0)));
        assert_eq!(bounds.get("y"), Some(&Record::Float(2.0)));
        assert_eq!(bounds.get("z"), Some(&Record::Float(3.0)));
    }

    #[test]
    fn test_mask_from_names() {
        let mut mask = Record::List(vec![
            Record::String("objects".into()),
            Record::String("avatars".into()),
        ]);
        mask_from_names(&mut mask);
        assert_eq!(
            mask,
            Record::List(vec![
                Record::Bool(true),
                Record::Bool(false),
                Record::Bool(false),
                Record::Bool(true),
                Record::Bool(false),
            ])
        );

        let mut bools = Record::List(vec![Record::Bool(true)]);
        mask_from_names(&mut bools);
        assert_eq!(bools, Record::List(vec![Record::Bool(true)]));
    }
}
