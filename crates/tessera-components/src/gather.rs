//! Export overrides for components whose glTF form differs from their
//! authoring form

use crate::behaviors::new_network_id;
use crate::COLLISION_GROUPS;
use std::sync::Arc;
use tessera_core::{EntityId, EntityKind, Result};
use tessera_ecs::SceneWorld;
use tessera_interchange::{
    gather_properties, ExportContext, GatherOverride, HostRef, InterchangeHooks,
    Record, RecordMap,
};
use tessera_schema::{default_value, ComponentInstance, SchemaDefinition, Target, Value};

const AXES: [&str; 3] = ["x", "y", "z"];

/// Prefixes of track names the editor generates on its own
const GENERATED_TRACK_PREFIXES: [&str; 2] = ["NlaTrack", "[Action Stash]"];

/// The stored vector, or the schema default when the instance lacks it
fn vector_or_default(
    instance: &ComponentInstance,
    schema: &SchemaDefinition,
    name: &str,
    ctx: &ExportContext<'_>,
) -> Option<Vec<f64>> {
    if let Some(v) = instance.get_vector(name) {
        return Some(v.to_vec());
    }
    let prop = schema.get_property(name)?;
    default_value(&prop.ty, prop.default.as_ref(), ctx.registry)
        .as_vector()
        .map(<[f64]>::to_vec)
}

/// Swap Y and Z when the document is written Y-up
fn to_document_axes(mut v: Vec<f64>, y_up: bool) -> Vec<f64> {
    if y_up && v.len() >= 3 {
        v.swap(1, 2);
    }
    v
}

fn axis_map(v: &[f64]) -> Record {
    Record::Map(
        AXES.iter()
            .zip(v)
            .map(|(axis, f)| (axis.to_string(), Record::Float(*f)))
            .collect(),
    )
}

fn float_list(v: &[f64]) -> Record {
    Record::List(v.iter().map(|f| Record::Float(*f)).collect())
}

struct NetworkedGather;

impl GatherOverride for NetworkedGather {
    fn gather(
        &self,
        _host: &HostRef,
        instance: &ComponentInstance,
        _schema: &SchemaDefinition,
        _ctx: &mut ExportContext<'_>,
    ) -> Result<Record> {
        let id = instance
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(new_network_id);
        let mut out = RecordMap::new();
        out.insert("id", Record::String(id));
        Ok(Record::Map(out))
    }
}

/// The runtime wants full extents rather than half extents
struct MediaFrameGather;

impl GatherOverride for MediaFrameGather {
    fn gather(
        &self,
        host: &HostRef,
        instance: &ComponentInstance,
        schema: &SchemaDefinition,
        ctx: &mut ExportContext<'_>,
    ) -> Result<Record> {
        let mut out = gather_properties(ctx, host, instance, schema);
        if let Some(bounds) = vector_or_default(instance, schema, "bounds", ctx) {
            let doubled = bounds.iter().map(|b| b * 2.0).collect();
            out.insert("bounds", axis_map(&to_document_axes(doubled, ctx.settings.y_up)));
        }
        Ok(Record::Map(out))
    }
}

struct PhysicsShapeGather;

impl GatherOverride for PhysicsShapeGather {
    fn gather(
        &self,
        host: &HostRef,
        instance: &ComponentInstance,
        schema: &SchemaDefinition,
        ctx: &mut ExportContext<'_>,
    ) -> Result<Record> {
        let mut out = gather_properties(ctx, host, instance, schema);
        for name in ["offset", "halfExtents"] {
            if let Some(v) = vector_or_default(instance, schema, name, ctx) {
                out.insert(name, axis_map(&to_document_axes(v, ctx.settings.y_up)));
            }
        }
        Ok(Record::Map(out))
    }
}

struct RigidBodyGather;

impl GatherOverride for RigidBodyGather {
    fn gather(
        &self,
        host: &HostRef,
        instance: &ComponentInstance,
        schema: &SchemaDefinition,
        ctx: &mut ExportContext<'_>,
    ) -> Result<Record> {
        let mut out = gather_properties(ctx, host, instance, schema);
        for name in ["angularFactor", "gravity"] {
            if let Some(v) = vector_or_default(instance, schema, name, ctx) {
                out.insert(name, float_list(&to_document_axes(v, ctx.settings.y_up)));
            }
        }

        let mask = match instance.get("collisionMask") {
            Some(Value::Array(items)) => items.iter().map(|v| v.as_bool() == Some(true)).collect(),
            _ => vec![true, true, true, false, false],
        };
        let groups = COLLISION_GROUPS
            .iter()
            .zip(&mask)
            .filter(|(_, on)| **on)
            .map(|(group, _)| Record::String(group.to_string()))
            .collect();
        out.insert("collisionMask", Record::List(groups));
        Ok(Record::Map(out))
    }
}

/// Whether `ancestor` sits somewhere above `id` in the entity tree
fn descends_from(world: &SceneWorld, id: EntityId, ancestor: EntityId) -> bool {
    let mut current = world.get_parent(id);
    while let Some(parent) = current {
        if parent == ancestor {
            return true;
        }
        current = world.get_parent(parent);
    }
    false
}

/// Points `srcNode` at a bone of the source node when `bone` names one
struct VideoTextureTargetGather;

impl GatherOverride for VideoTextureTargetGather {
    fn gather(
        &self,
        host: &HostRef,
        instance: &ComponentInstance,
        schema: &SchemaDefinition,
        ctx: &mut ExportContext<'_>,
    ) -> Result<Record> {
        let mut resolved = instance.clone();
        let bone = instance
            .get("bone")
            .and_then(Value::as_str)
            .filter(|b| !b.is_empty());
        let source = match instance.get("srcNode").and_then(Value::as_target) {
            Some(Target::Entity(id)) => Some(*id),
            _ => None,
        };
        if let (Some(bone), Some(source)) = (bone, source) {
            let world = ctx.world;
            match world.get_id(bone).filter(|id| {
                world.kind(*id) == Some(EntityKind::Bone) && descends_from(world, *id, source)
            }) {
                Some(bone_id) => {
                    resolved.set("srcNode", Value::Reference(Some(Target::Entity(bone_id))))
                }
                None => ctx.warn(format!(
                    "Bone '{}' of {} on {} not found under the source node, exporting the source node",
                    bone, schema.display_name, host
                )),
            }
        }

        let mut out = gather_properties(ctx, host, &resolved, schema);
        out.remove("bone");
        Ok(Record::Map(out))
    }
}

/// Tracks travel as one comma separated `clip` string
struct LoopAnimationGather;

fn is_generated_track_name(name: &str) -> bool {
    GENERATED_TRACK_PREFIXES.iter().any(|p| name.starts_with(p))
}

impl GatherOverride for LoopAnimationGather {
    fn gather(
        &self,
        _host: &HostRef,
        instance: &ComponentInstance,
        _schema: &SchemaDefinition,
        _ctx: &mut ExportContext<'_>,
    ) -> Result<Record> {
        let mut names = Vec::new();
        if let Some(Value::Array(tracks)) = instance.get("tracks") {
            for track in tracks {
                let Value::Nested(fields) = track else {
                    continue;
                };
                let field = |k: &str| fields.get(k).and_then(Value::as_str).unwrap_or_default();
                let track_name = field("trackName");
                if is_generated_track_name(track_name) {
                    names.push(field("actionName").to_string());
                } else {
                    names.push(track_name.to_string());
                }
            }
        }

        let mut out = RecordMap::new();
        out.insert("clip", Record::String(names.join(",")));
        out.insert(
            "paused",
            Record::Bool(instance.get_bool("paused").unwrap_or(false)),
        );
        Ok(Record::Map(out))
    }
}

pub(crate) fn register(hooks: InterchangeHooks) -> InterchangeHooks {
    hooks
        .with_gather("networked", Arc::new(NetworkedGather))
        .with_gather("media-frame", Arc::new(MediaFrameGather))
        .with_gather("physics-shape", Arc::new(PhysicsShapeGather))
        .with_gather("rigidbody", Arc::new(RigidBodyGather))
        .with_gather("video-texture-target", Arc::new(VideoTextureTargetGather))
        .with_gather("loop-animation", Arc::new(LoopAnimationGather))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_axes() {
        assert_eq!(to_document_axes(vec![1.0, 2.0, 3.0], true), vec![1.0, 3.0, 2.0]);
        assert_eq!(to_document_axes(vec![1.0, 2.0, 3.0], false), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_generated_track_names() {
        assert!(is_generated_track_name("NlaTrack.001"));
        assert!(is_generated_track_name("[Action Stash]"));
        assert!(!is_generated_track_name("Walk"));
    }
}
