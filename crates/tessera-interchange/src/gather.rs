//! Turning the components on one entity into extension records

use crate::codec::encode;
use crate::context::{ExportContext, HostRef};
use crate::hooks::InterchangeHooks;
use crate::record::{Record, RecordMap};
use std::collections::HashMap;
use tessera_core::{EntityId, Result, TesseraError};
use tessera_ecs::SceneWorld;
use tessera_schema::{
    default_value, ComponentInstance, PropertyType, SchemaDefinition, SchemaRegistry, Value,
};

type Resolve = Box<dyn FnOnce(&mut ExportContext<'_>) -> Result<Record>>;

/// A property whose record can only be built once every entity has a
/// position in the document
pub struct DeferredGather {
    pub owner: EntityId,
    pub component: String,
    pub key: String,
    resolve: Resolve,
}

impl DeferredGather {
    pub fn new(
        owner: EntityId,
        component: &str,
        key: &str,
        resolve: impl FnOnce(&mut ExportContext<'_>) -> Result<Record> + 'static,
    ) -> Self {
        Self {
            owner,
            component: component.to_string(),
            key: key.to_string(),
            resolve: Box::new(resolve),
        }
    }

    /// Encode `value` through the codec once positions are known
    pub fn encode_later(
        owner: EntityId,
        component: &str,
        key: &str,
        value: Value,
        ty: PropertyType,
    ) -> Self {
        Self::new(owner, component, key, move |ctx| encode(&value, &ty, ctx))
    }

    pub fn run(self, ctx: &mut ExportContext<'_>) -> Result<Record> {
        (self.resolve)(ctx)
    }
}

impl std::fmt::Debug for DeferredGather {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeferredGather({} {}.{})", self.owner, self.component, self.key)
    }
}

/// Encode one property. Forward references are queued on the context and
/// produce a `Null` placeholder; other failures are reported and also
/// produce `Null`.
pub fn gather_value(
    ctx: &mut ExportContext<'_>,
    host: &HostRef,
    component: &str,
    key: &str,
    value: &Value,
    ty: &PropertyType,
) -> Record {
    match encode(value, ty, ctx) {
        Ok(record) => record,
        Err(TesseraError::UnresolvedReference(_)) => {
            ctx.defer(DeferredGather::encode_later(
                host.id,
                component,
                key,
                value.clone(),
                ty.clone(),
            ));
            Record::Null
        }
        Err(e) => {
            ctx.warn(format!(
                "Failed to export {}.{} on {}: {}",
                component, key, host, e
            ));
            Record::Null
        }
    }
}

/// Encode every declared property of an instance in declaration order.
/// Values missing from the instance are taken from the schema defaults.
pub fn gather_properties(
    ctx: &mut ExportContext<'_>,
    host: &HostRef,
    instance: &ComponentInstance,
    schema: &SchemaDefinition,
) -> RecordMap {
    let registry: &SchemaRegistry = ctx.registry;
    let mut out = RecordMap::new();
    for prop in &schema.properties {
        let record = match instance.get(&prop.name) {
            Some(value) => gather_value(ctx, host, &schema.id, &prop.name, value, &prop.ty),
            None => {
                let value = default_value(&prop.ty, prop.default.as_ref(), registry);
                gather_value(ctx, host, &schema.id, &prop.name, &value, &prop.ty)
            }
        };
        out.insert(prop.name.clone(), record);
    }
    out
}

/// Build the record for one component, letting a registered override
/// take over
pub fn gather_component(
    ctx: &mut ExportContext<'_>,
    hooks: &InterchangeHooks,
    host: &HostRef,
    instance: &ComponentInstance,
    schema: &SchemaDefinition,
) -> Result<Record> {
    if let Some(hook) = hooks.gather_override(&schema.id) {
        return hook.gather(host, instance, schema, ctx);
    }
    if schema.properties.is_empty() {
        return Ok(Record::empty_component());
    }
    Ok(Record::Map(gather_properties(ctx, host, instance, schema)))
}

/// Gather every component on an entity, keyed by schema id
pub fn gather_entity<'a>(
    ctx: &mut ExportContext<'a>,
    hooks: &InterchangeHooks,
    id: EntityId,
) -> Result<RecordMap> {
    let world: &'a SceneWorld = ctx.world;
    let registry: &'a SchemaRegistry = ctx.registry;
    let host = HostRef::of(world, id)
        .ok_or_else(|| TesseraError::EntityNotFound(id.to_string()))?;
    let mut out = RecordMap::new();
    let Some(components) = world.components(id) else {
        return Ok(out);
    };

    for slot in components.iter() {
        let instance = &slot.instance;
        let Some(schema) = registry.get_schema(&instance.schema_id) else {
            ctx.warn(format!(
                "Skipping unknown component '{}' on {}",
                instance.schema_id, host
            ));
            continue;
        };
        match gather_component(ctx, hooks, &host, instance, schema) {
            Ok(record) => out.insert(schema.id.clone(), record),
            Err(e) => ctx.warn(format!(
                "Failed to export {} component on {}: {}",
                schema.display_name, host, e
            )),
        }

        for dep in &schema.dependencies {
            if components.has(dep) || out.contains_key(dep) {
                continue;
            }
            let Some(dep_schema) = registry.get_schema(dep) else {
                continue;
            };
            ctx.warn(format!(
                "{} on {} is missing its {} dependency, exporting defaults",
                schema.display_name, host, dep_schema.display_name
            ));
            let defaults = ComponentInstance::with_defaults(dep_schema, registry);
            match gather_component(ctx, hooks, &host, &defaults, dep_schema) {
                Ok(record) => out.insert(dep_schema.id.clone(), record),
                Err(e) => ctx.warn(format!(
                    "Failed to export {} component on {}: {}",
                    dep_schema.display_name, host, e
                )),
            }
        }
    }
    log::debug!("Gathered {} component(s) on {}", out.len(), host);
    Ok(out)
}

/// Run every queued gather and splice its record into the owner's
/// component record under the queued key
pub(crate) fn resolve_deferred(
    ctx: &mut ExportContext<'_>,
    records: &mut HashMap<EntityId, RecordMap>,
) {
    for gather in ctx.take_deferred() {
        let owner = gather.owner;
        let component = gather.component.clone();
        let key = gather.key.clone();
        let record = match gather.run(ctx) {
            Ok(record) => record,
            Err(e) => {
                ctx.warn(format!(
                    "Could not resolve {}.{} on entity {}: {}",
                    component, key, owner, e
                ));
                Record::Null
            }
        };
        let slot = records
            .get_mut(&owner)
            .and_then(|map| map.get_mut(&component))
            .and_then(Record::as_map_mut);
        match slot {
            Some(map) => map.insert(key, record),
            None => ctx.warn(format!(
                "No {} record on entity {} to receive {}",
                component, owner, key
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportSettings;
    use crate::hooks::GatherOverride;
    use crate::record::LinkKind;
    use std::sync::Arc;
    use tessera_core::EntityKind;
    use tessera_schema::{PropertyDef, ReferenceTarget, Target, Unit};

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register(SchemaDefinition::new("marker", "Marker"))
            .unwrap();
        registry
            .register(
                SchemaDefinition::new("mover", "Mover")
                    .property(PropertyDef::new("speed", PropertyType::Float).with_default(2.0))
                    .property(PropertyDef::new(
                        "offset",
                        PropertyType::vec3_with_unit(Unit::Length),
                    ))
                    .property(PropertyDef::new(
                        "target",
                        PropertyType::reference(ReferenceTarget::Node),
                    )),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_gather_declared_order_and_empty_marker() {
        let registry = registry();
        let mut world = SceneWorld::new();
        let cube = world.spawn("Cube", EntityKind::Node).unwrap();
        world.add_component(&registry, cube, "mover").unwrap();
        world.add_component(&registry, cube, "marker").unwrap();

        let settings = ExportSettings::default();
        let mut ctx = ExportContext::new(&registry, &world, &settings);
        ctx.assign_node(cube);
        let records = gather_entity(&mut ctx, &InterchangeHooks::new(), cube).unwrap();

        assert_eq!(records.keys().collect::<Vec<_>>(), vec!["mover", "marker"]);
        assert_eq!(
            records.get("marker").unwrap().to_json(),
            serde_json::json!({"__empty_component_dummy": null})
        );
        let mover = records.get("mover").unwrap().as_map().unwrap();
        assert_eq!(mover.keys().collect::<Vec<_>>(), vec!["speed", "offset", "target"]);
        assert_eq!(mover.get("speed"), Some(&Record::Float(2.0)));
        assert_eq!(mover.get("target"), Some(&Record::Null));
        assert_eq!(ctx.pending(), 0);
    }

    #[test]
    fn test_forward_reference_is_deferred_then_spliced() {
        let registry = registry();
        let mut world = SceneWorld::new();
        let a = world.spawn("A", EntityKind::Node).unwrap();
        let b = world.spawn("B", EntityKind::Node).unwrap();
        world.add_component(&registry, a, "mover").unwrap();
        world
            .set_value(&registry, a, "mover", "target", Value::Reference(Some(Target::Entity(b))))
            .unwrap();

        let settings = ExportSettings::default();
        let mut ctx = ExportContext::new(&registry, &world, &settings);
        ctx.assign_node(a);
        let hooks = InterchangeHooks::new();
        let mut records = HashMap::new();
        records.insert(a, gather_entity(&mut ctx, &hooks, a).unwrap());
        assert_eq!(ctx.pending(), 1);

        ctx.assign_node(b);
        resolve_deferred(&mut ctx, &mut records);
        assert_eq!(ctx.pending(), 0);

        let target = records[&a]
            .get("mover")
            .and_then(Record::as_map)
            .and_then(|m| m.get("target"))
            .cloned();
        assert_eq!(
            target,
            Some(Record::Reference {
                kind: LinkKind::Node,
                index: 1
            })
        );
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_unknown_schema_is_skipped_with_diagnostic() {
        let registry = registry();
        let mut world = SceneWorld::new();
        let cube = world.spawn("Cube", EntityKind::Node).unwrap();
        world.add_component(&registry, cube, "marker").unwrap();
        world.insert_instance(
            cube,
            ComponentInstance {
                schema_id: "retired".into(),
                version: tessera_schema::Version::new(1, 0, 0),
                values: Default::default(),
            },
            false,
        )
        .unwrap();

        let settings = ExportSettings::default();
        let mut ctx = ExportContext::new(&registry, &world, &settings);
        let records = gather_entity(&mut ctx, &InterchangeHooks::new(), cube).unwrap();
        assert_eq!(records.keys().collect::<Vec<_>>(), vec!["marker"]);
        assert_eq!(ctx.diagnostics().len(), 1);
        assert!(ctx.diagnostics()[0].contains("retired"));
    }

    struct Constant;

    impl GatherOverride for Constant {
        fn gather(
            &self,
            _host: &HostRef,
            _instance: &ComponentInstance,
            _schema: &SchemaDefinition,
            _ctx: &mut ExportContext<'_>,
        ) -> Result<Record> {
            Ok(Record::String("custom".into()))
        }
    }

    #[test]
    fn test_override_replaces_record() {
        let registry = registry();
        let mut world = SceneWorld::new();
        let cube = world.spawn("Cube", EntityKind::Node).unwrap();
        world.add_component(&registry, cube, "mover").unwrap();

        let hooks = InterchangeHooks::new().with_gather("mover", Arc::new(Constant));
        let settings = ExportSettings::default();
        let mut ctx = ExportContext::new(&registry, &world, &settings);
        let records = gather_entity(&mut ctx, &hooks, cube).unwrap();
        assert_eq!(records.get("mover"), Some(&Record::String("custom".into())));
    }

    #[test]
    fn test_gather_is_repeatable() {
        let registry = registry();
        let mut world = SceneWorld::new();
        let cube = world.spawn("Cube", EntityKind::Node).unwrap();
        world.add_component(&registry, cube, "mover").unwrap();

        let settings = ExportSettings::default();
        let hooks = InterchangeHooks::new();
        let mut ctx = ExportContext::new(&registry, &world, &settings);
        ctx.assign_node(cube);
        let first = gather_entity(&mut ctx, &hooks, cube).unwrap();
        let second = gather_entity(&mut ctx, &hooks, cube).unwrap();
        assert_eq!(first, second);
    }
}
