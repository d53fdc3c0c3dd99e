//! Reading component data out of a glTF document into a new world

use crate::codec::decode;
use crate::config::ImportSettings;
use crate::context::{HostRef, ImportContext};
use crate::document::{component_block, Document, JsonMap};
use crate::hooks::InterchangeHooks;
use crate::record::{Record, EMPTY_COMPONENT_KEY};
use crate::EXTENSION_VERSION;
use std::collections::HashSet;
use tessera_core::{EntityId, EntityKind, Result, TesseraError};
use tessera_ecs::{ImageAsset, SceneWorld};
use tessera_schema::{ComponentInstance, PropertyType, SchemaRegistry, Value};

/// Problems met during import that did not stop it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub entries: Vec<String>,
}

impl ImportReport {
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.entries.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct ImportOutput {
    pub world: SceneWorld,
    pub report: ImportReport,
}

/// The entity one component record is being imported into
pub struct ImportTarget<'t> {
    pub world: &'t mut SceneWorld,
    pub ctx: &'t ImportContext<'t>,
    pub entity: EntityId,
    report: &'t mut ImportReport,
}

impl<'t> ImportTarget<'t> {
    pub fn new(
        world: &'t mut SceneWorld,
        ctx: &'t ImportContext<'t>,
        entity: EntityId,
        report: &'t mut ImportReport,
    ) -> Self {
        Self {
            world,
            ctx,
            entity,
            report,
        }
    }

    pub fn registry(&self) -> &'t SchemaRegistry {
        self.ctx.registry
    }

    pub fn host(&self) -> HostRef {
        HostRef::of(self.world, self.entity).unwrap_or(HostRef {
            id: self.entity,
            kind: EntityKind::Node,
            name: self.entity.to_string(),
        })
    }

    pub fn kind(&self) -> Option<EntityKind> {
        self.world.kind(self.entity)
    }

    /// Attach a component if it is not there yet
    pub fn ensure(&mut self, schema_id: &str) -> Result<bool> {
        self.world
            .ensure_component(self.ctx.registry, self.entity, schema_id)
    }

    pub fn instance_mut(&mut self, schema_id: &str) -> Option<&mut ComponentInstance> {
        self.world.get_instance_mut(self.entity, schema_id)
    }

    /// Set one property, checked against its declared type
    pub fn set(&mut self, schema_id: &str, property: &str, value: Value) -> Result<()> {
        self.world
            .set_value(self.ctx.registry, self.entity, schema_id, property, value)
    }

    pub fn decode(&self, record: &Record, ty: &PropertyType) -> Result<Value> {
        decode(record, ty, self.ctx)
    }

    /// Add a line to the import report
    pub fn note(&mut self, message: impl Into<String>) {
        self.report.push(message);
    }

    /// Decode every key of a map record into an attached component.
    /// Unknown keys and values that fail to decode are reported and
    /// skipped.
    pub fn apply(&mut self, schema_id: &str, record: &Record) -> Result<()> {
        let registry = self.ctx.registry;
        let schema = registry
            .get_schema(schema_id)
            .ok_or_else(|| TesseraError::SchemaNotFound(schema_id.to_string()))?;
        let map = record
            .as_map()
            .ok_or_else(|| TesseraError::mismatch("map", record.type_name()))?;
        if self.world.get_instance(self.entity, schema_id).is_none() {
            return Err(TesseraError::ComponentNotFound(schema_id.to_string()));
        }

        let host = self.host();
        for (key, raw) in map.iter() {
            if key == EMPTY_COMPONENT_KEY {
                continue;
            }
            let Some(prop) = schema.get_property(key) else {
                self.note(format!(
                    "Ignoring unknown property '{}' of {} on {}",
                    key, schema_id, host
                ));
                continue;
            };
            match decode(raw, &prop.ty, self.ctx) {
                Ok(value) => {
                    if let Some(instance) = self.instance_mut(schema_id) {
                        instance.set(key, value);
                    }
                }
                Err(e) => self.note(format!(
                    "Skipping {}.{} on {}: {}",
                    schema_id, key, host, e
                )),
            }
        }
        Ok(())
    }
}

/// Import one component record. A registered handler for the name wins;
/// otherwise the name must be a registered schema.
pub fn import_component(
    target: &mut ImportTarget<'_>,
    hooks: &InterchangeHooks,
    schema_id: &str,
    record: &Record,
) -> Result<()> {
    if let Some(handler) = hooks.import_handler(schema_id) {
        return handler.import(target, record);
    }
    if !target.registry().contains(schema_id) {
        return Err(TesseraError::UnknownComponent(schema_id.to_string()));
    }
    target.ensure(schema_id)?;
    target.apply(schema_id, record)
}

fn import_block(
    world: &mut SceneWorld,
    ctx: &ImportContext<'_>,
    hooks: &InterchangeHooks,
    report: &mut ImportReport,
    entity: EntityId,
    extensions: &JsonMap,
) {
    let Some(block) = component_block(extensions) else {
        return;
    };
    for (name, raw) in block {
        let record = Record::from_json(raw);
        let result = {
            let mut target = ImportTarget::new(world, ctx, entity, report);
            import_component(&mut target, hooks, name, &record)
        };
        if let Err(e) = result {
            let host = HostRef::of(world, entity)
                .map(|h| h.to_string())
                .unwrap_or_else(|| entity.to_string());
            match e {
                TesseraError::UnknownComponent(_) => report.push(format!(
                    "Could not import unsupported component '{}' on {}",
                    name, host
                )),
                other => report.push(format!(
                    "Failed to import {} component on {}: {}",
                    name, host, other
                )),
            }
        }
    }
}

/// Build a world from a document: images and textures first, then every
/// scene, material, node and bone, then component data
pub fn import_document(
    document: &Document,
    registry: &SchemaRegistry,
    hooks: &InterchangeHooks,
    settings: &ImportSettings,
) -> Result<ImportOutput> {
    let mut world = SceneWorld::new();
    let mut report = ImportReport::default();
    let mut ctx = ImportContext::new(registry, settings);

    if let Some(version) = document
        .component_extension()
        .and_then(|root| root.get("version"))
        .and_then(|v| v.as_u64())
    {
        if version > EXTENSION_VERSION {
            report.push(format!(
                "Document was written with component extension version {}, newer than {}; some data may not import",
                version, EXTENSION_VERSION
            ));
        }
    }

    for (i, image) in document.images.iter().enumerate() {
        let base = image
            .name
            .clone()
            .or_else(|| image.uri.clone())
            .unwrap_or_else(|| format!("image_{}", i));
        let mut name = base.clone();
        let mut n = 0;
        while world.image(&name).is_some() {
            n += 1;
            name = format!("{}.{:03}", base, n);
        }
        world.add_image(
            name.clone(),
            ImageAsset {
                uri: image.uri.clone(),
                mime_type: image.mime_type.clone(),
            },
        );
        ctx.images.push(name);
    }
    ctx.textures = document
        .textures
        .iter()
        .map(|t| t.image_source().and_then(|s| ctx.images.get(s).cloned()))
        .collect();

    let joints: HashSet<usize> = document
        .skins
        .iter()
        .flat_map(|s| s.joints.iter().copied())
        .collect();

    let mut scenes = Vec::new();
    for scene in &document.scenes {
        let name = world.unique_name(scene.name.as_deref().unwrap_or("Scene"));
        scenes.push(world.spawn(name, EntityKind::Scene)?);
    }
    for material in &document.materials {
        let name = world.unique_name(material.name.as_deref().unwrap_or("Material"));
        let id = world.spawn(name, EntityKind::Material)?;
        ctx.materials.push(id);
    }
    for (i, node) in document.nodes.iter().enumerate() {
        let kind = if joints.contains(&i) {
            EntityKind::Bone
        } else {
            EntityKind::Node
        };
        let name = world.unique_name(node.name.as_deref().unwrap_or("Node"));
        let id = world.spawn(name, kind)?;
        ctx.nodes.push(id);
    }

    for (i, node) in document.nodes.iter().enumerate() {
        for child in &node.children {
            match ctx.nodes.get(*child) {
                Some(c) => world.set_parent(*c, ctx.nodes[i])?,
                None => report.push(format!("Node {} lists missing child {}", i, child)),
            }
        }
    }
    for (scene, def) in scenes.iter().zip(&document.scenes) {
        for root in &def.nodes {
            if let Some(id) = ctx.nodes.get(*root) {
                if world.get_parent(*id).is_none() {
                    world.set_parent(*id, *scene)?;
                }
            }
        }
    }

    if settings.enabled {
        for (id, def) in scenes.iter().zip(&document.scenes) {
            import_block(&mut world, &ctx, hooks, &mut report, *id, &def.extensions);
        }
        for (id, def) in ctx.nodes.iter().zip(&document.nodes) {
            import_block(&mut world, &ctx, hooks, &mut report, *id, &def.extensions);
        }
        for (id, def) in ctx.materials.iter().zip(&document.materials) {
            import_block(&mut world, &ctx, hooks, &mut report, *id, &def.extensions);
        }
    }

    log::info!(
        "Imported {} entities with {} report entries",
        world.len(),
        report.len()
    );
    Ok(ImportOutput { world, report })
}
