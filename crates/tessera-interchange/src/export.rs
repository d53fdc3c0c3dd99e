//! Whole-document export: walk the world, gather components, assemble glTF

use crate::config::ExportSettings;
use crate::context::ExportContext;
use crate::document::{Document, ImageDef, MaterialDef, NodeDef, SceneDef, SkinDef, TextureDef};
use crate::gather::{gather_entity, resolve_deferred};
use crate::hooks::InterchangeHooks;
use crate::record::{Record, RecordMap};
use crate::{EXTENSION_NAME, EXTENSION_VERSION};
use std::collections::HashMap;
use tessera_core::{EntityId, EntityKind, Result};
use tessera_ecs::SceneWorld;
use tessera_schema::SchemaRegistry;

/// The assembled document plus every recovered problem met on the way
#[derive(Debug)]
pub struct ExportOutput {
    pub document: Document,
    pub diagnostics: Vec<String>,
}

fn is_node(world: &SceneWorld, id: EntityId) -> bool {
    matches!(world.kind(id), Some(EntityKind::Node | EntityKind::Bone))
}

fn node_children(world: &SceneWorld, id: EntityId) -> Vec<EntityId> {
    world
        .get_children(id)
        .into_iter()
        .filter(|c| is_node(world, *c))
        .collect()
}

/// Nodes and bones that sit at the top of the node tree, either without a
/// parent or directly under a scene
fn root_nodes(world: &SceneWorld) -> Vec<EntityId> {
    world
        .entities()
        .iter()
        .copied()
        .filter(|id| is_node(world, *id))
        .filter(|id| match world.get_parent(*id) {
            None => true,
            Some(parent) => !is_node(world, parent),
        })
        .collect()
}

/// Order in which entities are gathered: materials, then scenes, then the
/// node tree depth first with siblings in spawn order
pub fn export_order(world: &SceneWorld) -> Vec<EntityId> {
    let mut order = world.entities_of_kind(EntityKind::Material);
    order.extend(world.entities_of_kind(EntityKind::Scene));

    let mut stack: Vec<EntityId> = root_nodes(world).into_iter().rev().collect();
    while let Some(id) = stack.pop() {
        order.push(id);
        stack.extend(node_children(world, id).into_iter().rev());
    }
    order
}

/// Bones below `id`, depth first, stopping at anything that is not a bone
fn bone_descendants(world: &SceneWorld, id: EntityId, out: &mut Vec<EntityId>) {
    for child in node_children(world, id) {
        if world.kind(child) == Some(EntityKind::Bone) {
            out.push(child);
            bone_descendants(world, child, out);
        }
    }
}

/// Export a world as a glTF document carrying component data
pub fn export_document(
    world: &SceneWorld,
    registry: &SchemaRegistry,
    hooks: &InterchangeHooks,
    settings: &ExportSettings,
) -> Result<ExportOutput> {
    let order = export_order(world);
    let mut ctx = ExportContext::new(registry, world, settings);

    // Materials are indexed up front so node components can point at them
    let materials = world.entities_of_kind(EntityKind::Material);
    for id in &materials {
        ctx.assign_material(*id);
    }

    let mut nodes = Vec::new();
    let mut records: HashMap<EntityId, RecordMap> = HashMap::new();
    for id in &order {
        if is_node(world, *id) {
            ctx.assign_node(*id);
            nodes.push(*id);
        }
        if settings.enabled {
            let gathered = gather_entity(&mut ctx, hooks, *id)?;
            records.insert(*id, gathered);
        }
    }
    if ctx.pending() > 0 {
        log::debug!("Resolving {} deferred gather(s)", ctx.pending());
    }
    resolve_deferred(&mut ctx, &mut records);

    let mut document = Document::default();
    document.asset.generator = Some(format!("Tessera {}", env!("CARGO_PKG_VERSION")));

    let mut wrote_components = false;
    let mut block_for = |id: EntityId| -> crate::document::JsonMap {
        let mut extensions = crate::document::JsonMap::new();
        if let Some(map) = records.remove(&id) {
            if !map.is_empty() {
                extensions.insert(EXTENSION_NAME.to_string(), Record::Map(map).to_json());
                wrote_components = true;
            }
        }
        extensions
    };

    for id in &nodes {
        let children = node_children(world, *id)
            .into_iter()
            .filter_map(|c| ctx.node_index(c))
            .collect();
        document.nodes.push(NodeDef {
            name: world.get_name(*id).map(String::from),
            children,
            extensions: block_for(*id),
            ..Default::default()
        });
    }

    for id in &materials {
        document.materials.push(MaterialDef {
            name: world.get_name(*id).map(String::from),
            extensions: block_for(*id),
            ..Default::default()
        });
    }

    let roots = root_nodes(world);
    let scenes = world.entities_of_kind(EntityKind::Scene);
    for (i, id) in scenes.iter().enumerate() {
        let members = roots
            .iter()
            .copied()
            .filter(|r| match world.get_parent(*r) {
                Some(parent) => parent == *id,
                // parentless roots belong to the first scene
                None => i == 0,
            })
            .filter_map(|r| ctx.node_index(r))
            .collect();
        document.scenes.push(SceneDef {
            name: world.get_name(*id).map(String::from),
            nodes: members,
            extensions: block_for(*id),
            ..Default::default()
        });
    }
    if document.scenes.is_empty() && !roots.is_empty() {
        document.scenes.push(SceneDef {
            name: Some("Scene".to_string()),
            nodes: roots.iter().filter_map(|r| ctx.node_index(*r)).collect(),
            ..Default::default()
        });
    }
    if !document.scenes.is_empty() {
        document.scene = Some(0);
    }

    for id in &nodes {
        if world.kind(*id) != Some(EntityKind::Node) {
            continue;
        }
        let mut joints = Vec::new();
        bone_descendants(world, *id, &mut joints);
        if joints.is_empty() {
            continue;
        }
        document.skins.push(SkinDef {
            joints: joints.iter().filter_map(|j| ctx.node_index(*j)).collect(),
            skeleton: ctx.node_index(*id),
            ..Default::default()
        });
    }

    for name in ctx.images() {
        let asset = world.image(name);
        document.images.push(ImageDef {
            name: Some(name.clone()),
            uri: asset
                .and_then(|a| a.uri.clone())
                .or_else(|| Some(name.clone())),
            mime_type: asset.and_then(|a| a.mime_type.clone()),
            ..Default::default()
        });
    }
    for source in ctx.textures() {
        document.textures.push(TextureDef {
            source: Some(*source),
            ..Default::default()
        });
    }

    if wrote_components {
        document.extensions.insert(
            EXTENSION_NAME.to_string(),
            serde_json::json!({
                "version": EXTENSION_VERSION,
                "exporterVersion": settings.exporter_version,
            }),
        );
        document.extensions_used.push(EXTENSION_NAME.to_string());
    }

    let diagnostics = ctx.into_diagnostics();
    log::info!(
        "Exported {} node(s), {} material(s) with {} diagnostic(s)",
        document.nodes.len(),
        document.materials.len(),
        diagnostics.len()
    );
    Ok(ExportOutput {
        document,
        diagnostics,
    })
}
