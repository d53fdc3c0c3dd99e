//! Per-document state shared by the codec, gather and import code

use crate::config::{ExportSettings, ImportSettings};
use crate::gather::DeferredGather;
use std::collections::HashMap;
use tessera_core::{EntityId, EntityKind};
use tessera_ecs::SceneWorld;
use tessera_schema::SchemaRegistry;

/// The entity a component is being gathered from or imported into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRef {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
}

impl HostRef {
    pub fn of(world: &SceneWorld, id: EntityId) -> Option<Self> {
        Some(Self {
            id,
            kind: world.kind(id)?,
            name: world.get_name(id)?.to_string(),
        })
    }
}

impl std::fmt::Display for HostRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} \"{}\"", self.kind, self.name)
    }
}

/// Export state: entity positions in the document, the image and texture
/// tables, gathers waiting for positions, and diagnostics
pub struct ExportContext<'a> {
    pub registry: &'a SchemaRegistry,
    pub world: &'a SceneWorld,
    pub settings: &'a ExportSettings,
    nodes: HashMap<EntityId, usize>,
    materials: HashMap<EntityId, usize>,
    images: Vec<String>,
    /// texture index -> image index
    textures: Vec<usize>,
    deferred: Vec<DeferredGather>,
    diagnostics: Vec<String>,
}

impl<'a> ExportContext<'a> {
    pub fn new(
        registry: &'a SchemaRegistry,
        world: &'a SceneWorld,
        settings: &'a ExportSettings,
    ) -> Self {
        Self {
            registry,
            world,
            settings,
            nodes: HashMap::new(),
            materials: HashMap::new(),
            images: Vec::new(),
            textures: Vec::new(),
            deferred: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Give a node or bone the next position in the document's node array
    pub fn assign_node(&mut self, id: EntityId) -> usize {
        let next = self.nodes.len();
        *self.nodes.entry(id).or_insert(next)
    }

    pub fn assign_material(&mut self, id: EntityId) -> usize {
        let next = self.materials.len();
        *self.materials.entry(id).or_insert(next)
    }

    pub fn node_index(&self, id: EntityId) -> Option<usize> {
        self.nodes.get(&id).copied()
    }

    pub fn material_index(&self, id: EntityId) -> Option<usize> {
        self.materials.get(&id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Index of an image in the document, adding it on first use
    pub fn image_index(&mut self, name: &str) -> usize {
        match self.images.iter().position(|n| n == name) {
            Some(i) => i,
            None => {
                self.images.push(name.to_string());
                self.images.len() - 1
            }
        }
    }

    /// Index of a texture sampling the named image, adding both on first use
    pub fn texture_index(&mut self, image: &str) -> usize {
        let source = self.image_index(image);
        match self.textures.iter().position(|s| *s == source) {
            Some(i) => i,
            None => {
                self.textures.push(source);
                self.textures.len() - 1
            }
        }
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn textures(&self) -> &[usize] {
        &self.textures
    }

    pub fn defer(&mut self, gather: DeferredGather) {
        self.deferred.push(gather);
    }

    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    pub(crate) fn take_deferred(&mut self) -> Vec<DeferredGather> {
        std::mem::take(&mut self.deferred)
    }

    /// Record a recovered problem
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.diagnostics.push(message);
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub(crate) fn into_diagnostics(self) -> Vec<String> {
        self.diagnostics
    }
}

/// Import state: document indices mapped back to entities and asset names
pub struct ImportContext<'a> {
    pub registry: &'a SchemaRegistry,
    pub settings: &'a ImportSettings,
    pub nodes: Vec<EntityId>,
    pub materials: Vec<EntityId>,
    pub images: Vec<String>,
    /// Image name each texture samples, if it has a usable source
    pub textures: Vec<Option<String>>,
}

impl<'a> ImportContext<'a> {
    pub fn new(registry: &'a SchemaRegistry, settings: &'a ImportSettings) -> Self {
        Self {
            registry,
            settings,
            nodes: Vec::new(),
            materials: Vec::new(),
            images: Vec::new(),
            textures: Vec::new(),
        }
    }
}
