//! Tessera Interchange - component data in glTF documents
//!
//! Components travel in the `MOZ_hubs_components` extension: each node,
//! material or scene carries a map from schema id to a record. This crate
//! turns live component state into those records and back, resolving
//! references to other entities, images and textures along the way.

mod codec;
pub mod config;
mod context;
mod document;
mod export;
mod gather;
mod hooks;
mod import;
mod record;

pub use codec::{decode, encode};
pub use config::{ExportSettings, ImportSettings, TesseraConfig};
pub use context::{ExportContext, HostRef, ImportContext};
pub use document::{
    component_block, Asset, Document, ImageDef, JsonMap, MaterialDef, NodeDef, SceneDef, SkinDef, TextureDef,
};
pub use export::{export_document, export_order, ExportOutput};
pub use gather::{gather_component, gather_entity, gather_properties, gather_value, DeferredGather};
pub use hooks::{GatherOverride, ImportHandler, InterchangeHooks};
pub use import::{import_component, import_document, ImportOutput, ImportReport, ImportTarget};
pub use record::{LinkKind, Record, RecordMap, EMPTY_COMPONENT_KEY, LINK_TYPE_KEY};

/// Name of the glTF extension carrying component data
pub const EXTENSION_NAME: &str = "MOZ_hubs_components";

/// Version written into the root extension payload
pub const EXTENSION_VERSION: u64 = 4;
