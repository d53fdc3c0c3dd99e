//! Tessera ECS - the authoring scene
//!
//! This crate wraps hecs with stable entity identifiers, entity kinds,
//! ordered per-entity component lists and the dependency resolver that keeps
//! those lists closed under schema dependencies.

mod component;
mod entity;
mod resolver;
mod world;

pub use component::{ComponentSlot, EntityComponents};
pub use entity::EntityInfo;
pub use world::{ImageAsset, Linked, SceneWorld};
