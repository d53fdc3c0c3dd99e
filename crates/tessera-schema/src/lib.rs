//! Tessera Schema - Component schemas as data
//!
//! This crate defines what a component is: its typed properties, the entity
//! kinds it may live on, its dependencies and version, plus the code hooks
//! and migration steps bound to it at registration.

mod behavior;
mod component;
pub mod global;
mod instance;
mod registry;
mod validation;
mod value;

pub use behavior::{
    AttachContext, ComponentBehavior, HostInfo, MigrateFn, MigrationScope, MigrationStep,
    StepContext,
};
pub use component::{
    Category, ComponentSchemaFile, PropertyDef, PropertyType, ReferenceTarget, SchemaDefinition, Unit, VectorSubtype,
};
pub use instance::ComponentInstance;
pub use registry::{RegisteredSchema, SchemaRegistry};
pub use validation::{validate_instance, validate_value};
pub use value::{default_value, value_from_toml, value_to_toml, NoReferences, ReferenceLookup, Target, Value};

pub use semver::Version;
