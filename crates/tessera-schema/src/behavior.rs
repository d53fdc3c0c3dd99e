//! Code attached to data schemas: attach hooks, host predicates and
//! migration steps

use crate::instance::ComponentInstance;
use semver::Version;
use tessera_core::{EntityKind, Result};

/// Whether migration acts on data owned by the open document or on data
/// shared from another file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationScope {
    Global,
    Local,
}

/// The entity a component lives on, as seen by hooks
#[derive(Debug, Clone, Copy)]
pub struct HostInfo<'a> {
    pub kind: EntityKind,
    pub name: &'a str,
    /// Data comes from a linked library file
    pub linked: bool,
}

pub struct AttachContext<'a> {
    pub host: HostInfo<'a>,
    pub instance: &'a mut ComponentInstance,
}

/// Runs one migration step. Returns whether the data was changed.
pub type MigrateFn = fn(&mut ComponentInstance, &mut StepContext<'_>) -> Result<bool>;

/// Transforms data stored at a version in `[since, until)`
#[derive(Clone)]
pub struct MigrationStep {
    pub since: Version,
    pub until: Version,
    pub transform: MigrateFn,
}

impl MigrationStep {
    pub fn new(since: Version, until: Version, transform: MigrateFn) -> Self {
        Self {
            since,
            until,
            transform,
        }
    }

    pub fn covers(&self, version: &Version) -> bool {
        self.since <= *version && *version < self.until
    }
}

impl std::fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MigrationStep[{}, {})", self.since, self.until)
    }
}

/// What a migration step can see and request
pub struct StepContext<'a> {
    pub scope: MigrationScope,
    pub host: HostInfo<'a>,
    messages: Vec<String>,
    required: Vec<String>,
}

impl<'a> StepContext<'a> {
    pub fn new(scope: MigrationScope, host: HostInfo<'a>) -> Self {
        Self {
            scope,
            host,
            messages: Vec::new(),
            required: Vec::new(),
        }
    }

    /// Add a line to the migration report
    pub fn report(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Ask the engine to make sure another component is attached to the
    /// host once this step has run
    pub fn require_component(&mut self, schema_id: &str) {
        if !self.required.iter().any(|r| r == schema_id) {
            self.required.push(schema_id.to_string());
        }
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.messages, self.required)
    }
}

/// Behavior bound to a schema id at registration
pub trait ComponentBehavior: Send + Sync {
    /// Runs after a fresh instance and its dependencies are attached
    fn on_attach(&self, _ctx: &mut AttachContext<'_>) {}

    /// Ordered steps that must tile `[0.0.0, schema.version)`
    fn migrations(&self) -> Vec<MigrationStep> {
        Vec::new()
    }

    /// Extra host check on top of the schema's applicable kinds
    fn supports_host(&self, _host: &HostInfo<'_>) -> bool {
        true
    }
}
