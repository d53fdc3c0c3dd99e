//! Per-component code that replaces the generic gather or import path

use crate::context::{ExportContext, HostRef};
use crate::import::ImportTarget;
use crate::record::Record;
use std::collections::HashMap;
use std::sync::Arc;
use tessera_core::Result;
use tessera_schema::{ComponentInstance, SchemaDefinition};

/// Produces a component's record instead of the property-by-property default
pub trait GatherOverride: Send + Sync {
    fn gather(
        &self,
        host: &HostRef,
        instance: &ComponentInstance,
        schema: &SchemaDefinition,
        ctx: &mut ExportContext<'_>,
    ) -> Result<Record>;
}

/// Applies an imported record keyed by a name that may not be a registered
/// schema, such as a legacy component
pub trait ImportHandler: Send + Sync {
    fn import(&self, target: &mut ImportTarget<'_>, record: &Record) -> Result<()>;
}

/// Overrides and handlers keyed by component name
#[derive(Clone, Default)]
pub struct InterchangeHooks {
    gather: HashMap<String, Arc<dyn GatherOverride>>,
    import: HashMap<String, Arc<dyn ImportHandler>>,
}

impl InterchangeHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gather(mut self, schema_id: &str, hook: Arc<dyn GatherOverride>) -> Self {
        self.gather.insert(schema_id.to_string(), hook);
        self
    }

    pub fn with_import(mut self, name: &str, handler: Arc<dyn ImportHandler>) -> Self {
        self.import.insert(name.to_string(), handler);
        self
    }

    pub fn gather_override(&self, schema_id: &str) -> Option<&Arc<dyn GatherOverride>> {
        self.gather.get(schema_id)
    }

    pub fn import_handler(&self, name: &str) -> Option<&Arc<dyn ImportHandler>> {
        self.import.get(name)
    }
}

impl std::fmt::Debug for InterchangeHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut gather: Vec<_> = self.gather.keys().collect();
        let mut import: Vec<_> = self.import.keys().collect();
        gather.sort();
        import.sort();
        f.debug_struct("InterchangeHooks")
            .field("gather", &gather)
            .field("import", &import)
            .finish()
    }
}
