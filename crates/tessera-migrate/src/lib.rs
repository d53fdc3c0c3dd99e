//! Tessera Migrate - bringing stored component data up to date
//!
//! Every component instance remembers the schema version it was written
//! with. After a document loads, the engine walks each instance forward
//! through its schema's migration steps until it reaches the current
//! version, collecting a report for the user.

mod engine;
mod report;

pub use engine::{migrate_document, migrate_entities, migrate_entity};
pub use report::{MigrationEntry, MigrationReport};
pub use tessera_schema::MigrationScope;
