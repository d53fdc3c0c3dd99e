//! The migration pass over a world

use crate::report::{MigrationEntry, MigrationReport};
use tessera_core::{EntityId, TesseraError};
use tessera_ecs::SceneWorld;
use tessera_schema::{HostInfo, MigrationScope, SchemaRegistry, StepContext};

/// Migrate every entity in the world
pub fn migrate_document(
    world: &mut SceneWorld,
    registry: &SchemaRegistry,
    scope: MigrationScope,
) -> MigrationReport {
    let ids = world.entities().to_vec();
    let report = migrate_entities(world, registry, &ids, scope);
    log::info!(
        "Migration pass over {} entities: {} component(s) migrated, {} error(s)",
        ids.len(),
        report.entries.iter().filter(|e| e.migrated()).count(),
        report.error_count()
    );
    report
}

/// Migrate a subset of entities, such as the ones a new library link
/// brought in
pub fn migrate_entities(
    world: &mut SceneWorld,
    registry: &SchemaRegistry,
    ids: &[EntityId],
    scope: MigrationScope,
) -> MigrationReport {
    let mut report = MigrationReport::default();
    for id in ids {
        migrate_entity(world, registry, *id, scope, &mut report);
    }
    report.linked_data_touched = report
        .entries
        .iter()
        .any(|e| e.linked && e.migrated());
    report
}

/// Bring every component on one entity to its schema's current version
pub fn migrate_entity(
    world: &mut SceneWorld,
    registry: &SchemaRegistry,
    id: EntityId,
    scope: MigrationScope,
    report: &mut MigrationReport,
) {
    let (Some(kind), Some(name)) = (world.kind(id), world.get_name(id).map(String::from)) else {
        log::warn!("Cannot migrate missing entity {}", id);
        return;
    };
    let linked = world.is_linked(id);
    let scope = if linked { MigrationScope::Local } else { scope };
    let schema_ids: Vec<String> = world
        .components(id)
        .map(|c| c.schema_ids().into_iter().map(String::from).collect())
        .unwrap_or_default();

    let mut required = Vec::new();
    for schema_id in schema_ids {
        let Some(entry) = registry.get(&schema_id) else {
            log::debug!("No schema '{}' on {} \"{}\", leaving data as is", schema_id, kind, name);
            continue;
        };
        let target = entry.definition.version.clone();
        let Some(instance) = world.get_instance_mut(id, &schema_id) else {
            continue;
        };
        if instance.version > target {
            log::warn!(
                "{} on {} \"{}\" was stored at v{}, newer than v{}; leaving it unchanged",
                schema_id,
                kind,
                name,
                instance.version,
                target
            );
            continue;
        }
        if instance.version == target {
            continue;
        }
        let host = HostInfo {
            kind,
            name: &name,
            linked,
        };
        let supported = entry.definition.applies_to(kind)
            && entry
                .behavior
                .as_ref()
                .map_or(true, |b| b.supports_host(&host));
        let mut outcome = MigrationEntry {
            entity: name.clone(),
            kind,
            schema_id: schema_id.clone(),
            display_name: entry.definition.display_name.clone(),
            from: instance.version.clone(),
            to: target.clone(),
            steps: Vec::new(),
            errors: Vec::new(),
            messages: Vec::new(),
            unsupported_host: !supported,
            linked,
        };

        if entry.migrations.is_empty() {
            instance.version = target;
            instance.fill_defaults(&entry.definition, registry);
            if outcome.unsupported_host {
                report.entries.push(outcome);
            }
            continue;
        }

        let mut step_ctx = StepContext::new(scope, host);

        while instance.version < target {
            let Some(step) = entry
                .migrations
                .iter()
                .find(|s| s.covers(&instance.version))
            else {
                outcome.errors.push(format!("no migration step covers v{}", instance.version));
                instance.version = target.clone();
                break;
            };
            match (step.transform)(instance, &mut step_ctx) {
                Ok(migrated) => outcome.steps.push(migrated),
                Err(e) => {
                    log::warn!("Migrating {} on {} \"{}\" failed: {}", schema_id, kind, name, e);
                    outcome.steps.push(true);
                    outcome.errors.push(error_text(&e));
                }
            }
            instance.version = step.until.clone();
        }
        instance.fill_defaults(&entry.definition, registry);

        let (messages, wanted) = step_ctx.into_parts();
        outcome.messages = messages;
        required.extend(wanted);

        if outcome.migrated() || !outcome.messages.is_empty() || outcome.unsupported_host {
            log::debug!("Migrated {} on {} \"{}\" to v{}", schema_id, kind, name, target);
            report.entries.push(outcome);
        }
    }

    for schema_id in required {
        if let Err(e) = world.ensure_dependency(registry, id, &schema_id) {
            log::warn!("Could not attach {} to {} \"{}\": {}", schema_id, kind, name, e);
            if let Some(last) = report.entries.last_mut().filter(|e| e.entity == name) {
                last.errors.push(format!("could not attach required {}: {}", schema_id, e));
            }
        }
    }
}

fn error_text(e: &TesseraError) -> String {
    match e {
        TesseraError::MigrationFailed { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
