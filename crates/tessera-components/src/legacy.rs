//! Components written by older tools, mapped onto their current
//! equivalents on import

use std::sync::Arc;
use tessera_core::{Result, TesseraError};
use tessera_interchange::{ImportHandler, ImportTarget, InterchangeHooks, Record};
use tessera_schema::Value;

/// Becomes a waypoint avatars spawn at
struct SpawnPoint;

impl ImportHandler for SpawnPoint {
    fn import(&self, target: &mut ImportTarget<'_>, _record: &Record) -> Result<()> {
        target.ensure("waypoint")?;
        target.set("waypoint", "canBeSpawnPoint", Value::Bool(true))
    }
}

/// Becomes a box physics shape
struct BoxCollider;

impl ImportHandler for BoxCollider {
    fn import(&self, target: &mut ImportTarget<'_>, _record: &Record) -> Result<()> {
        target.ensure("physics-shape")?;
        target.set("physics-shape", "type", Value::Enum("box".to_string()))
    }
}

/// Scene background color, now part of the environment settings
struct Background;

impl ImportHandler for Background {
    fn import(&self, target: &mut ImportTarget<'_>, record: &Record) -> Result<()> {
        let mut map = record
            .as_map()
            .ok_or_else(|| TesseraError::mismatch("map", record.type_name()))?
            .clone();
        if let Some(color) = map.remove("color") {
            map.insert("backgroundColor", color);
        }
        target.ensure("environment-settings")?;
        target.apply("environment-settings", &Record::Map(map))
    }
}

/// Terrain collision data only the old editor used
struct Heightfield;

impl ImportHandler for Heightfield {
    fn import(&self, _target: &mut ImportTarget<'_>, _record: &Record) -> Result<()> {
        log::debug!("Ignoring heightfield component");
        Ok(())
    }
}

pub(crate) fn register(hooks: InterchangeHooks) -> InterchangeHooks {
    hooks
        .with_import("spawn-point", Arc::new(SpawnPoint))
        .with_import("box-collider", Arc::new(BoxCollider))
        .with_import("background", Arc::new(Background))
        .with_import("heightfield", Arc::new(Heightfield))
}
