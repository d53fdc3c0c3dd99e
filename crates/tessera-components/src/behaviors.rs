//! Attach hooks and migration steps for the built-in components

use std::sync::Arc;
use tessera_core::Result;
use tessera_schema::{
    AttachContext, ComponentBehavior, ComponentInstance, MigrationStep, StepContext, Value,
    Version,
};
use uuid::Uuid;

/// A fresh network id in the form clients expect
pub fn new_network_id() -> String {
    Uuid::new_v4().to_string().to_uppercase()
}

/// Gives every new `networked` component its own id
struct Networked;

impl ComponentBehavior for Networked {
    fn on_attach(&self, ctx: &mut AttachContext<'_>) {
        ctx.instance.set("id", Value::String(new_network_id()));
    }
}

/// Components that gained a `networked` dependency at 1.0.0
struct NeedsNetworked;

fn require_networked(_: &mut ComponentInstance, ctx: &mut StepContext<'_>) -> Result<bool> {
    ctx.require_component("networked");
    Ok(true)
}

impl ComponentBehavior for NeedsNetworked {
    fn migrations(&self) -> Vec<MigrationStep> {
        vec![MigrationStep::new(
            Version::new(0, 0, 0),
            Version::new(1, 0, 0),
            require_networked,
        )]
    }
}

/// Components whose vectors were stored Y-up before 1.0.1 and are Z-up now.
/// Only vectors present in the saved data are swapped; missing ones pick up
/// the Z-up defaults after migration.
struct ZUpVectors {
    transform: fn(&mut ComponentInstance, &mut StepContext<'_>) -> Result<bool>,
}

fn physics_shape_to_z_up(instance: &mut ComponentInstance, _: &mut StepContext<'_>) -> Result<bool> {
    instance.swap_axes("offset", 1, 2);
    instance.swap_axes("halfExtents", 1, 2);
    Ok(true)
}

fn rigidbody_to_z_up(instance: &mut ComponentInstance, _: &mut StepContext<'_>) -> Result<bool> {
    instance.swap_axes("angularFactor", 1, 2);
    instance.swap_axes("gravity", 1, 2);
    Ok(true)
}

impl ComponentBehavior for ZUpVectors {
    fn migrations(&self) -> Vec<MigrationStep> {
        vec![MigrationStep::new(
            Version::new(0, 0, 0),
            Version::new(1, 0, 1),
            self.transform,
        )]
    }
}

/// Behavior for a built-in schema id, if it has any
pub fn behavior_for(schema_id: &str) -> Option<Arc<dyn ComponentBehavior>> {
    let behavior: Arc<dyn ComponentBehavior> = match schema_id {
        "networked" => Arc::new(Networked),
        "link" | "image" | "video" | "audio" => Arc::new(NeedsNetworked),
        "physics-shape" => Arc::new(ZUpVectors {
            transform: physics_shape_to_z_up,
        }),
        "rigidbody" => Arc::new(ZUpVectors {
            transform: rigidbody_to_z_up,
        }),
        _ => return None,
    };
    Some(behavior)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::EntityKind;
    use tessera_schema::{HostInfo, MigrationScope};

    fn step_ctx() -> StepContext<'static> {
        StepContext::new(
            MigrationScope::Global,
            HostInfo {
                kind: EntityKind::Node,
                name: "Cube",
                linked: false,
            },
        )
    }

    #[test]
    fn test_network_ids_are_unique_uppercase() {
        let a = new_network_id();
        let b = new_network_id();
        assert_ne!(a, b);
        assert_eq!(a, a.to_uppercase());
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_rigidbody_step_swaps_vectors() {
        let mut instance = ComponentInstance {
            schema_id: "rigidbody".into(),
            version: Version::new(1, 0, 0),
            values: Default::default(),
        };
        instance.set("gravity", Value::Vector(vec![0.0, -9.8, 0.0]));
        instance.set("angularFactor", Value::Vector(vec![1.0, 0.5, 0.0]));

        let steps = behavior_for("rigidbody").unwrap().migrations();
        let step = &steps[0];
        assert!(step.covers(&Version::new(1, 0, 0)));
        let mut ctx = step_ctx();
        assert!((step.transform)(&mut instance, &mut ctx).unwrap());
        assert_eq!(instance.get_vector("gravity"), Some(&[0.0, 0.0, -9.8][..]));
        assert_eq!(instance.get_vector("angularFactor"), Some(&[1.0, 0.0, 0.5][..]));
    }

    #[test]
    fn test_rigidbody_step_leaves_unsaved_gravity_alone() {
        let mut instance = ComponentInstance {
            schema_id: "rigidbody".into(),
            version: Version::new(1, 0, 0),
            values: Default::default(),
        };
        instance.set("angularFactor", Value::Vector(vec![1.0, 0.5, 0.0]));

        let steps = behavior_for("rigidbody").unwrap().migrations();
        let mut ctx = step_ctx();
        assert!((steps[0].transform)(&mut instance, &mut ctx).unwrap());
        assert_eq!(instance.get_vector("angularFactor"), Some(&[1.0, 0.0, 0.5][..]));
        assert_eq!(instance.get("gravity"), None);
    }

    #[test]
    fn test_physics_shape_step_always_reports() {
        let mut instance = ComponentInstance {
            schema_id: "physics-shape".into(),
            version: Version::new(0, 1, 0),
            values: Default::default(),
        };
        let steps = behavior_for("physics-shape").unwrap().migrations();
        let mut ctx = step_ctx();
        assert!((steps[0].transform)(&mut instance, &mut ctx).unwrap());
    }

    #[test]
    fn test_link_step_requires_networked() {
        let mut instance = ComponentInstance {
            schema_id: "link".into(),
            version: Version::new(0, 0, 0),
            values: Default::default(),
        };
        let steps = behavior_for("link").unwrap().migrations();
        let step = &steps[0];
        let mut ctx = step_ctx();
        (step.transform)(&mut instance, &mut ctx).unwrap();
        let (_, required) = ctx.into_parts();
        assert_eq!(required, vec!["networked".to_string()]);
    }

    #[test]
    fn test_plain_schemas_have_no_behavior() {
        assert!(behavior_for("fog").is_none());
        assert!(behavior_for("spot-light").is_none());
    }
}
