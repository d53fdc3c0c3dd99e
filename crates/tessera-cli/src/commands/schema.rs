//! Schema introspection command

use super::load_registry;
use anyhow::Result;
use tessera_core::EntityKind;
use tessera_schema::{RegisteredSchema, SchemaRegistry};

pub fn run(name: Option<&str>, kind: Option<&str>, schemas: &[String]) -> Result<()> {
    let (_, registry) = load_registry(schemas)?;

    let Some(name) = name else {
        return list(&registry, kind);
    };

    let found = registry
        .get(name)
        .or_else(|| registry.lookup_by_display_name(name));
    match found {
        Some(entry) => show(&registry, entry),
        None => {
            println!("Component '{}' not found.", name);
            println!();
            list(&registry, kind)?;
        }
    }
    Ok(())
}

fn list(registry: &SchemaRegistry, kind: Option<&str>) -> Result<()> {
    match kind {
        Some(kind) => {
            let Some(kind) = EntityKind::parse(kind) else {
                anyhow::bail!("Unknown entity kind: {} (node, bone, material, scene)", kind);
            };
            println!("Components that can be added to a {}:", kind);
            for schema in registry.addable_schemas(kind) {
                println!("  - {} ({})", schema.id, schema.display_name);
            }
        }
        None => {
            println!("Available components:");
            for entry in registry.list_schemas() {
                let schema = &entry.definition;
                let marker = if schema.dependency_only {
                    " [dependency]"
                } else {
                    ""
                };
                println!(
                    "  - {} ({}) v{}{}",
                    schema.id, schema.display_name, schema.version, marker
                );
            }
        }
    }
    Ok(())
}

fn show(registry: &SchemaRegistry, entry: &RegisteredSchema) {
    let schema = &entry.definition;
    println!("Component: {} ({})", schema.display_name, schema.id);
    println!("Version: {}", schema.version);
    if let Some(desc) = &schema.description {
        println!("Description: {}", desc);
    }
    if let Some(category) = schema.category {
        println!("Category: {}", format!("{:?}", category).to_lowercase());
    }
    let kinds: Vec<&str> = schema.applicable_kinds.iter().map(|k| k.as_str()).collect();
    println!("Applies to: {}", kinds.join(", "));
    if !schema.dependencies.is_empty() {
        println!("Depends on: {}", schema.dependencies.join(", "));
    }
    if schema.dependency_only {
        println!("Added only as a dependency of other components");
    }

    println!();
    println!("Properties:");
    for prop in &schema.properties {
        print!("  {} : {}", prop.name, prop.ty.type_name());
        if let Some(default) = &prop.default {
            print!(" = {}", format_toml_value(default));
        }
        println!();
        if let Some(desc) = &prop.description {
            println!("    # {}", desc);
        }
    }

    if !entry.migrations.is_empty() {
        println!();
        println!("Migrations:");
        for step in &entry.migrations {
            println!("  [{}, {})", step.since, step.until);
        }
    }

    let users: Vec<&str> = registry
        .list_schemas()
        .filter(|s| s.definition.dependencies.contains(&schema.id))
        .map(|s| s.definition.id.as_str())
        .collect();
    if !users.is_empty() {
        println!();
        println!("Required by: {}", users.join(", "));
    }
}

fn format_toml_value(v: &toml::Value) -> String {
    match v {
        toml::Value::String(s) => format!("\"{}\"", s),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_toml_value).collect();
            format!("[{}]", items.join(", "))
        }
        toml::Value::Table(t) => {
            let items: Vec<String> = t
                .iter()
                .map(|(k, v)| format!("{} = {}", k, format_toml_value(v)))
                .collect();
            format!("{{ {} }}", items.join(", "))
        }
        toml::Value::Datetime(d) => d.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_toml_value() {
        let v: toml::Value = toml::from_str::<toml::Table>("x = [1.5, 2, \"a\"]").unwrap()["x"].clone();
        assert_eq!(format_toml_value(&v), "[1.5, 2, \"a\"]");
    }
}
