//! What a migration pass did, in a form that can be shown to the user

use tessera_core::EntityKind;
use tessera_schema::Version;

/// Outcome for one component instance on one entity
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationEntry {
    pub entity: String,
    pub kind: EntityKind,
    pub schema_id: String,
    pub display_name: String,
    pub from: Version,
    pub to: Version,
    /// `migrated` flag of every step that ran, in order
    pub steps: Vec<bool>,
    pub errors: Vec<String>,
    /// Lines the steps asked to show
    pub messages: Vec<String>,
    /// The entity kind no longer accepts this component
    pub unsupported_host: bool,
    /// The data belongs to a linked library file
    pub linked: bool,
}

impl MigrationEntry {
    pub fn migrated(&self) -> bool {
        !self.errors.is_empty() || self.steps.iter().any(|m| *m)
    }

    fn host(&self) -> String {
        format!("{} \"{}\"", self.kind, self.entity)
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.migrated() {
            lines.push(format!(
                "Migrated {} component on {} from v{} to v{}",
                self.display_name,
                self.host(),
                self.from,
                self.to
            ));
        }
        for error in &self.errors {
            lines.push(format!(
                "Error: failed migrating {} component on {}: {}",
                self.display_name,
                self.host(),
                error
            ));
        }
        lines.extend(self.messages.iter().cloned());
        if self.unsupported_host {
            lines.push(format!(
                "Warning: Unsupported component on {}, {}s don't support {} components",
                self.host(),
                self.kind,
                self.display_name
            ));
        }
        if self.linked && self.migrated() {
            lines.push(format!(
                "Warning: component data on linked {} was migrated in memory only",
                self.host()
            ));
        }
        lines
    }
}

/// Aggregate result of a migration pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    pub entries: Vec<MigrationEntry>,
    /// Set when any migrated data came from a linked library
    pub linked_data_touched: bool,
}

impl MigrationReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.entries.iter().map(|e| e.errors.len()).sum()
    }

    /// Every report line, with the document-level warning last
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.entries.iter().flat_map(|e| e.lines()).collect();
        if self.linked_data_touched {
            lines.push(
                "Warning: linked data was migrated in memory only. Open the library files and save them to make the migration permanent."
                    .to_string(),
            );
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> MigrationEntry {
        MigrationEntry {
            entity: "Cube".into(),
            kind: EntityKind::Node,
            schema_id: "rigidbody".into(),
            display_name: "RigidBody".into(),
            from: Version::new(0, 0, 0),
            to: Version::new(1, 0, 1),
            steps: vec![true],
            errors: Vec::new(),
            messages: Vec::new(),
            unsupported_host: false,
            linked: false,
        }
    }

    #[test]
    fn test_lines() {
        let mut e = entry();
        assert_eq!(
            e.lines(),
            vec!["Migrated RigidBody component on node \"Cube\" from v0.0.0 to v1.0.1"]
        );

        e.unsupported_host = true;
        e.kind = EntityKind::Material;
        let lines = e.lines();
        assert_eq!(
            lines[1],
            "Warning: Unsupported component on material \"Cube\", materials don't support RigidBody components"
        );
    }

    #[test]
    fn test_no_op_steps_are_silent() {
        let mut e = entry();
        e.steps = vec![false, false];
        assert!(!e.migrated());
        assert!(e.lines().is_empty());
    }

    #[test]
    fn test_document_warning() {
        let mut e = entry();
        e.linked = true;
        let report = MigrationReport {
            entries: vec![e],
            linked_data_touched: true,
        };
        let lines = report.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("linked node \"Cube\""));
        assert!(lines[2].starts_with("Warning: linked data"));
    }
}
