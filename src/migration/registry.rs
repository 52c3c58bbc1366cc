//! Migration registry - the ordered source of migrations for a runner

use crate::migration::{Migration, MigrationError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Migrations indexed by version, iterated in ascending version order
///
/// Unlike a process-wide list, each runner owns its registry, so tests and
/// multiple databases in one process do not interfere.
#[derive(Clone, Default)]
pub struct MigrationRegistry {
    migrations: BTreeMap<i64, Arc<dyn Migration>>,
}

impl std::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.migrations.iter().map(|(v, m)| (v, m.name().to_string())))
            .finish()
    }
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::DuplicateVersion` if a migration with the same
    /// version is already registered. The registry is left unchanged.
    pub fn add(&mut self, migration: impl Migration + 'static) -> Result<&mut Self, MigrationError> {
        self.add_arc(Arc::new(migration))
    }

    /// Register a shared migration
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::DuplicateVersion` on a version clash.
    pub fn add_arc(&mut self, migration: Arc<dyn Migration>) -> Result<&mut Self, MigrationError> {
        let version = migration.version();
        if self.migrations.contains_key(&version) {
            return Err(MigrationError::DuplicateVersion { version });
        }
        self.migrations.insert(version, migration);
        Ok(self)
    }

    pub fn get(&self, version: i64) -> Option<&Arc<dyn Migration>> {
        self.migrations.get(&version)
    }

    pub fn contains(&self, version: i64) -> bool {
        self.migrations.contains_key(&version)
    }

    /// All versions, ascending
    pub fn versions(&self) -> Vec<i64> {
        self.migrations.keys().copied().collect()
    }

    /// Migrations in ascending version order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Migration>> {
        self.migrations.values()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::SchemaManager;

    struct TestMigration {
        version: i64,
        name: String,
    }

    impl TestMigration {
        fn new(version: i64, name: impl Into<String>) -> Self {
            Self {
                version,
                name: name.into(),
            }
        }
    }

    impl Migration for TestMigration {
        fn version(&self) -> i64 {
            self.version
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn up(&self, schema: &mut SchemaManager) {
            schema.execute(format!("SELECT {}", self.version));
        }

        fn down(&self, _schema: &mut SchemaManager) {}
    }

    #[test]
    fn test_versions_are_ascending() {
        let mut registry = MigrationRegistry::new();
        registry
            .add(TestMigration::new(20240120120000, "b"))
            .unwrap()
            .add(TestMigration::new(20240101000000, "a"))
            .unwrap();
        assert_eq!(registry.versions(), vec![20240101000000, 20240120120000]);
        let names: Vec<&str> = registry.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_version_is_rejected() {
        let mut registry = MigrationRegistry::new();
        registry.add(TestMigration::new(7, "first")).unwrap();

        let err = registry.add(TestMigration::new(7, "second")).unwrap_err();
        assert!(matches!(err, MigrationError::DuplicateVersion { version: 7 }));
        assert!(err.to_string().contains("already registered"));
        assert_eq!(registry.get(7).unwrap().name(), "first");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup() {
        let mut registry = MigrationRegistry::new();
        assert!(registry.is_empty());
        registry.add(TestMigration::new(3, "three")).unwrap();
        assert!(registry.contains(3));
        assert!(!registry.contains(4));
        assert!(registry.get(4).is_none());
    }
}
