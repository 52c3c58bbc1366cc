//! Migration runner - applies and reverts registered migrations
//!
//! Every public operation is one batch: migrations run in order on the single
//! calling thread, the ledger is written after each migration, and the batch ends
//! with a commit (automatic transactions) or, on the first uncaught error, with a
//! rollback followed by a reload of the ledger snapshot.

use crate::expression::ChangeExpression;
use crate::migration::version_store::{SqlVersionStore, VersionStore, VersionTableMetadata};
use crate::migration::{
    Conventions, Direction, Migration, MigrationError, MigrationRegistry, MigrationStatus, Profile,
    SchemaManager,
};
use crate::processor::{ExecutionOptions, Processor, TransactionMode};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// An expression failure swallowed in silent-fail mode
#[derive(Debug)]
pub struct CaughtFailure {
    /// Version of the migration the expression came from, `None` for profiles
    /// and ad-hoc `up`/`down` calls
    pub version: Option<i64>,
    pub expression: String,
    pub error: MigrationError,
}

/// Outcome of one runner operation
#[derive(Debug, Default)]
pub struct RunReport {
    /// Versions applied, in order
    pub applied: Vec<i64>,
    /// Versions reverted, in order
    pub reverted: Vec<i64>,
    /// Failures collected in silent-fail mode
    pub caught_failures: Vec<CaughtFailure>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Whether nothing was applied or reverted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.reverted.is_empty()
    }
}

/// Applies registered migrations through a [`Processor`] and keeps the ledger
///
/// # Example
///
/// ```rust
/// use tidemark::generator::{Dialect, GeneratorOptions};
/// use tidemark::migration::{Migration, MigrationRegistry, MigrationRunner, SchemaManager};
/// use tidemark::processor::{ExecutionOptions, ScriptProcessor};
///
/// struct CreateUsers;
///
/// impl Migration for CreateUsers {
///     fn version(&self) -> i64 { 20240101000000 }
///     fn name(&self) -> &str { "create_users" }
///     fn up(&self, schema: &mut SchemaManager) { schema.drop_table("Users"); }
///     fn down(&self, _schema: &mut SchemaManager) {}
/// }
///
/// let mut registry = MigrationRegistry::new();
/// registry.add(CreateUsers).unwrap();
///
/// let processor = ScriptProcessor::new(Dialect::Sqlite, ExecutionOptions::default(), GeneratorOptions::default());
/// let mut runner = MigrationRunner::new(processor, registry).unwrap();
/// let report = runner.migrate_up().unwrap();
/// assert_eq!(report.applied, vec![20240101000000]);
/// ```
pub struct MigrationRunner<P: Processor> {
    processor: P,
    registry: MigrationRegistry,
    store: Box<dyn VersionStore>,
    conventions: Conventions,
    profiles: Vec<Arc<dyn Profile>>,
    options: ExecutionOptions,
    preview_announced: bool,
}

impl<P: Processor> MigrationRunner<P> {
    /// Create a runner that keeps its ledger in the default `VersionInfo` table
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Processor` if the ledger cannot be read.
    pub fn new(processor: P, registry: MigrationRegistry) -> Result<Self, MigrationError> {
        Self::with_version_table(processor, registry, VersionTableMetadata::default())
    }

    /// Create a runner with a custom ledger table
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Processor` if the ledger cannot be read.
    pub fn with_version_table(
        processor: P,
        registry: MigrationRegistry,
        metadata: VersionTableMetadata,
    ) -> Result<Self, MigrationError> {
        let options = processor.options().clone();
        let mut runner = Self {
            processor,
            registry,
            store: Box::new(SqlVersionStore::new(metadata)),
            conventions: Conventions::default(),
            profiles: Vec::new(),
            options,
            preview_announced: false,
        };
        runner.store.load(&mut runner.processor)?;
        Ok(runner)
    }

    /// Replace the ledger and load it
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Processor` if the new ledger cannot be read.
    pub fn with_version_store(mut self, store: impl VersionStore + 'static) -> Result<Self, MigrationError> {
        self.store = Box::new(store);
        self.store.load(&mut self.processor)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_conventions(mut self, conventions: Conventions) -> Self {
        self.conventions = conventions;
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: impl Profile + 'static) -> Self {
        self.profiles.push(Arc::new(profile));
        self
    }

    #[must_use]
    pub fn with_profiles(mut self, profiles: impl IntoIterator<Item = Arc<dyn Profile>>) -> Self {
        self.profiles.extend(profiles);
        self
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Mutable access to the processor, for callers managing transactions
    /// themselves in [`TransactionMode::Manual`]
    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }

    pub fn into_processor(self) -> P {
        self.processor
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    pub fn version_store(&self) -> &dyn VersionStore {
        self.store.as_ref()
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Compare the registry with the ledger snapshot
    pub fn status(&self) -> MigrationStatus {
        MigrationStatus::compare(&self.registry.versions(), &self.store.applied_versions())
    }

    /// Apply every pending migration, ascending, then the profiles
    ///
    /// # Errors
    ///
    /// Returns the first uncaught error after rolling back the batch.
    pub fn migrate_up(&mut self) -> Result<RunReport, MigrationError> {
        self.run_batch("migrate_up", |runner, report| {
            let pending = runner.pending(None);
            for migration in pending {
                runner.apply_migration(migration.as_ref(), report)?;
            }
            runner.run_profiles(report)
        })
    }

    /// Apply pending migrations with a version `<= target`
    ///
    /// # Errors
    ///
    /// Returns the first uncaught error after rolling back the batch.
    pub fn migrate_up_to(&mut self, target: i64) -> Result<RunReport, MigrationError> {
        self.run_batch("migrate_up_to", |runner, report| {
            let pending = runner.pending(Some(target));
            for migration in pending {
                runner.apply_migration(migration.as_ref(), report)?;
            }
            Ok(())
        })
    }

    /// Revert every applied version `> target`, highest version first
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::MissingMigration` for an applied version with no
    /// registered migration, or the first uncaught error of a `down`.
    pub fn migrate_down(&mut self, target: i64) -> Result<RunReport, MigrationError> {
        self.run_batch("migrate_down", |runner, report| {
            let mut versions: Vec<i64> = runner
                .store
                .applied_versions()
                .into_iter()
                .filter(|v| *v > target)
                .collect();
            versions.reverse();
            for version in versions {
                runner.revert_migration(version, report)?;
            }
            Ok(())
        })
    }

    /// Revert the `steps` most recently applied migrations that are still
    /// registered
    ///
    /// Applied versions without a registered migration are skipped. Dropping the
    /// last applied version also drops the ledger table.
    ///
    /// # Errors
    ///
    /// Returns the first uncaught error of a `down`.
    pub fn rollback(&mut self, steps: usize) -> Result<RunReport, MigrationError> {
        if steps == 0 || self.store.applied_sequence().is_empty() {
            return Ok(RunReport::default());
        }

        self.run_batch("rollback", |runner, report| {
            let versions: Vec<i64> = runner
                .store
                .applied_sequence()
                .into_iter()
                .rev()
                .filter(|v| runner.registry.contains(*v))
                .take(steps)
                .collect();
            for version in versions {
                runner.revert_migration(version, report)?;
            }
            runner.drop_ledger_if_empty()
        })
    }

    /// Revert every applied version `> version`, highest version first
    ///
    /// `rollback_to_version(0)` reverts everything and drops the ledger table.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::MissingMigration` for the highest applied version
    /// with no registered migration. Every registered version above `version` is
    /// reverted before the error is raised, and the ledger is left in place.
    pub fn rollback_to_version(&mut self, version: i64) -> Result<RunReport, MigrationError> {
        let had_applied = !self.store.applied_versions().is_empty();

        self.run_batch("rollback_to_version", |runner, report| {
            let mut missing = None;
            for applied in runner.store.applied_versions().into_iter().rev() {
                if applied <= version {
                    break;
                }
                if runner.registry.contains(applied) {
                    runner.revert_migration(applied, report)?;
                } else if missing.is_none() {
                    missing = Some(applied);
                }
            }
            if let Some(missing) = missing {
                return Err(MigrationError::MissingMigration { version: missing });
            }
            if version == 0 && had_applied {
                runner.drop_ledger_if_empty()?;
            }
            Ok(())
        })
    }

    /// Run one migration's `up` without recording it in the ledger
    ///
    /// # Errors
    ///
    /// Returns the first uncaught error after rolling back.
    pub fn up(&mut self, migration: &dyn Migration) -> Result<RunReport, MigrationError> {
        self.run_batch("up", |runner, report| {
            let mut schema = SchemaManager::new();
            migration.up(&mut schema);
            runner
                .execute_expressions(None, schema.into_expressions(), report)
                .map_err(|e| MigrationError::failed(migration.version(), Direction::Up, e))
        })
    }

    /// Run one migration's `down` without touching the ledger
    ///
    /// # Errors
    ///
    /// Returns the first uncaught error after rolling back.
    pub fn down(&mut self, migration: &dyn Migration) -> Result<RunReport, MigrationError> {
        self.run_batch("down", |runner, report| {
            let mut schema = SchemaManager::new();
            migration.down(&mut schema);
            runner
                .execute_expressions(None, schema.into_expressions(), report)
                .map_err(|e| MigrationError::failed(migration.version(), Direction::Down, e))
        })
    }

    /// Run the profiles on their own
    ///
    /// # Errors
    ///
    /// Returns the first uncaught error after rolling back.
    pub fn apply_profiles(&mut self) -> Result<RunReport, MigrationError> {
        self.run_batch("apply_profiles", |runner, report| runner.run_profiles(report))
    }

    fn pending(&self, target: Option<i64>) -> Vec<Arc<dyn Migration>> {
        self.registry
            .iter()
            .filter(|m| target.map_or(true, |t| m.version() <= t))
            .filter(|m| !self.store.has_applied(m.version()))
            .cloned()
            .collect()
    }

    fn run_batch<F>(&mut self, operation: &'static str, body: F) -> Result<RunReport, MigrationError>
    where
        F: FnOnce(&mut Self, &mut RunReport) -> Result<(), MigrationError>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::runner_span(operation).entered();

        if self.options.preview_only && !self.preview_announced {
            log::warn!("PREVIEW-ONLY MODE: no statements will be executed");
            self.preview_announced = true;
        }

        let start = Instant::now();
        let mut report = RunReport::default();
        match body(self, &mut report) {
            Ok(()) => {
                if self.options.transaction_mode == TransactionMode::Automatic {
                    self.processor.commit()?;
                    log::debug!("{operation}: committed");
                }
                self.store.load(&mut self.processor)?;
                report.elapsed = start.elapsed();
                Ok(report)
            }
            Err(err) => {
                log::error!("{operation} failed: {err}");
                if self.options.transaction_mode == TransactionMode::Automatic {
                    match self.processor.rollback() {
                        Ok(()) => log::debug!("{operation}: rolled back"),
                        Err(rollback_err) => {
                            log::error!("{operation}: rollback failed: {rollback_err}");
                        }
                    }
                }
                if let Err(load_err) = self.store.load(&mut self.processor) {
                    log::warn!("{operation}: could not reload the version ledger: {load_err}");
                }
                Err(err)
            }
        }
    }

    fn apply_migration(
        &mut self,
        migration: &dyn Migration,
        report: &mut RunReport,
    ) -> Result<(), MigrationError> {
        let version = migration.version();
        if self.store.has_applied(version) {
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::migration_span(version, migration.name(), "up").entered();

        log::info!("{}: {} migrating", version, migration.name());
        let start = Instant::now();

        let mut schema = SchemaManager::new();
        migration.up(&mut schema);
        self.execute_expressions(Some(version), schema.into_expressions(), report)
            .and_then(|()| self.store.insert(&mut self.processor, version, migration.name()))
            .map_err(|e| MigrationError::failed(version, Direction::Up, e))?;

        log::info!("{}: {} migrated ({:?})", version, migration.name(), start.elapsed());
        report.applied.push(version);
        Ok(())
    }

    fn revert_migration(&mut self, version: i64, report: &mut RunReport) -> Result<(), MigrationError> {
        let migration = self
            .registry
            .get(version)
            .cloned()
            .ok_or(MigrationError::MissingMigration { version })?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::migration_span(version, migration.name(), "down").entered();

        log::info!("{}: {} reverting", version, migration.name());
        let start = Instant::now();

        let mut schema = SchemaManager::new();
        migration.down(&mut schema);
        self.execute_expressions(Some(version), schema.into_expressions(), report)
            .and_then(|()| self.store.delete(&mut self.processor, version))
            .map_err(|e| MigrationError::failed(version, Direction::Down, e))?;

        log::info!("{}: {} reverted ({:?})", version, migration.name(), start.elapsed());
        report.reverted.push(version);
        Ok(())
    }

    fn run_profiles(&mut self, report: &mut RunReport) -> Result<(), MigrationError> {
        let profiles = self.profiles.clone();
        for profile in profiles {
            log::info!("Profile {}", profile.name());
            let mut schema = SchemaManager::new();
            profile.apply(&mut schema);
            self.execute_expressions(None, schema.into_expressions(), report)?;
        }
        Ok(())
    }

    fn execute_expressions(
        &mut self,
        version: Option<i64>,
        expressions: Vec<ChangeExpression>,
        report: &mut RunReport,
    ) -> Result<(), MigrationError> {
        let mut insert_count = 0u32;
        let mut insert_time = Duration::ZERO;

        for expression in expressions {
            let expression = self.conventions.apply(expression);
            expression.validate()?;

            let start = Instant::now();
            let outcome = self.processor.process(&expression);
            let elapsed = start.elapsed();

            match outcome {
                Ok(()) => {}
                Err(err @ MigrationError::Execution { .. }) if self.options.silent_fail => {
                    log::error!("{expression} failed, continuing: {err}");
                    report.caught_failures.push(CaughtFailure {
                        version,
                        expression: expression.to_string(),
                        error: err,
                    });
                    continue;
                }
                Err(err) => return Err(err),
            }

            if expression.is_bulk_insert() {
                insert_count += 1;
                insert_time += elapsed;
            } else {
                log::info!("-> {expression} ({elapsed:?})");
            }
        }

        if insert_count > 0 {
            log::info!(
                "-> {} Insert operations completed in {:?} taking an average of {:?}",
                insert_count,
                insert_time,
                insert_time / insert_count
            );
        }
        Ok(())
    }

    fn drop_ledger_if_empty(&mut self) -> Result<(), MigrationError> {
        if self.store.applied_sequence().is_empty() {
            self.store.drop_tracking_structure(&mut self.processor)?;
        }
        Ok(())
    }
}
