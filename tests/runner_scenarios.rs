//! Runner scenarios against a script processor and an in-memory ledger

use std::sync::Arc;
use tidemark::expression::{ColumnDefinition, DataRow, DbType, DefaultValue};
use tidemark::generator::{Dialect, Generator, GeneratorOptions};
use tidemark::migration::{
    MemoryVersionStore, Migration, MigrationError, MigrationRegistry, MigrationRunner, Profile,
    SchemaManager, VersionStore,
};
use tidemark::processor::{
    ExecutionOptions, Processor, ProcessorError, ScriptProcessor, TransactionMode,
};

type Describe = Arc<dyn Fn(&mut SchemaManager) + Send + Sync>;

/// Migration built from closures
struct Step {
    version: i64,
    up: Describe,
    down: Describe,
}

impl Step {
    fn sql(version: i64) -> Self {
        Self {
            version,
            up: Arc::new(move |s| {
                s.execute(format!("UP {version}"));
            }),
            down: Arc::new(move |s| {
                s.execute(format!("DOWN {version}"));
            }),
        }
    }

    fn with_up(version: i64, up: impl Fn(&mut SchemaManager) + Send + Sync + 'static) -> Self {
        Self {
            up: Arc::new(up),
            ..Self::sql(version)
        }
    }
}

impl Migration for Step {
    fn version(&self) -> i64 {
        self.version
    }

    fn name(&self) -> &str {
        "step"
    }

    fn up(&self, schema: &mut SchemaManager) {
        (self.up)(schema);
    }

    fn down(&self, schema: &mut SchemaManager) {
        (self.down)(schema);
    }
}

/// Script processor that rejects one statement
struct FailingProcessor {
    inner: ScriptProcessor,
    fail_on: String,
}

impl Processor for FailingProcessor {
    fn options(&self) -> &ExecutionOptions {
        self.inner.options()
    }

    fn generator(&self) -> &Generator {
        self.inner.generator()
    }

    fn execute_raw(&mut self, sql: &str) -> Result<(), ProcessorError> {
        if sql == self.fail_on {
            return Err(ProcessorError::Other(format!("syntax error near \"{sql}\"")));
        }
        self.inner.execute_raw(sql)
    }

    fn read_i64s(&mut self, sql: &str) -> Result<Vec<i64>, ProcessorError> {
        self.inner.read_i64s(sql)
    }

    fn table_exists(&mut self, schema: Option<&str>, table: &str) -> Result<bool, ProcessorError> {
        self.inner.table_exists(schema, table)
    }

    fn commit(&mut self) -> Result<(), ProcessorError> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<(), ProcessorError> {
        self.inner.rollback()
    }
}

fn registry(steps: impl IntoIterator<Item = Step>) -> MigrationRegistry {
    let mut registry = MigrationRegistry::new();
    for step in steps {
        registry.add(step).unwrap();
    }
    registry
}

fn script(dialect: Dialect, options: ExecutionOptions) -> ScriptProcessor {
    ScriptProcessor::new(dialect, options, GeneratorOptions::default())
}

fn runner(
    versions: &[i64],
    store: &MemoryVersionStore,
) -> MigrationRunner<ScriptProcessor> {
    MigrationRunner::new(
        script(Dialect::Postgres, ExecutionOptions::default()),
        registry(versions.iter().map(|v| Step::sql(*v))),
    )
    .unwrap()
    .with_version_store(store.clone())
    .unwrap()
}

fn failing(fail_on: &str, options: ExecutionOptions, store: &MemoryVersionStore, steps: Vec<Step>) -> MigrationRunner<FailingProcessor> {
    let processor = FailingProcessor {
        inner: script(Dialect::Postgres, options),
        fail_on: fail_on.to_string(),
    };
    MigrationRunner::new(processor, registry(steps))
        .unwrap()
        .with_version_store(store.clone())
        .unwrap()
}

#[test]
fn test_migrate_up_to_is_idempotent() {
    let store = MemoryVersionStore::new();
    let mut runner = runner(&[1, 2, 3], &store);

    let first = runner.migrate_up_to(2).unwrap();
    assert_eq!(first.applied, vec![1, 2]);

    let second = runner.migrate_up_to(2).unwrap();
    assert!(second.applied.is_empty());
    assert_eq!(store.applied_versions(), vec![1, 2]);
    assert_eq!(runner.status().next_pending_version(), Some(3));
}

#[test]
fn test_rollback_on_empty_ledger_is_noop() {
    let store = MemoryVersionStore::new();
    let mut runner = runner(&[1, 2], &store);

    assert!(runner.rollback(0).unwrap().is_empty());
    assert!(runner.rollback(5).unwrap().is_empty());
    assert!(runner.processor().statements().is_empty());
    assert_eq!(store.drop_count(), 0);
}

#[test]
fn test_rollback_to_version_raises_for_missing_migration() {
    // Ledger {3, 7, 9} as migrate_up writes it; only 3 and 7 are registered
    let store = MemoryVersionStore::with_sequence([3, 7, 9]);
    let mut runner = runner(&[3, 7], &store);

    let err = runner.rollback_to_version(3).unwrap_err();
    assert!(matches!(err, MigrationError::MissingMigration { version: 9 }));
    assert!(err.to_string().contains("version 9"));

    assert_eq!(runner.processor().statements(), &["DOWN 7"]);
    assert_eq!(store.applied_versions(), vec![3, 9]);
    assert_eq!(store.drop_count(), 0);
}

#[test]
fn test_rollback_to_zero_reverts_registered_then_raises() {
    let store = MemoryVersionStore::with_sequence([3, 7, 9]);
    let mut runner = runner(&[3, 7], &store);

    let err = runner.rollback_to_version(0).unwrap_err();
    assert!(matches!(err, MigrationError::MissingMigration { version: 9 }));

    assert_eq!(runner.processor().statements(), &["DOWN 7", "DOWN 3"]);
    assert_eq!(store.applied_versions(), vec![9]);
    assert_eq!(store.drop_count(), 0, "ledger still references 9");
}

#[test]
fn test_rollback_skips_unregistered_versions() {
    let store = MemoryVersionStore::with_sequence([1, 5, 2]);
    let mut runner = runner(&[1, 2], &store);

    let report = runner.rollback(2).unwrap();
    assert_eq!(report.reverted, vec![2, 1]);
    assert_eq!(store.applied_versions(), vec![5]);
    assert_eq!(store.drop_count(), 0);
}

#[test]
fn test_rollback_drops_ledger_when_emptied() {
    let store = MemoryVersionStore::with_sequence([1, 2]);
    let mut runner = runner(&[1, 2], &store);

    runner.rollback(1).unwrap();
    assert_eq!(store.drop_count(), 0);

    runner.rollback(1).unwrap();
    assert_eq!(store.drop_count(), 1);
    assert!(store.applied_versions().is_empty());
}

#[test]
fn test_rollback_to_nonzero_keeps_ledger() {
    let store = MemoryVersionStore::with_sequence([1, 2, 3]);
    let mut runner = runner(&[1, 2, 3], &store);

    let report = runner.rollback_to_version(1).unwrap();
    assert_eq!(report.reverted, vec![3, 2]);
    assert_eq!(store.applied_versions(), vec![1]);
    assert_eq!(store.drop_count(), 0);
}

#[test]
fn test_migrate_down_reverts_descending() {
    let store = MemoryVersionStore::with_sequence([10, 30, 20]);
    let mut runner = runner(&[10, 20, 30], &store);

    let report = runner.migrate_down(10).unwrap();
    assert_eq!(report.reverted, vec![30, 20]);
    assert_eq!(runner.processor().statements(), &["DOWN 30", "DOWN 20"]);
}

#[test]
fn test_up_then_down_round_trip() {
    let store = MemoryVersionStore::new();
    let mut runner = runner(&[1, 2], &store);
    runner.migrate_up().unwrap();

    runner.migrate_down(1).unwrap();
    assert!(!store.has_applied(2));
    assert!(store.has_applied(1));
    assert_eq!(runner.processor().statements(), &["UP 1", "UP 2", "DOWN 2"]);
}

#[test]
fn test_failure_rolls_back_and_is_wrapped() {
    let store = MemoryVersionStore::new();
    let mut runner = failing(
        "UP 2",
        ExecutionOptions::default(),
        &store,
        vec![Step::sql(1), Step::sql(2), Step::sql(3)],
    );

    let err = runner.migrate_up().unwrap_err();
    assert!(matches!(err, MigrationError::Failed { version: 2, .. }));
    assert!(err.to_string().contains("migration 2 failed (up)"));
    assert!(matches!(err.root(), MigrationError::Execution { sql, .. } if sql == "UP 2"));

    assert_eq!(runner.processor().inner.rollback_count(), 1);
    assert_eq!(runner.processor().inner.commit_count(), 0);
    // Version 3 never ran
    assert_eq!(runner.processor().inner.statements(), &["UP 1"]);
}

#[test]
fn test_manual_transactions_are_left_to_caller() {
    let store = MemoryVersionStore::new();
    let options = ExecutionOptions {
        transaction_mode: TransactionMode::Manual,
        ..ExecutionOptions::default()
    };
    let mut runner = failing("UP 2", options, &store, vec![Step::sql(1), Step::sql(2)]);

    runner.migrate_up().unwrap_err();
    assert_eq!(runner.processor().inner.rollback_count(), 0);
    // The ledger keeps what succeeded
    assert_eq!(store.applied_versions(), vec![1]);
}

#[test]
fn test_silent_fail_collects_and_records_version() {
    let store = MemoryVersionStore::new();
    let options = ExecutionOptions {
        silent_fail: true,
        ..ExecutionOptions::default()
    };
    let mut runner = failing(
        "BROKEN",
        options,
        &store,
        vec![Step::with_up(1, |s| {
            s.execute("BROKEN").execute("AFTER");
        })],
    );

    let report = runner.migrate_up().unwrap();
    assert_eq!(report.applied, vec![1]);
    assert_eq!(report.caught_failures.len(), 1);
    let failure = &report.caught_failures[0];
    assert_eq!(failure.version, Some(1));
    assert_eq!(failure.expression, "ExecuteSql BROKEN");
    assert!(matches!(failure.error, MigrationError::Execution { .. }));

    assert_eq!(runner.processor().inner.statements(), &["AFTER"]);
    assert!(store.has_applied(1));
}

#[test]
fn test_silent_fail_does_not_catch_unsupported() {
    let store = MemoryVersionStore::new();
    let options = ExecutionOptions {
        silent_fail: true,
        ..ExecutionOptions::default()
    };
    let processor = script(Dialect::MySql, options);
    let mut runner = MigrationRunner::new(
        processor,
        registry([Step::with_up(1, |s| {
            s.alter_default("Users", "Active", Some(DefaultValue::from(true)));
        })]),
    )
    .unwrap()
    .with_version_store(store.clone())
    .unwrap();

    let err = runner.migrate_up().unwrap_err();
    assert!(err.is_unsupported());
    assert!(!store.has_applied(1));
}

#[test]
fn test_loose_compatibility_turns_unsupported_into_notice() {
    let store = MemoryVersionStore::new();
    let processor = ScriptProcessor::new(
        Dialect::MySql,
        ExecutionOptions::default(),
        GeneratorOptions::loose(),
    );
    let mut runner = MigrationRunner::new(
        processor,
        registry([Step::with_up(1, |s| {
            s.alter_default("Users", "Active", None);
        })]),
    )
    .unwrap()
    .with_version_store(store.clone())
    .unwrap();

    let report = runner.migrate_up().unwrap();
    assert_eq!(report.applied, vec![1]);
    assert!(runner.processor().statements().is_empty());
}

#[test]
fn test_preview_generates_sql_for_ledger_too() {
    let _ = env_logger::builder().is_test(true).try_init();
    let processor = script(Dialect::Postgres, ExecutionOptions::preview());
    let mut runner = MigrationRunner::new(
        processor,
        registry([Step::with_up(1, |s| {
            s.create_table(
                "Users",
                vec![ColumnDefinition::new("Id", DbType::Int32).primary_key()],
            );
        })]),
    )
    .unwrap();

    let report = runner.migrate_up().unwrap();
    assert_eq!(report.applied, vec![1]);

    let statements = runner.processor().statements();
    assert!(statements[0].starts_with("CREATE TABLE \"Users\""));
    assert!(statements[1].starts_with("CREATE TABLE \"VersionInfo\""));
    assert!(statements[2].starts_with("INSERT INTO \"VersionInfo\""));
}

#[test]
fn test_mysql_rename_column_runs_meta_sql() {
    let store = MemoryVersionStore::new();
    let processor = script(Dialect::MySql, ExecutionOptions::default());
    let mut runner = MigrationRunner::new(
        processor,
        registry([Step::with_up(1, |s| {
            s.rename_column("Users", "Name", "FullName");
        })]),
    )
    .unwrap()
    .with_version_store(store)
    .unwrap();

    runner.migrate_up().unwrap();
    let script = runner.processor().script();
    assert!(script.contains("`Users`"));
    assert!(script.contains("`Name`"));
    assert!(script.contains("INFORMATION_SCHEMA.COLUMNS"));
    assert!(script.contains("PREPARE"));
    assert!(script.contains("EXECUTE"));
    assert!(script.contains("DEALLOCATE PREPARE"));
}

struct SeedAdmin;

impl Profile for SeedAdmin {
    fn name(&self) -> &str {
        "seed_admin"
    }

    fn apply(&self, schema: &mut SchemaManager) {
        schema.insert("Users", DataRow::new().set("Name", "admin"));
    }
}

#[test]
fn test_profiles_run_after_full_migrate_up_only() {
    let store = MemoryVersionStore::new();
    let mut runner = runner(&[1, 2], &store).with_profile(SeedAdmin);

    runner.migrate_up_to(1).unwrap();
    assert_eq!(runner.processor().statements(), &["UP 1"]);

    runner.migrate_up().unwrap();
    let statements = runner.processor().statements();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[2], "INSERT INTO \"Users\" (\"Name\") VALUES ('admin')");

    // Profiles are never recorded in the ledger
    assert_eq!(store.applied_versions(), vec![1, 2]);
}

#[test]
fn test_single_migration_up_skips_ledger() {
    let store = MemoryVersionStore::new();
    let mut runner = runner(&[], &store);

    runner.up(&Step::sql(42)).unwrap();
    runner.down(&Step::sql(42)).unwrap();
    assert_eq!(runner.processor().statements(), &["UP 42", "DOWN 42"]);
    assert!(store.applied_versions().is_empty());
}
