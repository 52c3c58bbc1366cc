//! Version ledger - which migrations are applied, and in what order
//!
//! The ledger keeps the applied set together with the application sequence (the
//! order versions were applied in). Reverts walk the sequence backwards, so a
//! version back-filled after a later one is reverted first.

use crate::expression::{
    ChangeExpression, ColumnDefinition, CreateTable, DataRow, DbType, DeleteData, DeleteTable,
    InsertData, TableName, Value,
};
use crate::migration::MigrationError;
use crate::processor::Processor;
use chrono::{SubsecRound, Utc};
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Persistence for the version ledger
pub trait VersionStore: Send {
    /// Refresh the snapshot from the backing store
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Processor` if the ledger cannot be read.
    fn load(&mut self, processor: &mut dyn Processor) -> Result<(), MigrationError>;

    fn has_applied(&self, version: i64) -> bool;

    /// Applied versions, ascending
    fn applied_versions(&self) -> Vec<i64>;

    /// Applied versions, oldest application first
    fn applied_sequence(&self) -> Vec<i64>;

    /// Record `version` as applied
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Execution` if the ledger write fails.
    fn insert(
        &mut self,
        processor: &mut dyn Processor,
        version: i64,
        description: &str,
    ) -> Result<(), MigrationError>;

    /// Remove `version` from the applied set
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Execution` if the ledger write fails.
    fn delete(&mut self, processor: &mut dyn Processor, version: i64) -> Result<(), MigrationError>;

    /// Remove the ledger itself
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Execution` if the drop fails.
    fn drop_tracking_structure(&mut self, processor: &mut dyn Processor) -> Result<(), MigrationError>;
}

/// Name and columns of the ledger table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VersionTableMetadata {
    pub schema: Option<String>,
    pub table: String,
    pub version_column: String,
    pub applied_on_column: String,
    pub description_column: String,
}

impl Default for VersionTableMetadata {
    fn default() -> Self {
        Self {
            schema: None,
            table: "VersionInfo".to_string(),
            version_column: "Version".to_string(),
            applied_on_column: "AppliedOn".to_string(),
            description_column: "Description".to_string(),
        }
    }
}

impl VersionTableMetadata {
    pub fn table_name(&self) -> TableName {
        TableName {
            schema: self.schema.clone(),
            name: self.table.clone(),
        }
    }

    pub fn create_table(&self) -> ChangeExpression {
        CreateTable {
            table: self.table_name(),
            columns: vec![
                ColumnDefinition::new(&self.version_column, DbType::Int64).primary_key(),
                ColumnDefinition::new(&self.applied_on_column, DbType::DateTime).null(),
                ColumnDefinition::new(&self.description_column, DbType::String)
                    .size(1024)
                    .null(),
            ],
            primary_key_name: Some(format!("PK_{}", self.table)),
        }
        .into()
    }

    pub fn drop_table(&self) -> ChangeExpression {
        DeleteTable {
            table: self.table_name(),
        }
        .into()
    }

    pub fn insert_version(&self, version: i64, description: &str) -> ChangeExpression {
        // Microseconds are the finest precision every supported engine keeps.
        let applied_on = Utc::now().naive_utc().trunc_subsecs(6);
        InsertData {
            table: self.table_name(),
            rows: vec![DataRow::new()
                .set(&self.version_column, version)
                .set(&self.applied_on_column, Value::DateTime(applied_on))
                .set(&self.description_column, description)],
        }
        .into()
    }

    pub fn delete_version(&self, version: i64) -> ChangeExpression {
        DeleteData {
            table: self.table_name(),
            rows: vec![DataRow::new().set(&self.version_column, version)],
            all_rows: false,
        }
        .into()
    }

    /// Versions ordered by application time, then version
    pub fn select_versions(&self, processor: &dyn Processor) -> String {
        let q = processor.generator().quoter();
        let version = q.quote(&self.version_column);
        format!(
            "SELECT {} FROM {} ORDER BY {}, {}",
            version,
            q.quote_table_name(self.schema.as_deref(), &self.table),
            q.quote(&self.applied_on_column),
            version
        )
    }
}

/// Ledger kept in a database table
///
/// The table is created through the processor's generator on the first insert,
/// so it picks up dialect details such as the MySQL storage engine.
#[derive(Debug, Default)]
pub struct SqlVersionStore {
    metadata: VersionTableMetadata,
    sequence: Vec<i64>,
    table_exists: bool,
}

impl SqlVersionStore {
    pub fn new(metadata: VersionTableMetadata) -> Self {
        Self {
            metadata,
            sequence: Vec::new(),
            table_exists: false,
        }
    }

    pub fn metadata(&self) -> &VersionTableMetadata {
        &self.metadata
    }
}

impl VersionStore for SqlVersionStore {
    fn load(&mut self, processor: &mut dyn Processor) -> Result<(), MigrationError> {
        self.table_exists =
            processor.table_exists(self.metadata.schema.as_deref(), &self.metadata.table)?;
        self.sequence = if self.table_exists {
            let sql = self.metadata.select_versions(processor);
            processor.read_i64s(&sql)?
        } else {
            Vec::new()
        };
        log::debug!(
            "Loaded {} applied version(s) from {}",
            self.sequence.len(),
            self.metadata.table_name()
        );
        Ok(())
    }

    fn has_applied(&self, version: i64) -> bool {
        self.sequence.contains(&version)
    }

    fn applied_versions(&self) -> Vec<i64> {
        let mut versions = self.sequence.clone();
        versions.sort_unstable();
        versions
    }

    fn applied_sequence(&self) -> Vec<i64> {
        self.sequence.clone()
    }

    fn insert(
        &mut self,
        processor: &mut dyn Processor,
        version: i64,
        description: &str,
    ) -> Result<(), MigrationError> {
        if !self.table_exists
            && !processor.table_exists(self.metadata.schema.as_deref(), &self.metadata.table)?
        {
            log::info!("Creating version table {}", self.metadata.table_name());
            processor.process(&self.metadata.create_table())?;
        }
        self.table_exists = true;

        processor.process(&self.metadata.insert_version(version, description))?;
        if !self.sequence.contains(&version) {
            self.sequence.push(version);
        }
        Ok(())
    }

    fn delete(&mut self, processor: &mut dyn Processor, version: i64) -> Result<(), MigrationError> {
        processor.process(&self.metadata.delete_version(version))?;
        self.sequence.retain(|v| *v != version);
        Ok(())
    }

    fn drop_tracking_structure(&mut self, processor: &mut dyn Processor) -> Result<(), MigrationError> {
        if self.table_exists
            || processor.table_exists(self.metadata.schema.as_deref(), &self.metadata.table)?
        {
            log::info!("Dropping version table {}", self.metadata.table_name());
            processor.process(&self.metadata.drop_table())?;
        }
        self.table_exists = false;
        self.sequence.clear();
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryLedger {
    sequence: Vec<i64>,
    drops: usize,
}

/// Ledger held in memory
///
/// Clones share the same ledger, so a test can keep a handle while the runner
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryVersionStore {
    ledger: Arc<Mutex<MemoryLedger>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger that already records `sequence`, oldest application first
    pub fn with_sequence(sequence: impl IntoIterator<Item = i64>) -> Self {
        let store = Self::new();
        store.lock().sequence = sequence.into_iter().collect();
        store
    }

    /// How many times the tracking structure was dropped
    pub fn drop_count(&self) -> usize {
        self.lock().drops
    }

    fn lock(&self) -> MutexGuard<'_, MemoryLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VersionStore for MemoryVersionStore {
    fn load(&mut self, _processor: &mut dyn Processor) -> Result<(), MigrationError> {
        Ok(())
    }

    fn has_applied(&self, version: i64) -> bool {
        self.lock().sequence.contains(&version)
    }

    fn applied_versions(&self) -> Vec<i64> {
        let mut versions = self.lock().sequence.clone();
        versions.sort_unstable();
        versions
    }

    fn applied_sequence(&self) -> Vec<i64> {
        self.lock().sequence.clone()
    }

    fn insert(
        &mut self,
        _processor: &mut dyn Processor,
        version: i64,
        _description: &str,
    ) -> Result<(), MigrationError> {
        let mut ledger = self.lock();
        if !ledger.sequence.contains(&version) {
            ledger.sequence.push(version);
        }
        Ok(())
    }

    fn delete(&mut self, _processor: &mut dyn Processor, version: i64) -> Result<(), MigrationError> {
        self.lock().sequence.retain(|v| *v != version);
        Ok(())
    }

    fn drop_tracking_structure(&mut self, _processor: &mut dyn Processor) -> Result<(), MigrationError> {
        let mut ledger = self.lock();
        ledger.sequence.clear();
        ledger.drops += 1;
        Ok(())
    }
}
