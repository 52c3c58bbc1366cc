//! SQLite processor backed by `rusqlite`

use super::{ExecutionOptions, Processor, ProcessorError};
use crate::generator::{Dialect, Generator, GeneratorOptions};
use rusqlite::{params, Connection};
use std::time::Duration;

/// Processor for SQLite databases
///
/// # Examples
///
/// ```no_run
/// use tidemark::processor::{ExecutionOptions, SqliteProcessor};
/// use tidemark::generator::GeneratorOptions;
///
/// # fn main() -> Result<(), tidemark::processor::ProcessorError> {
/// // A plain path, `:memory:`, or a `Data Source=...;` string
/// let processor = SqliteProcessor::connect(
///     "Data Source=app.db;Version=3;",
///     ExecutionOptions::default(),
///     GeneratorOptions::default(),
/// )?;
/// # Ok(())
/// # }
/// ```
pub struct SqliteProcessor {
    connection: Connection,
    generator: Generator,
    options: ExecutionOptions,
    in_transaction: bool,
}

impl SqliteProcessor {
    /// Open a database from a connection string
    ///
    /// # Errors
    ///
    /// Returns `ProcessorError::Connection` for an empty data source and
    /// `ProcessorError::Sqlite` if the database cannot be opened.
    pub fn connect(
        connection_string: &str,
        options: ExecutionOptions,
        generator_options: GeneratorOptions,
    ) -> Result<Self, ProcessorError> {
        let path = data_source(connection_string)?;
        let connection = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(&path)?
        };
        log::debug!("Opened SQLite database {path}");
        Self::from_connection(connection, options, generator_options)
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns `ProcessorError::Sqlite` if SQLite cannot allocate the database.
    pub fn in_memory(options: ExecutionOptions) -> Result<Self, ProcessorError> {
        Self::from_connection(
            Connection::open_in_memory()?,
            options,
            GeneratorOptions::default(),
        )
    }

    /// Wrap an existing connection
    ///
    /// # Errors
    ///
    /// Returns `ProcessorError::Sqlite` if the busy timeout cannot be set.
    pub fn from_connection(
        connection: Connection,
        options: ExecutionOptions,
        generator_options: GeneratorOptions,
    ) -> Result<Self, ProcessorError> {
        if let Some(seconds) = options.timeout_seconds {
            connection.busy_timeout(Duration::from_secs(seconds))?;
        }
        Ok(Self {
            connection,
            generator: Generator::new(Dialect::Sqlite, generator_options),
            options,
            in_transaction: false,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn into_connection(self) -> Connection {
        self.connection
    }

    fn begin_if_due(&mut self) -> Result<(), ProcessorError> {
        if !self.in_transaction && self.options.begins_transactions() {
            self.connection.execute_batch("BEGIN")?;
            self.in_transaction = true;
            log::debug!("Began SQLite transaction");
        }
        Ok(())
    }
}

/// Extract the file path from a connection string
///
/// Accepts `Data Source=path;Version=3;...` key/value strings (keys are
/// case-insensitive), a bare path, or `:memory:`.
fn data_source(connection_string: &str) -> Result<String, ProcessorError> {
    let trimmed = connection_string.trim();
    let path = if trimmed.contains('=') {
        trimmed
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| {
                let key = key.trim();
                key.eq_ignore_ascii_case("data source") || key.eq_ignore_ascii_case("datasource")
            })
            .map(|(_, value)| value.trim().to_string())
            .unwrap_or_default()
    } else {
        trimmed.to_string()
    };

    if path.is_empty() {
        return Err(ProcessorError::Connection(format!(
            "no SQLite data source in connection string '{connection_string}'"
        )));
    }
    Ok(path)
}

impl Processor for SqliteProcessor {
    fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    fn generator(&self) -> &Generator {
        &self.generator
    }

    fn execute_raw(&mut self, sql: &str) -> Result<(), ProcessorError> {
        self.begin_if_due()?;
        self.connection.execute_batch(sql)?;
        Ok(())
    }

    fn read_i64s(&mut self, sql: &str) -> Result<Vec<i64>, ProcessorError> {
        let mut statement = self.connection.prepare(sql)?;
        let rows = statement.query_map([], |row| row.get::<_, i64>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn table_exists(&mut self, schema: Option<&str>, table: &str) -> Result<bool, ProcessorError> {
        let master = match schema {
            Some(schema) => format!("{}.sqlite_master", self.generator.quoter().quote(schema)),
            None => "sqlite_master".to_string(),
        };
        let count: i64 = self.connection.query_row(
            &format!("SELECT COUNT(*) FROM {master} WHERE type = 'table' AND name = ?1"),
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn commit(&mut self) -> Result<(), ProcessorError> {
        if self.in_transaction {
            self.in_transaction = false;
            self.connection.execute_batch("COMMIT")?;
            log::debug!("Committed SQLite transaction");
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ProcessorError> {
        if self.in_transaction {
            self.in_transaction = false;
            self.connection.execute_batch("ROLLBACK")?;
            log::debug!("Rolled back SQLite transaction");
        }
        Ok(())
    }
}
