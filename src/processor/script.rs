//! Connectionless processor that records the statements it is given
//!
//! Used for preview runs against dialects without a compiled-in connector and
//! for producing migration scripts. Reads see an empty database.

use super::{ExecutionOptions, Processor, ProcessorError};
use crate::generator::{Dialect, Generator, GeneratorOptions};
use crate::migration::MigrationError;

#[derive(Debug)]
pub struct ScriptProcessor {
    generator: Generator,
    options: ExecutionOptions,
    statements: Vec<String>,
    commits: usize,
    rollbacks: usize,
}

impl ScriptProcessor {
    pub fn new(dialect: Dialect, options: ExecutionOptions, generator_options: GeneratorOptions) -> Self {
        Self::with_generator(Generator::new(dialect, generator_options), options)
    }

    pub fn with_generator(generator: Generator, options: ExecutionOptions) -> Self {
        Self {
            generator,
            options,
            statements: Vec::new(),
            commits: 0,
            rollbacks: 0,
        }
    }

    /// Statements recorded so far, in execution order
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// The recorded statements as one script
    pub fn script(&self) -> String {
        self.statements
            .iter()
            .map(|s| format!("{};", s.trim_end().trim_end_matches(';')))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.statements.clear();
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn rollback_count(&self) -> usize {
        self.rollbacks
    }
}

impl Processor for ScriptProcessor {
    fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    fn generator(&self) -> &Generator {
        &self.generator
    }

    fn execute_raw(&mut self, sql: &str) -> Result<(), ProcessorError> {
        self.statements.push(sql.to_string());
        Ok(())
    }

    fn read_i64s(&mut self, _sql: &str) -> Result<Vec<i64>, ProcessorError> {
        Ok(Vec::new())
    }

    fn table_exists(&mut self, _schema: Option<&str>, _table: &str) -> Result<bool, ProcessorError> {
        Ok(false)
    }

    fn commit(&mut self) -> Result<(), ProcessorError> {
        log::debug!("Script commit");
        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ProcessorError> {
        log::debug!("Script rollback");
        self.rollbacks += 1;
        Ok(())
    }

    // Recording is the whole point, preview or not.
    fn execute(&mut self, sql: &str) -> Result<(), MigrationError> {
        log::info!("{sql}");
        self.statements.push(sql.to_string());
        Ok(())
    }
}
