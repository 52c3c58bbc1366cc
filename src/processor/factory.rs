//! Processor factory registry
//!
//! Maps provider names such as `"postgres"` to processor constructors. The
//! process-wide registry is initialized exactly once, either explicitly through
//! [`initialize`] or lazily with the built-in factories on first use.

use super::{ExecutionOptions, Processor, ScriptProcessor};
use crate::generator::{Dialect, GeneratorOptions};
use crate::migration::MigrationError;
use once_cell::sync::OnceCell;
use std::sync::Arc;

const SUFFIX: &str = "ProcessorFactory";

/// Creates processors for one engine
pub trait ProcessorFactory: Send + Sync {
    /// Full factory name, e.g. `"PostgresProcessorFactory"`
    fn name(&self) -> &str;

    fn dialect(&self) -> Dialect;

    /// Lowercased name without the `ProcessorFactory` suffix
    fn provider_name(&self) -> String {
        let name = self.name();
        name.strip_suffix(SUFFIX).unwrap_or(name).to_lowercase()
    }

    /// Open a processor
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Processor` when the connection fails and
    /// `MigrationError::Configuration` when the factory cannot serve the request.
    fn create(
        &self,
        connection_string: &str,
        options: &ExecutionOptions,
        generator_options: &GeneratorOptions,
    ) -> Result<Box<dyn Processor>, MigrationError>;
}

/// Factory for engines without a compiled-in connector
///
/// Serves preview-only runs through a [`ScriptProcessor`].
struct ScriptOnlyFactory {
    name: &'static str,
    dialect: Dialect,
}

impl ProcessorFactory for ScriptOnlyFactory {
    fn name(&self) -> &str {
        self.name
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn create(
        &self,
        _connection_string: &str,
        options: &ExecutionOptions,
        generator_options: &GeneratorOptions,
    ) -> Result<Box<dyn Processor>, MigrationError> {
        if !options.preview_only {
            return Err(MigrationError::Configuration(format!(
                "no {} connector is available; only preview-only runs are supported",
                self.dialect
            )));
        }
        Ok(Box::new(ScriptProcessor::new(
            self.dialect,
            options.clone(),
            generator_options.clone(),
        )))
    }
}

#[cfg(feature = "postgres")]
struct PostgresFactory;

#[cfg(feature = "postgres")]
impl ProcessorFactory for PostgresFactory {
    fn name(&self) -> &str {
        "PostgresProcessorFactory"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn create(
        &self,
        connection_string: &str,
        options: &ExecutionOptions,
        generator_options: &GeneratorOptions,
    ) -> Result<Box<dyn Processor>, MigrationError> {
        if options.preview_only && connection_string.is_empty() {
            return Ok(Box::new(ScriptProcessor::new(
                Dialect::Postgres,
                options.clone(),
                generator_options.clone(),
            )));
        }
        let processor = super::PostgresProcessor::connect(
            connection_string,
            options.clone(),
            generator_options.clone(),
        )?;
        Ok(Box::new(processor))
    }
}

#[cfg(feature = "sqlite")]
struct SqliteFactory;

#[cfg(feature = "sqlite")]
impl ProcessorFactory for SqliteFactory {
    fn name(&self) -> &str {
        "SqliteProcessorFactory"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn create(
        &self,
        connection_string: &str,
        options: &ExecutionOptions,
        generator_options: &GeneratorOptions,
    ) -> Result<Box<dyn Processor>, MigrationError> {
        let processor = super::SqliteProcessor::connect(
            connection_string,
            options.clone(),
            generator_options.clone(),
        )?;
        Ok(Box::new(processor))
    }
}

/// Ordered list of processor factories
#[derive(Default, Clone)]
pub struct FactoryRegistry {
    factories: Vec<Arc<dyn ProcessorFactory>>,
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.factories.iter().map(|factory| factory.name().to_string()))
            .finish()
    }
}

impl FactoryRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in factories: MySql, Postgres, SqlServer, Sqlite
    ///
    /// Postgres and Sqlite are only present when their features are enabled.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ScriptOnlyFactory {
            name: "MySqlProcessorFactory",
            dialect: Dialect::MySql,
        });
        #[cfg(feature = "postgres")]
        registry.register(PostgresFactory);
        registry.register(ScriptOnlyFactory {
            name: "SqlServerProcessorFactory",
            dialect: Dialect::SqlServer,
        });
        #[cfg(feature = "sqlite")]
        registry.register(SqliteFactory);
        registry
    }

    /// Append a factory; lookups prefer earlier registrations
    pub fn register(&mut self, factory: impl ProcessorFactory + 'static) -> &mut Self {
        self.factories.push(Arc::new(factory));
        self
    }

    /// Find a factory by name
    ///
    /// An exact case-insensitive match on the factory name or provider name wins.
    /// Otherwise the first factory whose name starts with `name`
    /// (case-insensitive) is returned.
    pub fn get_factory(&self, name: &str) -> Option<Arc<dyn ProcessorFactory>> {
        if name.is_empty() {
            return None;
        }
        let wanted = name.to_lowercase();

        self.factories
            .iter()
            .find(|f| f.name().to_lowercase() == wanted || f.provider_name() == wanted)
            .or_else(|| {
                self.factories
                    .iter()
                    .find(|f| f.name().to_lowercase().starts_with(&wanted))
            })
            .cloned()
    }

    /// Provider names, sorted
    pub fn list_available_providers(&self) -> Vec<String> {
        let mut providers: Vec<String> = self.factories.iter().map(|f| f.provider_name()).collect();
        providers.sort();
        providers
    }
}

static REGISTRY: OnceCell<FactoryRegistry> = OnceCell::new();

/// Install the process-wide registry
///
/// # Errors
///
/// Returns the rejected registry if one was already installed, explicitly or by
/// an earlier lookup.
pub fn initialize(registry: FactoryRegistry) -> Result<(), FactoryRegistry> {
    REGISTRY.set(registry)
}

/// The process-wide registry, initialized with the built-in factories on first use
pub fn registry() -> &'static FactoryRegistry {
    init_registry(&REGISTRY, FactoryRegistry::builtin)
}

/// Concurrent first callers block until one of them has built the registry
fn init_registry(
    cell: &OnceCell<FactoryRegistry>,
    build: impl FnOnce() -> FactoryRegistry,
) -> &FactoryRegistry {
    cell.get_or_init(|| {
        log::debug!("Initializing built-in processor factories");
        build()
    })
}

/// Look up a factory in the process-wide registry
pub fn get_factory(name: &str) -> Option<Arc<dyn ProcessorFactory>> {
    registry().get_factory(name)
}

/// Provider names of the process-wide registry, sorted
pub fn list_available_providers() -> Vec<String> {
    registry().list_available_providers()
}
