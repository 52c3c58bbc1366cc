//! In-process migration execution helpers

use crate::config::RunnerConfig;
use crate::migration::{MigrationError, MigrationRegistry, MigrationRunner, RunReport};
use crate::processor::factory;

/// Run pending migrations on application startup
///
/// Resolves the configured provider through the process-wide factory registry,
/// opens a processor and runs [`MigrationRunner::migrate_up`].
///
/// # Arguments
///
/// * `config` - Provider, connection string and execution settings
/// * `registry` - The migrations to apply
///
/// # Returns
///
/// The report of the run, or an error if:
/// - The provider is unknown (`MigrationError::Configuration`)
/// - The connection cannot be opened
/// - A migration fails (the batch is rolled back first)
///
/// # Example
///
/// ```rust,no_run
/// use tidemark::config::RunnerConfig;
/// use tidemark::migration::{startup_migrations, MigrationRegistry};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = RunnerConfig::load()?;
///     let registry = MigrationRegistry::new();
///
///     // Run migrations on startup
///     startup_migrations(&config, registry)?;
///
///     // Continue with application startup...
///     Ok(())
/// }
/// ```
pub fn startup_migrations(
    config: &RunnerConfig,
    registry: MigrationRegistry,
) -> Result<RunReport, MigrationError> {
    let factory = factory::get_factory(&config.provider).ok_or_else(|| {
        MigrationError::Configuration(format!(
            "unknown provider '{}'; available providers: {}",
            config.provider,
            factory::list_available_providers().join(", ")
        ))
    })?;
    log::debug!("Using {} for provider '{}'", factory.name(), config.provider);

    let processor = factory.create(
        &config.connection_string,
        &config.execution_options(),
        &config.generator_options(),
    )?;

    let mut runner = MigrationRunner::with_version_table(processor, registry, config.version_table())?
        .with_conventions(config.conventions());
    let report = runner.migrate_up()?;

    if report.applied.is_empty() {
        log::debug!("No pending migrations to apply");
    } else {
        log::info!("Applied {} migration(s) on startup", report.applied.len());
    }
    if !report.caught_failures.is_empty() {
        log::warn!(
            "{} expression(s) failed and were skipped",
            report.caught_failures.len()
        );
    }

    Ok(report)
}
