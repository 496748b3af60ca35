//! Runtime configuration for the compiler.

use std::sync::Arc;

use query_engine_metadata::metadata::SchemaRegistry;
use schemars::{gen::SchemaSettings, schema::RootSchema};

use crate::error::MakeRuntimeConfigurationError;
use crate::values::CompilerSettings;
use crate::version1::ParsedConfiguration;

/// The 'Configuration' type collects all the information necessary to compile queries at runtime.
///
/// Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration', which validates the settings and builds the schema registry.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub settings: CompilerSettings,
    pub registry: Arc<SchemaRegistry>,
}

impl Configuration {
    pub fn new(settings: CompilerSettings, registry: Arc<SchemaRegistry>) -> Self {
        Configuration { settings, registry }
    }
}

/// Validate a parsed configuration and turn it into a runtime one.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    validate_settings(&parsed_config.settings)?;
    let registry = SchemaRegistry::from_definitions(&parsed_config.schemas)?;
    Ok(Configuration::new(parsed_config.settings, registry))
}

fn validate_settings(settings: &CompilerSettings) -> Result<(), MakeRuntimeConfigurationError> {
    if settings.default_limit > settings.max_limit {
        return Err(MakeRuntimeConfigurationError::InvalidSettings(format!(
            "defaultLimit {} is greater than maxLimit {}",
            settings.default_limit, settings.max_limit
        )));
    }
    if settings.max_join_depth == 0 {
        return Err(MakeRuntimeConfigurationError::InvalidSettings(
            "maxJoinDepth must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// The JSON Schema of the configuration file.
pub fn generate_latest_schema() -> RootSchema {
    SchemaSettings::draft07()
        .into_generator()
        .into_root_schema_for::<ParsedConfiguration>()
}
