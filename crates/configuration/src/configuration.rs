//! Configuration for the query compiler.

use query_engine_metadata::metadata;
use schemars::{gen::SchemaSettings, schema::RootSchema};

use crate::values::Dialect;
use crate::version1::ParsedConfiguration;

/// The 'Configuration' type collects all the information necessary to compile queries.
///
/// Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration', which validates the metadata on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub metadata: metadata::Metadata,
    pub dialect: Dialect,
}

/// The JSON schema of the configuration file.
pub fn configuration_jsonschema() -> RootSchema {
    SchemaSettings::draft07()
        .into_generator()
        .into_root_schema_for::<ParsedConfiguration>()
}
