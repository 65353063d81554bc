//! Version 1 of the configuration format: the row-type registry and dialect options.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;

use query_engine_metadata::metadata;

use crate::configuration::{configuration_jsonschema, Configuration};
use crate::error::{
    MakeRuntimeConfigurationError, ParseConfigurationError, WriteParsedConfigurationError,
};
use crate::values::Dialect;

const CURRENT_VERSION: u32 = 1;
pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";

/// The configuration as it is stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct ParsedConfiguration {
    // Which version of the configuration format are we using
    pub version: u32,
    #[serde(default)]
    pub metadata: metadata::Metadata,
    #[serde(default)]
    #[serde(skip_serializing_if = "Dialect::is_default")]
    pub dialect: Dialect,
}

impl ParsedConfiguration {
    pub fn empty() -> Self {
        ParsedConfiguration {
            version: CURRENT_VERSION,
            metadata: metadata::Metadata::empty(),
            dialect: Dialect::default(),
        }
    }
}

/// Parse the configuration format from a directory.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|err| {
                ParseConfigurationError::IoErrorButStringified(format!(
                    "{}: {}",
                    &configuration_file.display(),
                    err
                ))
            })?;

    let parsed_config: ParsedConfiguration = serde_json::from_str(&configuration_file_contents)
        .map_err(|error| ParseConfigurationError::ParseError {
            file_path: configuration_file.clone(),
            line: error.line(),
            column: error.column(),
            message: error.to_string(),
        })?;

    if parsed_config.version != CURRENT_VERSION {
        return Err(ParseConfigurationError::UnsupportedVersion(
            parsed_config.version,
        ));
    }

    tracing::debug!(
        row_types = parsed_config.metadata.row_types.0.len(),
        "parsed configuration from {}",
        configuration_file.display()
    );

    Ok(parsed_config)
}

/// Write the parsed configuration, and its JSON schema, into a directory on disk.
pub async fn write_parsed_configuration(
    parsed_config: ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    let configuration_file = out_dir.as_ref().to_owned().join(CONFIGURATION_FILENAME);
    fs::create_dir_all(out_dir.as_ref()).await?;

    // create the configuration file
    fs::write(
        configuration_file,
        serde_json::to_string_pretty(&parsed_config)? + "\n",
    )
    .await?;

    // create the jsonschema file
    let configuration_jsonschema_file_path = out_dir
        .as_ref()
        .to_owned()
        .join(CONFIGURATION_JSONSCHEMA_FILENAME);

    fs::write(
        &configuration_jsonschema_file_path,
        serde_json::to_string_pretty(&configuration_jsonschema())? + "\n",
    )
    .await?;

    Ok(())
}

/// Validate the parsed configuration and turn it into the runtime configuration.
///
/// Every primary key and foreign key must be a column of its row type, and every row type
/// referenced by a foreign key or a navigation must be registered. A navigation is only
/// usable when its target holds a foreign key back to the navigating row type.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    let row_types = &parsed_config.metadata.row_types.0;

    for (name, info) in row_types {
        if !info.columns.contains_key(&info.primary_key) {
            return Err(MakeRuntimeConfigurationError::PrimaryKeyNotAColumn {
                row_type: name.clone(),
                primary_key: info.primary_key.clone(),
            });
        }

        for (principal, column) in &info.foreign_keys {
            if !row_types.contains_key(principal) {
                return Err(MakeRuntimeConfigurationError::UnknownRowType {
                    row_type: name.clone(),
                    target: principal.clone(),
                });
            }
            if !info.columns.contains_key(column) {
                return Err(MakeRuntimeConfigurationError::ForeignKeyNotAColumn {
                    row_type: name.clone(),
                    column: column.clone(),
                });
            }
        }

        for (navigation, navigation_info) in &info.navigations {
            let Some(target) = row_types.get(&navigation_info.target) else {
                return Err(MakeRuntimeConfigurationError::UnknownRowType {
                    row_type: name.clone(),
                    target: navigation_info.target.clone(),
                });
            };
            if !target.foreign_keys.contains_key(name) {
                return Err(MakeRuntimeConfigurationError::NavigationWithoutForeignKey {
                    row_type: name.clone(),
                    navigation: navigation.clone(),
                    target: navigation_info.target.clone(),
                });
            }
        }
    }

    Ok(Configuration {
        metadata: parsed_config.metadata,
        dialect: parsed_config.dialect,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use indexmap::IndexMap;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::values::DivisionOperator;
    use query_engine_metadata::metadata::{ColumnInfo, NavigationInfo, RowTypeInfo, ScalarType};

    fn column(name: &str, r#type: ScalarType) -> (String, ColumnInfo) {
        (
            name.to_string(),
            ColumnInfo {
                name: name.to_string(),
                r#type,
                description: None,
            },
        )
    }

    fn customers_and_orders() -> ParsedConfiguration {
        let customer = RowTypeInfo {
            table_name: "Customer".to_string(),
            primary_key: "Id".to_string(),
            columns: IndexMap::from([
                column("Id", ScalarType::Int32),
                column("Name", ScalarType::String),
            ]),
            foreign_keys: BTreeMap::new(),
            navigations: BTreeMap::from([(
                "Orders".to_string(),
                NavigationInfo {
                    target: "Order".to_string(),
                },
            )]),
        };
        let order = RowTypeInfo {
            table_name: "Order".to_string(),
            primary_key: "Id".to_string(),
            columns: IndexMap::from([
                column("Id", ScalarType::Int32),
                column("CustomerId", ScalarType::Int32),
            ]),
            foreign_keys: BTreeMap::from([("Customer".to_string(), "CustomerId".to_string())]),
            navigations: BTreeMap::new(),
        };

        let mut configuration = ParsedConfiguration::empty();
        configuration.metadata.row_types = metadata::RowTypes(BTreeMap::from([
            ("Customer".to_string(), customer),
            ("Order".to_string(), order),
        ]));
        configuration
    }

    #[test]
    fn valid_metadata_becomes_runtime_configuration() {
        let configuration = make_runtime_configuration(customers_and_orders()).unwrap();
        assert_eq!(configuration.metadata.row_types.0.len(), 2);
        assert_eq!(configuration.dialect.division_operator, DivisionOperator::Slash);
    }

    #[test]
    fn primary_key_must_be_a_column() {
        let mut parsed = customers_and_orders();
        if let Some(customer) = parsed.metadata.row_types.0.get_mut("Customer") {
            customer.primary_key = "CustomerKey".to_string();
        }
        assert_eq!(
            make_runtime_configuration(parsed).unwrap_err(),
            MakeRuntimeConfigurationError::PrimaryKeyNotAColumn {
                row_type: "Customer".to_string(),
                primary_key: "CustomerKey".to_string(),
            }
        );
    }

    #[test]
    fn navigation_needs_a_foreign_key_back() {
        let mut parsed = customers_and_orders();
        if let Some(order) = parsed.metadata.row_types.0.get_mut("Order") {
            order.foreign_keys.clear();
        }
        assert_eq!(
            make_runtime_configuration(parsed).unwrap_err(),
            MakeRuntimeConfigurationError::NavigationWithoutForeignKey {
                row_type: "Customer".to_string(),
                navigation: "Orders".to_string(),
                target: "Order".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn written_configuration_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut parsed = customers_and_orders();
        parsed.dialect.division_operator = DivisionOperator::Backslash;

        write_parsed_configuration(parsed.clone(), dir.path())
            .await
            .unwrap();
        let read_back = parse_configuration(dir.path()).await.unwrap();

        assert_eq!(read_back, parsed);
        assert!(dir.path().join(CONFIGURATION_JSONSCHEMA_FILENAME).exists());
    }

    #[tokio::test]
    async fn unsupported_versions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIGURATION_FILENAME),
            r#"{ "version": 2, "metadata": { "rowTypes": {} } }"#,
        )
        .await
        .unwrap();

        let error = parse_configuration(dir.path()).await.unwrap_err();
        assert!(matches!(error, ParseConfigurationError::UnsupportedVersion(2)));
    }

    #[tokio::test]
    async fn malformed_json_reports_its_position() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIGURATION_FILENAME), "{\n  \"version\": }")
            .await
            .unwrap();

        let error = parse_configuration(dir.path()).await.unwrap_err();
        let ParseConfigurationError::ParseError { line, .. } = error else {
            panic!("expected a parse error, got {error}");
        };
        assert_eq!(line, 2);
    }

    #[test]
    fn configuration_validates_against_its_schema() {
        let schema = serde_json::to_value(configuration_jsonschema()).unwrap();
        let compiled = jsonschema::JSONSchema::compile(&schema).unwrap();
        let instance = serde_json::to_value(customers_and_orders()).unwrap();
        assert!(compiled.is_valid(&instance));
    }
}
