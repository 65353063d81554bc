use std::fs;
use std::path::PathBuf;

use lambda_sql_configuration::Dialect;
use query_engine_models::Query;
use query_engine_sql::sql;
use query_engine_translation::translation;

/// Translate the query of a golden file directory under its configuration, and render the
/// SQL with its parameters.
pub async fn test_translation(testname: &str) -> anyhow::Result<String> {
    let directory = PathBuf::from("tests/goldenfiles").join(testname);

    let parsed_configuration = lambda_sql_configuration::parse_configuration(&directory).await?;
    let configuration = lambda_sql_configuration::make_runtime_configuration(parsed_configuration)?;

    let request: Query =
        serde_json::from_str(&fs::read_to_string(directory.join("request.json"))?)?;

    let plan = translation::query::translate(
        &configuration.metadata,
        &configuration.dialect,
        &request,
    )?;
    Ok(render(&plan.query_sql()))
}

/// The SQL, then each parameter next to the index of its placeholder.
pub fn render(query: &sql::string::SQL) -> String {
    let params: Vec<(usize, &sql::string::Param)> = query.params.iter().enumerate().collect();
    format!("{}\n\n{:?}", query.sql, params)
}

/// Translate a query over the shop fixtures with the default dialect.
pub fn translate(query: &Query) -> Result<sql::string::SQL, translation::error::Error> {
    let metadata = tests_common::shop_metadata();
    let plan = translation::query::translate(&metadata, &Dialect::default(), query)?;
    Ok(plan.query_sql())
}
