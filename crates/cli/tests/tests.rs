use std::fs;
use std::path::{Path, PathBuf};

use lambda_sql_cli::{run, Command};
use lambda_sql_configuration::{write_parsed_configuration, ParsedConfiguration};
use query_engine_models::builders::{constant, eq, lambda};
use query_engine_models::Query;
use tests_common::{customer, field};

async fn shop_configuration(dir: &Path) -> anyhow::Result<()> {
    let mut parsed = ParsedConfiguration::empty();
    parsed.metadata = tests_common::shop_metadata();
    write_parsed_configuration(parsed, dir).await?;
    Ok(())
}

fn customers_in_london(dir: &Path) -> anyhow::Result<PathBuf> {
    let c = customer("c");
    let query = Query::table("Customer")
        .filter(lambda([&c], eq(field(&c, "City"), constant("London"))))
        .select(lambda([&c], field(&c, "Name")));
    let path = dir.join("query.json");
    fs::write(&path, serde_json::to_string(&query)?)?;
    Ok(path)
}

#[tokio::test]
async fn compile_prints_sql_then_parameters() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    shop_configuration(dir.path()).await?;
    let query = customers_in_london(dir.path())?;

    let output = run(Command::Compile {
        configuration: dir.path().to_path_buf(),
        query,
        pretty: false,
    })
    .await?;

    insta::assert_snapshot!(output, @r###"
    SELECT Name FROM Customer AS t0 WHERE (t0.City = @0)
    ["London"]
    "###);
    Ok(())
}

#[tokio::test]
async fn compile_fails_without_a_configuration() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let query = customers_in_london(dir.path())?;

    let result = run(Command::Compile {
        configuration: dir.path().join("missing"),
        query,
        pretty: false,
    })
    .await;

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn schema_describes_the_configuration_file() -> anyhow::Result<()> {
    let output = run(Command::Schema).await?;
    let schema: serde_json::Value = serde_json::from_str(&output)?;
    assert_eq!(schema["title"], "ParsedConfiguration");
    Ok(())
}
