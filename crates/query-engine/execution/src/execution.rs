//! Execute an execution plan against the database.

use async_trait::async_trait;
use tracing::{info_span, Instrument};

use query_engine_sql::sql;
use query_engine_sql::sql::string::Param;

use crate::error::Error;

/// Runs SQL text with `@N` placeholders bound to the parameter at index N.
#[async_trait]
pub trait StatementExecutor {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run a query and return its rows.
    async fn query(
        &self,
        sql: &str,
        params: &[Param],
    ) -> Result<Vec<serde_json::Value>, Self::Error>;
}

/// Execute a query against the database.
pub async fn execute<E: StatementExecutor + Sync>(
    executor: &E,
    plan: &sql::execution_plan::ExecutionPlan,
) -> Result<Vec<serde_json::Value>, Error> {
    let query = plan.query_sql();

    tracing::info!(
        generated_sql = %query.sql,
        params = ?&query.params,
        root_row_type = %plan.root_row_type,
    );

    let rows = executor
        .query(&query.sql, &query.params)
        .instrument(info_span!("Database request", row_type = %plan.root_row_type))
        .await
        .map_err(|err| Error::Executor(Box::new(err)))?;

    tracing::debug!(rows_result = rows.len());
    Ok(rows)
}
