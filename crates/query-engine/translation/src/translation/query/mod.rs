//! Translate an incoming `Query`.

pub mod aggregates;
pub mod fields;
pub mod filtering;
pub mod functions;
pub mod joins;
pub mod lambda;
pub mod relationships;
pub mod root;
pub mod scalar;
pub mod sorting;
pub mod values;

use lambda_sql_configuration::Dialect;
use query_engine_metadata::metadata;
use query_engine_models::Query;
use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::evaluator;
use crate::translation::helpers::{Env, State};
use root::{Role, Statement};

/// Translate the incoming Query to an ExecutionPlan (SQL) to be run against the database.
pub fn translate(
    metadata: &metadata::Metadata,
    dialect: &Dialect,
    query: &Query,
) -> Result<sql::execution_plan::ExecutionPlan, Error> {
    // fold everything that does not depend on a row into constants first
    let query = evaluator::partially_evaluate_query(query)?;
    tracing::debug!("Partially evaluated query: {}", query);

    let env = Env::new(metadata, dialect);
    let mut state = State::new();
    let select = translate_query(&env, &mut state, &query)?;

    // log and return
    tracing::info!("SQL AST: {:?}", select);
    Ok(sql::execution_plan::simple_exec_plan(
        query.element_type().to_string(),
        select,
    ))
}

/// Translate a query to sql ast.
pub fn translate_query(
    env: &Env,
    state: &mut State,
    query: &Query,
) -> Result<sql::ast::Select, Error> {
    let statement = Statement::compile(env, state, query, 0, Role::Root)?;
    let (select, _) = statement.translate(env, state, None)?;
    Ok(select)
}
