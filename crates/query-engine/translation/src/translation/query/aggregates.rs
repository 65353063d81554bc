//! Handle aggregate functions and the correlated subqueries that compute them.

use query_engine_models::AggregateMethod;
use query_engine_sql::sql;

use super::root::{Role, Statement};
use super::scalar::{Correlated, Resolver};
use crate::translation::error::Error;
use crate::translation::helpers::{Env, State};

/// The aggregate function applied to an argument. `Count` counts rows and ignores it.
pub fn translate_aggregate(
    aggregate: AggregateMethod,
    argument: sql::ast::Expression,
) -> sql::ast::Expression {
    let function = match aggregate {
        AggregateMethod::Count => return sql::ast::Expression::Count(sql::ast::CountType::Star),
        AggregateMethod::Sum => sql::ast::Function::Sum,
        AggregateMethod::Min => sql::ast::Function::Min,
        AggregateMethod::Max => sql::ast::Function::Max,
        AggregateMethod::Average => sql::ast::Function::Avg,
    };
    sql::ast::Expression::FunctionCall {
        function,
        args: vec![argument],
    }
}

/// Compile a correlated aggregate one level below the statement of `outer`.
pub fn translate_correlated(
    env: &Env,
    state: &mut State,
    correlated: &Correlated,
    outer: &Resolver,
) -> Result<sql::ast::Select, Error> {
    let depth = outer.depth + 1;

    if correlated.nested {
        // aggregate the values of the key/value pairs selected one level further down
        let statement = Statement::compile(
            env,
            state,
            &correlated.query,
            depth + 1,
            Role::CorrelatedPairs,
        )?;
        let (pairs, _) = statement.translate(env, state, Some(outer))?;
        Ok(sql::helpers::select_from_derived(
            vec![translate_aggregate(
                correlated.aggregate,
                sql::helpers::bare_column("Value"),
            )],
            pairs,
            sql::helpers::make_depth_alias(depth),
        ))
    } else {
        let statement = Statement::compile(
            env,
            state,
            &correlated.query,
            depth,
            Role::Correlated(correlated.aggregate),
        )?;
        let (select, _) = statement.translate(env, state, Some(outer))?;
        Ok(select)
    }
}
