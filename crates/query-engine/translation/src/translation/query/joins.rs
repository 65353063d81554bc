//! Handle equi-joins and cross joins.

use query_engine_models::{Lambda, Query};
use query_engine_sql::sql;

use super::lambda::{translate_lambda, Translated};
use super::root::{Role, Statement};
use super::scalar::{DerivedTable, JoinedTable, Position, Resolver, Scalar, Source};
use super::sorting::Ordering;
use crate::translation::error::Error;
use crate::translation::helpers::{Env, RowTypeId, State};

/// The join a scope selects from.
#[derive(Debug)]
pub enum JoinClause {
    Join(JoinHandler),
    CrossJoin(CrossJoinHandler),
}

impl JoinClause {
    /// The translated result selector.
    pub fn result(&self) -> &Translated {
        match self {
            JoinClause::Join(join) => &join.result,
            JoinClause::CrossJoin(cross_join) => &cross_join.result,
        }
    }
}

/// `outer.Join(inner, outer_key, inner_key, result_selector)`, selecting from two tables.
#[derive(Debug)]
pub struct JoinHandler {
    left: JoinedTable,
    right: JoinedTable,
    outer_key: Scalar,
    inner_key: Scalar,
    pub result: Translated,
}

impl JoinHandler {
    /// Build the handler, along with the orderings of both sources.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        env: &Env,
        state: &mut State,
        depth: usize,
        outer: &Query,
        inner: &Query,
        outer_key: &Lambda,
        inner_key: &Lambda,
        result_selector: &Lambda,
    ) -> Result<(JoinHandler, Vec<Ordering>), Error> {
        let outer_key = translate_lambda(env, state, outer_key, 1)?;
        let inner_key = translate_lambda(env, state, inner_key, 1)?;
        let result = translate_lambda(env, state, result_selector, 2)?;

        let (left, mut orderings) =
            Statement::compile(env, state, outer, depth + 1, Role::JoinSource)?
                .joined_table(env, state)?;
        let (right, right_orderings) =
            Statement::compile(env, state, inner, depth + 1, Role::JoinSource)?
                .joined_table(env, state)?;
        orderings.extend(right_orderings);

        // columns are resolved by row type, so the two sides must differ
        if left.row == right.row {
            return Err(Error::UnsupportedMethod(format!(
                "a join of '{}' with itself",
                left.row_type
            )));
        }

        Ok((
            JoinHandler {
                left,
                right,
                outer_key: outer_key.body,
                inner_key: inner_key.body,
                result,
            },
            orderings,
        ))
    }

    /// The joined tables, and the FROM clause naming the left one.
    pub fn source(&self) -> (Source, sql::ast::From) {
        (
            Source::Join {
                left: self.left.clone(),
                right: self.right.clone(),
            },
            sql::ast::From::Table {
                reference: sql::helpers::db_table(&self.left.table_name),
                alias: None,
            },
        )
    }

    /// The INNER JOIN of the right table on the equality of the keys.
    pub fn translate(
        &self,
        env: &Env,
        state: &mut State,
        resolver: &Resolver,
    ) -> Result<sql::ast::Join, Error> {
        Ok(sql::ast::Join::InnerJoin(sql::ast::InnerJoin {
            reference: sql::helpers::db_table(&self.right.table_name),
            left_key: self
                .outer_key
                .resolve(env, state, resolver, Position::Predicate)?,
            right_key: self
                .inner_key
                .resolve(env, state, resolver, Position::Predicate)?,
        }))
    }
}

/// `source.SelectMany(collection, result_selector)`, selecting from two subqueries.
#[derive(Debug)]
pub struct CrossJoinHandler {
    left: Box<Statement>,
    right: Box<Statement>,
    left_row: RowTypeId,
    right_row: RowTypeId,
    pub result: Translated,
}

impl CrossJoinHandler {
    pub fn new(
        env: &Env,
        state: &mut State,
        depth: usize,
        source: &Query,
        collection: &Query,
        result_selector: &Lambda,
    ) -> Result<CrossJoinHandler, Error> {
        let result = translate_lambda(env, state, result_selector, 2)?;
        let left_row = state.row_type_id(&result_selector.parameters[0].r#type);
        let right_row = state.row_type_id(&result_selector.parameters[1].r#type);
        if left_row == right_row {
            return Err(Error::UnsupportedMethod(format!(
                "a cross join of '{}' with itself",
                result_selector.parameters[0].r#type
            )));
        }

        Ok(CrossJoinHandler {
            left: Box::new(Statement::compile(
                env,
                state,
                source,
                depth + 1,
                Role::CrossJoinSource,
            )?),
            right: Box::new(Statement::compile(
                env,
                state,
                collection,
                depth + 1,
                Role::CrossJoinSource,
            )?),
            left_row,
            right_row,
            result,
        })
    }

    /// The derived tables, the FROM clause and CROSS JOIN selecting them, and the orderings
    /// of both sides.
    pub fn translate(
        &self,
        env: &Env,
        state: &mut State,
        outer: Option<&Resolver>,
    ) -> Result<(Source, sql::ast::From, sql::ast::Join, Vec<Ordering>), Error> {
        let (left_select, mut orderings) = self.left.translate(env, state, outer)?;
        let (right_select, right_orderings) = self.right.translate(env, state, outer)?;
        orderings.extend(right_orderings);

        let left = DerivedTable {
            row: self.left_row,
            alias: sql::helpers::make_table_alias("leftStatement"),
            exports: self.left.exports(env)?,
        };
        let right = DerivedTable {
            row: self.right_row,
            alias: sql::helpers::make_table_alias("rightStatement"),
            exports: self.right.exports(env)?,
        };

        let from = sql::ast::From::Select {
            select: Box::new(left_select),
            alias: left.alias.clone(),
        };
        let join = sql::ast::Join::CrossJoin(sql::ast::CrossJoin {
            select: Box::new(right_select),
            alias: right.alias.clone(),
        });

        Ok((Source::CrossJoin { left, right }, from, join, orderings))
    }
}
