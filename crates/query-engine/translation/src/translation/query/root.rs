//! Compile a chain of operators into the SELECT of one scope.

use indexmap::IndexMap;

use query_engine_models::{AggregateMethod, Lambda, Query, Type};
use query_engine_sql::sql;

use super::aggregates;
use super::fields::{self, SelectHandler};
use super::filtering::WhereHandler;
use super::joins::{CrossJoinHandler, JoinClause, JoinHandler};
use super::scalar::{Aliases, JoinedTable, Position, Resolver, Scalar, Source};
use super::sorting::{self, Ordering, OrderingHandler};
use crate::translation::error::{Clause, Error};
use crate::translation::helpers::{Env, State};

/// What a scope is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The outermost query.
    Root,
    /// A side of an equi-join. Only a table, optionally ordered, is allowed.
    JoinSource,
    /// A side of a cross join, selected as a derived table.
    CrossJoinSource,
    /// The rows an aggregate is computed over.
    Correlated(AggregateMethod),
    /// The key/value pairs an aggregate of aggregates is computed over.
    CorrelatedPairs,
}

/// The clauses of one scope, gathered by walking its operators from the outermost in.
#[derive(Debug)]
pub struct Statement {
    depth: usize,
    role: Role,
    table: Option<String>,
    select: Option<SelectHandler>,
    where_: Option<WhereHandler>,
    join: Option<JoinClause>,
    /// in walk order, so the last declared comes first
    orderings: Vec<OrderingHandler>,
    /// orderings of the sources of an equi-join
    lifted: Vec<Ordering>,
    /// operators that no clause handles, outermost first
    queued: Vec<String>,
}

impl Statement {
    /// Walk the operators of a scope and fail on any that were left unhandled.
    pub fn compile(
        env: &Env,
        state: &mut State,
        query: &Query,
        depth: usize,
        role: Role,
    ) -> Result<Statement, Error> {
        let mut statement = Statement {
            depth,
            role,
            table: None,
            select: None,
            where_: None,
            join: None,
            orderings: vec![],
            lifted: vec![],
            queued: vec![],
        };
        statement.walk(env, state, query)?;

        // report the operator nearest the table
        if let Some(operator) = statement.queued.last() {
            return Err(Error::UnsupportedMethod(operator.clone()));
        }
        Ok(statement)
    }

    fn walk(&mut self, env: &Env, state: &mut State, query: &Query) -> Result<(), Error> {
        if self.role == Role::JoinSource {
            match query {
                Query::Table { .. } | Query::OrderBy { .. } => {}
                Query::Join { .. } | Query::CrossJoin { .. } => {
                    return Err(Error::DuplicateClauseHandler {
                        clause: Clause::Join,
                        expression: query.to_string(),
                    })
                }
                _ => {
                    return Err(Error::UnsupportedMethod(format!(
                        "{} in a join source",
                        describe_operator(query)
                    )))
                }
            }
        }

        match query {
            Query::Table { row_type } => {
                if row_type.is_empty() {
                    return Err(Error::InvalidArgument(
                        "a table must name its row type".to_string(),
                    ));
                }
                env.lookup_row_type(row_type)?;
                self.table = Some(row_type.clone());
                Ok(())
            }
            Query::Select { source, selector } => {
                if is_grouped(selector) {
                    self.queued.push(describe_operator(query));
                } else if self.select.is_some() {
                    return Err(Error::DuplicateClauseHandler {
                        clause: Clause::Select,
                        expression: selector.to_string(),
                    });
                } else {
                    self.select = Some(SelectHandler::new(env, state, selector)?);
                }
                self.walk(env, state, source)
            }
            Query::Where { source, predicate } => {
                if is_grouped(predicate) {
                    self.queued.push(describe_operator(query));
                } else if self.where_.is_some() {
                    return Err(Error::DuplicateClauseHandler {
                        clause: Clause::Where,
                        expression: predicate.to_string(),
                    });
                } else {
                    self.where_ = Some(WhereHandler::new(env, state, predicate)?);
                }
                self.walk(env, state, source)
            }
            Query::OrderBy { source, key, kind } => {
                if is_grouped(key) {
                    self.queued.push(describe_operator(query));
                } else {
                    self.orderings
                        .push(OrderingHandler::new(env, state, key, *kind)?);
                }
                self.walk(env, state, source)
            }
            Query::Join {
                outer,
                inner,
                outer_key,
                inner_key,
                result_selector,
            } => {
                if self.join.is_some() {
                    return Err(Error::DuplicateClauseHandler {
                        clause: Clause::Join,
                        expression: query.to_string(),
                    });
                }
                let (join, lifted) = JoinHandler::new(
                    env,
                    state,
                    self.depth,
                    outer,
                    inner,
                    outer_key,
                    inner_key,
                    result_selector,
                )?;
                self.join = Some(JoinClause::Join(join));
                self.lifted = lifted;
                Ok(())
            }
            Query::CrossJoin {
                source,
                collection,
                result_selector,
            } => {
                if self.join.is_some() {
                    return Err(Error::DuplicateClauseHandler {
                        clause: Clause::Join,
                        expression: query.to_string(),
                    });
                }
                self.join = Some(JoinClause::CrossJoin(CrossJoinHandler::new(
                    env,
                    state,
                    self.depth,
                    source,
                    collection,
                    result_selector,
                )?));
                Ok(())
            }
            Query::Call { source, .. } => {
                self.queued.push(describe_operator(query));
                self.walk(env, state, source)
            }
        }
    }

    /// Translate the scope to a SELECT. Scopes whose orderings must be applied by the
    /// enclosing scope return them instead of emitting an ORDER BY.
    pub fn translate(
        &self,
        env: &Env,
        state: &mut State,
        outer: Option<&Resolver>,
    ) -> Result<(sql::ast::Select, Vec<Ordering>), Error> {
        let mut lifted = self.lifted.clone();

        let (source, from, mut joins) = match &self.join {
            Some(JoinClause::Join(join)) => {
                let (source, from) = join.source();
                (source, from, vec![])
            }
            Some(JoinClause::CrossJoin(cross_join)) => {
                let (source, from, join, orderings) = cross_join.translate(env, state, outer)?;
                lifted.extend(orderings);
                (source, from, vec![join])
            }
            None => self.table_source(env, state)?,
        };

        let resolver = Resolver {
            depth: self.depth,
            aliases: self.record_aliases(),
            source: &source,
            outer,
        };

        if let Some(JoinClause::Join(join)) = &self.join {
            joins.push(join.translate(env, state, &resolver)?);
        }

        let select_list = self.translate_select_list(env, state, &resolver)?;

        let where_ = match &self.where_ {
            Some(where_) => where_.translate(env, state, &resolver)?,
            None => sql::ast::Where(sql::helpers::empty_where()),
        };

        // the orderings of the sources come first, then ours in declaration order
        let orderings: Vec<Ordering> = lifted
            .into_iter()
            .chain(
                self.orderings
                    .iter()
                    .rev()
                    .map(|handler| handler.ordering.clone()),
            )
            .collect();

        let (order_by, orderings) = match self.role {
            Role::Root => (
                sorting::translate_order_by(env, state, &resolver, &orderings)?,
                vec![],
            ),
            Role::Correlated(_) | Role::CorrelatedPairs => {
                (sql::helpers::empty_order_by(), vec![])
            }
            Role::JoinSource | Role::CrossJoinSource => (
                sql::helpers::empty_order_by(),
                sorting::lift(
                    orderings,
                    self.select
                        .as_ref()
                        .map(|select| (select.record, &select.translated.aliases)),
                ),
            ),
        };

        Ok((
            sql::ast::Select {
                select_list,
                from: Some(from),
                joins,
                where_,
                order_by,
            },
            orderings,
        ))
    }

    /// The table of an equi-join source, along with its orderings in declaration order.
    pub fn joined_table(
        &self,
        env: &Env,
        state: &mut State,
    ) -> Result<(JoinedTable, Vec<Ordering>), Error> {
        let row_type = self.row_type()?;
        let table_name = env.lookup_row_type(row_type)?.table_name.clone();
        let table = JoinedTable {
            row: state.row_type_id(&Type::Row(row_type.to_string())),
            row_type: row_type.to_string(),
            table_name,
        };
        let orderings = self
            .orderings
            .iter()
            .rev()
            .map(|handler| handler.ordering.clone())
            .collect();
        Ok((table, orderings))
    }

    /// The output column of each member of the rows this scope produces, for use as a
    /// derived table.
    pub fn exports(&self, env: &Env) -> Result<IndexMap<String, String>, Error> {
        if let Some(members) = self.exported_members() {
            return Ok(members
                .into_iter()
                .map(|(member, _)| (member.to_string(), member.to_string()))
                .collect());
        }
        match self.projection_type() {
            Some(Type::Row(row_type)) => Ok(env
                .lookup_row_type(&row_type)?
                .columns
                .iter()
                .map(|(member, column)| (member.clone(), column.name.clone()))
                .collect()),
            _ => Ok(IndexMap::new()),
        }
    }

    fn row_type(&self) -> Result<&str, Error> {
        self.table
            .as_deref()
            .ok_or_else(|| Error::UnresolvableProjection("a query without a table".to_string()))
    }

    fn table_source(
        &self,
        env: &Env,
        state: &mut State,
    ) -> Result<(Source, sql::ast::From, Vec<sql::ast::Join>), Error> {
        let row_type = self.row_type()?;
        let table_name = &env.lookup_row_type(row_type)?.table_name;
        let alias = sql::helpers::make_depth_alias(self.depth);
        let source = Source::Table {
            row: state.row_type_id(&Type::Row(row_type.to_string())),
            row_type: row_type.to_string(),
            alias: alias.clone(),
        };
        let from = sql::ast::From::Table {
            reference: sql::helpers::db_table(table_name),
            alias: Some(alias),
        };
        Ok((source, from, vec![]))
    }

    /// The records built by the projection and by the join result selector, outermost first.
    fn record_aliases(&self) -> Vec<&Aliases> {
        self.select
            .iter()
            .map(|select| &select.translated.aliases)
            .chain(self.join.iter().map(|join| &join.result().aliases))
            .collect()
    }

    /// The members selected under their own names, when the scope is selected from by
    /// another one.
    fn exported_members(&self) -> Option<Vec<(&str, &Scalar)>> {
        match self.role {
            Role::CorrelatedPairs | Role::CrossJoinSource => {
                let members = self.select.as_ref()?.record_members();
                (!members.is_empty()).then_some(members)
            }
            Role::Root | Role::JoinSource | Role::Correlated(_) => None,
        }
    }

    /// The type of the rows this scope produces.
    fn projection_type(&self) -> Option<Type> {
        self.select
            .as_ref()
            .map(|select| select.translated.return_type.clone())
            .or_else(|| {
                self.join
                    .as_ref()
                    .map(|join| join.result().return_type.clone())
            })
            .or_else(|| {
                self.where_
                    .as_ref()
                    .map(|where_| where_.parameter_type.clone())
            })
            .or_else(|| {
                self.orderings
                    .first()
                    .map(|ordering| ordering.parameter_type.clone())
            })
            .or_else(|| match self.role {
                Role::Root => None,
                _ => self.table.clone().map(Type::Row),
            })
    }

    fn translate_select_list(
        &self,
        env: &Env,
        state: &mut State,
        resolver: &Resolver,
    ) -> Result<sql::ast::SelectList, Error> {
        if let Role::Correlated(aggregate) = self.role {
            let expression = match (aggregate, &self.select) {
                (AggregateMethod::Count, _) => {
                    sql::ast::Expression::Count(sql::ast::CountType::Star)
                }
                (_, Some(select)) => aggregates::translate_aggregate(
                    aggregate,
                    select
                        .translated
                        .body
                        .resolve(env, state, resolver, Position::SelectList)?,
                ),
                (_, None) => {
                    return Err(Error::UnresolvableProjection(self.describe()));
                }
            };
            return Ok(sql::ast::SelectList::Expressions(vec![expression]));
        }

        if let Some(members) = self.exported_members() {
            return fields::translate_members(env, state, resolver, &members);
        }

        let columns = match (&self.select, &self.join) {
            (Some(select), _) => select.translated.columns.as_slice(),
            (None, Some(join)) => join.result().columns.as_slice(),
            (None, None) => &[],
        };
        if !columns.is_empty() {
            return Ok(sql::ast::SelectList::Expressions(fields::translate_columns(
                env, state, resolver, columns,
            )?));
        }

        let r#type = self
            .projection_type()
            .ok_or_else(|| Error::UnresolvableProjection(self.describe()))?;
        Ok(sql::ast::SelectList::Expressions(fields::default_columns(
            env, &r#type,
        )?))
    }

    fn describe(&self) -> String {
        match &self.table {
            Some(row_type) => format!("Table<{row_type}>"),
            None => "a join".to_string(),
        }
    }
}

/// Whether a lambda ranges over groupings, which no clause handles.
fn is_grouped(lambda: &Lambda) -> bool {
    lambda
        .parameters
        .first()
        .is_some_and(|parameter| parameter.r#type.is_group())
}

/// The outermost operator of a query, for error messages.
fn describe_operator(query: &Query) -> String {
    match query {
        Query::Table { row_type } => format!("Table<{row_type}>"),
        Query::Select { selector, .. } => format!("Select({selector})"),
        Query::Where { predicate, .. } => format!("Where({predicate})"),
        Query::Join { .. } => "Join".to_string(),
        Query::CrossJoin { .. } => "SelectMany".to_string(),
        Query::OrderBy { key, kind, .. } => format!("{}({key})", kind.name()),
        Query::Call {
            method, arguments, ..
        } => {
            let arguments: Vec<String> = arguments.iter().map(ToString::to_string).collect();
            format!("{method}({})", arguments.join(", "))
        }
    }
}
