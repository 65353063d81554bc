//! The intermediate representation of scalar expressions, and the pass that resolves the
//! column tokens it holds against the scopes of a statement.

use indexmap::IndexMap;

use query_engine_models::{AggregateMethod, BinaryOperator, Literal, Query};
use query_engine_sql::sql;

use super::aggregates;
use super::values;
use crate::translation::error::Error;
use crate::translation::helpers::{ColumnToken, Env, RowTypeId, State};

/// A translated scalar expression whose columns are not yet bound to a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Column(ColumnToken),
    Value(Literal),
    Null,
    Binary {
        left: Box<Scalar>,
        operator: BinaryOperator,
        right: Box<Scalar>,
    },
    Not(Box<Scalar>),
    Negate(Box<Scalar>),
    Function {
        function: sql::ast::Function,
        args: Vec<Scalar>,
    },
    Like {
        expression: Box<Scalar>,
        pattern: Box<Scalar>,
        wildcards: sql::ast::Wildcards,
    },
    Case {
        test: Box<Scalar>,
        if_true: Box<Scalar>,
        if_false: Box<Scalar>,
    },
    /// An aggregate over the rows related to the current one, compiled when it is resolved.
    Subquery(Box<Correlated>),
    /// A row or record. It has no SQL form of its own, only its members do.
    Composite(String),
}

/// A correlated aggregate subquery.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlated {
    /// `Table<Child>.Where(src => src.fk == outer.pk).Select(selector)`
    pub query: Query,
    pub aggregate: AggregateMethod,
    /// Whether the selector is itself an aggregate, in which case the subquery aggregates
    /// over key/value pairs.
    pub nested: bool,
}

/// Members of records built by a projection, by the record's type and the member name.
pub type Aliases = IndexMap<(RowTypeId, String), Scalar>;

/// Where in a statement an expression appears. Columns of a single table are left
/// unqualified in the select list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    SelectList,
    Predicate,
}

/// A table joined by an equi-join. Its columns are qualified by the table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedTable {
    pub row: RowTypeId,
    pub row_type: String,
    pub table_name: String,
}

/// A subquery joined by a cross join. Its columns are qualified by its alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedTable {
    pub row: RowTypeId,
    pub alias: sql::ast::TableAlias,
    /// The output column of the subquery for each member of its rows.
    pub exports: IndexMap<String, String>,
}

/// What a statement selects from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Table {
        row: RowTypeId,
        row_type: String,
        alias: sql::ast::TableAlias,
    },
    Join {
        left: JoinedTable,
        right: JoinedTable,
    },
    CrossJoin {
        left: DerivedTable,
        right: DerivedTable,
    },
}

impl Source {
    /// The column of a member of `owner`, if `owner` is one of the rows of this source.
    fn column(
        &self,
        env: &Env,
        owner: RowTypeId,
        member: &str,
        position: Position,
    ) -> Result<Option<sql::ast::Expression>, Error> {
        match self {
            Source::Table {
                row,
                row_type,
                alias,
            } if *row == owner => {
                let name = env.column_name(row_type, member)?;
                Ok(Some(match position {
                    Position::SelectList => sql::helpers::bare_column(&name),
                    Position::Predicate => sql::helpers::aliased_column(alias, &name),
                }))
            }
            Source::Table { .. } => Ok(None),
            Source::Join { left, right } => {
                for side in [left, right] {
                    if side.row == owner {
                        let name = env.column_name(&side.row_type, member)?;
                        return Ok(Some(sql::ast::Expression::ColumnReference(
                            sql::ast::ColumnReference::TableColumn {
                                table: sql::helpers::db_table(&side.table_name),
                                name: sql::ast::ColumnName(name),
                            },
                        )));
                    }
                }
                Ok(None)
            }
            Source::CrossJoin { left, right } => Ok([left, right]
                .into_iter()
                .find(|side| side.row == owner)
                .map(|side| {
                    let name = side.exports.get(member).map_or(member, String::as_str);
                    sql::helpers::aliased_column(&side.alias, name)
                })),
        }
    }
}

/// Resolves column tokens for one statement: first through the records its projections
/// build, then against its source, then in the enclosing statement.
pub struct Resolver<'a> {
    pub depth: usize,
    pub aliases: Vec<&'a Aliases>,
    pub source: &'a Source,
    pub outer: Option<&'a Resolver<'a>>,
}

impl Resolver<'_> {
    pub fn resolve_column(
        &self,
        env: &Env,
        state: &mut State,
        token: &ColumnToken,
        position: Position,
    ) -> Result<sql::ast::Expression, Error> {
        let Some(owner) = token.owner() else {
            return Err(Error::UnresolvedColumn(token.member.clone()));
        };
        let key = (owner, token.member.clone());

        for (index, aliases) in self.aliases.iter().enumerate() {
            if let Some(target) = aliases.get(&key) {
                // the aliased expression is written in terms of the records below this one
                let below = Resolver {
                    depth: self.depth,
                    aliases: self.aliases[index + 1..].to_vec(),
                    source: self.source,
                    outer: self.outer,
                };
                return target.resolve(env, state, &below, position);
            }
        }

        if let Some(column) = self.source.column(env, owner, &token.member, position)? {
            return Ok(column);
        }

        match self.outer {
            Some(outer) => outer.resolve_column(env, state, token, Position::Predicate),
            None => Err(Error::UnresolvedColumn(state.describe(token))),
        }
    }
}

impl Scalar {
    /// Bind every column to a table of the resolver's scopes and produce the SQL AST.
    pub fn resolve(
        &self,
        env: &Env,
        state: &mut State,
        resolver: &Resolver,
        position: Position,
    ) -> Result<sql::ast::Expression, Error> {
        let resolve_boxed = |scalar: &Scalar, state: &mut State| {
            scalar
                .resolve(env, state, resolver, position)
                .map(Box::new)
        };

        match self {
            Scalar::Column(token) => resolver.resolve_column(env, state, token, position),
            Scalar::Value(value) => Ok(sql::ast::Expression::Value(values::translate_literal(
                value,
            )?)),
            Scalar::Null => Ok(sql::ast::Expression::Value(sql::ast::Value::Null)),
            Scalar::Binary {
                left,
                operator,
                right,
            } => match (operator, left.as_ref(), right.as_ref()) {
                // comparisons with NULL
                (BinaryOperator::Equal, other, Scalar::Null)
                | (BinaryOperator::Equal, Scalar::Null, other) => {
                    Ok(sql::ast::Expression::UnaryOperation {
                        expression: resolve_boxed(other, state)?,
                        operator: sql::ast::UnaryOperator::IsNull,
                    })
                }
                (BinaryOperator::NotEqual, other, Scalar::Null)
                | (BinaryOperator::NotEqual, Scalar::Null, other) => {
                    Ok(sql::ast::Expression::UnaryOperation {
                        expression: resolve_boxed(other, state)?,
                        operator: sql::ast::UnaryOperator::IsNotNull,
                    })
                }
                (BinaryOperator::And, _, _) => Ok(sql::ast::Expression::And {
                    left: resolve_boxed(left, state)?,
                    right: resolve_boxed(right, state)?,
                }),
                (BinaryOperator::Or, _, _) => Ok(sql::ast::Expression::Or {
                    left: resolve_boxed(left, state)?,
                    right: resolve_boxed(right, state)?,
                }),
                _ => Ok(sql::ast::Expression::BinaryOperation {
                    left: resolve_boxed(left, state)?,
                    operator: sql::ast::BinaryOperator(sql_operator(env, *operator).to_string()),
                    right: resolve_boxed(right, state)?,
                }),
            },
            Scalar::Not(expression) => Ok(sql::ast::Expression::Not(resolve_boxed(
                expression, state,
            )?)),
            Scalar::Negate(expression) => Ok(sql::ast::Expression::Negate(resolve_boxed(
                expression, state,
            )?)),
            Scalar::Function { function, args } => Ok(sql::ast::Expression::FunctionCall {
                function: function.clone(),
                args: args
                    .iter()
                    .map(|arg| arg.resolve(env, state, resolver, position))
                    .collect::<Result<Vec<_>, Error>>()?,
            }),
            Scalar::Like {
                expression,
                pattern,
                wildcards,
            } => Ok(sql::ast::Expression::Like {
                expression: resolve_boxed(expression, state)?,
                pattern: resolve_boxed(pattern, state)?,
                wildcards: *wildcards,
            }),
            Scalar::Case {
                test,
                if_true,
                if_false,
            } => Ok(sql::ast::Expression::Case {
                test: resolve_boxed(test, state)?,
                then: resolve_boxed(if_true, state)?,
                otherwise: resolve_boxed(if_false, state)?,
            }),
            Scalar::Subquery(correlated) => Ok(sql::ast::Expression::CorrelatedSubSelect(
                Box::new(aggregates::translate_correlated(
                    env, state, correlated, resolver,
                )?),
            )),
            Scalar::Composite(text) => Err(Error::UnsupportedNodeKind(text.clone())),
        }
    }
}

/// The SQL token of a binary operator.
fn sql_operator(env: &Env, operator: BinaryOperator) -> &'static str {
    match operator {
        BinaryOperator::And => "AND",
        BinaryOperator::Or => "OR",
        BinaryOperator::Equal => "=",
        BinaryOperator::NotEqual => "<>",
        BinaryOperator::LessThan => "<",
        BinaryOperator::LessThanOrEqual => "<=",
        BinaryOperator::GreaterThan => ">",
        BinaryOperator::GreaterThanOrEqual => ">=",
        BinaryOperator::Add => "+",
        BinaryOperator::Subtract => "-",
        BinaryOperator::Multiply => "*",
        BinaryOperator::Divide => env.division_operator(),
        BinaryOperator::Modulo => "%",
    }
}
