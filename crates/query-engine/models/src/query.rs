//! The operator chain of a query.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expression::{Expression, Lambda};
use crate::types::Type;

/// A queryable operator applied to a source. The chain leans right: every operator
/// wraps the query it is applied to, down to a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operator", rename_all = "snake_case")]
pub enum Query {
    /// All rows of a registered row type.
    Table { row_type: String },
    Select {
        source: Box<Query>,
        selector: Lambda,
    },
    Where {
        source: Box<Query>,
        predicate: Lambda,
    },
    /// An equi-join of two sources on a key selected from each side.
    Join {
        outer: Box<Query>,
        inner: Box<Query>,
        outer_key: Lambda,
        inner_key: Lambda,
        result_selector: Lambda,
    },
    /// An unconditional join of every row of the source with every row of a collection.
    CrossJoin {
        source: Box<Query>,
        collection: Box<Query>,
        result_selector: Lambda,
    },
    OrderBy {
        source: Box<Query>,
        key: Lambda,
        kind: OrderingKind,
    },
    /// Any other queryable operator, such as `GroupBy`, `Distinct` or `Take`.
    Call {
        method: String,
        source: Box<Query>,
        #[serde(default)]
        arguments: Vec<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingKind {
    OrderBy,
    OrderByDescending,
    ThenBy,
    ThenByDescending,
}

impl OrderingKind {
    pub fn is_descending(self) -> bool {
        matches!(
            self,
            OrderingKind::OrderByDescending | OrderingKind::ThenByDescending
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            OrderingKind::OrderBy => "OrderBy",
            OrderingKind::OrderByDescending => "OrderByDescending",
            OrderingKind::ThenBy => "ThenBy",
            OrderingKind::ThenByDescending => "ThenByDescending",
        }
    }
}

impl Query {
    /// The type of the rows the query produces.
    pub fn element_type(&self) -> Type {
        match self {
            Query::Table { row_type } => Type::Row(row_type.clone()),
            Query::Select { selector, .. } => selector.return_type(),
            Query::Join {
                result_selector, ..
            }
            | Query::CrossJoin {
                result_selector, ..
            } => result_selector.return_type(),
            Query::Where { source, .. }
            | Query::OrderBy { source, .. }
            | Query::Call { source, .. } => source.element_type(),
        }
    }

    /// Rebuild the query with every lambda body, and every argument of other operators,
    /// replaced by the result of `f`.
    pub fn try_map_expressions<E, F>(&self, f: &mut F) -> Result<Query, E>
    where
        F: FnMut(&Expression) -> Result<Expression, E>,
    {
        fn lambda<E, F>(l: &Lambda, f: &mut F) -> Result<Lambda, E>
        where
            F: FnMut(&Expression) -> Result<Expression, E>,
        {
            Ok(Lambda::new(l.parameters.clone(), f(&l.body)?))
        }

        Ok(match self {
            Query::Table { .. } => self.clone(),
            Query::Select { source, selector } => Query::Select {
                source: Box::new(source.try_map_expressions(f)?),
                selector: lambda(selector, f)?,
            },
            Query::Where { source, predicate } => Query::Where {
                source: Box::new(source.try_map_expressions(f)?),
                predicate: lambda(predicate, f)?,
            },
            Query::Join {
                outer,
                inner,
                outer_key,
                inner_key,
                result_selector,
            } => Query::Join {
                outer: Box::new(outer.try_map_expressions(f)?),
                inner: Box::new(inner.try_map_expressions(f)?),
                outer_key: lambda(outer_key, f)?,
                inner_key: lambda(inner_key, f)?,
                result_selector: lambda(result_selector, f)?,
            },
            Query::CrossJoin {
                source,
                collection,
                result_selector,
            } => Query::CrossJoin {
                source: Box::new(source.try_map_expressions(f)?),
                collection: Box::new(collection.try_map_expressions(f)?),
                result_selector: lambda(result_selector, f)?,
            },
            Query::OrderBy { source, key, kind } => Query::OrderBy {
                source: Box::new(source.try_map_expressions(f)?),
                key: lambda(key, f)?,
                kind: *kind,
            },
            Query::Call {
                method,
                source,
                arguments,
            } => Query::Call {
                method: method.clone(),
                source: Box::new(source.try_map_expressions(f)?),
                arguments: arguments.iter().map(&mut *f).collect::<Result<_, E>>()?,
            },
        })
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Query::Table { row_type } => write!(f, "Table<{row_type}>"),
            Query::Select { source, selector } => write!(f, "{source}.Select({selector})"),
            Query::Where { source, predicate } => write!(f, "{source}.Where({predicate})"),
            Query::Join {
                outer,
                inner,
                outer_key,
                inner_key,
                result_selector,
            } => write!(
                f,
                "{outer}.Join({inner}, {outer_key}, {inner_key}, {result_selector})"
            ),
            Query::CrossJoin {
                source,
                collection,
                result_selector,
            } => write!(f, "{source}.SelectMany({collection}, {result_selector})"),
            Query::OrderBy { source, key, kind } => write!(f, "{source}.{}({key})", kind.name()),
            Query::Call {
                method,
                source,
                arguments,
            } => {
                write!(f, "{source}.{method}(")?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ")")
            }
        }
    }
}
