//! The query AST handed to the compiler: a chain of queryable operators whose
//! predicates, projections and key selectors are lambdas over scalar expressions.

pub mod builders;
pub mod expression;
pub mod literal;
pub mod query;
pub mod types;

pub use expression::{
    AggregateMethod, BinaryOperator, Expression, Lambda, Method, Parameter, StringMethod,
    UnaryOperator,
};
pub use literal::Literal;
pub use query::{OrderingKind, Query};
pub use types::{Field, RecordType, Type};
