//! Helpers for building queries and expressions in code.

use indexmap::IndexMap;
use query_engine_metadata::metadata::ScalarType;

use crate::expression::{
    AggregateMethod, BinaryOperator, Expression, Lambda, Method, Parameter, StringMethod,
    UnaryOperator,
};
use crate::literal::Literal;
use crate::query::{OrderingKind, Query};
use crate::types::{Field, RecordType, Type};

// Types //

pub fn scalar(scalar_type: ScalarType) -> Type {
    Type::Scalar(scalar_type)
}

pub fn string() -> Type {
    scalar(ScalarType::String)
}

pub fn boolean() -> Type {
    scalar(ScalarType::Boolean)
}

pub fn int32() -> Type {
    scalar(ScalarType::Int32)
}

pub fn int64() -> Type {
    scalar(ScalarType::Int64)
}

pub fn double() -> Type {
    scalar(ScalarType::Double)
}

pub fn decimal() -> Type {
    scalar(ScalarType::Decimal)
}

pub fn nullable(inner: Type) -> Type {
    Type::Nullable(Box::new(inner))
}

pub fn row(name: &str) -> Type {
    Type::Row(name.to_string())
}

pub fn collection(element: Type) -> Type {
    Type::Collection(Box::new(element))
}

pub fn group(key: Type, element: Type) -> Type {
    Type::Group {
        key: Box::new(key),
        element: Box::new(element),
    }
}

pub fn record<'a>(name: &str, fields: impl IntoIterator<Item = (&'a str, Type)>) -> Type {
    Type::Record(RecordType {
        name: name.to_string(),
        fields: fields
            .into_iter()
            .map(|(name, r#type)| Field {
                name: name.to_string(),
                r#type,
            })
            .collect(),
    })
}

/// A type for a literal, as a compiler would infer it.
pub fn literal_type(value: &Literal) -> Type {
    match value {
        Literal::Null => nullable(string()),
        Literal::Bool(_) => boolean(),
        Literal::Int(_) => int64(),
        Literal::Float(_) => double(),
        Literal::String(_) => string(),
        Literal::List(items) => collection(items.first().map_or_else(string, literal_type)),
        Literal::Object(fields) => record(
            "Closure",
            fields
                .iter()
                .map(|(name, value)| (name.as_str(), literal_type(value))),
        ),
    }
}

// Expressions //

pub fn param(name: &str, r#type: Type) -> Parameter {
    Parameter {
        name: name.to_string(),
        r#type,
    }
}

pub fn lambda<'a>(parameters: impl IntoIterator<Item = &'a Parameter>, body: Expression) -> Lambda {
    Lambda::new(parameters.into_iter().cloned().collect(), body)
}

pub fn constant(value: impl Into<Literal>) -> Expression {
    let value = value.into();
    Expression::Constant {
        r#type: literal_type(&value),
        value,
    }
}

pub fn null(r#type: Type) -> Expression {
    Expression::Constant {
        value: Literal::Null,
        r#type,
    }
}

/// A captured object, such as the environment of a closure.
pub fn captured<'a>(fields: impl IntoIterator<Item = (&'a str, Literal)>) -> Expression {
    constant(Literal::Object(
        fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect::<IndexMap<_, _>>(),
    ))
}

pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn and(left: Expression, right: Expression) -> Expression {
    binary(BinaryOperator::And, left, right)
}

pub fn or(left: Expression, right: Expression) -> Expression {
    binary(BinaryOperator::Or, left, right)
}

pub fn eq(left: Expression, right: Expression) -> Expression {
    binary(BinaryOperator::Equal, left, right)
}

pub fn ne(left: Expression, right: Expression) -> Expression {
    binary(BinaryOperator::NotEqual, left, right)
}

pub fn lt(left: Expression, right: Expression) -> Expression {
    binary(BinaryOperator::LessThan, left, right)
}

pub fn gt(left: Expression, right: Expression) -> Expression {
    binary(BinaryOperator::GreaterThan, left, right)
}

pub fn add(left: Expression, right: Expression) -> Expression {
    binary(BinaryOperator::Add, left, right)
}

pub fn mul(left: Expression, right: Expression) -> Expression {
    binary(BinaryOperator::Multiply, left, right)
}

pub fn div(left: Expression, right: Expression) -> Expression {
    binary(BinaryOperator::Divide, left, right)
}

pub fn not(operand: Expression) -> Expression {
    Expression::Unary {
        operator: UnaryOperator::Not,
        operand: Box::new(operand),
    }
}

pub fn negate(operand: Expression) -> Expression {
    Expression::Unary {
        operator: UnaryOperator::Negate,
        operand: Box::new(operand),
    }
}

pub fn convert(operand: Expression, r#type: Type) -> Expression {
    Expression::Unary {
        operator: UnaryOperator::Convert(r#type),
        operand: Box::new(operand),
    }
}

pub fn conditional(test: Expression, if_true: Expression, if_false: Expression) -> Expression {
    Expression::Conditional {
        test: Box::new(test),
        if_true: Box::new(if_true),
        if_false: Box::new(if_false),
    }
}

/// Construct a record whose type is named `name` and has one field per member.
pub fn new_record<'a>(
    name: &str,
    members: impl IntoIterator<Item = (&'a str, Expression)>,
) -> Expression {
    let members: Vec<(String, Expression)> = members
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    let r#type = record(
        name,
        members
            .iter()
            .map(|(name, value)| (name.as_str(), value.type_of())),
    );
    Expression::New { r#type, members }
}

/// Call an aggregating extension method on a collection.
pub fn aggregate(
    method: AggregateMethod,
    source: Expression,
    selector: Option<Lambda>,
    r#type: Type,
) -> Expression {
    let mut arguments = vec![source];
    arguments.extend(selector.map(Expression::Lambda));
    Expression::Call {
        method: Method::Aggregate(method),
        object: None,
        arguments,
        r#type,
    }
}

impl Parameter {
    /// Access a member of the parameter.
    pub fn member(&self, member: &str, r#type: Type) -> Expression {
        self.reference().member(member, r#type)
    }
}

impl Expression {
    /// Access a member of this expression.
    pub fn member(self, member: &str, r#type: Type) -> Expression {
        Expression::Member {
            object: Box::new(self),
            member: member.to_string(),
            r#type,
        }
    }

    /// Call a string method on this expression.
    pub fn call_string(self, method: StringMethod, arguments: Vec<Expression>) -> Expression {
        let r#type = match method {
            StringMethod::StartsWith | StringMethod::EndsWith | StringMethod::Contains => {
                boolean()
            }
            StringMethod::Substring | StringMethod::ToUpper | StringMethod::ToLower => string(),
        };
        Expression::Call {
            method: Method::String(method),
            object: Some(Box::new(self)),
            arguments,
            r#type,
        }
    }
}

// Queries //

impl Query {
    pub fn table(row_type: &str) -> Query {
        Query::Table {
            row_type: row_type.to_string(),
        }
    }

    /// Apply a `Where`.
    pub fn filter(self, predicate: Lambda) -> Query {
        Query::Where {
            source: Box::new(self),
            predicate,
        }
    }

    pub fn select(self, selector: Lambda) -> Query {
        Query::Select {
            source: Box::new(self),
            selector,
        }
    }

    pub fn join(self, inner: Query, outer_key: Lambda, inner_key: Lambda, result: Lambda) -> Query {
        Query::Join {
            outer: Box::new(self),
            inner: Box::new(inner),
            outer_key,
            inner_key,
            result_selector: result,
        }
    }

    pub fn cross_join(self, collection: Query, result: Lambda) -> Query {
        Query::CrossJoin {
            source: Box::new(self),
            collection: Box::new(collection),
            result_selector: result,
        }
    }

    pub fn ordered(self, key: Lambda, kind: OrderingKind) -> Query {
        Query::OrderBy {
            source: Box::new(self),
            key,
            kind,
        }
    }

    pub fn order_by(self, key: Lambda) -> Query {
        self.ordered(key, OrderingKind::OrderBy)
    }

    pub fn order_by_descending(self, key: Lambda) -> Query {
        self.ordered(key, OrderingKind::OrderByDescending)
    }

    pub fn then_by(self, key: Lambda) -> Query {
        self.ordered(key, OrderingKind::ThenBy)
    }

    pub fn then_by_descending(self, key: Lambda) -> Query {
        self.ordered(key, OrderingKind::ThenByDescending)
    }

    /// Apply an operator that has no dedicated node.
    pub fn call(self, method: &str) -> Query {
        Query::Call {
            method: method.to_string(),
            source: Box::new(self),
            arguments: vec![],
        }
    }
}
