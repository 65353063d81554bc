//! Static types of expressions.

use std::fmt;

use query_engine_metadata::metadata::ScalarType;
use serde::{Deserialize, Serialize};

/// The static type of an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Scalar(ScalarType),
    Nullable(Box<Type>),
    /// A registered row type.
    Row(String),
    /// A record built by a projection, such as an anonymous type.
    Record(RecordType),
    Collection(Box<Type>),
    /// The element of a grouping: a key and the rows sharing it.
    Group { key: Box<Type>, element: Box<Type> },
}

/// A record type and its fields, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub r#type: Type,
}

impl Type {
    pub fn boolean() -> Type {
        Type::Scalar(ScalarType::Boolean)
    }

    /// The scalar type underneath any nullability.
    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            Type::Scalar(scalar) => Some(*scalar),
            Type::Nullable(inner) => inner.scalar(),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.scalar().is_some()
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Type::Group { .. })
    }

    /// The row type name, if this is a registered row type.
    pub fn row_type(&self) -> Option<&str> {
        match self {
            Type::Row(name) => Some(name),
            _ => None,
        }
    }

    /// The element type of a collection.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Collection(element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Scalar(scalar) => write!(f, "{scalar}"),
            Type::Nullable(inner) => write!(f, "{inner}?"),
            Type::Row(name) => write!(f, "{name}"),
            Type::Record(record) => write!(f, "{}", record.name),
            Type::Collection(element) => write!(f, "IEnumerable<{element}>"),
            Type::Group { key, element } => write!(f, "IGrouping<{key}, {element}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_scalars_are_scalar() {
        let ty = Type::Nullable(Box::new(Type::Scalar(ScalarType::Int32)));
        assert_eq!(ty.scalar(), Some(ScalarType::Int32));
        assert_eq!(ty.to_string(), "int32?");
        assert!(!Type::Row("Customer".into()).is_scalar());
    }

    #[test]
    fn types_deserialize_from_json() {
        let ty: Type = serde_json::from_value(serde_json::json!({
            "collection": { "row": "Order" }
        }))
        .unwrap();
        assert_eq!(ty, Type::Collection(Box::new(Type::Row("Order".into()))));
    }
}
