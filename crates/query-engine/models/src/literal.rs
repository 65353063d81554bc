//! Literal values: constants written in the query and values captured from the caller.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Literal>),
    /// A captured object, such as a closure's environment.
    Object(IndexMap<String, Literal>),
}

impl Literal {
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// A short name for the kind of value, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "boolean",
            Literal::Int(_) => "integer",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
            Literal::List(_) => "list",
            Literal::Object(_) => "object",
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(x) => write!(f, "{x}"),
            Literal::String(s) => write!(f, "\"{s}\""),
            Literal::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Literal::Object(fields) => {
                write!(f, "{{")?;
                for (index, (name, value)) in fields.iter().enumerate() {
                    if index > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {name} = {value}")?;
                }
                write!(f, " }}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_deserialize_untagged() {
        let literal: Literal =
            serde_json::from_str(r#"{ "city": "London", "limit": 3, "ratio": 0.5 }"#).unwrap();
        let Literal::Object(fields) = literal else {
            panic!("expected an object literal");
        };
        assert_eq!(fields["city"], Literal::String("London".into()));
        assert_eq!(fields["limit"], Literal::Int(3));
        assert_eq!(fields["ratio"], Literal::Float(0.5));
    }

    #[test]
    fn object_literals_display_like_initializers() {
        let mut fields = IndexMap::new();
        fields.insert("City".to_string(), Literal::from("London"));
        assert_eq!(Literal::Object(fields).to_string(), r#"{ City = "London" }"#);
    }
}
