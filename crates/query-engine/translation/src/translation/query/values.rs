//! Handle the translation of literal values.

use query_engine_models::Literal;
use query_engine_sql::sql;

use crate::translation::error::Error;

/// Convert a literal into a SQL value. Everything but `null` becomes a parameter.
pub fn translate_literal(value: &Literal) -> Result<sql::ast::Value, Error> {
    match value {
        Literal::Null => Ok(sql::ast::Value::Null),
        Literal::Bool(b) => Ok(sql::ast::Value::Param(sql::string::Param::Bool(*b))),
        Literal::Int(i) => Ok(sql::ast::Value::Param(sql::string::Param::Int(*i))),
        Literal::Float(x) => Ok(sql::ast::Value::Param(sql::string::Param::Float(*x))),
        Literal::String(s) => Ok(sql::ast::Value::Param(sql::string::Param::String(
            s.clone(),
        ))),

        // not supported
        Literal::List(_) | Literal::Object(_) => {
            Err(Error::UnsupportedNodeKind(format!("{value} ({} value)", value.kind())))
        }
    }
}
