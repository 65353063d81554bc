//! Type definitions of a low-level SQL string representation.

use serde::Serialize;

/// A SQL string and the values of its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SQL {
    pub sql: String,
    pub params: Vec<Param>,
    /// for internal use and tests only
    pub param_index: usize,
}

impl Default for SQL {
    fn default() -> Self {
        Self::new()
    }
}

/// A parameter for a parameterized query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Param {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl SQL {
    pub fn new() -> SQL {
        SQL {
            sql: String::new(),
            params: vec![],
            param_index: 0,
        }
    }
    pub fn append_syntax(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }
    pub fn append_identifier(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }
    /// Placeholders are numbered from zero in the order they are written, so the Nth
    /// placeholder always refers to the Nth parameter.
    pub fn append_param(&mut self, param: Param) {
        self.sql.push_str(format!("@{}", self.param_index).as_str());
        self.param_index += 1;
        self.params.push(param);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_zero_based_and_contiguous() {
        let mut sql = SQL::new();
        sql.append_param(Param::String("London".into()));
        sql.append_syntax(", ");
        sql.append_param(Param::Int(3));
        assert_eq!(sql.sql, "@0, @1");
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn params_serialize_as_plain_json_values() {
        let params = vec![
            Param::String("London".into()),
            Param::Int(3),
            Param::Bool(true),
        ];
        assert_eq!(
            serde_json::to_string(&params).unwrap(),
            r#"["London",3,true]"#
        );
    }
}
