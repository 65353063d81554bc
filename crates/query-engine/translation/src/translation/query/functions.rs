//! Translate calls to string methods.

use query_engine_models::{Expression, StringMethod};
use query_engine_sql::sql;

use super::lambda::LambdaTranslator;
use super::scalar::Scalar;
use crate::translation::error::Error;

impl LambdaTranslator<'_, '_> {
    pub(super) fn translate_string_method(
        &mut self,
        expression: &Expression,
        method: StringMethod,
        object: Option<&Expression>,
        arguments: &[Expression],
    ) -> Result<Scalar, Error> {
        let Some(object) = object else {
            return Err(Error::InvalidArgument(format!(
                "'{expression}' is called without a string"
            )));
        };
        let receiver = self.translate(object)?;

        match (method, arguments) {
            (StringMethod::StartsWith, [pattern]) => {
                self.like(receiver, pattern, sql::ast::Wildcards::Trailing)
            }
            (StringMethod::EndsWith, [pattern]) => {
                self.like(receiver, pattern, sql::ast::Wildcards::Leading)
            }
            (StringMethod::Contains, [pattern]) => {
                self.like(receiver, pattern, sql::ast::Wildcards::Both)
            }
            (StringMethod::Substring, [start, length]) => Ok(Scalar::Function {
                function: sql::ast::Function::Substring,
                args: vec![receiver, self.translate(start)?, self.translate(length)?],
            }),
            (StringMethod::ToUpper, []) => Ok(Scalar::Function {
                function: sql::ast::Function::Upper,
                args: vec![receiver],
            }),
            (StringMethod::ToLower, []) => Ok(Scalar::Function {
                function: sql::ast::Function::Lower,
                args: vec![receiver],
            }),
            _ => Err(Error::InvalidArgument(format!(
                "'{expression}' is called with {} arguments",
                arguments.len()
            ))),
        }
    }

    fn like(
        &mut self,
        receiver: Scalar,
        pattern: &Expression,
        wildcards: sql::ast::Wildcards,
    ) -> Result<Scalar, Error> {
        Ok(Scalar::Like {
            expression: Box::new(receiver),
            pattern: Box::new(self.translate(pattern)?),
            wildcards,
        })
    }
}
