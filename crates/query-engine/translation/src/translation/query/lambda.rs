//! Translate the bodies of lambdas into scalars.

use query_engine_models::{Expression, Lambda, Literal, Method, Type, UnaryOperator};

use super::scalar::{Aliases, Scalar};
use crate::translation::error::Error;
use crate::translation::helpers::{ColumnToken, Env, RowTypeId, State};

/// A translated lambda.
#[derive(Debug, Clone, PartialEq)]
pub struct Translated {
    /// The type of the first parameter.
    pub parameter_type: Type,
    pub return_type: Type,
    pub body: Scalar,
    /// The scalar columns and aggregate subqueries the body reads, in the order they are
    /// first read, without duplicates.
    pub columns: Vec<Scalar>,
    /// The members of the records the body builds.
    pub aliases: Aliases,
}

/// Translate a lambda that must take exactly `arity` parameters.
pub fn translate_lambda(
    env: &Env,
    state: &mut State,
    lambda: &Lambda,
    arity: usize,
) -> Result<Translated, Error> {
    let Some(first) = lambda.parameters.first() else {
        return Err(Error::InvalidArgument(format!(
            "'{lambda}' takes no parameters, expected {arity}"
        )));
    };
    if lambda.parameters.len() != arity {
        return Err(Error::InvalidArgument(format!(
            "'{lambda}' takes {} parameters, expected {arity}",
            lambda.parameters.len()
        )));
    }

    let mut translator = LambdaTranslator {
        env,
        state,
        columns: vec![],
        aliases: Aliases::new(),
    };
    let body = translator.translate(&lambda.body)?;

    Ok(Translated {
        parameter_type: first.r#type.clone(),
        return_type: lambda.return_type(),
        body,
        columns: translator.columns,
        aliases: translator.aliases,
    })
}

pub(super) struct LambdaTranslator<'a, 'e> {
    pub(super) env: &'a Env<'e>,
    pub(super) state: &'a mut State,
    columns: Vec<Scalar>,
    aliases: Aliases,
}

impl LambdaTranslator<'_, '_> {
    pub(super) fn translate(&mut self, expression: &Expression) -> Result<Scalar, Error> {
        match expression {
            Expression::Binary {
                operator,
                left,
                right,
            } => Ok(Scalar::Binary {
                left: Box::new(self.translate(left)?),
                operator: *operator,
                right: Box::new(self.translate(right)?),
            }),
            Expression::Unary { operator, operand } => match operator {
                UnaryOperator::Not => Ok(Scalar::Not(Box::new(self.translate(operand)?))),
                UnaryOperator::Negate => Ok(Scalar::Negate(Box::new(self.translate(operand)?))),
                // conversions between scalars are left to the database
                UnaryOperator::Convert(target) if target.is_scalar() => self.translate(operand),
                UnaryOperator::Convert(target) => Err(Error::UnsupportedConversion {
                    expression: expression.to_string(),
                    target: target.to_string(),
                }),
            },
            Expression::Member {
                object,
                member,
                r#type,
            } => self.translate_member(expression, object, member, r#type),
            Expression::Constant { value, r#type } => match value {
                Literal::Null => Ok(Scalar::Null),
                // a record built only from constants reads no columns
                Literal::Object(_) if matches!(r#type, Type::Record(_) | Type::Row(_)) => {
                    Ok(Scalar::Composite(expression.to_string()))
                }
                Literal::List(_) | Literal::Object(_) => {
                    Err(Error::UnsupportedNodeKind(expression.to_string()))
                }
                _ => Ok(Scalar::Value(value.clone())),
            },
            Expression::Parameter { name, .. } => Ok(Scalar::Composite(name.clone())),
            Expression::New { r#type, members } => {
                let owner = self.state.row_type_id(r#type);
                for (name, value) in members {
                    let value = self.translate(value)?;
                    // property getters are named after their property
                    let name = name.strip_prefix("get_").unwrap_or(name);
                    self.aliases.insert((owner, name.to_string()), value);
                }
                Ok(Scalar::Composite(expression.to_string()))
            }
            Expression::Call {
                method,
                object,
                arguments,
                ..
            } => match method {
                Method::String(method) => {
                    self.translate_string_method(expression, *method, object.as_deref(), arguments)
                }
                Method::Aggregate(aggregate) => {
                    let subquery =
                        self.translate_navigation_aggregate(expression, *aggregate, arguments)?;
                    self.record(subquery.clone());
                    Ok(subquery)
                }
                Method::Other {
                    declaring_type,
                    name,
                } => Err(Error::UnsupportedMethod(format!("{declaring_type}.{name}"))),
            },
            Expression::Conditional {
                test,
                if_true,
                if_false,
            } => match self.translate(test)? {
                Scalar::Value(Literal::Bool(true)) => self.translate(if_true),
                Scalar::Value(Literal::Bool(false)) => self.translate(if_false),
                test => Ok(Scalar::Case {
                    test: Box::new(test),
                    if_true: Box::new(self.translate(if_true)?),
                    if_false: Box::new(self.translate(if_false)?),
                }),
            },

            // not supported
            Expression::Lambda(_)
            | Expression::MemberInit { .. }
            | Expression::ListInit { .. }
            | Expression::NewArray { .. }
            | Expression::Invoke { .. }
            | Expression::TypeIs { .. } => {
                Err(Error::UnsupportedNodeKind(expression.to_string()))
            }
        }
    }

    fn translate_member(
        &mut self,
        expression: &Expression,
        object: &Expression,
        member: &str,
        r#type: &Type,
    ) -> Result<Scalar, Error> {
        // members of scalars, such as the length of a string, have no column
        if object.type_of().is_scalar() {
            return Err(Error::UnsupportedNodeKind(expression.to_string()));
        }
        let Some(path) = self.member_path(object) else {
            return Err(Error::UnsupportedNodeKind(expression.to_string()));
        };

        if r#type.is_scalar() {
            let column = Scalar::Column(ColumnToken {
                path,
                member: member.to_string(),
            });
            self.record(column.clone());
            Ok(column)
        } else {
            Ok(Scalar::Composite(expression.to_string()))
        }
    }

    /// The types walked from a lambda parameter to `expression`, or nothing if it does not
    /// start at a parameter.
    pub(super) fn member_path(&mut self, expression: &Expression) -> Option<Vec<RowTypeId>> {
        match expression {
            Expression::Parameter { r#type, .. } => Some(vec![self.state.row_type_id(r#type)]),
            Expression::Unary {
                operator: UnaryOperator::Convert(_),
                operand,
            } => self.member_path(operand),
            Expression::Member { object, r#type, .. } => {
                let mut path = self.member_path(object)?;
                path.push(self.state.row_type_id(r#type));
                Some(path)
            }
            _ => None,
        }
    }

    fn record(&mut self, column: Scalar) {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
    }
}
