//! Handle aggregates over one-to-many navigations, which become correlated subqueries.

use query_engine_models::builders::{and, eq, lambda, new_record, param};
use query_engine_models::{AggregateMethod, Expression, Lambda, Method, Parameter, Query, Type};

use super::lambda::LambdaTranslator;
use super::scalar::{Correlated, Scalar};
use crate::translation::error::Error;

impl LambdaTranslator<'_, '_> {
    /// Translate `parent.Navigation.Aggregate(selector)` into the query over the child rows
    /// that reference `parent`:
    ///
    /// `Table<Child>.Where(src => src.fk == parent.pk).Select(selector)`
    ///
    /// For `Count` the selector is an optional predicate, which is added to the correlation.
    pub(super) fn translate_navigation_aggregate(
        &mut self,
        expression: &Expression,
        aggregate: AggregateMethod,
        arguments: &[Expression],
    ) -> Result<Scalar, Error> {
        let (source, selector) = match arguments {
            [source] => (source, None),
            [source, Expression::Lambda(selector)] => (source, Some(selector)),
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "'{expression}' takes a collection and an optional selector"
                )))
            }
        };

        // the source must be a navigation of a row reached from a lambda parameter
        let unsupported = || Error::UnsupportedMethod(expression.to_string());
        let Expression::Member {
            object,
            member,
            r#type,
        } = source
        else {
            return Err(unsupported());
        };
        let child = r#type
            .element()
            .and_then(Type::row_type)
            .ok_or_else(unsupported)?;
        let parent_type = object.type_of();
        let parent = parent_type.row_type().ok_or_else(unsupported)?;
        if self.member_path(object).is_none() {
            return Err(unsupported());
        }
        let navigation = self.env.lookup_navigation(parent, member)?;
        if navigation.target != child {
            return Err(Error::MissingMetadata(format!(
                "navigation '{parent}.{member}' to '{child}'"
            )));
        }

        let foreign_key = self.env.lookup_foreign_key(child, parent)?;
        let primary_key = &self.env.lookup_row_type(parent)?.primary_key;

        if let Some(selector) = selector {
            if selector.parameters.len() != 1 {
                return Err(Error::InvalidArgument(format!(
                    "the selector of '{expression}' must take one parameter"
                )));
            }
        }

        // the rows of the child table, named after the selector's parameter if there is one
        let source_parameter: Parameter = selector
            .and_then(|selector| selector.parameters.first().cloned())
            .unwrap_or_else(|| param("src", Type::Row(child.to_string())));
        let correlation = eq(
            source_parameter.member(foreign_key, self.env.column_type(child, foreign_key)?),
            (**object)
                .clone()
                .member(primary_key, self.env.column_type(parent, primary_key)?),
        );

        let (predicate, selector, nested) = match (aggregate, selector) {
            (AggregateMethod::Count, None) => (correlation, identity(&source_parameter), false),
            (AggregateMethod::Count, Some(predicate)) => (
                and(correlation, (*predicate.body).clone()),
                identity(&source_parameter),
                false,
            ),
            (_, None) => {
                return Err(Error::InvalidArgument(format!(
                    "'{expression}' needs a selector"
                )))
            }
            (_, Some(selector)) => {
                // an aggregate of aggregates is computed over pairs of the correlation key
                // and the inner aggregate
                if matches!(
                    *selector.body,
                    Expression::Call {
                        method: Method::Aggregate(_),
                        ..
                    }
                ) {
                    let pair = new_record(
                        "KeyValuePair",
                        [
                            (
                                "Key",
                                source_parameter
                                    .member(foreign_key, self.env.column_type(child, foreign_key)?),
                            ),
                            ("Value", (*selector.body).clone()),
                        ],
                    );
                    (correlation, lambda([&source_parameter], pair), true)
                } else {
                    (correlation, selector.clone(), false)
                }
            }
        };

        let query = Query::table(child)
            .filter(lambda([&source_parameter], predicate))
            .select(selector);

        Ok(Scalar::Subquery(Box::new(Correlated {
            query,
            aggregate,
            nested,
        })))
    }
}

fn identity(parameter: &Parameter) -> Lambda {
    lambda([parameter], parameter.reference())
}
