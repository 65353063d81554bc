//! Handle sorting.

use query_engine_models::{Lambda, OrderingKind, Type};
use query_engine_sql::sql;

use super::lambda::translate_lambda;
use super::scalar::{Aliases, Position, Resolver, Scalar};
use crate::translation::error::Error;
use crate::translation::helpers::{ColumnToken, Env, RowTypeId, State};

/// One key of an ORDER BY clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub key: Scalar,
    pub direction: sql::ast::OrderByDirection,
}

/// An ordering operator of a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderingHandler {
    pub parameter_type: Type,
    pub ordering: Ordering,
}

impl OrderingHandler {
    pub fn new(
        env: &Env,
        state: &mut State,
        key: &Lambda,
        kind: OrderingKind,
    ) -> Result<OrderingHandler, Error> {
        let translated = translate_lambda(env, state, key, 1)?;
        Ok(OrderingHandler {
            parameter_type: translated.parameter_type,
            ordering: Ordering {
                key: translated.body,
                direction: if kind.is_descending() {
                    sql::ast::OrderByDirection::Desc
                } else {
                    sql::ast::OrderByDirection::Asc
                },
            },
        })
    }
}

/// Convert orderings to an ORDER BY clause.
pub fn translate_order_by(
    env: &Env,
    state: &mut State,
    resolver: &Resolver,
    orderings: &[Ordering],
) -> Result<sql::ast::OrderBy, Error> {
    let elements = orderings
        .iter()
        .map(|ordering| {
            Ok(sql::ast::OrderByElement {
                target: ordering
                    .key
                    .resolve(env, state, resolver, Position::Predicate)?,
                direction: ordering.direction,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(sql::ast::OrderBy { elements })
}

/// Orderings of a nested scope, restated in terms of the records it selects so the
/// enclosing scope can apply them. Keys that are not a member of the record stay as they are.
pub fn lift(
    orderings: Vec<Ordering>,
    projection: Option<(RowTypeId, &Aliases)>,
) -> Vec<Ordering> {
    let Some((record, aliases)) = projection else {
        return orderings;
    };
    orderings
        .into_iter()
        .map(|ordering| {
            let member = aliases
                .iter()
                .find(|((owner, _), value)| *owner == record && **value == ordering.key)
                .map(|((_, member), _)| member.clone());
            match member {
                Some(member) => Ordering {
                    key: Scalar::Column(ColumnToken {
                        path: vec![record],
                        member,
                    }),
                    direction: ordering.direction,
                },
                None => ordering,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_models::Literal;
    use similar_asserts::assert_eq;

    #[test]
    fn lifted_orderings_refer_to_record_members() {
        let mut state = State::new();
        let customer = state.row_type_id(&query_engine_models::builders::row("Customer"));
        let card = state.row_type_id(&query_engine_models::builders::record(
            "Card",
            [("Label", query_engine_models::builders::string())],
        ));
        let name = Scalar::Column(ColumnToken {
            path: vec![customer],
            member: "Name".to_string(),
        });
        let aliases = Aliases::from([((card, "Label".to_string()), name.clone())]);

        let lifted = lift(
            vec![
                Ordering {
                    key: name,
                    direction: sql::ast::OrderByDirection::Desc,
                },
                Ordering {
                    key: Scalar::Value(Literal::Int(1)),
                    direction: sql::ast::OrderByDirection::Asc,
                },
            ],
            Some((card, &aliases)),
        );

        assert_eq!(
            lifted[0].key,
            Scalar::Column(ColumnToken {
                path: vec![card],
                member: "Label".to_string(),
            })
        );
        assert_eq!(lifted[0].direction, sql::ast::OrderByDirection::Desc);
        assert_eq!(lifted[1].key, Scalar::Value(Literal::Int(1)));
    }
}
