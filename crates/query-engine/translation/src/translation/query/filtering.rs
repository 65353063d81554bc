//! Handle filtering.

use query_engine_models::{Lambda, Type};
use query_engine_sql::sql;

use super::lambda::translate_lambda;
use super::scalar::{Position, Resolver, Scalar};
use crate::translation::error::Error;
use crate::translation::helpers::{Env, State};

/// The predicate of a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereHandler {
    pub parameter_type: Type,
    pub predicate: Scalar,
}

impl WhereHandler {
    pub fn new(env: &Env, state: &mut State, predicate: &Lambda) -> Result<WhereHandler, Error> {
        let translated = translate_lambda(env, state, predicate, 1)?;
        Ok(WhereHandler {
            parameter_type: translated.parameter_type,
            predicate: translated.body,
        })
    }

    /// Translate the predicate to a WHERE clause.
    pub fn translate(
        &self,
        env: &Env,
        state: &mut State,
        resolver: &Resolver,
    ) -> Result<sql::ast::Where, Error> {
        Ok(sql::ast::Where(self.predicate.resolve(
            env,
            state,
            resolver,
            Position::Predicate,
        )?))
    }
}
