//! Handle projections and the select list.

use query_engine_models::{Lambda, Type};
use query_engine_sql::sql;

use super::lambda::{translate_lambda, Translated};
use super::scalar::{Position, Resolver, Scalar};
use crate::translation::error::Error;
use crate::translation::helpers::{Env, RowTypeId, State};

/// The projection of a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectHandler {
    /// The type the projection returns.
    pub record: RowTypeId,
    pub translated: Translated,
}

impl SelectHandler {
    pub fn new(env: &Env, state: &mut State, selector: &Lambda) -> Result<SelectHandler, Error> {
        let translated = translate_lambda(env, state, selector, 1)?;
        Ok(SelectHandler {
            record: state.row_type_id(&translated.return_type),
            translated,
        })
    }

    /// The members of the record the projection returns, if it builds one.
    pub fn record_members(&self) -> Vec<(&str, &Scalar)> {
        self.translated
            .aliases
            .iter()
            .filter(|((owner, _), _)| *owner == self.record)
            .map(|((_, member), value)| (member.as_str(), value))
            .collect()
    }
}

/// The select list of the columns a projection reads.
pub fn translate_columns(
    env: &Env,
    state: &mut State,
    resolver: &Resolver,
    columns: &[Scalar],
) -> Result<Vec<sql::ast::Expression>, Error> {
    columns
        .iter()
        .map(|column| column.resolve(env, state, resolver, Position::SelectList))
        .collect()
}

/// The select list of a record, with one aliased column per member.
pub fn translate_members(
    env: &Env,
    state: &mut State,
    resolver: &Resolver,
    members: &[(&str, &Scalar)],
) -> Result<sql::ast::SelectList, Error> {
    let select_list = members
        .iter()
        .map(|(member, value)| {
            Ok((
                sql::helpers::make_column_alias(member),
                value.resolve(env, state, resolver, Position::SelectList)?,
            ))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(sql::ast::SelectList::SelectList(select_list))
}

/// The columns selected when the projection reads none: every column of a row type in
/// registration order, or the scalar fields of a record sorted by name.
pub fn default_columns(env: &Env, r#type: &Type) -> Result<Vec<sql::ast::Expression>, Error> {
    let names: Vec<String> = match r#type {
        Type::Row(row_type) => env
            .lookup_row_type(row_type)?
            .columns
            .values()
            .map(|column| column.name.clone())
            .collect(),
        Type::Record(record) => {
            let mut names: Vec<String> = record
                .fields
                .iter()
                .filter(|field| field.r#type.is_scalar())
                .map(|field| {
                    field
                        .name
                        .strip_prefix("get_")
                        .unwrap_or(&field.name)
                        .to_string()
                })
                .collect();
            names.sort();
            names
        }
        _ => vec![],
    };

    if names.is_empty() {
        return Err(Error::UnresolvableProjection(r#type.to_string()));
    }
    Ok(names
        .iter()
        .map(|name| sql::helpers::bare_column(name))
        .collect())
}
