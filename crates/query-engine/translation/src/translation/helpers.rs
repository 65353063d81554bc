//! Helpers for compiling queries: static information from the metadata and dialect, and the
//! state shared by every scope of one compilation.

use std::fmt;

use indexmap::IndexSet;

use lambda_sql_configuration::Dialect;
use query_engine_metadata::metadata;
use query_engine_models::Type;

use super::error::Error;

/// Static information from the metadata and the dialect.
pub struct Env<'a> {
    metadata: &'a metadata::Metadata,
    dialect: &'a Dialect,
}

impl<'a> Env<'a> {
    pub fn new(metadata: &'a metadata::Metadata, dialect: &'a Dialect) -> Env<'a> {
        Env { metadata, dialect }
    }

    /// Lookup a row type's information in the metadata.
    pub fn lookup_row_type(&self, row_type: &str) -> Result<&'a metadata::RowTypeInfo, Error> {
        self.metadata
            .row_types
            .0
            .get(row_type)
            .ok_or_else(|| Error::MissingMetadata(format!("row type '{row_type}'")))
    }

    /// The member of `child` that references the primary key of `principal`.
    pub fn lookup_foreign_key(&self, child: &str, principal: &str) -> Result<&'a str, Error> {
        self.lookup_row_type(child)?
            .foreign_keys
            .get(principal)
            .map(String::as_str)
            .ok_or_else(|| {
                Error::MissingMetadata(format!(
                    "foreign key from '{child}' to '{principal}'"
                ))
            })
    }

    /// A one-to-many navigation member of a row type.
    pub fn lookup_navigation(
        &self,
        row_type: &str,
        member: &str,
    ) -> Result<&'a metadata::NavigationInfo, Error> {
        self.lookup_row_type(row_type)?
            .navigations
            .get(member)
            .ok_or_else(|| Error::MissingMetadata(format!("navigation '{row_type}.{member}'")))
    }

    /// The database column storing a member. Members that are not registered columns keep
    /// their own name.
    pub fn column_name(&self, row_type: &str, member: &str) -> Result<String, Error> {
        Ok(self
            .lookup_row_type(row_type)?
            .columns
            .get(member)
            .map_or_else(|| member.to_string(), |column| column.name.clone()))
    }

    /// The scalar type of a registered column.
    pub fn column_type(&self, row_type: &str, member: &str) -> Result<Type, Error> {
        self.lookup_row_type(row_type)?
            .columns
            .get(member)
            .map(|column| Type::Scalar(column.r#type))
            .ok_or_else(|| Error::MissingMetadata(format!("column '{row_type}.{member}'")))
    }

    /// The token emitted for division.
    pub fn division_operator(&self) -> &'static str {
        self.dialect.division_operator.token()
    }
}

/// A unique token for a type encountered during compilation, used as the key for
/// resolving the columns of that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowTypeId(u32);

impl fmt::Display for RowTypeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// A reference to a member, reached from a lambda parameter through the types in `path`.
/// The member belongs to the last type of the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnToken {
    pub path: Vec<RowTypeId>,
    pub member: String,
}

impl ColumnToken {
    /// The type that owns the member.
    pub fn owner(&self) -> Option<RowTypeId> {
        self.path.last().copied()
    }
}

impl fmt::Display for ColumnToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for id in &self.path {
            write!(f, "{id}.")?;
        }
        write!(f, "{}", self.member)
    }
}

/// State for the compilation of one query, shared by all of its scopes.
#[derive(Debug, Default)]
pub struct State {
    row_types: IndexSet<Type>,
}

impl State {
    pub fn new() -> State {
        State::default()
    }

    /// The identifier of a type. Identifiers are handed out in first-seen order and stay
    /// stable for the whole compilation.
    pub fn row_type_id(&mut self, r#type: &Type) -> RowTypeId {
        let (index, _) = self.row_types.insert_full(r#type.clone());
        RowTypeId(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// The type an identifier was handed out for.
    pub fn lookup_row_type_id(&self, id: RowTypeId) -> Option<&Type> {
        self.row_types.get_index(id.0 as usize)
    }

    /// A readable form of a column token, for error messages.
    pub fn describe(&self, token: &ColumnToken) -> String {
        match token.owner().and_then(|id| self.lookup_row_type_id(id)) {
            Some(owner) => format!("{owner}.{}", token.member),
            None => token.to_string(),
        }
    }
}
