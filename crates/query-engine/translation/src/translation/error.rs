//! Errors for query translation.

use std::fmt;

use thiserror::Error;

/// A type for translation errors. Every variant names the offending part of the query in
/// its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Expressions of the form '{0}' cannot be translated to SQL.")]
    UnsupportedNodeKind(String),
    #[error("Cannot convert '{expression}' to '{target}': only scalar types are supported.")]
    UnsupportedConversion { expression: String, target: String },
    #[error("The method '{0}' is not supported.")]
    UnsupportedMethod(String),
    #[error("Cannot determine which columns to select for '{0}'.")]
    UnresolvableProjection(String),
    #[error("Missing metadata: {0}.")]
    MissingMetadata(String),
    #[error("Could not evaluate '{expression}' locally: {reason}.")]
    InvalidLocalEvaluation { expression: String, reason: String },
    #[error("This query already has a {clause} clause, cannot add '{expression}'.")]
    DuplicateClauseHandler { clause: Clause, expression: String },
    #[error("Invalid argument: {0}.")]
    InvalidArgument(String),
    #[error("The column '{0}' is not in scope.")]
    UnresolvedColumn(String),
}

/// The kinds of clause a scope may hold at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Select,
    Where,
    Join,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Clause::Select => write!(f, "SELECT"),
            Clause::Where => write!(f, "WHERE"),
            Clause::Join => write!(f, "JOIN"),
        }
    }
}
