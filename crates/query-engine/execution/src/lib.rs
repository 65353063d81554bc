//! Hand a compiled execution plan to a database.
//!
//! The engine never talks to a database itself: callers supply a [`execution::StatementExecutor`]
//! that runs SQL text with its positional parameters.

pub mod error;
pub mod execution;
