//! Describe the SQL execution plan.

use super::ast;
use super::string;

/// Definition of an execution plan to be run against the database.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    /// The row type the query was built over.
    pub root_row_type: String,
    /// The query.
    pub query: ast::Select,
}

impl ExecutionPlan {
    /// Extract the query component as SQL.
    pub fn query_sql(&self) -> string::SQL {
        select_to_sql(&self.query)
    }
}

pub fn select_to_sql(select: &ast::Select) -> string::SQL {
    let mut sql = string::SQL::new();
    select.to_sql(&mut sql);
    sql
}

/// A simple execution plan with only a root row type and a query.
pub fn simple_exec_plan(root_row_type: String, query: ast::Select) -> ExecutionPlan {
    ExecutionPlan {
        root_row_type,
        query,
    }
}
