//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;

// Empty clauses //

/// An empty `WHERE` clause.
pub fn empty_where() -> Expression {
    true_expr()
}

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// A `true` expression.
pub fn true_expr() -> Expression {
    Expression::Value(Value::Bool(true))
}

// Aliasing //

/// Create table aliases using this function so we build everything in one place.
pub fn make_table_alias(name: &str) -> TableAlias {
    TableAlias {
        name: name.to_string(),
    }
}

/// The alias of the table a scope selects from, by nesting depth.
pub fn make_depth_alias(depth: usize) -> TableAlias {
    make_table_alias(&format!("t{depth}"))
}

/// Create column aliases using this function so we build everything in one place.
pub fn make_column_alias(name: &str) -> ColumnAlias {
    ColumnAlias {
        name: name.to_string(),
    }
}

/// A reference to a table by its name in the database.
pub fn db_table(name: &str) -> TableReference {
    TableReference::DBTable(TableName(name.to_string()))
}

/// A column qualified by a table alias.
pub fn aliased_column(alias: &TableAlias, name: &str) -> Expression {
    Expression::ColumnReference(ColumnReference::TableColumn {
        table: TableReference::AliasedTable(alias.clone()),
        name: ColumnName(name.to_string()),
    })
}

/// A column that is not qualified.
pub fn bare_column(name: &str) -> Expression {
    Expression::ColumnReference(ColumnReference::Column(ColumnName(name.to_string())))
}

// SELECTs //

/// Build a simple select with a select list and the rest are empty.
pub fn simple_select(select_list: Vec<Expression>) -> Select {
    Select {
        select_list: SelectList::Expressions(select_list),
        from: None,
        joins: vec![],
        where_: Where(empty_where()),
        order_by: empty_order_by(),
    }
}

/// Build a select of one aggregate over a derived table.
pub fn select_from_derived(
    select_list: Vec<Expression>,
    inner: Select,
    alias: TableAlias,
) -> Select {
    let mut select = simple_select(select_list);
    select.from = Some(From::Select {
        select: Box::new(inner),
        alias,
    });
    select
}
