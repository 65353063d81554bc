//! Type definitions of a SQL AST representation.

/// A SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub select_list: SelectList,
    pub from: Option<From>,
    pub joins: Vec<Join>,
    pub where_: Where,
    pub order_by: OrderBy,
}

/// A select list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectList {
    /// Expressions emitted as they are, without aliases.
    Expressions(Vec<Expression>),
    /// Aliased expressions.
    SelectList(Vec<(ColumnAlias, Expression)>),
}

/// A FROM clause
#[derive(Debug, Clone, PartialEq)]
pub enum From {
    /// Select from a table, optionally aliased
    Table {
        reference: TableReference,
        alias: Option<TableAlias>,
    },
    /// Select from a subquery
    Select {
        select: Box<Select>,
        alias: TableAlias,
    },
}

/// A JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub enum Join {
    /// INNER JOIN
    InnerJoin(InnerJoin),
    /// CROSS JOIN
    CrossJoin(CrossJoin),
}

/// An INNER JOIN clause on the equality of two keys
#[derive(Debug, Clone, PartialEq)]
pub struct InnerJoin {
    pub reference: TableReference,
    pub left_key: Expression,
    pub right_key: Expression,
}

/// A CROSS JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct CrossJoin {
    pub select: Box<Select>,
    pub alias: TableAlias,
}

/// A WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Where(pub Expression);

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub elements: Vec<OrderByElement>,
}

/// A single element in an ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByElement {
    pub target: Expression,
    pub direction: OrderByDirection,
}

/// A direction for a single ORDER BY element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    Asc,
    Desc,
}

/// A scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// AND clause
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// OR clause
    Or {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// NOT clause
    Not(Box<Expression>),
    /// Arithmetic negation
    Negate(Box<Expression>),
    /// A binary operation on two scalar expression
    BinaryOperation {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// An unary operation on a scalar expression
    UnaryOperation {
        expression: Box<Expression>,
        operator: UnaryOperator,
    },
    /// A scalar function call
    FunctionCall {
        function: Function,
        args: Vec<Expression>,
    },
    /// A LIKE match against a pattern built from an expression and wildcards
    Like {
        expression: Box<Expression>,
        pattern: Box<Expression>,
        wildcards: Wildcards,
    },
    /// CASE WHEN test THEN a ELSE b END
    Case {
        test: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
    /// A column reference
    ColumnReference(ColumnReference),
    /// An irreducible value
    Value(Value),
    /// A COUNT clause
    Count(CountType),
    /// A parenthesized SELECT returning a single value
    CorrelatedSubSelect(Box<Select>),
}

/// An unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    IsNull,
    IsNotNull,
}

/// Represents the name of a binary operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryOperator(pub String);

/// Where the `%` wildcards go around a LIKE pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wildcards {
    /// `pattern%`
    Trailing,
    /// `%pattern`
    Leading,
    /// `%pattern%`
    Both,
}

/// A scalar function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    Sum,
    Min,
    Max,
    Avg,
    Upper,
    Lower,
    Substring,
}

/// COUNT clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountType {
    Star,
}

/// Value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Rendered as a positional parameter.
    Param(crate::sql::string::Param),
    /// Rendered inline.
    Null,
    /// Rendered inline. Only used by helpers for clauses that are then omitted.
    Bool(bool),
}

/// A database table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(pub String);

/// A reference to a table. Used when we want to query it,
/// for example in a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableReference {
    /// refers to a db table object name
    DBTable(TableName),
    /// refers to an alias we created
    AliasedTable(TableAlias),
}

/// A database table's column name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(pub String);

/// A reference to a column. Used when we want to query it,
/// for example in a SELECT list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnReference {
    /// refers to a db column of a table
    TableColumn {
        table: TableReference,
        name: ColumnName,
    },
    /// refers to a db column of the only table in scope
    Column(ColumnName),
}

/// aliases that we give to relations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableAlias {
    pub name: String,
}

/// aliases that we give to columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnAlias {
    pub name: String,
}
