//! Convert a SQL AST to a low-level SQL string.

use super::ast::*;
use super::helpers;
use super::string::SQL;

// Convert to SQL strings

impl Select {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("SELECT ");

        self.select_list.to_sql(sql);

        if let Some(from) = &self.from {
            sql.append_syntax(" ");
            from.to_sql(sql);
        }

        for join in &self.joins {
            join.to_sql(sql);
        }

        self.where_.to_sql(sql);

        self.order_by.to_sql(sql);
    }
}

impl SelectList {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            SelectList::Expressions(expressions) => {
                for (index, expr) in expressions.iter().enumerate() {
                    if index > 0 {
                        sql.append_syntax(", ");
                    }
                    expr.to_sql(sql);
                }
            }
            SelectList::SelectList(select_list) => {
                for (index, (col, expr)) in select_list.iter().enumerate() {
                    if index > 0 {
                        sql.append_syntax(", ");
                    }
                    expr.to_sql(sql);
                    sql.append_syntax(" AS ");
                    col.to_sql(sql);
                }
            }
        }
    }
}

impl From {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("FROM ");
        match &self {
            From::Table { reference, alias } => {
                reference.to_sql(sql);
                if let Some(alias) = alias {
                    sql.append_syntax(" AS ");
                    alias.to_sql(sql);
                }
            }
            From::Select { select, alias } => {
                sql.append_syntax("(");
                select.to_sql(sql);
                sql.append_syntax(")");
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
        }
    }
}

impl Join {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Join::InnerJoin(join) => {
                sql.append_syntax(" INNER JOIN ");
                join.reference.to_sql(sql);
                sql.append_syntax(" ON ");
                join.left_key.to_sql(sql);
                sql.append_syntax(" = ");
                join.right_key.to_sql(sql);
            }
            Join::CrossJoin(join) => {
                sql.append_syntax(" CROSS JOIN ");
                sql.append_syntax("(");
                join.select.to_sql(sql);
                sql.append_syntax(")");
                sql.append_syntax(" AS ");
                join.alias.to_sql(sql);
            }
        }
    }
}

impl Where {
    pub fn to_sql(&self, sql: &mut SQL) {
        let Where(expression) = self;
        if *expression != helpers::true_expr() {
            sql.append_syntax(" WHERE ");
            expression.to_sql(sql);
        }
    }
}

impl OrderBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" ORDER BY ");
            for (index, element) in self.elements.iter().enumerate() {
                if index > 0 {
                    sql.append_syntax(", ");
                }
                element.to_sql(sql);
            }
        }
    }
}

impl OrderByElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.target.to_sql(sql);
        match self.direction {
            OrderByDirection::Asc => {}
            OrderByDirection::Desc => sql.append_syntax(" Desc"),
        }
    }
}

// scalars
impl Expression {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Expression::ColumnReference(column_reference) => column_reference.to_sql(sql),
            Expression::Value(value) => value.to_sql(sql),
            Expression::And { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" AND ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Or { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" OR ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Not(expr) => {
                sql.append_syntax("NOT (");
                expr.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Negate(expr) => {
                sql.append_syntax("-(");
                expr.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::BinaryOperation {
                left,
                operator,
                right,
            } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                operator.to_sql(sql);
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::UnaryOperation {
                expression,
                operator,
            } => {
                sql.append_syntax("(");
                expression.to_sql(sql);
                operator.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::FunctionCall { function, args } => {
                function.to_sql(sql);
                sql.append_syntax("(");
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        sql.append_syntax(", ");
                    }
                    arg.to_sql(sql);
                }
                sql.append_syntax(")");
            }
            Expression::Like {
                expression,
                pattern,
                wildcards,
            } => {
                expression.to_sql(sql);
                sql.append_syntax(" LIKE (");
                if matches!(wildcards, Wildcards::Leading | Wildcards::Both) {
                    sql.append_syntax("'%' + ");
                }
                pattern.to_sql(sql);
                if matches!(wildcards, Wildcards::Trailing | Wildcards::Both) {
                    sql.append_syntax(" + '%'");
                }
                sql.append_syntax(")");
            }
            Expression::Case {
                test,
                then,
                otherwise,
            } => {
                sql.append_syntax("CASE WHEN ");
                test.to_sql(sql);
                sql.append_syntax(" THEN ");
                then.to_sql(sql);
                sql.append_syntax(" ELSE ");
                otherwise.to_sql(sql);
                sql.append_syntax(" END");
            }
            Expression::Count(count_type) => {
                sql.append_syntax("Count(");
                count_type.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::CorrelatedSubSelect(select) => {
                sql.append_syntax("(");
                select.to_sql(sql);
                sql.append_syntax(")");
            }
        }
    }
}

impl UnaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            UnaryOperator::IsNull => sql.append_syntax(" IS NULL"),
            UnaryOperator::IsNotNull => sql.append_syntax(" IS NOT NULL"),
        }
    }
}

impl BinaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax(" ");
        sql.append_syntax(&self.0);
        sql.append_syntax(" ");
    }
}

impl Function {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Function::Sum => sql.append_syntax("Sum"),
            Function::Min => sql.append_syntax("Min"),
            Function::Max => sql.append_syntax("Max"),
            Function::Avg => sql.append_syntax("Avg"),
            Function::Upper => sql.append_syntax("Upper"),
            Function::Lower => sql.append_syntax("Lower"),
            Function::Substring => sql.append_syntax("Substring"),
        }
    }
}

impl CountType {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            CountType::Star => sql.append_syntax("*"),
        }
    }
}

impl Value {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Value::Param(param) => sql.append_param(param.clone()),
            Value::Null => sql.append_syntax("NULL"),
            Value::Bool(true) => sql.append_syntax("TRUE"),
            Value::Bool(false) => sql.append_syntax("FALSE"),
        }
    }
}

// names
impl TableReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            TableReference::DBTable(TableName(name)) => sql.append_identifier(name),
            TableReference::AliasedTable(alias) => alias.to_sql(sql),
        }
    }
}

impl TableAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

impl ColumnReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            ColumnReference::TableColumn { table, name } => {
                table.to_sql(sql);
                sql.append_syntax(".");
                name.to_sql(sql);
            }
            ColumnReference::Column(name) => name.to_sql(sql),
        }
    }
}

impl ColumnName {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.0);
    }
}

impl ColumnAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}
