//! Scalar expression trees: the bodies of predicates, projections and key selectors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::literal::Literal;
use crate::types::Type;

/// A scalar expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expression {
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    /// Access to a member of a row, record or captured object.
    Member {
        object: Box<Expression>,
        member: String,
        r#type: Type,
    },
    Constant {
        value: Literal,
        r#type: Type,
    },
    /// A reference to a lambda parameter.
    Parameter { name: String, r#type: Type },
    /// Construction of a record, such as an anonymous type.
    New {
        r#type: Type,
        members: Vec<(String, Expression)>,
    },
    Call {
        method: Method,
        /// The receiver of an instance method. Extension methods such as aggregates take
        /// their source as the first argument instead.
        #[serde(default)]
        object: Option<Box<Expression>>,
        #[serde(default)]
        arguments: Vec<Expression>,
        r#type: Type,
    },
    Conditional {
        test: Box<Expression>,
        if_true: Box<Expression>,
        if_false: Box<Expression>,
    },
    /// A lambda in argument position, such as the selector of an aggregate.
    Lambda(Lambda),
    /// Construction followed by member bindings.
    MemberInit {
        r#type: Type,
        bindings: Vec<(String, Expression)>,
    },
    /// Construction of a collection followed by element initializers.
    ListInit {
        r#type: Type,
        initializers: Vec<Expression>,
    },
    NewArray {
        r#type: Type,
        elements: Vec<Expression>,
    },
    /// Invocation of a delegate.
    Invoke {
        target: Box<Expression>,
        #[serde(default)]
        arguments: Vec<Expression>,
        r#type: Type,
    },
    /// A type test.
    TypeIs {
        operand: Box<Expression>,
        type_operand: Type,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOperator {
    And,
    Or,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessThanOrEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanOrEqual
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOperator {
    Not,
    Negate,
    Convert(Type),
}

/// A method called from within a lambda.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    String(StringMethod),
    Aggregate(AggregateMethod),
    Other {
        declaring_type: String,
        name: String,
    },
}

/// Instance methods of strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringMethod {
    StartsWith,
    EndsWith,
    Contains,
    Substring,
    ToUpper,
    ToLower,
}

/// Aggregating extension methods over collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateMethod {
    Count,
    Sum,
    Min,
    Max,
    Average,
}

impl Method {
    pub fn name(&self) -> &str {
        match self {
            Method::String(StringMethod::StartsWith) => "StartsWith",
            Method::String(StringMethod::EndsWith) => "EndsWith",
            Method::String(StringMethod::Contains) => "Contains",
            Method::String(StringMethod::Substring) => "Substring",
            Method::String(StringMethod::ToUpper) => "ToUpper",
            Method::String(StringMethod::ToLower) => "ToLower",
            Method::Aggregate(AggregateMethod::Count) => "Count",
            Method::Aggregate(AggregateMethod::Sum) => "Sum",
            Method::Aggregate(AggregateMethod::Min) => "Min",
            Method::Aggregate(AggregateMethod::Max) => "Max",
            Method::Aggregate(AggregateMethod::Average) => "Average",
            Method::Other { name, .. } => name,
        }
    }
}

/// A lambda: the parameters it binds and its body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    pub parameters: Vec<Parameter>,
    pub body: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub r#type: Type,
}

impl Parameter {
    /// A reference to this parameter.
    pub fn reference(&self) -> Expression {
        Expression::Parameter {
            name: self.name.clone(),
            r#type: self.r#type.clone(),
        }
    }
}

impl Lambda {
    pub fn new(parameters: Vec<Parameter>, body: Expression) -> Lambda {
        Lambda {
            parameters,
            body: Box::new(body),
        }
    }

    /// The type of the value the lambda returns.
    pub fn return_type(&self) -> Type {
        self.body.type_of()
    }
}

impl Expression {
    /// The static type of the expression.
    pub fn type_of(&self) -> Type {
        match self {
            Expression::Binary {
                operator, left, ..
            } => {
                if operator.is_logical() || operator.is_comparison() {
                    Type::boolean()
                } else {
                    left.type_of()
                }
            }
            Expression::Unary { operator, operand } => match operator {
                UnaryOperator::Not => Type::boolean(),
                UnaryOperator::Negate => operand.type_of(),
                UnaryOperator::Convert(r#type) => r#type.clone(),
            },
            Expression::Conditional { if_true, .. } => if_true.type_of(),
            Expression::Lambda(lambda) => lambda.return_type(),
            Expression::TypeIs { .. } => Type::boolean(),
            Expression::Member { r#type, .. }
            | Expression::Constant { r#type, .. }
            | Expression::Parameter { r#type, .. }
            | Expression::New { r#type, .. }
            | Expression::Call { r#type, .. }
            | Expression::MemberInit { r#type, .. }
            | Expression::ListInit { r#type, .. }
            | Expression::NewArray { r#type, .. }
            | Expression::Invoke { r#type, .. } => r#type.clone(),
        }
    }

    /// The direct sub-expressions, in evaluation order.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Binary { left, right, .. } => vec![&**left, &**right],
            Expression::Unary { operand, .. } => vec![&**operand],
            Expression::Member { object, .. } => vec![&**object],
            Expression::Constant { .. } | Expression::Parameter { .. } => vec![],
            Expression::New { members, .. } => members.iter().map(|(_, e)| e).collect(),
            Expression::Call {
                object, arguments, ..
            } => object.iter().map(|o| &**o).chain(arguments).collect(),
            Expression::Conditional {
                test,
                if_true,
                if_false,
            } => vec![&**test, &**if_true, &**if_false],
            Expression::Lambda(lambda) => vec![&*lambda.body],
            Expression::MemberInit { bindings, .. } => bindings.iter().map(|(_, e)| e).collect(),
            Expression::ListInit { initializers, .. } => initializers.iter().collect(),
            Expression::NewArray { elements, .. } => elements.iter().collect(),
            Expression::Invoke {
                target, arguments, ..
            } => std::iter::once(&**target).chain(arguments).collect(),
            Expression::TypeIs { operand, .. } => vec![&**operand],
        }
    }

    /// Rebuild the expression with each direct sub-expression replaced by the result of `f`.
    /// Sub-expressions are visited in the same order as `children`.
    pub fn try_map_children<E, F>(&self, mut f: F) -> Result<Expression, E>
    where
        F: FnMut(&Expression) -> Result<Expression, E>,
    {
        let mut boxed = |e: &Expression| f(e).map(Box::new);
        Ok(match self {
            Expression::Binary {
                operator,
                left,
                right,
            } => Expression::Binary {
                operator: *operator,
                left: boxed(left)?,
                right: boxed(right)?,
            },
            Expression::Unary { operator, operand } => Expression::Unary {
                operator: operator.clone(),
                operand: boxed(operand)?,
            },
            Expression::Member {
                object,
                member,
                r#type,
            } => Expression::Member {
                object: boxed(object)?,
                member: member.clone(),
                r#type: r#type.clone(),
            },
            Expression::Constant { .. } | Expression::Parameter { .. } => self.clone(),
            Expression::New { r#type, members } => Expression::New {
                r#type: r#type.clone(),
                members: members
                    .iter()
                    .map(|(name, e)| Ok((name.clone(), *boxed(e)?)))
                    .collect::<Result<_, E>>()?,
            },
            Expression::Call {
                method,
                object,
                arguments,
                r#type,
            } => Expression::Call {
                method: method.clone(),
                object: object.as_deref().map(&mut boxed).transpose()?,
                arguments: arguments
                    .iter()
                    .map(|e| boxed(e).map(|b| *b))
                    .collect::<Result<_, E>>()?,
                r#type: r#type.clone(),
            },
            Expression::Conditional {
                test,
                if_true,
                if_false,
            } => Expression::Conditional {
                test: boxed(test)?,
                if_true: boxed(if_true)?,
                if_false: boxed(if_false)?,
            },
            Expression::Lambda(lambda) => Expression::Lambda(Lambda {
                parameters: lambda.parameters.clone(),
                body: boxed(&lambda.body)?,
            }),
            Expression::MemberInit { r#type, bindings } => Expression::MemberInit {
                r#type: r#type.clone(),
                bindings: bindings
                    .iter()
                    .map(|(name, e)| Ok((name.clone(), *boxed(e)?)))
                    .collect::<Result<_, E>>()?,
            },
            Expression::ListInit {
                r#type,
                initializers,
            } => Expression::ListInit {
                r#type: r#type.clone(),
                initializers: initializers
                    .iter()
                    .map(|e| boxed(e).map(|b| *b))
                    .collect::<Result<_, E>>()?,
            },
            Expression::NewArray { r#type, elements } => Expression::NewArray {
                r#type: r#type.clone(),
                elements: elements
                    .iter()
                    .map(|e| boxed(e).map(|b| *b))
                    .collect::<Result<_, E>>()?,
            },
            Expression::Invoke {
                target,
                arguments,
                r#type,
            } => Expression::Invoke {
                target: boxed(target)?,
                arguments: arguments
                    .iter()
                    .map(|e| boxed(e).map(|b| *b))
                    .collect::<Result<_, E>>()?,
                r#type: r#type.clone(),
            },
            Expression::TypeIs {
                operand,
                type_operand,
            } => Expression::TypeIs {
                operand: boxed(operand)?,
                type_operand: type_operand.clone(),
            },
        })
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter, items: &[T]) -> fmt::Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_assignments(f: &mut fmt::Formatter, assignments: &[(String, Expression)]) -> fmt::Result {
    for (index, (name, value)) in assignments.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{name} = {value}")?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Binary {
                operator,
                left,
                right,
            } => write!(f, "({left} {} {right})", operator.symbol()),
            Expression::Unary { operator, operand } => match operator {
                UnaryOperator::Not => write!(f, "Not({operand})"),
                UnaryOperator::Negate => write!(f, "-{operand}"),
                UnaryOperator::Convert(r#type) => write!(f, "Convert({operand}, {type})"),
            },
            Expression::Member { object, member, .. } => write!(f, "{object}.{member}"),
            Expression::Constant { value, .. } => write!(f, "{value}"),
            Expression::Parameter { name, .. } => write!(f, "{name}"),
            Expression::New { r#type, members } => {
                write!(f, "new {type}(")?;
                write_assignments(f, members)?;
                write!(f, ")")
            }
            Expression::Call {
                method,
                object,
                arguments,
                ..
            } => {
                if let Some(object) = object {
                    write!(f, "{object}.")?;
                }
                write!(f, "{}(", method.name())?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
            Expression::Conditional {
                test,
                if_true,
                if_false,
            } => write!(f, "IIF({test}, {if_true}, {if_false})"),
            Expression::Lambda(lambda) => write!(f, "{lambda}"),
            Expression::MemberInit { r#type, bindings } => {
                write!(f, "new {type}() {{")?;
                write_assignments(f, bindings)?;
                write!(f, "}}")
            }
            Expression::ListInit {
                r#type,
                initializers,
            } => {
                write!(f, "new {type}() {{")?;
                write_list(f, initializers)?;
                write!(f, "}}")
            }
            Expression::NewArray { elements, .. } => {
                write!(f, "new [] {{")?;
                write_list(f, elements)?;
                write!(f, "}}")
            }
            Expression::Invoke {
                target, arguments, ..
            } => {
                write!(f, "Invoke({target}")?;
                for argument in arguments {
                    write!(f, ", {argument}")?;
                }
                write!(f, ")")
            }
            Expression::TypeIs {
                operand,
                type_operand,
            } => write!(f, "({operand} Is {type_operand})"),
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.parameters.as_slice() {
            [single] => write!(f, "{} => {}", single.name, self.body),
            parameters => {
                write!(f, "(")?;
                for (index, parameter) in parameters.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", parameter.name)?;
                }
                write!(f, ") => {}", self.body)
            }
        }
    }
}
