//! Partial evaluation: fold the sub-trees of an expression that do not depend on a lambda
//! parameter into literal constants, before the expression is translated.
//!
//! Evaluation takes two passes. The first nominates, bottom-up, every node whose whole
//! sub-tree may be evaluated locally. The second walks top-down and replaces the first
//! nominated node it reaches on each branch by the value it computes.

use std::cmp::Ordering;

use query_engine_metadata::metadata::ScalarType;
use query_engine_models::{
    AggregateMethod, BinaryOperator, Expression, Literal, Method, Query, StringMethod, Type,
    UnaryOperator,
};

use super::error::Error;

/// Whether a node may be evaluated before translation. Lambda parameters and everything
/// that binds or calls through them must stay, as do type conversions.
pub fn can_be_evaluated_locally(expression: &Expression) -> bool {
    !matches!(
        expression,
        Expression::Parameter { .. }
            | Expression::Lambda(_)
            | Expression::Invoke { .. }
            | Expression::Unary {
                operator: UnaryOperator::Convert(_),
                ..
            }
    )
}

/// Fold every maximal sub-tree that can be evaluated locally into a constant.
pub fn partially_evaluate(expression: &Expression) -> Result<Expression, Error> {
    partially_evaluate_with(expression, &can_be_evaluated_locally)
}

/// Fold every maximal sub-tree accepted by `can_be_evaluated` into a constant.
pub fn partially_evaluate_with(
    expression: &Expression,
    can_be_evaluated: &dyn Fn(&Expression) -> bool,
) -> Result<Expression, Error> {
    let nomination = nominate(expression, can_be_evaluated);
    evaluate(expression, &nomination)
}

/// Partially evaluate every lambda body and operator argument of a query.
pub fn partially_evaluate_query(query: &Query) -> Result<Query, Error> {
    query.try_map_expressions(&mut |expression| partially_evaluate(expression))
}

/// The outcome of the nomination pass, shaped like the expression tree.
struct Nomination {
    candidate: bool,
    children: Vec<Nomination>,
}

fn nominate(expression: &Expression, can_be_evaluated: &dyn Fn(&Expression) -> bool) -> Nomination {
    let children: Vec<Nomination> = expression
        .children()
        .into_iter()
        .map(|child| nominate(child, can_be_evaluated))
        .collect();
    let candidate = children.iter().all(|child| child.candidate) && can_be_evaluated(expression);
    Nomination {
        candidate,
        children,
    }
}

fn evaluate(expression: &Expression, nomination: &Nomination) -> Result<Expression, Error> {
    if nomination.candidate {
        return match expression {
            Expression::Constant { .. } => Ok(expression.clone()),
            _ => {
                let value =
                    interpret(expression).map_err(|reason| Error::InvalidLocalEvaluation {
                        expression: expression.to_string(),
                        reason,
                    })?;
                Ok(Expression::Constant {
                    value,
                    r#type: expression.type_of(),
                })
            }
        };
    }

    let mut children = nomination.children.iter();
    expression.try_map_children(|child| match children.next() {
        Some(nomination) => evaluate(child, nomination),
        None => Ok(child.clone()),
    })
}

/// Compute the value of an expression that does not depend on any lambda parameter.
fn interpret(expression: &Expression) -> Result<Literal, String> {
    match expression {
        Expression::Constant { value, .. } => Ok(value.clone()),
        Expression::Binary {
            operator,
            left,
            right,
        } => {
            let left = interpret(left)?;
            match (operator, &left) {
                (BinaryOperator::And, Literal::Bool(false)) => Ok(Literal::Bool(false)),
                (BinaryOperator::Or, Literal::Bool(true)) => Ok(Literal::Bool(true)),
                _ => binary(*operator, left, interpret(right)?),
            }
        }
        Expression::Unary { operator, operand } => unary(operator, interpret(operand)?),
        Expression::Member { object, member, .. } => match interpret(object)? {
            Literal::Object(mut fields) => fields
                .swap_remove(member)
                .ok_or_else(|| format!("the captured object has no member '{member}'")),
            Literal::String(text) if member == "Length" => length(text.chars().count()),
            Literal::List(items) if member == "Count" || member == "Length" => length(items.len()),
            other => Err(format!("a {} has no member '{member}'", other.kind())),
        },
        Expression::Conditional {
            test,
            if_true,
            if_false,
        } => match interpret(test)? {
            Literal::Bool(true) => interpret(if_true),
            Literal::Bool(false) => interpret(if_false),
            other => Err(format!("the test is a {}, not a boolean", other.kind())),
        },
        Expression::New { members, .. }
        | Expression::MemberInit {
            bindings: members, ..
        } => Ok(Literal::Object(
            members
                .iter()
                .map(|(name, value)| Ok((name.clone(), interpret(value)?)))
                .collect::<Result<_, String>>()?,
        )),
        Expression::ListInit {
            initializers: elements,
            ..
        }
        | Expression::NewArray { elements, .. } => Ok(Literal::List(
            elements.iter().map(interpret).collect::<Result<_, _>>()?,
        )),
        Expression::Call {
            method,
            object,
            arguments,
            ..
        } => call(method, object.as_deref(), arguments),
        Expression::TypeIs {
            operand,
            type_operand,
        } => Ok(Literal::Bool(has_type(&interpret(operand)?, type_operand))),
        Expression::Parameter { name, .. } => Err(format!("it depends on the parameter '{name}'")),
        Expression::Lambda(_) => Err("lambdas have no value of their own".to_string()),
        Expression::Invoke { .. } => Err("delegates cannot be invoked locally".to_string()),
    }
}

fn length(length: usize) -> Result<Literal, String> {
    i64::try_from(length)
        .map(Literal::Int)
        .map_err(|_| "the length does not fit in an integer".to_string())
}

#[allow(clippy::cast_precision_loss)]
fn as_float(value: &Literal) -> Option<f64> {
    match value {
        Literal::Int(i) => Some(*i as f64),
        Literal::Float(x) => Some(*x),
        _ => None,
    }
}

fn mismatch(operator: BinaryOperator, left: &Literal, right: &Literal) -> String {
    format!(
        "cannot apply '{}' to a {} and a {}",
        operator.symbol(),
        left.kind(),
        right.kind()
    )
}

fn equals(left: &Literal, right: &Literal) -> bool {
    match (left, right) {
        (Literal::Int(_), Literal::Float(_)) | (Literal::Float(_), Literal::Int(_)) => {
            as_float(left) == as_float(right)
        }
        _ => left == right,
    }
}

fn compare(left: &Literal, right: &Literal) -> Option<Ordering> {
    match (left, right) {
        (Literal::Int(l), Literal::Int(r)) => Some(l.cmp(r)),
        (Literal::String(l), Literal::String(r)) => Some(l.cmp(r)),
        _ => as_float(left)?.partial_cmp(&as_float(right)?),
    }
}

/// The text a value contributes to a string concatenation.
fn text(value: &Literal) -> String {
    match value {
        Literal::String(s) => s.clone(),
        Literal::Null => String::new(),
        other => other.to_string(),
    }
}

fn arithmetic(
    operator: BinaryOperator,
    left: &Literal,
    right: &Literal,
    integral: fn(i64, i64) -> Option<i64>,
    floating: fn(f64, f64) -> f64,
) -> Result<Literal, String> {
    if let (Literal::Int(l), Literal::Int(r)) = (left, right) {
        return integral(*l, *r)
            .map(Literal::Int)
            .ok_or_else(|| format!("arithmetic overflow in {l} {} {r}", operator.symbol()));
    }
    match (as_float(left), as_float(right)) {
        (Some(l), Some(r)) => {
            let value = floating(l, r);
            if value.is_finite() {
                Ok(Literal::Float(value))
            } else {
                Err(format!(
                    "{l} {} {r} is not a finite number",
                    operator.symbol()
                ))
            }
        }
        _ => Err(mismatch(operator, left, right)),
    }
}

fn binary(operator: BinaryOperator, left: Literal, right: Literal) -> Result<Literal, String> {
    match operator {
        BinaryOperator::And | BinaryOperator::Or => match (&left, &right) {
            (Literal::Bool(l), Literal::Bool(r)) => Ok(Literal::Bool(
                if operator == BinaryOperator::And {
                    *l && *r
                } else {
                    *l || *r
                },
            )),
            _ => Err(mismatch(operator, &left, &right)),
        },
        BinaryOperator::Equal => Ok(Literal::Bool(equals(&left, &right))),
        BinaryOperator::NotEqual => Ok(Literal::Bool(!equals(&left, &right))),
        BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => {
            let ordering =
                compare(&left, &right).ok_or_else(|| mismatch(operator, &left, &right))?;
            Ok(Literal::Bool(match operator {
                BinaryOperator::LessThan => ordering.is_lt(),
                BinaryOperator::LessThanOrEqual => ordering.is_le(),
                BinaryOperator::GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOperator::Add => match (&left, &right) {
            (Literal::String(_), _) | (_, Literal::String(_)) => {
                Ok(Literal::String(text(&left) + &text(&right)))
            }
            _ => arithmetic(operator, &left, &right, i64::checked_add, |l, r| l + r),
        },
        BinaryOperator::Subtract => {
            arithmetic(operator, &left, &right, i64::checked_sub, |l, r| l - r)
        }
        BinaryOperator::Multiply => {
            arithmetic(operator, &left, &right, i64::checked_mul, |l, r| l * r)
        }
        BinaryOperator::Divide | BinaryOperator::Modulo => {
            if right == Literal::Int(0) && matches!(left, Literal::Int(_)) {
                return Err("division by zero".to_string());
            }
            if operator == BinaryOperator::Divide {
                arithmetic(operator, &left, &right, i64::checked_div, |l, r| l / r)
            } else {
                arithmetic(operator, &left, &right, i64::checked_rem, |l, r| l % r)
            }
        }
    }
}

fn unary(operator: &UnaryOperator, operand: Literal) -> Result<Literal, String> {
    match (operator, operand) {
        (UnaryOperator::Not, Literal::Bool(b)) => Ok(Literal::Bool(!b)),
        (UnaryOperator::Negate, Literal::Int(i)) => i
            .checked_neg()
            .map(Literal::Int)
            .ok_or_else(|| format!("arithmetic overflow in -{i}")),
        (UnaryOperator::Negate, Literal::Float(x)) => Ok(Literal::Float(-x)),
        (UnaryOperator::Convert(target), value) => convert_value(value, target),
        (UnaryOperator::Not, operand) => Err(format!("cannot negate a {}", operand.kind())),
        (UnaryOperator::Negate, operand) => {
            Err(format!("cannot take the negative of a {}", operand.kind()))
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn convert_value(value: Literal, target: &Type) -> Result<Literal, String> {
    match (target.scalar(), value) {
        (_, Literal::Null) => {
            if matches!(target, Type::Nullable(_)) {
                Ok(Literal::Null)
            } else {
                Err(format!("cannot convert null to {target}"))
            }
        }
        (Some(scalar), Literal::Float(x)) if scalar.is_integral() => {
            if x.is_finite() && x.trunc() >= i64::MIN as f64 && x.trunc() <= i64::MAX as f64 {
                Ok(Literal::Int(x.trunc() as i64))
            } else {
                Err(format!("{x} does not fit in {target}"))
            }
        }
        (Some(scalar), Literal::Int(i)) if scalar.is_numeric() && !scalar.is_integral() => {
            Ok(Literal::Float(i as f64))
        }
        (_, value) => Ok(value),
    }
}

fn has_type(value: &Literal, r#type: &Type) -> bool {
    match (value, r#type) {
        (Literal::Null, _) => false,
        (value, Type::Nullable(inner)) => has_type(value, inner),
        (Literal::Bool(_), Type::Scalar(scalar)) => *scalar == ScalarType::Boolean,
        (Literal::Int(_), Type::Scalar(scalar)) => scalar.is_integral(),
        (Literal::Float(_), Type::Scalar(scalar)) => {
            scalar.is_numeric() && !scalar.is_integral()
        }
        (Literal::String(_), Type::Scalar(scalar)) => scalar.is_textual(),
        (Literal::List(_), Type::Collection(_))
        | (Literal::Object(_), Type::Record(_) | Type::Row(_)) => true,
        _ => false,
    }
}

fn call(
    method: &Method,
    object: Option<&Expression>,
    arguments: &[Expression],
) -> Result<Literal, String> {
    match method {
        Method::String(string_method) => {
            let Some(object) = object else {
                return Err(format!("{} needs a receiver", method.name()));
            };
            let receiver = match interpret(object)? {
                Literal::String(receiver) => receiver,
                other => return Err(format!("{} called on a {}", method.name(), other.kind())),
            };
            let arguments = arguments
                .iter()
                .map(interpret)
                .collect::<Result<Vec<_>, _>>()?;
            string_call(*string_method, &receiver, &arguments)
        }
        Method::Aggregate(aggregate) => {
            let [source] = arguments else {
                return Err(format!(
                    "{} with a selector cannot be evaluated locally",
                    method.name()
                ));
            };
            match interpret(source)? {
                Literal::List(items) => aggregate_list(*aggregate, &items),
                other => Err(format!("{} called on a {}", method.name(), other.kind())),
            }
        }
        Method::Other {
            declaring_type,
            name,
        } => Err(format!("{declaring_type}.{name} cannot be called locally")),
    }
}

fn string_call(
    method: StringMethod,
    receiver: &str,
    arguments: &[Literal],
) -> Result<Literal, String> {
    match (method, arguments) {
        (StringMethod::StartsWith, [Literal::String(pattern)]) => {
            Ok(Literal::Bool(receiver.starts_with(pattern.as_str())))
        }
        (StringMethod::EndsWith, [Literal::String(pattern)]) => {
            Ok(Literal::Bool(receiver.ends_with(pattern.as_str())))
        }
        (StringMethod::Contains, [Literal::String(pattern)]) => {
            Ok(Literal::Bool(receiver.contains(pattern.as_str())))
        }
        (StringMethod::ToUpper, []) => Ok(Literal::String(receiver.to_uppercase())),
        (StringMethod::ToLower, []) => Ok(Literal::String(receiver.to_lowercase())),
        (StringMethod::Substring, [Literal::Int(start)]) => {
            let chars: Vec<char> = receiver.chars().collect();
            let start = index(*start, chars.len())?;
            Ok(Literal::String(chars[start..].iter().collect()))
        }
        (StringMethod::Substring, [Literal::Int(start), Literal::Int(length)]) => {
            let chars: Vec<char> = receiver.chars().collect();
            let start = index(*start, chars.len())?;
            if *length < 0 {
                return Err(format!("negative substring length {length}"));
            }
            let end = i64::try_from(start)
                .ok()
                .and_then(|start| start.checked_add(*length))
                .ok_or_else(|| format!("substring length {length} is out of range"))?;
            let end = index(end, chars.len())?;
            Ok(Literal::String(chars[start..end].iter().collect()))
        }
        _ => Err(format!(
            "invalid arguments to {}",
            Method::String(method).name()
        )),
    }
}

/// A character position within a string of `length` characters.
fn index(position: i64, length: usize) -> Result<usize, String> {
    usize::try_from(position)
        .ok()
        .filter(|position| *position <= length)
        .ok_or_else(|| format!("index {position} is out of range"))
}

fn aggregate_list(aggregate: AggregateMethod, items: &[Literal]) -> Result<Literal, String> {
    match aggregate {
        AggregateMethod::Count => length(items.len()),
        AggregateMethod::Sum => items.iter().try_fold(Literal::Int(0), |total, item| {
            binary(BinaryOperator::Add, total, item.clone())
        }),
        AggregateMethod::Min | AggregateMethod::Max => {
            let mut items = items.iter();
            let first = items
                .next()
                .ok_or_else(|| "the sequence contains no elements".to_string())?;
            items.try_fold(first.clone(), |best, item| {
                let ordering = compare(item, &best)
                    .ok_or_else(|| format!("cannot compare a {} and a {}", item.kind(), best.kind()))?;
                let better = if aggregate == AggregateMethod::Min {
                    ordering.is_lt()
                } else {
                    ordering.is_gt()
                };
                Ok(if better { item.clone() } else { best })
            })
        }
        AggregateMethod::Average => {
            if items.is_empty() {
                return Err("the sequence contains no elements".to_string());
            }
            let total = aggregate_list(AggregateMethod::Sum, items)?;
            let count = length(items.len())?;
            binary(
                BinaryOperator::Divide,
                Literal::Float(as_float(&total).unwrap_or(f64::NAN)),
                count,
            )
        }
    }
}
