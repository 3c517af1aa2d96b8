//! Compilation of expressions into positional evaluators.
//!
//! `compile` resolves every source reference against an ordered source list,
//! so the resulting evaluator reads `tuple[i]` for the i-th source. The same
//! expression must be recompiled whenever the source order changes.

use crate::access::{DataType, Value};
use crate::expression::{
    BinaryOperator, CustomFunction, Expression, ExpressionError, ExpressionResult, TypeChecker,
    UnaryOperator,
};
use std::cmp::Ordering;

/// Expression with source references resolved to tuple slots
#[derive(Debug, Clone)]
enum Bound {
    Literal(Value),
    Slot(usize),
    Field(Box<Bound>, String),
    Binary(BinaryOperator, Box<Bound>, Box<Bound>),
    Unary(UnaryOperator, Box<Bound>),
    Tuple(Vec<Bound>),
    Custom(CustomFunction, Vec<Bound>),
}

/// An expression compiled against an ordered source list
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    root: Bound,
    /// Highest slot read by the expression, `None` for constants
    max_slot: Option<usize>,
}

/// Compile `expr` against `sources`, where `sources[i]` binds to `tuple[i]`
pub fn compile(sources: &[String], expr: &Expression) -> ExpressionResult<CompiledExpression> {
    TypeChecker::new(sources).check(expr)?;
    let mut max_slot = None;
    let root = bind(sources, expr, &mut max_slot)?;
    Ok(CompiledExpression { root, max_slot })
}

fn bind(
    sources: &[String],
    expr: &Expression,
    max_slot: &mut Option<usize>,
) -> ExpressionResult<Bound> {
    let bound = match expr {
        Expression::Literal(lit) => Bound::Literal(lit.value.clone()),
        Expression::Source(source) => {
            let index = sources
                .iter()
                .position(|s| *s == source.name)
                .ok_or_else(|| ExpressionError::UnknownSource {
                    name: source.name.clone(),
                    available: sources.to_vec(),
                })?;
            *max_slot = Some(max_slot.map_or(index, |m| m.max(index)));
            Bound::Slot(index)
        }
        Expression::Field { base, name } => {
            Bound::Field(Box::new(bind(sources, base, max_slot)?), name.clone())
        }
        Expression::BinaryOp { op, left, right } => Bound::Binary(
            *op,
            Box::new(bind(sources, left, max_slot)?),
            Box::new(bind(sources, right, max_slot)?),
        ),
        Expression::UnaryOp { op, operand } => {
            Bound::Unary(*op, Box::new(bind(sources, operand, max_slot)?))
        }
        Expression::Tuple(items) => Bound::Tuple(
            items
                .iter()
                .map(|item| bind(sources, item, max_slot))
                .collect::<ExpressionResult<_>>()?,
        ),
        Expression::Custom { function, args } => Bound::Custom(
            function.clone(),
            args.iter()
                .map(|arg| bind(sources, arg, max_slot))
                .collect::<ExpressionResult<_>>()?,
        ),
    };
    Ok(bound)
}

impl CompiledExpression {
    /// Highest tuple slot this expression reads
    pub fn max_slot(&self) -> Option<usize> {
        self.max_slot
    }

    /// Evaluate against a tuple; the tuple may be a prefix as long as it
    /// covers `max_slot`
    pub fn evaluate(&self, tuple: &[Value]) -> ExpressionResult<Value> {
        evaluate_bound(&self.root, tuple)
    }

    /// Evaluate as a filter: only `true` passes, NULL counts as `false`
    pub fn evaluate_predicate(&self, tuple: &[Value]) -> ExpressionResult<bool> {
        match self.evaluate(tuple)? {
            Value::Boolean(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(ExpressionError::NonBooleanPredicate {
                actual: other.data_type(),
            }),
        }
    }
}

fn evaluate_bound(expr: &Bound, tuple: &[Value]) -> ExpressionResult<Value> {
    match expr {
        Bound::Literal(value) => Ok(value.clone()),

        Bound::Slot(index) => tuple
            .get(*index)
            .cloned()
            .ok_or(ExpressionError::SlotOutOfBounds {
                index: *index,
                tuple_size: tuple.len(),
            }),

        Bound::Field(base, name) => {
            let base = evaluate_bound(base, tuple)?;
            if base.is_null() {
                return Ok(Value::Null);
            }
            match base.field(name) {
                Some(value) => Ok(value.clone()),
                None => Err(ExpressionError::TypeMismatch {
                    expected: DataType::Record,
                    actual: base.data_type(),
                    context: format!("field access .{}", name),
                }),
            }
        }

        Bound::Binary(op @ (BinaryOperator::And | BinaryOperator::Or), left, right) => {
            let left_val = evaluate_bound(left, tuple)?;
            // Short-circuit on a decisive left operand
            match (op, &left_val) {
                (BinaryOperator::And, Value::Boolean(false)) => return Ok(Value::Boolean(false)),
                (BinaryOperator::Or, Value::Boolean(true)) => return Ok(Value::Boolean(true)),
                _ => {}
            }
            let right_val = evaluate_bound(right, tuple)?;
            evaluate_logical(*op, left_val, right_val)
        }

        Bound::Binary(op, left, right) => {
            let left_val = evaluate_bound(left, tuple)?;
            let right_val = evaluate_bound(right, tuple)?;
            evaluate_binary_op(*op, left_val, right_val)
        }

        Bound::Unary(op, operand) => {
            let operand_val = evaluate_bound(operand, tuple)?;
            evaluate_unary_op(*op, operand_val)
        }

        Bound::Tuple(items) => Ok(Value::Tuple(
            items
                .iter()
                .map(|item| evaluate_bound(item, tuple))
                .collect::<ExpressionResult<_>>()?,
        )),

        Bound::Custom(function, args) => {
            let args = args
                .iter()
                .map(|arg| evaluate_bound(arg, tuple))
                .collect::<ExpressionResult<Vec<_>>>()?;
            function.call(&args)
        }
    }
}

/// AND/OR under three-valued logic
fn evaluate_logical(op: BinaryOperator, left: Value, right: Value) -> ExpressionResult<Value> {
    let operand = |v: &Value| match v {
        Value::Null => Ok(None),
        Value::Boolean(b) => Ok(Some(*b)),
        _ => Err(ExpressionError::InvalidOperandTypes {
            operator: op.as_str().to_string(),
            left_type: left.data_type(),
            right_type: right.data_type(),
        }),
    };
    let (l, r) = (operand(&left)?, operand(&right)?);

    let result = match op {
        // NULL AND false = false, NULL AND true = NULL
        BinaryOperator::And => match (l, r) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        // NULL OR true = true, NULL OR false = NULL
        _ => match (l, r) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
    };
    Ok(result.map_or(Value::Null, Value::Boolean))
}

fn evaluate_binary_op(op: BinaryOperator, left: Value, right: Value) -> ExpressionResult<Value> {
    // NULL propagates through comparisons, arithmetic and concatenation
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    let invalid = |left: &Value, right: &Value| ExpressionError::InvalidOperandTypes {
        operator: op.as_str().to_string(),
        left_type: left.data_type(),
        right_type: right.data_type(),
    };

    match op {
        BinaryOperator::Add => match (&left, &right) {
            (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(a.wrapping_add(*b))),
            _ => Err(invalid(&left, &right)),
        },

        BinaryOperator::Sub => match (&left, &right) {
            (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(a.wrapping_sub(*b))),
            _ => Err(invalid(&left, &right)),
        },

        BinaryOperator::Mul => match (&left, &right) {
            (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(a.wrapping_mul(*b))),
            _ => Err(invalid(&left, &right)),
        },

        BinaryOperator::Div => match (&left, &right) {
            (Value::Int32(_), Value::Int32(0)) => Err(ExpressionError::DivisionByZero),
            (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(a.wrapping_div(*b))),
            _ => Err(invalid(&left, &right)),
        },

        BinaryOperator::Eq | BinaryOperator::Ne => {
            if left.data_type() != right.data_type() {
                return Err(invalid(&left, &right));
            }
            let equal = left == right;
            Ok(Value::Boolean(if op == BinaryOperator::Eq {
                equal
            } else {
                !equal
            }))
        }

        BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
            let cmp = left
                .compare(&right)
                .ok_or_else(|| ExpressionError::Incomparable {
                    left_type: left.data_type(),
                    right_type: right.data_type(),
                })?;
            Ok(Value::Boolean(match op {
                BinaryOperator::Lt => cmp == Ordering::Less,
                BinaryOperator::Le => cmp != Ordering::Greater,
                BinaryOperator::Gt => cmp == Ordering::Greater,
                _ => cmp != Ordering::Less,
            }))
        }

        BinaryOperator::Concat => match (&left, &right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            _ => Err(invalid(&left, &right)),
        },

        BinaryOperator::And | BinaryOperator::Or => evaluate_logical(op, left, right),
    }
}

fn evaluate_unary_op(op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
    match op {
        UnaryOperator::Not => match operand {
            Value::Null => Ok(Value::Null),
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            _ => Err(ExpressionError::InvalidOperandTypes {
                operator: op.as_str().to_string(),
                left_type: operand.data_type(),
                right_type: None,
            }),
        },

        UnaryOperator::IsTrue => match operand {
            Value::Null => Ok(Value::Boolean(false)),
            Value::Boolean(b) => Ok(Value::Boolean(b)),
            _ => Err(ExpressionError::InvalidOperandTypes {
                operator: op.as_str().to_string(),
                left_type: operand.data_type(),
                right_type: None,
            }),
        },

        UnaryOperator::IsNull => Ok(Value::Boolean(operand.is_null())),

        UnaryOperator::IsNotNull => Ok(Value::Boolean(!operand.is_null())),

        UnaryOperator::Minus => match operand {
            Value::Null => Ok(Value::Null),
            Value::Int32(n) => Ok(Value::Int32(n.wrapping_neg())),
            _ => Err(ExpressionError::InvalidOperandTypes {
                operator: op.as_str().to_string(),
                left_type: operand.data_type(),
                right_type: None,
            }),
        },
    }
}
