//! Static checks for expressions.
//!
//! Source rows are dynamically typed, so a source reference has no static
//! type. Checks catch what can be known before any row is seen: references
//! to sources outside the source list and operators applied to operands
//! whose types are already known to be invalid.

use crate::access::DataType;
use crate::expression::{Expression, ExpressionError, ExpressionResult, UnaryOperator};

/// Type checker for expressions over an ordered source list
pub struct TypeChecker<'a> {
    /// Identifiers of the sources an expression may reference
    sources: &'a [String],
}

impl<'a> TypeChecker<'a> {
    /// Create a new type checker for the given source list
    pub fn new(sources: &'a [String]) -> Self {
        Self { sources }
    }

    /// Check an expression and return its output type if statically known
    pub fn check(&self, expr: &Expression) -> ExpressionResult<Option<DataType>> {
        match expr {
            Expression::Literal(lit) => Ok(lit.value.data_type()),

            Expression::Source(source) => {
                if !self.sources.iter().any(|s| *s == source.name) {
                    return Err(ExpressionError::UnknownSource {
                        name: source.name.clone(),
                        available: self.sources.to_vec(),
                    });
                }
                Ok(None)
            }

            Expression::Field { base, name } => match self.check(base)? {
                Some(DataType::Record) | None => Ok(None),
                Some(other) => Err(ExpressionError::TypeMismatch {
                    expected: DataType::Record,
                    actual: Some(other),
                    context: format!("field access .{}", name),
                }),
            },

            Expression::BinaryOp { op, left, right } => {
                let left_type = self.check(left)?;
                let right_type = self.check(right)?;

                match (left_type, right_type) {
                    (Some(lt), Some(rt)) => match op.output_type(lt, rt) {
                        Some(output_type) => Ok(Some(output_type)),
                        None => Err(ExpressionError::InvalidOperandTypes {
                            operator: op.as_str().to_string(),
                            left_type: Some(lt),
                            right_type: Some(rt),
                        }),
                    },
                    (known, None) | (None, known) => {
                        // Logical operators need booleans even when one side is unknown
                        if op.is_logical() && known.is_some_and(|t| t != DataType::Boolean) {
                            return Err(ExpressionError::InvalidOperandTypes {
                                operator: op.as_str().to_string(),
                                left_type,
                                right_type,
                            });
                        }
                        if op.is_boolean() {
                            Ok(Some(DataType::Boolean))
                        } else {
                            Ok(None)
                        }
                    }
                }
            }

            Expression::UnaryOp { op, operand } => match self.check(operand)? {
                Some(ot) => match op.output_type(ot) {
                    Some(output_type) => Ok(Some(output_type)),
                    None => Err(ExpressionError::InvalidOperandTypes {
                        operator: op.as_str().to_string(),
                        left_type: Some(ot),
                        right_type: None,
                    }),
                },
                None => match op {
                    UnaryOperator::Minus => Ok(None),
                    _ => Ok(Some(DataType::Boolean)),
                },
            },

            Expression::Tuple(items) => {
                for item in items {
                    self.check(item)?;
                }
                Ok(Some(DataType::Tuple))
            }

            Expression::Custom { args, .. } => {
                for arg in args {
                    self.check(arg)?;
                }
                Ok(None)
            }
        }
    }

    /// Check if an expression is valid for use as a filter predicate
    pub fn check_filter_predicate(&self, expr: &Expression) -> ExpressionResult<()> {
        match self.check(expr)? {
            Some(DataType::Boolean) | None => Ok(()),
            Some(other_type) => Err(ExpressionError::TypeMismatch {
                expected: DataType::Boolean,
                actual: Some(other_type),
                context: "filter predicate".to_string(),
            }),
        }
    }
}
