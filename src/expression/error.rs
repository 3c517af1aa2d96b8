//! Error types for expression compilation and evaluation.

use crate::access::DataType;
use std::fmt;

/// Errors that can occur while compiling or evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Value of the wrong type in an operation
    TypeMismatch {
        expected: DataType,
        actual: Option<DataType>,
        context: String,
    },

    /// Invalid operand types for operator
    InvalidOperandTypes {
        operator: String,
        left_type: Option<DataType>,
        right_type: Option<DataType>,
    },

    /// Expression references a source that is not in the source list
    UnknownSource { name: String, available: Vec<String> },

    /// Slot index out of bounds for the tuple being evaluated
    SlotOutOfBounds { index: usize, tuple_size: usize },

    /// Division by zero
    DivisionByZero,

    /// Values that have no ordering between them
    Incomparable {
        left_type: Option<DataType>,
        right_type: Option<DataType>,
    },

    /// A predicate produced something other than a boolean or NULL
    NonBooleanPredicate { actual: Option<DataType> },

    /// A custom function reported a failure
    CustomFunction { name: String, message: String },
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionError::TypeMismatch {
                expected,
                actual,
                context,
            } => {
                write!(
                    f,
                    "Type mismatch in {}: expected {:?}, got {:?}",
                    context, expected, actual
                )
            }

            ExpressionError::InvalidOperandTypes {
                operator,
                left_type,
                right_type,
            } => {
                write!(
                    f,
                    "Invalid operand types for operator {}: left={:?}, right={:?}",
                    operator, left_type, right_type
                )
            }

            ExpressionError::UnknownSource { name, available } => {
                write!(
                    f,
                    "Unknown source '{}' (sources: [{}])",
                    name,
                    available.join(", ")
                )
            }

            ExpressionError::SlotOutOfBounds { index, tuple_size } => {
                write!(
                    f,
                    "Slot {} out of bounds for tuple with {} values",
                    index, tuple_size
                )
            }

            ExpressionError::DivisionByZero => write!(f, "Division by zero"),

            ExpressionError::Incomparable {
                left_type,
                right_type,
            } => {
                write!(
                    f,
                    "Cannot compare values: left={:?}, right={:?}",
                    left_type, right_type
                )
            }

            ExpressionError::NonBooleanPredicate { actual } => {
                write!(f, "Predicate evaluated to {:?} instead of boolean", actual)
            }

            ExpressionError::CustomFunction { name, message } => {
                write!(f, "Function {} failed: {}", name, message)
            }
        }
    }
}

impl std::error::Error for ExpressionError {}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExpressionError::TypeMismatch {
            expected: DataType::Record,
            actual: Some(DataType::Int32),
            context: "field access .id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch in field access .id: expected Record, got Some(Int32)"
        );

        let err = ExpressionError::InvalidOperandTypes {
            operator: "+".to_string(),
            left_type: Some(DataType::Int32),
            right_type: Some(DataType::Varchar),
        };
        assert_eq!(
            err.to_string(),
            "Invalid operand types for operator +: left=Some(Int32), right=Some(Varchar)"
        );

        let err = ExpressionError::UnknownSource {
            name: "c".to_string(),
            available: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Unknown source 'c' (sources: [a, b])");

        let err = ExpressionError::SlotOutOfBounds {
            index: 5,
            tuple_size: 3,
        };
        assert_eq!(
            err.to_string(),
            "Slot 5 out of bounds for tuple with 3 values"
        );

        assert_eq!(ExpressionError::DivisionByZero.to_string(), "Division by zero");

        let err = ExpressionError::NonBooleanPredicate {
            actual: Some(DataType::Int32),
        };
        assert_eq!(
            err.to_string(),
            "Predicate evaluated to Some(Int32) instead of boolean"
        );

        let err = ExpressionError::CustomFunction {
            name: "score".to_string(),
            message: "negative input".to_string(),
        };
        assert_eq!(err.to_string(), "Function score failed: negative input");
    }
}
