//! Operator definitions for expressions.

use crate::access::DataType;

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,

    // String
    Concat,
}

impl BinaryOperator {
    /// Get the output type of this operator given input types
    pub fn output_type(&self, left: DataType, right: DataType) -> Option<DataType> {
        match self {
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div => match (left, right) {
                (DataType::Int32, DataType::Int32) => Some(DataType::Int32),
                _ => None,
            },

            BinaryOperator::Eq | BinaryOperator::Ne => {
                if left == right {
                    Some(DataType::Boolean)
                } else {
                    None
                }
            }

            // Records have equality but no ordering
            BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
                if left == right && left != DataType::Record {
                    Some(DataType::Boolean)
                } else {
                    None
                }
            }

            BinaryOperator::And | BinaryOperator::Or => match (left, right) {
                (DataType::Boolean, DataType::Boolean) => Some(DataType::Boolean),
                _ => None,
            },

            BinaryOperator::Concat => match (left, right) {
                (DataType::Varchar, DataType::Varchar) => Some(DataType::Varchar),
                _ => None,
            },
        }
    }

    /// Whether the operator always yields a boolean (or NULL)
    pub fn is_boolean(&self) -> bool {
        self.is_comparison() || self.is_logical()
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Concat => "||",
        }
    }
}

/// Unary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    // Logical
    Not,
    /// True only for a boolean `true`; NULL and `false` give `false`
    IsTrue,

    // NULL checks
    IsNull,
    IsNotNull,

    // Arithmetic
    Minus,
}

impl UnaryOperator {
    /// Get the output type of this operator given input type
    pub fn output_type(&self, operand: DataType) -> Option<DataType> {
        match self {
            UnaryOperator::Not | UnaryOperator::IsTrue => match operand {
                DataType::Boolean => Some(DataType::Boolean),
                _ => None,
            },

            UnaryOperator::IsNull | UnaryOperator::IsNotNull => Some(DataType::Boolean),

            UnaryOperator::Minus => match operand {
                DataType::Int32 => Some(DataType::Int32),
                _ => None,
            },
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "NOT",
            UnaryOperator::IsTrue => "IS TRUE",
            UnaryOperator::IsNull => "IS NULL",
            UnaryOperator::IsNotNull => "IS NOT NULL",
            UnaryOperator::Minus => "-",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_operator_output_types() {
        assert_eq!(
            BinaryOperator::Add.output_type(DataType::Int32, DataType::Int32),
            Some(DataType::Int32)
        );
        assert_eq!(
            BinaryOperator::Add.output_type(DataType::Int32, DataType::Varchar),
            None
        );

        assert_eq!(
            BinaryOperator::Eq.output_type(DataType::Int32, DataType::Int32),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOperator::Eq.output_type(DataType::Record, DataType::Record),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOperator::Lt.output_type(DataType::Record, DataType::Record),
            None
        );
        assert_eq!(
            BinaryOperator::Lt.output_type(DataType::Varchar, DataType::Varchar),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOperator::Eq.output_type(DataType::Int32, DataType::Varchar),
            None
        );

        assert_eq!(
            BinaryOperator::Or.output_type(DataType::Boolean, DataType::Boolean),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOperator::And.output_type(DataType::Int32, DataType::Boolean),
            None
        );

        assert_eq!(
            BinaryOperator::Concat.output_type(DataType::Varchar, DataType::Varchar),
            Some(DataType::Varchar)
        );
    }

    #[test]
    fn test_unary_operator_output_types() {
        assert_eq!(
            UnaryOperator::Not.output_type(DataType::Boolean),
            Some(DataType::Boolean)
        );
        assert_eq!(UnaryOperator::Not.output_type(DataType::Int32), None);
        assert_eq!(UnaryOperator::IsTrue.output_type(DataType::Int32), None);
        assert_eq!(
            UnaryOperator::IsNull.output_type(DataType::Record),
            Some(DataType::Boolean)
        );
        assert_eq!(
            UnaryOperator::Minus.output_type(DataType::Int32),
            Some(DataType::Int32)
        );
    }

    #[test]
    fn test_operator_classes() {
        assert!(BinaryOperator::Ge.is_comparison());
        assert!(BinaryOperator::Or.is_logical());
        assert!(BinaryOperator::Eq.is_boolean());
        assert!(!BinaryOperator::Add.is_boolean());
        assert_eq!(BinaryOperator::Ne.as_str(), "!=");
        assert_eq!(UnaryOperator::IsTrue.as_str(), "IS TRUE");
    }
}
