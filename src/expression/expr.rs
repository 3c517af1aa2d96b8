//! Expression tree definitions.

use crate::access::Value;
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use crate::expression::ExpressionResult;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Reference to a registered source by its identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub name: String,
}

impl SourceRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Literal value in an expression
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

type ScalarFn = dyn Fn(&[Value]) -> ExpressionResult<Value> + Send + Sync;

/// User supplied scalar function over evaluated arguments.
///
/// Must be pure: the planner may evaluate it any number of times per tuple.
#[derive(Clone)]
pub struct CustomFunction {
    name: String,
    func: Arc<ScalarFn>,
}

impl CustomFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> ExpressionResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> ExpressionResult<Value> {
        (self.func)(args)
    }
}

impl fmt::Debug for CustomFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.func, &other.func)
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal constant value
    Literal(Literal),

    /// The row bound to a source
    Source(SourceRef),

    /// Field of a record value
    Field {
        base: Box<Expression>,
        name: String,
    },

    /// Binary operation, including AND/OR and comparisons
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Unary operation, including NOT
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Tuple constructor
    Tuple(Vec<Expression>),

    /// Custom scalar function call
    Custom {
        function: CustomFunction,
        args: Vec<Expression>,
    },
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(Literal::new(value.into()))
    }

    pub fn int32(val: i32) -> Self {
        Self::literal(Value::Int32(val))
    }

    pub fn string(val: impl Into<String>) -> Self {
        Self::literal(Value::String(val.into()))
    }

    pub fn boolean(val: bool) -> Self {
        Self::literal(Value::Boolean(val))
    }

    pub fn null() -> Self {
        Self::literal(Value::Null)
    }

    /// Create a reference to a source
    pub fn source(name: impl Into<String>) -> Self {
        Expression::Source(SourceRef::new(name))
    }

    /// Create a field access on a record-valued expression
    pub fn field(base: Expression, name: impl Into<String>) -> Self {
        Expression::Field {
            base: Box::new(base),
            name: name.into(),
        }
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Or, left, right)
    }

    pub fn not_expr(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Not, operand)
    }

    pub fn is_true(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsTrue, operand)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    pub fn ne(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ne, left, right)
    }

    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Lt, left, right)
    }

    pub fn le(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Le, left, right)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    pub fn ge(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ge, left, right)
    }

    pub fn add_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Add, left, right)
    }

    pub fn sub_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Sub, left, right)
    }

    pub fn mul_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Mul, left, right)
    }

    pub fn div_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Div, left, right)
    }

    pub fn concat(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Concat, left, right)
    }

    pub fn is_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNull, operand)
    }

    pub fn is_not_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNotNull, operand)
    }

    /// Create a tuple constructor
    pub fn tuple(items: Vec<Expression>) -> Self {
        Expression::Tuple(items)
    }

    /// Create a call to a custom scalar function
    pub fn custom(function: CustomFunction, args: Vec<Expression>) -> Self {
        Expression::Custom { function, args }
    }

    /// Split off the operands if this node is a binary OR
    pub fn as_or(&self) -> Option<(&Expression, &Expression)> {
        match self {
            Expression::BinaryOp {
                op: BinaryOperator::Or,
                left,
                right,
            } => Some((left, right)),
            _ => None,
        }
    }

    /// Top-level conjuncts: the leaves of the AND nodes at the root
    pub fn conjuncts(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        self.collect_conjuncts(&mut out);
        out
    }

    fn collect_conjuncts<'a>(&'a self, out: &mut Vec<&'a Expression>) {
        match self {
            Expression::BinaryOp {
                op: BinaryOperator::And,
                left,
                right,
            } => {
                left.collect_conjuncts(out);
                right.collect_conjuncts(out);
            }
            other => out.push(other),
        }
    }

    /// Names of all sources this expression refers to
    pub fn referenced_sources(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_sources(&mut names);
        names
    }

    fn collect_sources<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expression::Literal(_) => {}
            Expression::Source(source) => {
                names.insert(source.name.as_str());
            }
            Expression::Field { base, .. } => base.collect_sources(names),
            Expression::BinaryOp { left, right, .. } => {
                left.collect_sources(names);
                right.collect_sources(names);
            }
            Expression::UnaryOp { operand, .. } => operand.collect_sources(names),
            Expression::Tuple(items) | Expression::Custom { args: items, .. } => {
                for item in items {
                    item.collect_sources(names);
                }
            }
        }
    }

    /// Check if this expression is a constant (references no source)
    pub fn is_constant(&self) -> bool {
        self.referenced_sources().is_empty()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(lit) => write!(f, "{}", lit.value),
            Expression::Source(source) => write!(f, "{}", source.name),
            Expression::Field { base, name } => write!(f, "{}.{}", base, name),
            Expression::BinaryOp { op, left, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            Expression::UnaryOp { op, operand } => match op {
                UnaryOperator::Not | UnaryOperator::Minus => {
                    write!(f, "{} {}", op.as_str(), operand)
                }
                _ => write!(f, "{} {}", operand, op.as_str()),
            },
            Expression::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Expression::Custom { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
