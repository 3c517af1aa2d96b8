//! Expression framework for predicates, sort keys and projections.
//!
//! This module provides:
//! - Expression tree representation over named sources
//! - Static checks run when an expression is compiled
//! - Compilation of an expression against an ordered source list into a
//!   positional evaluator over tuples

pub mod error;
pub mod eval;
pub mod expr;
pub mod operator;
pub mod type_checker;

pub use error::{ExpressionError, ExpressionResult};
pub use eval::{compile, CompiledExpression};
pub use expr::{CustomFunction, Expression, Literal, SourceRef};
pub use operator::{BinaryOperator, UnaryOperator};
pub use type_checker::TypeChecker;
