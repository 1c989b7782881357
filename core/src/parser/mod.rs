pub mod ast;
pub mod error;
#[allow(clippy::module_inception)]
pub mod parser;
mod syntax;

// Re-export the parser and rule enum for external use
pub use parser::ExpressionParser;
pub use parser::Rule;
pub use parser::parse;

pub use ast::{
    Comprehension, Constant, DictItem, Expr, ExprKind, ImportAlias, Keyword, Module, Param,
    Parameters, Stmt, StmtKind, WithItem,
};
pub use error::ParseError;
pub use syntax::{BinaryOp, BoolOp, CompareOp, Span, UnaryOp};

#[cfg(test)]
mod parse_test;

#[cfg(test)]
mod rule_valid_test;
