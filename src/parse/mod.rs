pub(crate) use at_root_query::AtRootQueryParser;
pub(crate) use base::BaseParser;
pub(crate) use stylesheet::StylesheetParser;

use crate::ast::{AstStmt, AstVariableDecl, Interpolation};

mod at_root_query;
mod base;
mod stylesheet;
mod value;

/// Identifiers that cannot name a user-defined function.
pub(crate) const RESERVED_IDENTIFIERS: [&str; 7] =
    ["calc", "element", "expression", "url", "and", "or", "not"];

/// The ceiling on blocks, parenthesized expressions, and bracketed lists
/// open at once. Deeper input fails deterministically instead of
/// overflowing the stack.
pub(crate) const MAX_NESTING: usize = 100;

/// The result of parsing something that may turn out to be either a full
/// statement or the prefix of a style rule's selector.
pub(crate) enum DeclarationOrBuffer {
    Stmt(AstStmt),
    Buffer(Interpolation),
}

pub(crate) enum VariableDeclOrInterpolation {
    VariableDecl(AstVariableDecl),
    Interpolation(Interpolation),
}
