pub mod ast;
mod builder;
pub mod cst;
mod decode;
pub mod lexer;
mod parser;
pub mod visit;

use crate::error::DiceResult;
use ast::Node;

pub use parser::{ParseError, ParseErrorKind};

/// How deep a single expression may nest, counting both parser recursion and the depth of the
/// built tree. `1+1+1` is three levels deep once built.
pub const MAX_DEPTH: usize = 128;
pub use visit::index_inline_rolls;

/// Parses a full expression with the built-in grammar and numbers its inline rolls.
pub fn parse(s: &str) -> DiceResult<Node> {
    let mut node = parse_unindexed(s)?;
    index_inline_rolls(&mut node);
    Ok(node)
}

pub(crate) fn parse_unindexed(s: &str) -> DiceResult<Node> {
    let cst = parser::Parser::new(s).parse()?;
    tracing::trace!(?cst, "parsed concrete syntax tree");
    Ok(builder::build(&cst)?)
}
