mod common;
mod expr;
mod stmt;

pub use self::common::TokenStream;

use self::common::Parser;
use crate::ast::Script;
use crate::error::Diagnostic;
use crate::lexer::lex;
use tracing::debug;

/// Lexes and parses `src`. Always returns a tree; statements that failed to parse are
/// left out and described in the diagnostics instead.
pub fn parse(src: &[u8]) -> (Script, Vec<Diagnostic>) {
    let mut parser = Parser::new(lex(src), src);
    let statements = parser.parse_statements(false);

    debug!(
        statements = statements.len(),
        errors = parser.errors.len(),
        "parsed script"
    );
    (Script { statements }, parser.errors)
}
