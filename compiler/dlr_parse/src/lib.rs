//! Recursive descent parser for dlr scripts.
//!
//! Scripts are line oriented: node headers (`Name:` / `Name: Parent`) and
//! imports start in column 0, formulas and parameters are indented beneath
//! the node they belong to. The parser only checks shape; scoping and name
//! resolution belong to the compiler's check pass.

mod cursor;
mod grammar;

use dlr_diagnostic::Diagnostic;
use dlr_ir::{LineIndex, SourceFile};

use crate::cursor::Cursor;

/// Parse `source`, attributing any syntax error to `module`.
#[tracing::instrument(level = "debug", skip(source))]
pub fn parse(source: &str, module: &str) -> Result<SourceFile, Diagnostic> {
    let lines = LineIndex::new(source);
    let tokens = dlr_lexer::lex(source).map_err(|e| {
        Diagnostic::parse(e.message).at(module, lines.line_of(e.span.start))
    })?;
    let mut parser = Parser {
        cursor: Cursor::new(&tokens),
        lines: &lines,
        module,
    };
    parser.parse_file()
}

/// Parser state: a token cursor plus what is needed to locate errors.
pub(crate) struct Parser<'a> {
    cursor: Cursor<'a>,
    lines: &'a LineIndex,
    module: &'a str,
}

impl Parser<'_> {
    /// Build a parse diagnostic at the current token's line.
    pub(crate) fn error(&self, message: impl Into<String>) -> Diagnostic {
        let line = self.lines.line_of(self.cursor.current_span().start);
        Diagnostic::parse(message).at(self.module, line)
    }

    /// "expected X, found Y" at the current token.
    pub(crate) fn expected(&self, what: &str) -> Diagnostic {
        self.error(format!(
            "expected {what}, found {}",
            self.cursor.current_kind().describe()
        ))
    }
}

#[cfg(test)]
mod tests;
