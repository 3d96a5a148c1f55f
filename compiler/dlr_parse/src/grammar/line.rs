//! Declaration lines: imports, node headers, formulas and parameters.

use dlr_diagnostic::Diagnostic;
use dlr_ir::{Decl, Line, NodePath, SourceFile, TokenKind};
use tracing::trace;

use crate::Parser;

impl Parser<'_> {
    pub(crate) fn parse_file(&mut self) -> Result<SourceFile, Diagnostic> {
        let mut file = SourceFile::default();
        loop {
            while self.cursor.eat(&TokenKind::Newline) {}
            if self.cursor.is_at_end() {
                break;
            }
            let line = self.parse_line()?;
            trace!(line = line.line, name = line.decl.name(), "parsed declaration");
            file.lines.push(line);
            if !self.cursor.at_line_end() {
                return Err(self.expected("end of line"));
            }
        }
        Ok(file)
    }

    fn parse_line(&mut self) -> Result<Line, Diagnostic> {
        let start = self.cursor.current_span();
        let line = self.lines.line_of(start.start);
        let indented = self.lines.column_of(start.start) > 0;

        let decl = match self.cursor.current_kind() {
            TokenKind::Import => {
                self.require_column_zero(indented, "import")?;
                self.cursor.advance();
                let module = self.expect_const("module name")?;
                Decl::Import { module }
            }
            TokenKind::Const(_) => {
                self.require_column_zero(indented, "node definition")?;
                self.parse_node_header()?
            }
            TokenKind::Ident(_) => {
                if !indented {
                    return Err(self.error("attribute definitions must be indented under a node"));
                }
                self.parse_member()?
            }
            _ => return Err(self.expected("a declaration")),
        };

        Ok(Line {
            line,
            span: start.merge(self.cursor.previous_span()),
            decl,
        })
    }

    fn require_column_zero(&self, indented: bool, what: &str) -> Result<(), Diagnostic> {
        if indented {
            Err(self.error(format!("{what} must start in column 0")))
        } else {
            Ok(())
        }
    }

    /// `Name:` / `Name: Parent` / `Name: Module::Parent`
    fn parse_node_header(&mut self) -> Result<Decl, Diagnostic> {
        let name = self.expect_const("node name")?;
        if !self.cursor.eat(&TokenKind::Colon) {
            return Err(self.expected("`:` after node name"));
        }
        let parent = if self.cursor.at_line_end() {
            None
        } else {
            Some(self.parse_node_path()?)
        };
        Ok(Decl::Node { name, parent })
    }

    pub(crate) fn parse_node_path(&mut self) -> Result<NodePath, Diagnostic> {
        let first = self.expect_const("node name")?;
        if self.cursor.eat(&TokenKind::DoubleColon) {
            let name = self.expect_const("node name after `::`")?;
            Ok(NodePath::qualified(first, name))
        } else {
            Ok(NodePath::local(first))
        }
    }

    /// `name = expr`, `name =? expr`, `name =?`, `name = ?`
    fn parse_member(&mut self) -> Result<Decl, Diagnostic> {
        let name = self.expect_ident("attribute name")?;
        if !self.cursor.eat(&TokenKind::Assign) {
            return Err(self.expected("`=`"));
        }
        if self.cursor.eat(&TokenKind::Question) {
            let default = if self.cursor.at_line_end() {
                None
            } else {
                Some(self.parse_expr()?)
            };
            return Ok(Decl::Param { name, default });
        }
        if self.cursor.at_line_end() {
            return Err(self.expected("an expression"));
        }
        let expr = self.parse_expr()?;
        Ok(Decl::Formula { name, expr })
    }

    pub(crate) fn expect_const(&mut self, what: &str) -> Result<String, Diagnostic> {
        match self.cursor.current_kind() {
            TokenKind::Const(name) => {
                let name = name.clone();
                self.cursor.advance();
                Ok(name)
            }
            _ => Err(self.expected(what)),
        }
    }

    pub(crate) fn expect_ident(&mut self, what: &str) -> Result<String, Diagnostic> {
        match self.cursor.current_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.cursor.advance();
                Ok(name)
            }
            _ => Err(self.expected(what)),
        }
    }
}
