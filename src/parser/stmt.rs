use super::common::{ParsResult, Parser};
use super::expr::starts_expression;
use crate::ast::*;
use crate::error::{Diagnostic, Title};
use crate::lexer::{KEYWORDS, TokenKind};
use crate::suggest::suggest;
use tracing::trace;

impl<'a> Parser<'a> {
    /// Parses statements until `Eof`, or until the closing `}` when `in_block`.
    /// Errors are recorded and parsing resumes at the next safe token.
    pub fn parse_statements(&mut self, in_block: bool) -> Vec<Stmt> {
        let mut statements = Vec::new();
        loop {
            match self.tokens.peek().kind {
                TokenKind::Eof => break,
                TokenKind::RBrace if in_block => break,
                _ => {}
            }
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(diag) => {
                    self.errors.push(diag);
                    self.recover(in_block);
                }
            }
        }
        statements
    }

    /// Panic-mode recovery: discard tokens up to the next statement boundary.
    fn recover(&mut self, in_block: bool) {
        let start = self.tokens.position();
        loop {
            match self.tokens.peek().kind {
                TokenKind::Eof | TokenKind::If | TokenKind::Comment => break,
                TokenKind::RBrace if in_block => break,
                TokenKind::NewLine => {
                    self.tokens.take();
                    break;
                }
                _ => {
                    self.tokens.take();
                }
            }
        }
        let stuck = self.tokens.position() == start
            && !self.check(TokenKind::Eof)
            && !(in_block && self.check(TokenKind::RBrace));
        if stuck {
            self.tokens.take();
        }
        trace!(skipped = self.tokens.position() - start, "recovered from parse error");
    }

    fn parse_statement(&mut self) -> ParsResult<Stmt> {
        let token = self.tokens.peek();
        match token.kind {
            TokenKind::Comment => {
                self.tokens.take();
                let text = self.text(token);
                self.expect_terminator("a comment")?;
                Ok(Stmt::new(StmtKind::Comment(text), token.span))
            }
            TokenKind::NewLine => {
                self.tokens.take();
                Ok(Stmt::new(StmtKind::NewLine, token.span))
            }
            TokenKind::Let => self.parse_assign(),
            TokenKind::If => self.parse_if(),
            _ => self.parse_expr_statement(),
        }
    }

    fn parse_assign(&mut self) -> ParsResult<Stmt> {
        let start = self.tokens.take().span;

        let name_token = self.tokens.peek();
        let identifier = match name_token.kind {
            TokenKind::Identifier => {
                self.tokens.take();
                Identifier {
                    name: self.text(name_token),
                    span: name_token.span,
                }
            }
            TokenKind::Invalid => return Err(self.invalid_token(name_token)),
            _ => {
                return self.error(
                    Title::InvalidStatement,
                    name_token.span,
                    format!("expected a name after 'let', found {}", self.describe(name_token)),
                );
            }
        };

        self.expect(
            TokenKind::Assign,
            Title::InvalidStatement,
            &format!("expected '=' after 'let {}'", identifier.name),
        )?;
        let value = self.parse_expr()?;
        let span = start.merge(value.span);
        self.expect_terminator("an assignment")?;

        Ok(Stmt::new(StmtKind::Assign { identifier, value }, span))
    }

    fn parse_if(&mut self) -> ParsResult<Stmt> {
        let start = self.tokens.take().span;
        let test = self.parse_expr()?;
        let body = self.parse_block()?;

        let mut else_ifs = Vec::new();
        let mut else_body = None;
        while self.match_kind(TokenKind::Else) {
            if self.match_kind(TokenKind::If) {
                let test = self.parse_expr()?;
                let body = self.parse_block()?;
                else_ifs.push(ElseIf { test, body });
            } else {
                else_body = Some(self.parse_block()?);
                break;
            }
        }

        let span = start.merge(self.tokens.previous_span());
        self.expect_terminator("'}'")?;

        Ok(Stmt::new(
            StmtKind::If(If {
                test,
                body,
                else_ifs,
                else_body,
            }),
            span,
        ))
    }

    fn parse_block(&mut self) -> ParsResult<Block> {
        let open = self.expect(
            TokenKind::LBrace,
            Title::InvalidBlock,
            "expected '{' to open a block",
        )?;
        self.expect(
            TokenKind::NewLine,
            Title::InvalidBlock,
            "expected a new line after '{'",
        )?;

        let statements = self.nested(Title::InvalidBlock, "block", |p| {
            Ok(p.parse_statements(true))
        })?;

        if !self.check(TokenKind::RBrace) {
            return self.error(Title::InvalidBlock, open.span, "this block is never closed");
        }
        let close = self.tokens.take();

        Ok(Block {
            statements,
            span: open.span.merge(close.span),
        })
    }

    fn parse_expr_statement(&mut self) -> ParsResult<Stmt> {
        let token = self.tokens.peek();
        if !starts_expression(token.kind) {
            return self.error(
                Title::UnknownToken,
                token.span,
                format!("{} is not a valid way to start a statement", self.describe(token)),
            );
        }
        if token.kind == TokenKind::Identifier && self.tokens.peek_next().kind == TokenKind::Assign {
            let name = self.text(token);
            return Err(Diagnostic::new(
                Title::InvalidStatement,
                token.span,
                format!("assignment to '{}' is missing 'let'", name),
            )
            .with_help(format!("write 'let {} = ...'", name)));
        }

        let expr = self.parse_expr()?;
        let span = expr.span;
        if let Err(diag) = self.expect_terminator("an expression") {
            return Err(match &expr.node {
                ExprKind::Identifier(name) => match keyword_suggestion(name) {
                    Some(keyword) => diag.with_help(format!("did you mean '{}'?", keyword)),
                    None => diag,
                },
                _ => diag,
            });
        }

        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }
}

fn keyword_suggestion(word: &str) -> Option<&'static str> {
    let keywords: Vec<&'static str> = KEYWORDS.iter().map(|(k, _)| *k).collect();
    suggest(word, &keywords)
}
