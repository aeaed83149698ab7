use super::common::{ParsResult, Parser};
use crate::ast::*;
use crate::error::{Diagnostic, Title};
use crate::lexer::TokenKind;

/// Binding power, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equality,
    Relational,
    Additive,
    Multiplicative,
    Prefix,
    Call,
}

fn precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Equal | TokenKind::NotEqual => Precedence::Equality,
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
            Precedence::Relational
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Additive,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Multiplicative,
        TokenKind::LParen => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

fn infix_operator(kind: TokenKind) -> Option<Operator> {
    let op = match kind {
        TokenKind::Equal => Operator::Equal,
        TokenKind::NotEqual => Operator::NotEqual,
        TokenKind::Less => Operator::Less,
        TokenKind::LessEqual => Operator::LessEqual,
        TokenKind::Greater => Operator::Greater,
        TokenKind::GreaterEqual => Operator::GreaterEqual,
        TokenKind::Plus => Operator::Add,
        TokenKind::Minus => Operator::Subtract,
        TokenKind::Star => Operator::Multiply,
        TokenKind::Slash => Operator::Divide,
        TokenKind::Percent => Operator::Modulo,
        _ => return None,
    };
    Some(op)
}

/// True for tokens with a prefix handler. `Invalid` counts so the parser can explain it.
pub(super) fn starts_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::StringLiteral
            | TokenKind::PatternLiteral
            | TokenKind::Atom
            | TokenKind::Minus
            | TokenKind::LParen
            | TokenKind::Invalid
    )
}

impl<'a> Parser<'a> {
    pub fn parse_expr(&mut self) -> ParsResult<Expr> {
        self.parse_expr_with(Precedence::Lowest)
    }

    fn parse_expr_with(&mut self, min: Precedence) -> ParsResult<Expr> {
        self.nested(Title::InvalidExpression, "expression", |p| p.parse_expr_at(min))
    }

    fn parse_expr_at(&mut self, min: Precedence) -> ParsResult<Expr> {
        let mut left = self.parse_prefix()?;

        loop {
            let kind = self.tokens.peek().kind;
            let prec = precedence(kind);
            if prec <= min {
                break;
            }
            left = match kind {
                TokenKind::LParen => self.parse_call(left)?,
                _ => self.parse_infix(left, prec)?,
            };
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParsResult<Expr> {
        let token = self.tokens.peek();
        let node = match token.kind {
            TokenKind::Identifier => ExprKind::Identifier(self.text(token)),
            TokenKind::Number => ExprKind::NumberLiteral(self.text(token)),
            TokenKind::StringLiteral => ExprKind::StringLiteral(self.text(token)),
            TokenKind::PatternLiteral => ExprKind::PatternLiteral(self.text(token)),
            TokenKind::Atom => ExprKind::AtomLiteral(self.text(token)),
            TokenKind::Minus => {
                self.tokens.take();
                let inner = self.parse_expr_with(Precedence::Prefix)?;
                let span = token.span.merge(inner.span);
                return Ok(Expr::new(ExprKind::Negate(Box::new(inner)), span));
            }
            TokenKind::LParen => return self.parse_group(),
            TokenKind::Invalid => return Err(self.invalid_token(token)),
            _ => {
                return self.error(
                    Title::InvalidExpression,
                    token.span,
                    format!("expected an expression, found {}", self.describe(token)),
                );
            }
        };
        self.tokens.take();
        Ok(Expr::new(node, token.span))
    }

    fn parse_group(&mut self) -> ParsResult<Expr> {
        let open = self.tokens.take();
        let inner = self.parse_expr()?;
        let close = self.expect(
            TokenKind::RParen,
            Title::InvalidExpression,
            "expected ')' to close the group",
        )?;
        Ok(Expr::new(
            ExprKind::Group(Box::new(inner)),
            open.span.merge(close.span),
        ))
    }

    fn parse_infix(&mut self, left: Expr, prec: Precedence) -> ParsResult<Expr> {
        let op_token = self.tokens.take();
        let Some(operator) = infix_operator(op_token.kind) else {
            return self.error(
                Title::InvalidExpression,
                op_token.span,
                format!("{} is not an operator", self.describe(op_token)),
            );
        };
        // Equal precedence on the right makes every operator left-associative.
        let right = self.parse_expr_with(prec)?;
        let span = left.span.merge(right.span);
        Ok(Expr::new(
            ExprKind::Infix {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            },
            span,
        ))
    }

    fn parse_call(&mut self, callee: Expr) -> ParsResult<Expr> {
        let ExprKind::Identifier(name) = callee.node else {
            return self.error(
                Title::InvalidExpression,
                self.tokens.peek().span,
                "only a name can be called",
            );
        };
        self.tokens.take();
        let mut arguments = Vec::new();

        self.skip_newlines();
        if !self.match_kind(TokenKind::RParen) {
            loop {
                arguments.push(self.parse_expr()?);
                self.skip_newlines();
                if self.match_kind(TokenKind::RParen) {
                    break;
                }
                if self.match_kind(TokenKind::Comma) {
                    self.skip_newlines();
                    // trailing comma
                    if self.match_kind(TokenKind::RParen) {
                        break;
                    }
                    continue;
                }
                let found = self.tokens.peek();
                let msg = if found.kind == TokenKind::Eof {
                    format!("missing ')' to close the call to '{}'", name)
                } else {
                    format!(
                        "expected ',' or ')' in the call to '{}', found {}",
                        name,
                        self.describe(found)
                    )
                };
                return Err(Diagnostic::new(Title::InvalidExpression, found.span, msg));
            }
        }

        let span = callee.span.merge(self.tokens.previous_span());
        Ok(Expr::new(
            ExprKind::Call(Call {
                name,
                name_span: callee.span,
                arguments,
            }),
            span,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::error::Title;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn expr(src: &str) -> Expr {
        let (script, errors) = parse(src.as_bytes());
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        match script.statements.into_iter().next().map(|s| s.node) {
            Some(StmtKind::Expr(e)) => e,
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    /// Fully parenthesized rendering so precedence is visible.
    fn shape(e: &Expr) -> String {
        match &e.node {
            ExprKind::Identifier(s)
            | ExprKind::NumberLiteral(s)
            | ExprKind::StringLiteral(s)
            | ExprKind::PatternLiteral(s)
            | ExprKind::AtomLiteral(s) => s.clone(),
            ExprKind::Infix {
                left,
                operator,
                right,
            } => format!("({} {} {})", shape(left), operator.as_str(), shape(right)),
            ExprKind::Negate(inner) => format!("(-{})", shape(inner)),
            ExprKind::Group(inner) => format!("[{}]", shape(inner)),
            ExprKind::Call(call) | ExprKind::NestedCall { call, .. } => format!(
                "{}({})",
                call.name,
                call.arguments.iter().map(shape).collect::<Vec<_>>().join(", ")
            ),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(shape(&expr("a + b * 2")), "(a + (b * 2))");
        assert_eq!(shape(&expr("a * b + 2")), "((a * b) + 2)");
    }

    #[test]
    fn comparison_is_weakest() {
        assert_eq!(shape(&expr("a + 1 == b - 2")), "((a + 1) == (b - 2))");
        assert_eq!(shape(&expr("a < b == c")), "((a < b) == c)");
    }

    #[test]
    fn operators_are_left_associative() {
        assert_eq!(shape(&expr("a - b - c")), "((a - b) - c)");
        assert_eq!(shape(&expr("a / b % c")), "((a / b) % c)");
    }

    #[test]
    fn prefix_minus_and_groups() {
        assert_eq!(shape(&expr("-a * 2")), "((-a) * 2)");
        assert_eq!(shape(&expr("(a + 1) * 2")), "([(a + 1)] * 2)");
    }

    #[test]
    fn calls_bind_tightest() {
        assert_eq!(shape(&expr("len(x) + 1")), "(len(x) + 1)");
        assert_eq!(shape(&expr("-f(x)")), "(-f(x))");
    }

    #[test]
    fn call_arguments_allow_new_lines_and_trailing_comma() {
        let e = expr("replace(\n  name,\n  'a',\n  \"b\",\n)");
        assert_eq!(shape(&e), "replace(name, 'a', \"b\")");
    }

    #[test]
    fn empty_call() {
        assert_eq!(shape(&expr("ls()")), "ls()");
    }

    #[test]
    fn spans_cover_the_whole_expression() {
        let e = expr("print(:a, 1)");
        assert_eq!((e.span.start, e.span.end), (0, 12));
        let ExprKind::Call(call) = e.node else {
            panic!("expected call");
        };
        assert_eq!((call.name_span.start, call.name_span.end), (0, 5));
    }

    #[test]
    fn missing_close_paren_is_reported() {
        let (_, errors) = parse(b"print(1, 2");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("missing ')'"), "{}", errors[0].message);
    }

    #[test]
    fn only_names_can_be_called() {
        let (_, errors) = parse(b"\"a\"(1)\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "only a name can be called");
    }

    #[test]
    fn deep_nesting_is_reported_not_overflowed() {
        let src = format!(
            "let a = {}1{}\nlet b = {}1\nprint(a)\n",
            "(".repeat(10_000),
            ")".repeat(10_000),
            "-".repeat(10_000)
        );
        let (script, errors) = parse(src.as_bytes());
        assert_eq!(errors.len(), 2, "{:?}", errors);
        for error in &errors {
            assert_eq!(error.title, Title::InvalidExpression);
            assert_eq!(error.message, "expression nested too deeply");
        }
        // recovery resumes on the next line
        assert_eq!(script.statements.len(), 1);
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let src = format!("{}a{}", "(".repeat(100), ")".repeat(100));
        let mut e = expr(&src);
        let mut depth = 0;
        while let ExprKind::Group(inner) = e.node {
            e = *inner;
            depth += 1;
        }
        assert_eq!(depth, 100);
        assert_eq!(shape(&e), "a");
    }
}
