//! Desugaring pass run between parsing and lowering.
//!
//! Shell has no nested calls and `${VAR...}` only accepts a variable name, so the
//! fixer hoists anything that cannot be written inline into a `_TMP<N>` assignment
//! placed right before the statement that uses it, and marks calls in value
//! position as `NestedCall` so they render as command substitutions.

use crate::ast::*;
use crate::builtins;
use crate::span::Span;
use tracing::{debug, trace};

/// Prefix of synthesized variables. User names must start with a letter, so these
/// never collide.
pub const TEMP_PREFIX: &str = "_TMP";

#[derive(Debug, Default)]
pub struct Fixer {
    counter: usize,
}

pub fn fix(script: Script) -> Script {
    Fixer::default().fix(script)
}

impl Fixer {
    pub fn fix(&mut self, script: Script) -> Script {
        let statements = self.fix_statements(script.statements);
        debug!(temporaries = self.counter, "fixed script");
        Script { statements }
    }

    fn fix_statements(&mut self, statements: Vec<Stmt>) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(statements.len());
        for stmt in statements {
            self.fix_statement(stmt, &mut out);
        }
        out
    }

    /// Pushes any hoisted assignments followed by the rewritten statement.
    fn fix_statement(&mut self, stmt: Stmt, out: &mut Vec<Stmt>) {
        let span = stmt.span;
        let node = match stmt.node {
            StmtKind::Assign { identifier, value } => {
                let value = self.fix_expr(value, 1, out);
                StmtKind::Assign { identifier, value }
            }
            StmtKind::Expr(expr) => StmtKind::Expr(self.fix_expr(expr, 0, out)),
            StmtKind::If(if_stmt) => {
                let test = self.fix_expr(if_stmt.test, 1, out);
                let body = self.fix_block(if_stmt.body);
                let else_ifs = if_stmt
                    .else_ifs
                    .into_iter()
                    .map(|else_if| ElseIf {
                        test: self.fix_expr(else_if.test, 1, out),
                        body: self.fix_block(else_if.body),
                    })
                    .collect();
                let else_body = if_stmt.else_body.map(|b| self.fix_block(b));
                StmtKind::If(If {
                    test,
                    body,
                    else_ifs,
                    else_body,
                })
            }
            other @ (StmtKind::Comment(_) | StmtKind::NewLine) => other,
        };
        out.push(Stmt::new(node, span));
    }

    fn fix_block(&mut self, block: Block) -> Block {
        Block {
            statements: self.fix_statements(block.statements),
            span: block.span,
        }
    }

    fn fix_expr(&mut self, expr: Expr, depth: usize, prefix: &mut Vec<Stmt>) -> Expr {
        let span = expr.span;
        let node = match expr.node {
            ExprKind::Call(call) => return self.fix_call(call, span, depth, prefix),
            ExprKind::Infix {
                left,
                operator,
                right,
            } => ExprKind::Infix {
                left: Box::new(self.fix_expr(*left, depth + 1, prefix)),
                operator,
                right: Box::new(self.fix_expr(*right, depth + 1, prefix)),
            },
            ExprKind::Group(inner) => {
                ExprKind::Group(Box::new(self.fix_expr(*inner, depth + 1, prefix)))
            }
            ExprKind::Negate(inner) => {
                ExprKind::Negate(Box::new(self.fix_expr(*inner, depth + 1, prefix)))
            }
            other => other,
        };
        Expr::new(node, span)
    }

    fn fix_call(&mut self, mut call: Call, span: Span, depth: usize, prefix: &mut Vec<Stmt>) -> Expr {
        if builtins::is_expansion_builtin(&call.name) {
            // Wrong arity is left for the compiler to report.
            if builtins::arity(&call.name) != Some(call.arguments.len()) {
                return Expr::new(ExprKind::Call(call), span);
            }
            let mut args = std::mem::take(&mut call.arguments).into_iter();
            if let Some(target) = args.next() {
                call.arguments.push(self.simplify_to_ident(target, depth + 1, prefix));
            }
            for arg in args {
                let arg = if builtins::takes_word_arguments(&call.name) {
                    self.simplify_to_word(arg, depth + 1, prefix)
                } else {
                    self.fix_expr(arg, depth + 1, prefix)
                };
                call.arguments.push(arg);
            }
            return Expr::new(ExprKind::Call(call), span);
        }

        call.arguments = std::mem::take(&mut call.arguments)
            .into_iter()
            .map(|arg| self.fix_expr(arg, depth + 1, prefix))
            .collect();

        if depth == 0 {
            Expr::new(ExprKind::Call(call), span)
        } else {
            Expr::new(ExprKind::NestedCall { depth, call }, span)
        }
    }

    fn next_temp(&mut self) -> String {
        self.counter += 1;
        format!("{}{}", TEMP_PREFIX, self.counter)
    }

    /// Hoists `expr` into a fresh temporary unless it already is a plain name.
    fn hoist(&mut self, expr: Expr, depth: usize, prefix: &mut Vec<Stmt>) -> Expr {
        let span = expr.span;
        let value = self.fix_expr(expr, depth, prefix);
        let name = self.next_temp();
        trace!(temp = %name, "hoisted expression into temporary");

        prefix.push(Stmt::new(
            StmtKind::Assign {
                identifier: Identifier {
                    name: name.clone(),
                    span,
                },
                value,
            },
            span,
        ));
        Expr::new(ExprKind::Identifier(name), span)
    }

    fn simplify_to_ident(&mut self, expr: Expr, depth: usize, prefix: &mut Vec<Stmt>) -> Expr {
        if matches!(expr.node, ExprKind::Identifier(_)) {
            return expr;
        }
        self.hoist(expr, depth, prefix)
    }

    /// Reduces `expr` to a literal or a command substitution.
    fn simplify_to_word(&mut self, expr: Expr, depth: usize, prefix: &mut Vec<Stmt>) -> Expr {
        if expr.node.is_literal() || matches!(expr.node, ExprKind::NestedCall { .. }) {
            return expr;
        }
        if matches!(expr.node, ExprKind::Call(_)) {
            return self.fix_expr(expr, depth, prefix);
        }

        let span = expr.span;

        let ident = self.simplify_to_ident(expr, depth, prefix);
        let echo = Call {
            name: "echo".to_string(),
            name_span: span,
            arguments: vec![
                Expr::new(ExprKind::StringLiteral("\"-n\"".to_string()), span),
                ident,
            ],
        };
        Expr::new(ExprKind::NestedCall { depth, call: echo }, span)
    }
}
