use crate::ast::{self, Call, ExprKind, Operator, StmtKind};
use crate::builtins;
use crate::error::{CompileError, Diagnostic, Title};
use crate::ir::{self, Expansion, Exec, Redirect, TestCommand};
use crate::span::Span;
use tracing::debug;

/// How an infix or group node is embedded in shell syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wrap {
    Test,
    Arithmetic,
    Bare,
}

/// Lowers a fixed source tree into the shell tree.
///
/// `arithmetic_depth` counts the infix/group nodes between the current node and the
/// nearest statement or test root, and `in_test` is set only while an `if` condition
/// is lowered. Together they decide whether an operation becomes `[ ]`, `$(( ))` or
/// stays bare inside an already wrapped parent.
#[derive(Debug, Default)]
pub struct Compiler {
    arithmetic_depth: usize,
    in_test: bool,
    in_arithmetic: bool,
    errors: Vec<Diagnostic>,
}

pub fn lower(script: &ast::Script) -> Result<ir::Script, CompileError> {
    Compiler::new().compile(script)
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowers every statement, then fails with all collected errors if there were any.
    pub fn compile(&mut self, script: &ast::Script) -> Result<ir::Script, CompileError> {
        let statements = self.lower_statements(&script.statements);
        debug!(
            statements = statements.len(),
            errors = self.errors.len(),
            "lowered script"
        );

        if !self.errors.is_empty() {
            return Err(CompileError::Lower(std::mem::take(&mut self.errors)));
        }
        Ok(ir::Script { statements })
    }

    fn error(&mut self, span: Span, msg: impl Into<String>) -> ir::Expr {
        self.errors.push(Diagnostic::new(Title::InvalidCall, span, msg));
        ir::Expr::StringLiteral(String::new())
    }

    fn lower_statements(&mut self, statements: &[ast::Stmt]) -> Vec<ir::Stmt> {
        statements.iter().map(|s| self.lower_statement(s)).collect()
    }

    fn lower_statement(&mut self, stmt: &ast::Stmt) -> ir::Stmt {
        match &stmt.node {
            StmtKind::Comment(text) => ir::Stmt::Comment(text.clone()),
            StmtKind::NewLine => ir::Stmt::NewLine,
            StmtKind::Assign { identifier, value } => ir::Stmt::Assign {
                identifier: identifier.name.to_ascii_uppercase(),
                value: self.lower_expr(value),
            },
            StmtKind::Expr(expr) => {
                if let ExprKind::Call(call) = &expr.node {
                    if builtins::is_expansion_builtin(&call.name) {
                        let msg = format!(
                            "{}() produces a value and cannot be used as a statement",
                            call.name
                        );
                        return ir::Stmt::Expr(self.error(expr.span, msg));
                    }
                }
                ir::Stmt::Expr(self.lower_expr(expr))
            }
            StmtKind::If(if_stmt) => ir::Stmt::If {
                test: self.lower_test(&if_stmt.test),
                body: self.lower_statements(&if_stmt.body.statements),
                else_ifs: if_stmt
                    .else_ifs
                    .iter()
                    .map(|else_if| ir::ElseIf {
                        test: self.lower_test(&else_if.test),
                        body: self.lower_statements(&else_if.body.statements),
                    })
                    .collect(),
                else_body: if_stmt
                    .else_body
                    .as_ref()
                    .map(|b| self.lower_statements(&b.statements)),
            },
        }
    }

    fn lower_test(&mut self, test: &ast::Expr) -> TestCommand {
        self.in_test = true;
        let lowered = self.lower_expr(test);
        self.in_test = false;

        match lowered {
            ir::Expr::Test(test) => test,
            other => TestCommand {
                inner: Box::new(other),
            },
        }
    }

    fn lower_expr(&mut self, expr: &ast::Expr) -> ir::Expr {
        match &expr.node {
            ExprKind::StringLiteral(text) => ir::Expr::StringLiteral(text.clone()),
            ExprKind::NumberLiteral(text) => ir::Expr::StringLiteral(text.clone()),
            ExprKind::PatternLiteral(text) => {
                ir::Expr::StringLiteral(text.trim_matches('\'').to_string())
            }
            ExprKind::AtomLiteral(text) => {
                ir::Expr::StringLiteral(format!("\"{}\"", text.trim_start_matches(':')))
            }
            ExprKind::Identifier(name) => ir::Expr::Identifier {
                name: name.to_ascii_uppercase(),
                quoted: self.in_test && !self.in_arithmetic,
            },
            ExprKind::Call(call) => self.lower_call(call, expr.span),
            ExprKind::NestedCall { call, .. } => {
                ir::Expr::CommandSub(Box::new(self.lower_call(call, expr.span)))
            }
            ExprKind::Infix {
                left,
                operator,
                right,
            } => self.lower_operation(operator.is_arithmetic(), |c| ir::Expr::Infix {
                left: Box::new(c.lower_expr(left)),
                operator: c.convert_operator(*operator),
                right: Box::new(c.lower_expr(right)),
            }),
            ExprKind::Group(inner) => self.lower_operation(is_arithmetic(inner), |c| {
                ir::Expr::Group(Box::new(c.lower_expr(inner)))
            }),
            ExprKind::Negate(inner) => match &inner.node {
                ExprKind::NumberLiteral(n) => ir::Expr::StringLiteral(format!("-{}", n)),
                _ => self.lower_operation(true, |c| ir::Expr::Infix {
                    left: Box::new(ir::Expr::StringLiteral("0".to_string())),
                    operator: "-".to_string(),
                    right: Box::new(c.lower_expr(inner)),
                }),
            },
        }
    }

    fn wrap_for(&self, arithmetic: bool) -> Wrap {
        if self.in_arithmetic {
            return Wrap::Bare;
        }
        match (self.in_test, self.arithmetic_depth) {
            (true, 0) => Wrap::Test,
            (false, 0) => Wrap::Arithmetic,
            (true, 1) if arithmetic => Wrap::Arithmetic,
            _ => Wrap::Bare,
        }
    }

    /// Lowers an infix or group node one level deeper and applies its wrapper.
    fn lower_operation(
        &mut self,
        arithmetic: bool,
        build: impl FnOnce(&mut Self) -> ir::Expr,
    ) -> ir::Expr {
        let wrap = self.wrap_for(arithmetic);
        let was_in_arithmetic = self.in_arithmetic;
        if wrap == Wrap::Arithmetic {
            self.in_arithmetic = true;
        }

        self.arithmetic_depth += 1;
        let inner = build(self);
        self.arithmetic_depth -= 1;
        self.in_arithmetic = was_in_arithmetic;

        match wrap {
            Wrap::Test => ir::Expr::Test(TestCommand {
                inner: Box::new(inner),
            }),
            Wrap::Arithmetic => ir::Expr::Arithmetic(Box::new(inner)),
            Wrap::Bare => inner,
        }
    }

    /// Test operators inside `[ ]`, C operators inside `$(( ))`.
    fn convert_operator(&self, operator: Operator) -> String {
        if self.in_arithmetic {
            return operator.as_str().to_string();
        }
        let op = match operator {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::Greater => "-gt",
            Operator::GreaterEqual => "-ge",
            Operator::Less => "-lt",
            Operator::LessEqual => "-le",
            other => other.as_str(),
        };
        op.to_string()
    }

    fn lower_call(&mut self, call: &Call, span: Span) -> ir::Expr {
        if builtins::is_expansion_builtin(&call.name) {
            return self.lower_expansion(call, span);
        }

        let arguments = self.lower_arguments(&call.arguments);
        match builtins::command_builtin(&call.name) {
            Some(builtin) => ir::Expr::Exec(Exec {
                command: builtin.command.to_string(),
                arguments,
                redirects: if builtin.to_stderr {
                    vec![Redirect::to_stderr()]
                } else {
                    Vec::new()
                },
            }),
            None => ir::Expr::Exec(Exec {
                command: call.name.clone(),
                arguments,
                redirects: Vec::new(),
            }),
        }
    }

    /// Command arguments are separate words, so each one starts a fresh context.
    fn lower_arguments(&mut self, arguments: &[ast::Expr]) -> Vec<ir::Expr> {
        let saved = (self.arithmetic_depth, self.in_test, self.in_arithmetic);
        (self.arithmetic_depth, self.in_test, self.in_arithmetic) = (0, false, false);
        let lowered = arguments.iter().map(|a| self.lower_expr(a)).collect();
        (self.arithmetic_depth, self.in_test, self.in_arithmetic) = saved;
        lowered
    }

    fn lower_expansion(&mut self, call: &Call, span: Span) -> ir::Expr {
        let name = call.name.as_str();
        let expected = builtins::arity(name).unwrap_or(0);
        if call.arguments.len() != expected {
            let plural = if expected == 1 { "" } else { "s" };
            return self.error(
                span,
                format!(
                    "{}() takes {} argument{}, found {}",
                    name,
                    expected,
                    plural,
                    call.arguments.len()
                ),
            );
        }

        let Some(target) = call.arguments.first() else {
            return self.error(span, format!("{}() cannot be lowered", name));
        };
        let ExprKind::Identifier(parameter) = &target.node else {
            return self.error(
                target.span,
                format!("the first argument of {}() must be a variable name", name),
            );
        };
        let parameter = parameter.to_ascii_uppercase();

        let mut words = Vec::with_capacity(expected.saturating_sub(1));
        for (position, arg) in call.arguments.iter().enumerate().skip(1) {
            let word = self.lower_expr(arg);
            if !is_word(&word) {
                return self.error(
                    arg.span,
                    format!(
                        "argument {} of {}() must be a literal or a command",
                        position + 1,
                        name
                    ),
                );
            }
            words.push(word);
        }
        let mut words = words.into_iter().map(Box::new);

        let expansion = match (name, words.next(), words.next()) {
            ("len", _, _) => Expansion::Length,
            ("replace", Some(find), Some(replace)) => Expansion::Replace {
                find_all: false,
                find,
                replace,
            },
            ("replace_all", Some(find), Some(replace)) => Expansion::Replace {
                find_all: true,
                find,
                replace,
            },
            ("remove_prefix", Some(pattern), _) => Expansion::RemoveFix {
                prefix: true,
                pattern,
            },
            ("remove_suffix", Some(pattern), _) => Expansion::RemoveFix {
                prefix: false,
                pattern,
            },
            _ => return self.error(span, format!("{}() cannot be lowered", name)),
        };

        ir::Expr::ParameterExpansion {
            parameter,
            expansion,
        }
    }
}

/// Arithmetic nodes get their own `$(( ))` when they sit directly under a test.
fn is_arithmetic(expr: &ast::Expr) -> bool {
    match &expr.node {
        ExprKind::Infix { operator, .. } => operator.is_arithmetic(),
        ExprKind::Group(inner) => is_arithmetic(inner),
        ExprKind::Negate(_) => true,
        _ => false,
    }
}

fn is_word(expr: &ir::Expr) -> bool {
    matches!(
        expr,
        ir::Expr::StringLiteral(_) | ir::Expr::CommandSub(_) | ir::Expr::ParameterExpansion { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixer::fix;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn lower_src(src: &str) -> Result<ir::Script, CompileError> {
        let (script, errors) = parse(src.as_bytes());
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        lower(&fix(script))
    }

    fn first(src: &str) -> ir::Stmt {
        match lower_src(src) {
            Ok(script) => script.statements.into_iter().next().expect("one statement"),
            Err(e) => panic!("lowering failed: {:?}", e.diagnostics()),
        }
    }

    fn ident(name: &str, quoted: bool) -> Box<ir::Expr> {
        Box::new(ir::Expr::Identifier {
            name: name.to_string(),
            quoted,
        })
    }

    fn lit(text: &str) -> Box<ir::Expr> {
        Box::new(ir::Expr::StringLiteral(text.to_string()))
    }

    #[test]
    fn comparison_in_if_becomes_a_test() {
        let ir::Stmt::If { test, .. } = first("if a > 10 {\n}\n") else {
            panic!("expected if");
        };
        assert_eq!(
            *test.inner,
            ir::Expr::Infix {
                left: ident("A", true),
                operator: "-gt".to_string(),
                right: lit("10"),
            }
        );
    }

    #[test]
    fn arithmetic_in_assignment_becomes_an_arithmetic_command() {
        let stmt = first("let x = a + 10\n");
        assert_eq!(
            stmt,
            ir::Stmt::Assign {
                identifier: "X".to_string(),
                value: ir::Expr::Arithmetic(Box::new(ir::Expr::Infix {
                    left: ident("A", false),
                    operator: "+".to_string(),
                    right: lit("10"),
                })),
            }
        );
    }

    #[test]
    fn nested_operations_are_bare() {
        let ir::Stmt::Assign { value, .. } = first("let x = (a + 1) * 2\n") else {
            panic!("expected assign");
        };
        let ir::Expr::Arithmetic(inner) = value else {
            panic!("outermost node is wrapped");
        };
        let ir::Expr::Infix { left, .. } = *inner else {
            panic!("expected infix");
        };
        assert!(matches!(*left, ir::Expr::Group(_)));
    }

    #[test]
    fn arithmetic_under_a_test_gets_its_own_wrapper() {
        let ir::Stmt::If { test, .. } = first("if a + 1 >= b {\n}\n") else {
            panic!("expected if");
        };
        let ir::Expr::Infix {
            left,
            operator,
            right,
        } = *test.inner
        else {
            panic!("expected infix");
        };
        assert_eq!(operator, "-ge");
        assert_eq!(
            *left,
            ir::Expr::Arithmetic(Box::new(ir::Expr::Infix {
                left: ident("A", false),
                operator: "+".to_string(),
                right: lit("1"),
            }))
        );
        assert_eq!(right, ident("B", true));
    }

    #[test]
    fn comparison_outside_a_test_keeps_c_operators() {
        let ir::Stmt::Assign { value, .. } = first("let same = a == b\n") else {
            panic!("expected assign");
        };
        let ir::Expr::Arithmetic(inner) = value else {
            panic!("expected arithmetic");
        };
        assert!(matches!(*inner, ir::Expr::Infix { ref operator, .. } if operator == "=="));
    }

    #[test]
    fn plain_if_condition_is_wrapped_in_a_test() {
        let ir::Stmt::If { test, .. } = first("if flag {\n}\n") else {
            panic!("expected if");
        };
        assert_eq!(test.inner, ident("FLAG", true));
    }

    #[test]
    fn literals() {
        let ir::Stmt::Expr(ir::Expr::Exec(exec)) = first("print(:ok, 'a*', -3, \"x\")\n") else {
            panic!("expected exec");
        };
        assert_eq!(exec.command, "echo");
        assert_eq!(exec.redirects, vec![Redirect::to_stderr()]);
        assert_eq!(
            exec.arguments,
            vec![
                ir::Expr::StringLiteral("\"ok\"".into()),
                ir::Expr::StringLiteral("a*".into()),
                ir::Expr::StringLiteral("-3".into()),
                ir::Expr::StringLiteral("\"x\"".into()),
            ]
        );
    }

    #[test]
    fn negated_name_subtracts_from_zero() {
        let ir::Stmt::Assign { value, .. } = first("let n = -a\n") else {
            panic!("expected assign");
        };
        assert_eq!(
            value,
            ir::Expr::Arithmetic(Box::new(ir::Expr::Infix {
                left: lit("0"),
                operator: "-".to_string(),
                right: ident("A", false),
            }))
        );
    }

    #[test]
    fn string_builtins_become_parameter_expansions() {
        let ir::Stmt::Assign { value, .. } = first("let n = len(my_var)\n") else {
            panic!("expected assign");
        };
        assert_eq!(
            value,
            ir::Expr::ParameterExpansion {
                parameter: "MY_VAR".to_string(),
                expansion: Expansion::Length,
            }
        );

        let ir::Stmt::Assign { value, .. } = first("let b = remove_prefix(path, 'ab*')\n") else {
            panic!("expected assign");
        };
        assert_eq!(
            value,
            ir::Expr::ParameterExpansion {
                parameter: "PATH".to_string(),
                expansion: Expansion::RemoveFix {
                    prefix: true,
                    pattern: lit("ab*"),
                },
            }
        );
    }

    #[test]
    fn external_command_in_value_position_is_substituted() {
        let ir::Stmt::Assign { value, .. } = first("let now = date(\"+%s\")\n") else {
            panic!("expected assign");
        };
        assert_eq!(
            value,
            ir::Expr::CommandSub(Box::new(ir::Expr::Exec(Exec {
                command: "date".to_string(),
                arguments: vec![ir::Expr::StringLiteral("\"+%s\"".into())],
                redirects: Vec::new(),
            })))
        );
    }

    #[test]
    fn call_arguments_start_a_fresh_context() {
        let ir::Stmt::If { test, .. } = first("if f(b + 1) == 2 {\n}\n") else {
            panic!("expected if");
        };
        let ir::Expr::Infix { left, .. } = *test.inner else {
            panic!("expected infix");
        };
        let ir::Expr::CommandSub(exec) = *left else {
            panic!("expected command substitution");
        };
        let ir::Expr::Exec(exec) = *exec else {
            panic!("expected exec");
        };
        assert_eq!(
            exec.arguments,
            vec![ir::Expr::Arithmetic(Box::new(ir::Expr::Infix {
                left: ident("B", false),
                operator: "+".to_string(),
                right: lit("1"),
            }))]
        );
    }

    #[test]
    fn else_if_chain_is_kept_flat() {
        let ir::Stmt::If {
            else_ifs,
            else_body,
            ..
        } = first("if a == 1 {\n} else if a == 2 {\n} else {\n  print(a)\n}\n")
        else {
            panic!("expected if");
        };
        assert_eq!(else_ifs.len(), 1);
        assert_eq!(else_body.map(|b| b.len()), Some(1));
    }

    #[test]
    fn all_builtin_errors_are_collected() {
        let err = lower_src("let a = len()\nlet b = replace(x, 1)\nlen(x)\n")
            .expect_err("lowering should fail");
        let messages: Vec<_> = err.diagnostics().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "len() takes 1 argument, found 0",
                "replace() takes 3 arguments, found 2",
                "len() produces a value and cannot be used as a statement",
            ]
        );
        assert!(err.diagnostics().iter().all(|d| d.title == Title::InvalidCall));
    }
}
