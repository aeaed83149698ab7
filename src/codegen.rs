use crate::ir::{Expansion, Exec, Expr, Script, Stmt, TestCommand};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct CodegenOptions {
    /// Spaces per nesting level.
    pub indent_width: usize,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}

const SHEBANG: &str = "#!/bin/sh";

/// Where an expression is rendered. Only `[ ]` changes how groups are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Word,
    Test,
}

pub fn emit(script: &Script) -> String {
    emit_with_options(script, &CodegenOptions::default())
}

pub fn emit_with_options(script: &Script, opts: &CodegenOptions) -> String {
    let mut out = String::new();
    out.push_str(SHEBANG);
    out.push_str("\n\n");

    for stmt in &script.statements {
        emit_stmt(stmt, &mut out, 0, opts);
    }

    debug!(bytes = out.len(), "generated shell script");
    out
}

fn pad(depth: usize, opts: &CodegenOptions) -> String {
    " ".repeat(depth * opts.indent_width)
}

fn emit_line(out: &mut String, depth: usize, opts: &CodegenOptions, line: &str) {
    out.push_str(&pad(depth, opts));
    out.push_str(line);
    out.push('\n');
}

fn emit_stmt(stmt: &Stmt, out: &mut String, depth: usize, opts: &CodegenOptions) {
    match stmt {
        Stmt::Comment(text) => emit_line(out, depth, opts, text),
        // No indentation, so blank lines carry no trailing whitespace.
        Stmt::NewLine => out.push('\n'),
        Stmt::Assign { identifier, value } => {
            let line = format!("{}={}", identifier, emit_expr(value, Context::Word));
            emit_line(out, depth, opts, &line);
        }
        Stmt::Expr(expr) => emit_line(out, depth, opts, &emit_expr(expr, Context::Word)),
        Stmt::If {
            test,
            body,
            else_ifs,
            else_body,
        } => {
            emit_line(out, depth, opts, &format!("if {}; then", emit_test(test)));
            emit_body(body, out, depth + 1, opts);

            for else_if in else_ifs {
                let line = format!("elif {}; then", emit_test(&else_if.test));
                emit_line(out, depth, opts, &line);
                emit_body(&else_if.body, out, depth + 1, opts);
            }

            if let Some(else_body) = else_body {
                emit_line(out, depth, opts, "else");
                emit_body(else_body, out, depth + 1, opts);
            }

            emit_line(out, depth, opts, "fi");
        }
    }
}

/// Emits a `then`/`else` body. The shell rejects bodies without a command, so those get
/// the `:` no-op.
fn emit_body(stmts: &[Stmt], out: &mut String, depth: usize, opts: &CodegenOptions) {
    for stmt in stmts {
        emit_stmt(stmt, out, depth, opts);
    }
    let has_command = stmts
        .iter()
        .any(|s| !matches!(s, Stmt::Comment(_) | Stmt::NewLine));
    if !has_command {
        emit_line(out, depth, opts, ":");
    }
}

fn emit_test(test: &TestCommand) -> String {
    format!("[ {} ]", emit_expr(&test.inner, Context::Test))
}

// Anything the shell would split, quote, expand or glob in an unquoted word.
const SHELL_SPECIAL: &[char] = &[
    '(', ')', ';', '&', '|', '<', '>', '\'', '"', '\\', '`', '$', '*', '?', '[', ']', '#',
    '~', '{', '}',
];

/// Double quotes can be dropped when the shell would read the same single word.
fn needs_quotes(inner: &str) -> bool {
    inner.is_empty()
        || inner
            .chars()
            .any(|c| c.is_whitespace() || SHELL_SPECIAL.contains(&c))
}

fn emit_string(value: &str) -> String {
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'));
    match inner {
        Some(inner) if !needs_quotes(inner) => inner.to_string(),
        _ => value.to_string(),
    }
}

fn emit_exec(exec: &Exec) -> String {
    let mut line = exec.command.clone();
    for arg in &exec.arguments {
        line.push(' ');
        line.push_str(&emit_expr(arg, Context::Word));
    }
    for redirect in &exec.redirects {
        line.push(' ');
        line.push_str(&redirect.render());
    }
    line
}

fn emit_expr(expr: &Expr, ctx: Context) -> String {
    match expr {
        Expr::StringLiteral(value) => emit_string(value),
        Expr::Identifier { name, quoted: true } => format!("\"${}\"", name),
        Expr::Identifier { name, quoted: false } => format!("${}", name),
        Expr::Exec(exec) => emit_exec(exec),
        Expr::Infix {
            left,
            operator,
            right,
        } => format!(
            "{} {} {}",
            emit_expr(left, ctx),
            operator,
            emit_expr(right, ctx)
        ),
        Expr::Group(inner) => match ctx {
            Context::Test => format!("\\( {} \\)", emit_expr(inner, ctx)),
            Context::Word => format!("( {} )", emit_expr(inner, ctx)),
        },
        Expr::Arithmetic(inner) => format!("$(( {} ))", emit_expr(inner, Context::Word)),
        Expr::Test(test) => emit_test(test),
        Expr::CommandSub(inner) => format!("$({})", emit_expr(inner, Context::Word)),
        Expr::ParameterExpansion {
            parameter,
            expansion,
        } => match expansion {
            Expansion::Length => format!("${{#{}}}", parameter),
            Expansion::Replace {
                find_all,
                find,
                replace,
            } => format!(
                "${{{}{}{}/{}}}",
                parameter,
                if *find_all { "//" } else { "/" },
                emit_expr(find, Context::Word),
                emit_expr(replace, Context::Word)
            ),
            Expansion::RemoveFix { prefix, pattern } => format!(
                "${{{}{}{}}}",
                parameter,
                if *prefix { "##" } else { "%%" },
                emit_expr(pattern, Context::Word)
            ),
        },
    }
}
