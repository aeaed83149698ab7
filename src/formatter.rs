use crate::ast::*;

const INDENT: &str = "    ";

/// Renders a parsed script in canonical layout. Comments and blank lines are kept,
/// everything else is re-spaced.
pub fn format_script(script: &Script) -> String {
    let mut out = String::new();
    format_block(&script.statements, 0, &mut out);
    out
}

fn indent_str(depth: usize) -> String {
    INDENT.repeat(depth)
}

fn format_block(stmts: &[Stmt], depth: usize, out: &mut String) {
    for stmt in stmts {
        format_stmt(stmt, depth, out);
    }
}

fn format_stmt(stmt: &Stmt, depth: usize, out: &mut String) {
    let indent = indent_str(depth);
    match &stmt.node {
        StmtKind::NewLine => out.push('\n'),
        StmtKind::Comment(text) => {
            out.push_str(&indent);
            out.push_str(text.trim_end());
            out.push('\n');
        }
        StmtKind::Assign { identifier, value } => {
            out.push_str(&format!("{}let {} = {}\n", indent, identifier.name, format_expr(value)));
        }
        StmtKind::Expr(expr) => {
            out.push_str(&format!("{}{}\n", indent, format_expr(expr)));
        }
        StmtKind::If(if_stmt) => {
            out.push_str(&format!("{}if {} {{\n", indent, format_expr(&if_stmt.test)));
            format_block(&if_stmt.body.statements, depth + 1, out);
            for else_if in &if_stmt.else_ifs {
                out.push_str(&format!("{}}} else if {} {{\n", indent, format_expr(&else_if.test)));
                format_block(&else_if.body.statements, depth + 1, out);
            }
            if let Some(else_body) = &if_stmt.else_body {
                out.push_str(&format!("{}}} else {{\n", indent));
                format_block(&else_body.statements, depth + 1, out);
            }
            out.push_str(&format!("{}}}\n", indent));
        }
    }
}

fn format_call(call: &Call) -> String {
    let args: Vec<String> = call.arguments.iter().map(format_expr).collect();
    format!("{}({})", call.name, args.join(", "))
}

pub fn format_expr(expr: &Expr) -> String {
    match &expr.node {
        ExprKind::StringLiteral(s)
        | ExprKind::PatternLiteral(s)
        | ExprKind::AtomLiteral(s)
        | ExprKind::NumberLiteral(s)
        | ExprKind::Identifier(s) => s.clone(),
        ExprKind::Call(call) | ExprKind::NestedCall { call, .. } => format_call(call),
        ExprKind::Infix {
            left,
            operator,
            right,
        } => format!("{} {} {}", format_expr(left), operator.as_str(), format_expr(right)),
        ExprKind::Negate(inner) => format!("-{}", format_expr(inner)),
        ExprKind::Group(inner) => format!("({})", format_expr(inner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn fmt(src: &str) -> String {
        let (script, errors) = parse(src.as_bytes());
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        format_script(&script)
    }

    #[test]
    fn respaces_expressions() {
        assert_eq!(fmt("let   x=a+(b*2)\nprint( x ,:ok )"), "let x = a + (b * 2)\nprint(x, :ok)\n");
    }

    #[test]
    fn indents_blocks_and_keeps_comments() {
        let src = "# top\nif a==1 {\n# inner\n  print(1)\n\n} else if a == 2 {\n} else {\n        print(3)\n}\n";
        let want = "# top\nif a == 1 {\n    # inner\n    print(1)\n\n} else if a == 2 {\n} else {\n    print(3)\n}\n";
        assert_eq!(fmt(src), want);
    }

    #[test]
    fn collapses_multiline_calls() {
        assert_eq!(fmt("replace(\n  s,\n  \"a\",\n  \"b\",\n)\n"), "replace(s, \"a\", \"b\")\n");
    }

    #[test]
    fn formatting_is_idempotent() {
        let once = fmt("let  n=-a*(b-1)\nif n>=2{\n print(len(s))\n}\n");
        assert_eq!(fmt(&once), once);
    }
}
