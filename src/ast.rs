use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

pub type Expr = Spanned<ExprKind>;
pub type Stmt = Spanned<StmtKind>;

/// Root of a parsed yok file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Full comment text, including the leading `#`.
    Comment(String),
    NewLine,
    Assign {
        identifier: Identifier,
        value: Expr,
    },
    Expr(Expr),
    If(If),
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub test: Expr,
    pub body: Block,
    pub else_ifs: Vec<ElseIf>,
    pub else_body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseIf {
    pub test: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Operator::Add
                | Operator::Subtract
                | Operator::Multiply
                | Operator::Divide
                | Operator::Modulo
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub name_span: Span,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Raw literal text, quotes included.
    StringLiteral(String),
    /// Raw literal text, single quotes included.
    PatternLiteral(String),
    /// Raw atom text, leading `:` included.
    AtomLiteral(String),
    NumberLiteral(String),
    Identifier(String),
    Call(Call),
    Infix {
        left: Box<Expr>,
        operator: Operator,
        right: Box<Expr>,
    },
    /// Unary minus.
    Negate(Box<Expr>),
    Group(Box<Expr>),
    /// Produced only by the fixer: a call that must render as a command substitution.
    NestedCall {
        depth: usize,
        call: Call,
    },
}

impl ExprKind {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            ExprKind::StringLiteral(_)
                | ExprKind::PatternLiteral(_)
                | ExprKind::AtomLiteral(_)
                | ExprKind::NumberLiteral(_)
        )
    }
}

impl Script {
    /// Resets every span to the default so trees parsed from differently laid out
    /// sources can be compared structurally.
    pub fn strip_spans(&mut self) {
        strip_statements(&mut self.statements);
    }
}

fn strip_statements(statements: &mut [Stmt]) {
    for stmt in statements {
        stmt.span = Span::default();
        match &mut stmt.node {
            StmtKind::Comment(_) | StmtKind::NewLine => {}
            StmtKind::Assign { identifier, value } => {
                identifier.span = Span::default();
                strip_expr(value);
            }
            StmtKind::Expr(expr) => strip_expr(expr),
            StmtKind::If(if_stmt) => {
                strip_expr(&mut if_stmt.test);
                strip_block(&mut if_stmt.body);
                for else_if in &mut if_stmt.else_ifs {
                    strip_expr(&mut else_if.test);
                    strip_block(&mut else_if.body);
                }
                if let Some(body) = &mut if_stmt.else_body {
                    strip_block(body);
                }
            }
        }
    }
}

fn strip_block(block: &mut Block) {
    block.span = Span::default();
    strip_statements(&mut block.statements);
}

fn strip_call(call: &mut Call) {
    call.name_span = Span::default();
    for arg in &mut call.arguments {
        strip_expr(arg);
    }
}

fn strip_expr(expr: &mut Expr) {
    expr.span = Span::default();
    match &mut expr.node {
        ExprKind::StringLiteral(_)
        | ExprKind::PatternLiteral(_)
        | ExprKind::AtomLiteral(_)
        | ExprKind::NumberLiteral(_)
        | ExprKind::Identifier(_) => {}
        ExprKind::Call(call) | ExprKind::NestedCall { call, .. } => strip_call(call),
        ExprKind::Infix { left, right, .. } => {
            strip_expr(left);
            strip_expr(right);
        }
        ExprKind::Negate(inner) | ExprKind::Group(inner) => strip_expr(inner),
    }
}
