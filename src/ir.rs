//! Shell-level tree produced by lowering and consumed by codegen.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Comment(String),
    NewLine,
    Assign { identifier: String, value: Expr },
    Expr(Expr),
    If {
        test: TestCommand,
        body: Vec<Stmt>,
        else_ifs: Vec<ElseIf>,
        else_body: Option<Vec<Stmt>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseIf {
    pub test: TestCommand,
    pub body: Vec<Stmt>,
}

/// `[ inner ]`
#[derive(Debug, Clone, PartialEq)]
pub struct TestCommand {
    pub inner: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exec {
    pub command: String,
    pub arguments: Vec<Expr>,
    pub redirects: Vec<Redirect>,
}

/// `[left_fd]>&right_fd`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub left_fd: Option<u32>,
    pub right_fd: u32,
}

impl Redirect {
    pub fn to_stderr() -> Self {
        Redirect {
            left_fd: None,
            right_fd: 2,
        }
    }

    pub fn render(&self) -> String {
        match self.left_fd {
            Some(fd) => format!("{}>&{}", fd, self.right_fd),
            None => format!(">&{}", self.right_fd),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    /// `${#VAR}`
    Length,
    /// `${VAR/find/replace}`, or `${VAR//find/replace}` with `find_all`
    Replace {
        find_all: bool,
        find: Box<Expr>,
        replace: Box<Expr>,
    },
    /// `${VAR##pattern}` or `${VAR%%pattern}`
    RemoveFix { prefix: bool, pattern: Box<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Rendered verbatim, except that surrounding double quotes are dropped when the
    /// text has no whitespace.
    StringLiteral(String),
    Identifier {
        name: String,
        quoted: bool,
    },
    Exec(Exec),
    Infix {
        left: Box<Expr>,
        operator: String,
        right: Box<Expr>,
    },
    Group(Box<Expr>),
    /// `$(( inner ))`
    Arithmetic(Box<Expr>),
    Test(TestCommand),
    /// `$(inner)`
    CommandSub(Box<Expr>),
    ParameterExpansion {
        parameter: String,
        expansion: Expansion,
    },
}
