use crate::span::{SourceMap, Span};
use std::fmt;

/// Heading shown above a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Title {
    InvalidStatement,
    InvalidExpression,
    InvalidBlock,
    InvalidToken,
    UnknownToken,
    InvalidCall,
}

impl Title {
    pub fn as_str(&self) -> &'static str {
        match self {
            Title::InvalidStatement => "INVALID STATEMENT",
            Title::InvalidExpression => "INVALID EXPRESSION",
            Title::InvalidBlock => "INVALID BLOCK",
            Title::InvalidToken => "INVALID TOKEN",
            Title::UnknownToken => "UNKNOWN TOKEN",
            Title::InvalidCall => "INVALID CALL",
        }
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user-facing problem with the source, anchored to a byte span.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{title}: {message}")]
pub struct Diagnostic {
    pub title: Title,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(title: Title, span: Span, message: impl Into<String>) -> Self {
        Self {
            title,
            span,
            message: message.into(),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn position(&self, sm: &SourceMap) -> (usize, usize) {
        sm.line_col(self.span.start)
    }

    /// Plain one-line rendering with an optional `help:` line. Colors are left to the
    /// caller.
    pub fn render(&self, sm: &SourceMap) -> String {
        let (line, col) = self.position(sm);
        let main = format!("{}:{}: {}: {}", line, col, self.title, self.message);
        match &self.help {
            Some(help) => format!("{}\nhelp: {}", main, help),
            None => main,
        }
    }

    /// The offending source line with the span underlined.
    pub fn excerpt(&self, sm: &SourceMap) -> String {
        sm.excerpt(self.span)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("failed to parse script ({} error(s))", .0.len())]
    Parse(Vec<Diagnostic>),
    #[error("failed to compile script ({} error(s))", .0.len())]
    Lower(Vec<Diagnostic>),
}

impl CompileError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Parse(diags) | CompileError::Lower(diags) => diags,
        }
    }
}
