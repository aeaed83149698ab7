use crate::error::{Diagnostic, Title};
use crate::lexer::{Token, TokenKind};
use crate::span::Span;

/// Cursor over lexer output. Reading past the end keeps returning the trailing `Eof`.
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.span.end);
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::empty(end),
            });
        }
        TokenStream { tokens, pos: 0 }
    }

    fn at(&self, index: usize) -> Token {
        let last = self.tokens.len() - 1;
        self.tokens[index.min(last)]
    }

    pub fn peek(&self) -> Token {
        self.at(self.pos)
    }

    pub fn peek_next(&self) -> Token {
        self.at(self.pos + 1)
    }

    /// Returns the current token and advances, except at `Eof` which is never consumed.
    pub fn take(&mut self) -> Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Span of the most recently taken token.
    pub fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::empty(0)
        }
    }
}

pub type ParsResult<T> = Result<T, Diagnostic>;

/// Deepest nesting of expressions or blocks before parsing gives up on the construct.
pub const MAX_NESTING: usize = 256;

pub(crate) struct Parser<'a> {
    pub tokens: TokenStream,
    pub src: &'a [u8],
    pub errors: Vec<Diagnostic>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, src: &'a [u8]) -> Self {
        Parser {
            tokens: TokenStream::new(tokens),
            src,
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Runs `parse` one nesting level deeper, failing at the current token once
    /// `MAX_NESTING` is reached.
    pub fn nested<T>(
        &mut self,
        title: Title,
        what: &str,
        parse: impl FnOnce(&mut Self) -> ParsResult<T>,
    ) -> ParsResult<T> {
        if self.depth >= MAX_NESTING {
            let span = self.tokens.peek().span;
            return self.error(title, span, format!("{} nested too deeply", what));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    pub fn text(&self, token: Token) -> String {
        token.lexeme(self.src)
    }

    /// Human wording for a token in error messages.
    pub fn describe(&self, token: Token) -> String {
        match token.kind {
            TokenKind::NewLine => "end of line".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            _ => format!("'{}'", self.text(token)),
        }
    }

    pub fn error<T>(&self, title: Title, span: Span, msg: impl Into<String>) -> ParsResult<T> {
        Err(Diagnostic::new(title, span, msg))
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.tokens.peek().kind == kind
    }

    pub fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.tokens.take();
            true
        } else {
            false
        }
    }

    /// Takes a token of `kind` or reports `msg` at whatever was found instead.
    pub fn expect(&mut self, kind: TokenKind, title: Title, msg: &str) -> ParsResult<Token> {
        let token = self.tokens.peek();
        if token.kind == kind {
            return Ok(self.tokens.take());
        }
        self.error(
            title,
            token.span,
            format!("{}, found {}", msg, self.describe(token)),
        )
    }

    /// A statement ends at a new line, or at the end of the file for the last one.
    pub fn expect_terminator(&mut self, what: &str) -> ParsResult<()> {
        let token = self.tokens.peek();
        match token.kind {
            TokenKind::NewLine => {
                self.tokens.take();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => self.error(
                Title::InvalidStatement,
                token.span,
                format!("expected a new line after {}, found {}", what, self.describe(token)),
            ),
        }
    }

    pub fn skip_newlines(&mut self) {
        while self.match_kind(TokenKind::NewLine) {}
    }

    pub fn invalid_token(&self, token: Token) -> Diagnostic {
        let text = self.text(token);
        let msg = match text.as_bytes().first() {
            Some(b'"') => "unterminated string literal".to_string(),
            Some(b'\'') if text.len() > 1 && text.ends_with('\'') => {
                "pattern literals may only contain letters, digits and ! * ? [ - ]".to_string()
            }
            Some(b'\'') => "unterminated pattern literal".to_string(),
            Some(b':') => format!(
                "malformed atom '{}': atoms may only contain letters, digits and / . _ ( )",
                text
            ),
            Some(b'_') => format!("'{}' is not a valid name: names must start with a letter", text),
            Some(b) if b.is_ascii_digit() => format!("malformed number '{}'", text),
            _ => format!("unrecognized input '{}'", text),
        };
        Diagnostic::new(Title::InvalidToken, token.span, msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn take_never_moves_past_eof() {
        let mut stream = TokenStream::new(lex(b"a"));
        assert_eq!(stream.take().kind, TokenKind::Identifier);
        assert_eq!(stream.take().kind, TokenKind::Eof);
        assert_eq!(stream.take().kind, TokenKind::Eof);
        assert_eq!(stream.position(), 1);
    }

    #[test]
    fn peek_next_looks_two_ahead() {
        let stream = TokenStream::new(lex(b"x = 1"));
        assert_eq!(stream.peek().kind, TokenKind::Identifier);
        assert_eq!(stream.peek_next().kind, TokenKind::Assign);
    }

    #[test]
    fn missing_eof_is_added() {
        let stream = TokenStream::new(Vec::new());
        assert_eq!(stream.peek().kind, TokenKind::Eof);
        assert_eq!(stream.peek_next().kind, TokenKind::Eof);
    }
}
