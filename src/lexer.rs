use crate::span::Span;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Invalid,
    Eof,
    NewLine,
    Comment,
    Identifier,
    Number,
    StringLiteral,
    PatternLiteral,
    Atom,
    Let,
    If,
    Else,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Assign,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
}

/// A positioned slice of the source. Tokens never own text: use [`Token::text`]
/// against the buffer that was lexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    fn new(kind: TokenKind, pos: usize, len: usize) -> Self {
        Token {
            kind,
            span: Span::new(pos, pos + len),
        }
    }

    pub fn pos(&self) -> usize {
        self.span.start
    }

    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    pub fn text<'s>(&self, src: &'s [u8]) -> &'s [u8] {
        &src[self.span.start..self.span.end]
    }

    pub fn lexeme(&self, src: &[u8]) -> String {
        String::from_utf8_lossy(self.text(src)).into_owned()
    }
}

// Longest symbols first so `==` wins over `=`.
const SYMBOLS: &[(&[u8], TokenKind)] = &[
    (b"\r\n", TokenKind::NewLine),
    (b"==", TokenKind::Equal),
    (b"!=", TokenKind::NotEqual),
    (b"<=", TokenKind::LessEqual),
    (b">=", TokenKind::GreaterEqual),
    (b"\n", TokenKind::NewLine),
    (b"=", TokenKind::Assign),
    (b"<", TokenKind::Less),
    (b">", TokenKind::Greater),
    (b"(", TokenKind::LParen),
    (b")", TokenKind::RParen),
    (b"{", TokenKind::LBrace),
    (b"}", TokenKind::RBrace),
    (b",", TokenKind::Comma),
    (b"+", TokenKind::Plus),
    (b"-", TokenKind::Minus),
    (b"*", TokenKind::Star),
    (b"/", TokenKind::Slash),
    (b"%", TokenKind::Percent),
];

pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("let", TokenKind::Let),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
];

type Matcher = fn(&[u8], usize) -> Option<Token>;

// Tried in order at every position; the first match wins.
const MATCHERS: &[Matcher] = &[
    match_symbol,
    match_identifier_or_keyword,
    match_number,
    match_pattern_literal,
    match_string_literal,
    match_atom_literal,
    match_comment,
];

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a [u8]) -> Self {
        Lexer { src, pos: 0 }
    }

    fn rest(&self) -> &'a [u8] {
        &self.src[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t') = self.src.get(self.pos) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Token {
        let rest = self.rest();
        let token = MATCHERS
            .iter()
            .find_map(|matcher| matcher(rest, self.pos))
            .unwrap_or_else(|| match_unknown(rest, self.pos));
        self.pos += token.len();
        token
    }
}

/// Splits `src` into tokens. Never fails: malformed input becomes `Invalid` tokens and
/// the result always ends with a single `Eof` token.
pub fn lex(src: &[u8]) -> Vec<Token> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();

    loop {
        lexer.skip_whitespace();
        if lexer.pos >= src.len() {
            break;
        }
        tokens.push(lexer.next_token());
    }
    tokens.push(Token::new(TokenKind::Eof, src.len(), 0));

    debug!(
        tokens = tokens.len(),
        invalid = tokens.iter().filter(|t| t.kind == TokenKind::Invalid).count(),
        "lexed source"
    );
    tokens
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'"' | b'\'' | b'#' | b',')
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn match_symbol(rest: &[u8], pos: usize) -> Option<Token> {
    SYMBOLS
        .iter()
        .find(|(symbol, _)| rest.starts_with(symbol))
        .map(|(symbol, kind)| Token::new(*kind, pos, symbol.len()))
}

fn match_identifier_or_keyword(rest: &[u8], pos: usize) -> Option<Token> {
    if !rest.first()?.is_ascii_alphabetic() {
        return None;
    }
    let len = rest.iter().take_while(|b| is_word_byte(**b)).count();
    match_keyword(&rest[..len], pos).or(Some(Token::new(TokenKind::Identifier, pos, len)))
}

fn match_keyword(word: &[u8], pos: usize) -> Option<Token> {
    KEYWORDS
        .iter()
        .find(|(keyword, _)| keyword.as_bytes() == word)
        .map(|(_, kind)| Token::new(*kind, pos, word.len()))
}

fn match_number(rest: &[u8], pos: usize) -> Option<Token> {
    if !rest.first()?.is_ascii_digit() {
        return None;
    }
    let run = &rest[..rest.iter().take_while(|b| is_word_byte(**b)).count()];
    if run.iter().all(u8::is_ascii_digit) {
        Some(Token::new(TokenKind::Number, pos, run.len()))
    } else {
        Some(Token::new(TokenKind::Invalid, pos, run.len()))
    }
}

fn is_line_end(rest: &[u8], i: usize) -> bool {
    match rest.get(i) {
        Some(b'\n') => true,
        Some(b'\r') => rest.get(i + 1) == Some(&b'\n'),
        _ => false,
    }
}

fn is_pattern_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'!' | b'*' | b'?' | b'[' | b'-' | b']')
}

fn match_pattern_literal(rest: &[u8], pos: usize) -> Option<Token> {
    if rest.first() != Some(&b'\'') {
        return None;
    }

    let mut legal = true;
    let mut i = 1;
    loop {
        if i >= rest.len() || is_line_end(rest, i) {
            return Some(Token::new(TokenKind::Invalid, pos, i));
        }
        match rest[i] {
            b'\'' => {
                let kind = if legal {
                    TokenKind::PatternLiteral
                } else {
                    TokenKind::Invalid
                };
                return Some(Token::new(kind, pos, i + 1));
            }
            b => legal &= is_pattern_byte(b),
        }
        i += 1;
    }
}

fn match_string_literal(rest: &[u8], pos: usize) -> Option<Token> {
    if rest.first() != Some(&b'"') {
        return None;
    }

    let mut i = 1;
    loop {
        if i >= rest.len() || is_line_end(rest, i) {
            return Some(Token::new(TokenKind::Invalid, pos, i));
        }
        match rest[i] {
            b'"' => return Some(Token::new(TokenKind::StringLiteral, pos, i + 1)),
            // An escape never swallows a line break.
            b'\\' if i + 1 < rest.len() && !is_line_end(rest, i + 1) => i += 2,
            _ => i += 1,
        }
    }
}

fn is_atom_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'/' | b'.' | b'_' | b'(' | b')')
}

fn match_atom_literal(rest: &[u8], pos: usize) -> Option<Token> {
    if rest.first() != Some(&b':') {
        return None;
    }

    let mut legal = true;
    let mut depth = 0usize;
    let mut i = 1;
    while let Some(&b) = rest.get(i) {
        if is_delimiter(b) {
            break;
        }
        match b {
            b'(' => depth += 1,
            // an unmatched ')' belongs to the surrounding call
            b')' if depth == 0 => break,
            b')' => depth -= 1,
            _ => legal &= is_atom_byte(b),
        }
        i += 1;
    }

    if i == 1 || !legal {
        return Some(Token::new(TokenKind::Invalid, pos, i));
    }
    Some(Token::new(TokenKind::Atom, pos, i))
}

fn match_comment(rest: &[u8], pos: usize) -> Option<Token> {
    if rest.first() != Some(&b'#') {
        return None;
    }
    let mut len = 1;
    while len < rest.len() && !is_line_end(rest, len) {
        len += 1;
    }
    Some(Token::new(TokenKind::Comment, pos, len))
}

/// Consumes an unrecognized run up to the next delimiter so the parser reports one
/// error per malformed region.
fn match_unknown(rest: &[u8], pos: usize) -> Token {
    let len = 1 + rest[1..].iter().take_while(|b| !is_delimiter(**b)).count();
    Token::new(TokenKind::Invalid, pos, len)
}
