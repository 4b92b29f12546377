//! CurioScript lexer.
//!
//! Converts source text into a flat, ordered token sequence.  Whitespace and
//! comments (`// …` to end of line, non-nested `/* … */`) are discarded and
//! never emitted.  A successful lex always ends in exactly one
//! [`TokenKind::Eof`] token.
//!
//! Reserved words are classified after the identifier rule has matched: the
//! scanner reads `[A-Za-z_][A-Za-z0-9_]*` and then looks the lexeme up in the
//! keyword table, so keywords always win over user identifiers and the match
//! is exact (case-sensitive).

use std::fmt;

use crate::error::ScriptError;

// ── Source positions ──────────────────────────────────────────────────────────

/// A 1-based line/column position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Pos { line, column }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ── Tokens ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals and names
    Ident(String),
    Str(String),
    Num(f64),
    Bool(bool),

    // Keywords
    If,
    Else,
    Foreach,
    In,
    Push,
    Pop,

    // Operators
    Assign,      // =
    ColonAssign, // :=
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    BangEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,

    Eof,
}

impl TokenKind {
    /// Human-readable description used in parse diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::Str(_) => "string literal".to_owned(),
            TokenKind::Num(_) => "number literal".to_owned(),
            TokenKind::Bool(b) => format!("`{b}`"),
            TokenKind::If => "`if`".to_owned(),
            TokenKind::Else => "`else`".to_owned(),
            TokenKind::Foreach => "`foreach`".to_owned(),
            TokenKind::In => "`in`".to_owned(),
            TokenKind::Push => "`push`".to_owned(),
            TokenKind::Pop => "`pop`".to_owned(),
            TokenKind::Assign => "`=`".to_owned(),
            TokenKind::ColonAssign => "`:=`".to_owned(),
            TokenKind::Plus => "`+`".to_owned(),
            TokenKind::Minus => "`-`".to_owned(),
            TokenKind::Star => "`*`".to_owned(),
            TokenKind::Slash => "`/`".to_owned(),
            TokenKind::Percent => "`%`".to_owned(),
            TokenKind::EqEq => "`==`".to_owned(),
            TokenKind::BangEq => "`!=`".to_owned(),
            TokenKind::Lt => "`<`".to_owned(),
            TokenKind::Le => "`<=`".to_owned(),
            TokenKind::Gt => "`>`".to_owned(),
            TokenKind::Ge => "`>=`".to_owned(),
            TokenKind::AndAnd => "`&&`".to_owned(),
            TokenKind::OrOr => "`||`".to_owned(),
            TokenKind::Bang => "`!`".to_owned(),
            TokenKind::LParen => "`(`".to_owned(),
            TokenKind::RParen => "`)`".to_owned(),
            TokenKind::LBrace => "`{`".to_owned(),
            TokenKind::RBrace => "`}`".to_owned(),
            TokenKind::LBracket => "`[`".to_owned(),
            TokenKind::RBracket => "`]`".to_owned(),
            TokenKind::Comma => "`,`".to_owned(),
            TokenKind::Semicolon => "`;`".to_owned(),
            TokenKind::Colon => "`:`".to_owned(),
            TokenKind::Eof => "end of input".to_owned(),
        }
    }
}

/// A single token: classified kind, raw source text, and start position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub pos: Pos,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

/// Tokenize `src`.  Pure function of the input: lexing the same text twice
/// yields the same sequence.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ScriptError> {
    Lexer::new(src).tokenize()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Lexer {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if let Some(c) = ch {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        ch
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn here(&self) -> Pos {
        Pos::new(self.line, self.column)
    }

    fn err(message: impl Into<String>, pos: Pos) -> ScriptError {
        ScriptError::Lex {
            message: message.into(),
            pos,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ScriptError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let pos = self.here();
            let Some(ch) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    lexeme: String::new(),
                    pos,
                });
                return Ok(tokens);
            };
            let token = match ch {
                c if c.is_ascii_alphabetic() || c == '_' => self.read_ident(pos),
                c if c.is_ascii_digit() => self.read_number(pos)?,
                '"' | '\'' => self.read_string(pos)?,
                _ => self.read_operator(pos)?,
            };
            tokens.push(token);
        }
    }

    /// Skip whitespace and comments.  An unterminated block comment is a
    /// lexical error, like an unterminated string.
    fn skip_trivia(&mut self) -> Result<(), ScriptError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek2() == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                Some('/') if self.peek2() == Some('*') => {
                    let start = self.here();
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance() {
                            None => return Err(Self::err("unterminated block comment", start)),
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some(_) => {}
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_ident(&mut self, pos: Pos) -> Token {
        let mut text = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            // Guarded by the peek above.
            if let Some(c) = self.advance() {
                text.push(c);
            }
        }
        let kind = match text.as_str() {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "foreach" => TokenKind::Foreach,
            "in" => TokenKind::In,
            "push" => TokenKind::Push,
            "pop" => TokenKind::Pop,
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => TokenKind::Ident(text.clone()),
        };
        Token {
            kind,
            lexeme: text,
            pos,
        }
    }

    fn read_number(&mut self, pos: Pos) -> Result<Token, ScriptError> {
        let mut text = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            if let Some(c) = self.advance() {
                text.push(c);
            }
        }
        // A fractional part needs at least one digit after the dot; a bare
        // trailing dot is left for the next token (and rejected there).
        if self.peek() == Some('.') && matches!(self.peek2(), Some(c) if c.is_ascii_digit()) {
            if let Some(c) = self.advance() {
                text.push(c);
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                if let Some(c) = self.advance() {
                    text.push(c);
                }
            }
        }
        let value: f64 = text
            .parse()
            .map_err(|_| Self::err(format!("invalid number literal `{text}`"), pos))?;
        Ok(Token {
            kind: TokenKind::Num(value),
            lexeme: text,
            pos,
        })
    }

    fn read_string(&mut self, pos: Pos) -> Result<Token, ScriptError> {
        let mut raw = String::new();
        let mut value = String::new();
        // Opening quote is known to be present.
        let Some(quote) = self.advance() else {
            return Err(Self::err("unterminated string literal", pos));
        };
        raw.push(quote);
        loop {
            match self.advance() {
                None => return Err(Self::err("unterminated string literal", pos)),
                Some('\\') => {
                    raw.push('\\');
                    match self.advance() {
                        None => return Err(Self::err("unterminated string literal", pos)),
                        Some(c) if c == quote || c == '\\' => {
                            raw.push(c);
                            value.push(c);
                        }
                        // Unknown escapes are kept verbatim.
                        Some(c) => {
                            raw.push(c);
                            value.push('\\');
                            value.push(c);
                        }
                    }
                }
                Some(c) if c == quote => {
                    raw.push(c);
                    break;
                }
                Some(c) => {
                    raw.push(c);
                    value.push(c);
                }
            }
        }
        Ok(Token {
            kind: TokenKind::Str(value),
            lexeme: raw,
            pos,
        })
    }

    fn read_operator(&mut self, pos: Pos) -> Result<Token, ScriptError> {
        let Some(ch) = self.advance() else {
            return Err(Self::err("unexpected end of input", pos));
        };
        let kind = match ch {
            '=' => {
                if self.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::AndAnd
                } else {
                    return Err(Self::err("unexpected character `&` (did you mean `&&`?)", pos));
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::OrOr
                } else {
                    return Err(Self::err("unexpected character `|` (did you mean `||`?)", pos));
                }
            }
            ':' => {
                if self.eat('=') {
                    TokenKind::ColonAssign
                } else {
                    TokenKind::Colon
                }
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            other => {
                return Err(Self::err(format!("unexpected character {other:?}"), pos));
            }
        };
        Ok(Token {
            lexeme: operator_text(&kind).to_owned(),
            kind,
            pos,
        })
    }
}

fn operator_text(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Assign => "=",
        TokenKind::ColonAssign => ":=",
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::Percent => "%",
        TokenKind::EqEq => "==",
        TokenKind::BangEq => "!=",
        TokenKind::Lt => "<",
        TokenKind::Le => "<=",
        TokenKind::Gt => ">",
        TokenKind::Ge => ">=",
        TokenKind::AndAnd => "&&",
        TokenKind::OrOr => "||",
        TokenKind::Bang => "!",
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::LBrace => "{",
        TokenKind::RBrace => "}",
        TokenKind::LBracket => "[",
        TokenKind::RBracket => "]",
        TokenKind::Comma => ",",
        TokenKind::Semicolon => ";",
        TokenKind::Colon => ":",
        _ => "",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
