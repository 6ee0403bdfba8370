//! NWScript Lexer
//!
//! Single pass over the document text producing positioned tokens.
//! Columns are counted in UTF-16 code units to match LSP positions.

use std::collections::HashSet;

use super::grammar::Grammar;
use super::{Tokenizer, TokenStream};

/// Token types in NWScript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Control-flow and declaration keywords like "if", "return", "const"
    Keyword,
    /// Built-in type names like "int", "object", "effect"
    Type,
    Identifier,
    /// Integer, float or hex literal
    Number,
    /// Terminated string literal, quotes included
    String,
    /// Line or block comment, delimiters included
    Comment,
    /// Preprocessor directive like "#include"
    Directive,
    Punctuation,
    Operator,
    /// Unterminated string or comment, or a character outside the language
    Invalid,
}

/// Zero-based line/column pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A token with its text content and source range
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: Location,
    pub end: Location,
}

impl Token {
    /// Whether `location` falls inside the token (end inclusive, so a cursor
    /// placed right after an identifier still resolves to it)
    pub fn contains(&self, location: Location) -> bool {
        self.start <= location && location <= self.end
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == text
    }
}

const TWO_CHAR_OPERATORS: &[&str] = &[
    "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=",
    "^=", "<<", ">>",
];

/// Grammar-driven tokenizer
#[derive(Debug, Clone)]
pub struct Lexer {
    keywords: Vec<String>,
    types: Vec<String>,
    keyword_set: HashSet<String>,
    type_set: HashSet<String>,
}

impl Lexer {
    pub fn new(grammar: &Grammar) -> Self {
        Self {
            keywords: grammar.keywords.clone(),
            types: grammar.types.clone(),
            keyword_set: grammar.keywords.iter().cloned().collect(),
            type_set: grammar.types.iter().cloned().collect(),
        }
    }

    fn classify_word(&self, word: &str) -> TokenKind {
        if self.keyword_set.contains(word) {
            TokenKind::Keyword
        } else if self.type_set.contains(word) {
            TokenKind::Type
        } else {
            TokenKind::Identifier
        }
    }

    /// Tokenize a whole document
    pub fn tokenize_text(&self, text: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(text);
        let mut tokens = Vec::new();

        while let Some(ch) = scanner.peek() {
            let start = scanner.location();
            let start_pos = scanner.pos;

            let kind = match ch {
                // Skip whitespace
                c if c.is_whitespace() => {
                    scanner.bump();
                    continue;
                }

                '/' if scanner.peek_second() == Some('/') => {
                    scanner.eat_while(|c| c != '\n');
                    TokenKind::Comment
                }

                '/' if scanner.peek_second() == Some('*') => {
                    scanner.bump();
                    scanner.bump();
                    if scanner.eat_until("*/") {
                        TokenKind::Comment
                    } else {
                        TokenKind::Invalid
                    }
                }

                '"' => {
                    scanner.bump();
                    if scanner.eat_string_body() {
                        TokenKind::String
                    } else {
                        TokenKind::Invalid
                    }
                }

                '#' => {
                    scanner.bump();
                    scanner.eat_while(|c| c.is_ascii_alphabetic());
                    TokenKind::Directive
                }

                c if c.is_ascii_digit() => {
                    scanner.eat_while(|c| c.is_ascii_alphanumeric() || c == '.');
                    TokenKind::Number
                }

                c if c.is_alphabetic() || c == '_' => {
                    scanner.eat_while(|c| c.is_alphanumeric() || c == '_');
                    self.classify_word(&text[start_pos..scanner.pos])
                }

                '(' | ')' | '{' | '}' | '[' | ']' | ';' | ',' | '.' => {
                    scanner.bump();
                    TokenKind::Punctuation
                }

                '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '!' | '&' | '|' | '^' | '~'
                | '?' | ':' => {
                    scanner.bump();
                    if let Some(next) = scanner.peek() {
                        let pair: String = [ch, next].iter().collect();
                        if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
                            scanner.bump();
                        }
                    }
                    TokenKind::Operator
                }

                _ => {
                    scanner.bump();
                    TokenKind::Invalid
                }
            };

            tokens.push(Token {
                kind,
                text: text[start_pos..scanner.pos].to_string(),
                start,
                end: scanner.location(),
            });
        }

        tokens
    }
}

impl Tokenizer for Lexer {
    fn tokenize(&self, text: &str) -> TokenStream {
        self.tokenize_text(text).into()
    }

    fn keywords(&self) -> &[String] {
        &self.keywords
    }

    fn types(&self) -> &[String] {
        &self.types
    }
}

/// Byte cursor that tracks LSP line/column as it advances
struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line: 0,
            column: 0,
        }
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.text[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += ch.len_utf16() as u32;
        }
        Some(ch)
    }

    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.bump();
        }
    }

    /// Consume through `terminator`; false if the text ends first
    fn eat_until(&mut self, terminator: &str) -> bool {
        while self.peek().is_some() {
            if self.text[self.pos..].starts_with(terminator) {
                for _ in terminator.chars() {
                    self.bump();
                }
                return true;
            }
            self.bump();
        }
        false
    }

    /// Consume a string body after the opening quote. Strings may not span lines.
    fn eat_string_body(&mut self) -> bool {
        while let Some(ch) = self.peek() {
            match ch {
                '\n' => return false,
                '\\' => {
                    self.bump();
                    if self.peek() != Some('\n') {
                        self.bump();
                    }
                }
                '"' => {
                    self.bump();
                    return true;
                }
                _ => {
                    self.bump();
                }
            }
        }
        false
    }
}
