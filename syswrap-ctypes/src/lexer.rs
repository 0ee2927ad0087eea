/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Tokenizer for preprocessed C.

use crate::error::ParseError;
use crate::error::ParseErrorKind;

/// The kind of a token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenKind {
    /// An identifier or keyword.
    Ident(String),
    /// A numeric literal, unparsed.
    Number(String),
    /// A string literal, including its quotes.
    Str(String),
    /// A character literal, including its quotes.
    Char(String),
    /// A punctuator. Only `...` is combined; everything else is one
    /// character.
    Punct(&'static str),
}

/// A token and the line it started on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    /// What was lexed.
    pub kind: TokenKind,
    /// 1-based line number.
    pub line: usize,
}

impl Token {
    /// Returns the identifier text if this is an identifier.
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this token is the punctuator `p`.
    pub fn is_punct(&self, p: &str) -> bool {
        matches!(&self.kind, TokenKind::Punct(q) if *q == p)
    }

    /// Returns true if this token is the identifier or keyword `s`.
    pub fn is_ident(&self, s: &str) -> bool {
        self.ident() == Some(s)
    }
}

const PUNCTUATORS: &[&str] = &[
    "(", ")", "[", "]", "{", "}", ";", ",", "*", "=", ":", "?", "&", "|", "^", "~", "!", "<",
    ">", "+", "-", "/", "%", ".",
];

/// Splits `src` into tokens.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    Lexer {
        chars: src.chars().collect(),
        pos: 0,
        line: 1,
    }
    .run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.line, kind)
    }

    fn at_line_start(&self) -> bool {
        self.chars[..self.pos]
            .iter()
            .rev()
            .take_while(|c| **c != '\n')
            .all(|c| c.is_whitespace())
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek(0) {
            let line = self.line;

            if c.is_whitespace() {
                self.bump();
            } else if c == '#' && self.at_line_start() {
                // Stray preprocessor output, e.g. line markers.
                while let Some(c) = self.peek(0) {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else if c == '/' && self.peek(1) == Some('*') {
                self.block_comment()?;
            } else if c == '/' && self.peek(1) == Some('/') {
                while let Some(c) = self.peek(0) {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else if c.is_ascii_alphabetic() || c == '_' || c == '$' {
                let mut s = String::new();
                while let Some(c) = self.peek(0) {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                        s.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(s),
                    line,
                });
            } else if c.is_ascii_digit()
                || (c == '.' && self.peek(1).map_or(false, |d| d.is_ascii_digit()))
            {
                let mut s = String::new();
                while let Some(c) = self.peek(0) {
                    let exponent_sign = (c == '+' || c == '-')
                        && match s.chars().last() {
                            Some('e' | 'E') => !s.starts_with("0x") && !s.starts_with("0X"),
                            Some('p' | 'P') => true,
                            _ => false,
                        };
                    if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                        s.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Number(s),
                    line,
                });
            } else if c == '"' || c == '\'' {
                let s = self.quoted(c)?;
                let kind = if c == '"' {
                    TokenKind::Str(s)
                } else {
                    TokenKind::Char(s)
                };
                tokens.push(Token { kind, line });
            } else if c == '.' && self.peek(1) == Some('.') && self.peek(2) == Some('.') {
                self.pos += 3;
                tokens.push(Token {
                    kind: TokenKind::Punct("..."),
                    line,
                });
            } else if let Some(&p) = PUNCTUATORS.iter().find(|p| p.starts_with(c)) {
                self.bump();
                tokens.push(Token {
                    kind: TokenKind::Punct(p),
                    line,
                });
            } else {
                return Err(self.error(ParseErrorKind::InvalidCharacter(c)));
            }
        }

        Ok(tokens)
    }

    fn block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.line;
        self.pos += 2;
        loop {
            match self.bump() {
                Some('*') if self.peek(0) == Some('/') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(ParseError::new(start, ParseErrorKind::UnterminatedComment)),
            }
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.line;
        let mut s = String::new();
        s.push(quote);
        self.bump();
        loop {
            match self.bump() {
                Some('\\') => {
                    s.push('\\');
                    match self.bump() {
                        Some(c) => s.push(c),
                        None => break,
                    }
                }
                Some('\n') | None => break,
                Some(c) => {
                    s.push(c);
                    if c == quote {
                        return Ok(s);
                    }
                }
            }
        }
        Err(ParseError::new(start, ParseErrorKind::UnterminatedLiteral))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn declaration() {
        assert_eq!(
            kinds("extern int foo (char *, ...);"),
            vec![
                TokenKind::Ident("extern".into()),
                TokenKind::Ident("int".into()),
                TokenKind::Ident("foo".into()),
                TokenKind::Punct("("),
                TokenKind::Ident("char".into()),
                TokenKind::Punct("*"),
                TokenKind::Punct(","),
                TokenKind::Punct("..."),
                TokenKind::Punct(")"),
                TokenKind::Punct(";"),
            ]
        );
    }

    #[test]
    fn comments_and_line_markers() {
        let tokens = tokenize("# 1 \"<stdin>\"\n/* a\ncomment */ int // trailing\nx;").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens[0].is_ident("int"));
        assert_eq!(tokens[0].line, 3);
        assert!(tokens[1].is_ident("x"));
        assert_eq!(tokens[1].line, 4);
    }

    #[test]
    fn literals() {
        assert_eq!(
            kinds(r#"asm("foo" "\"bar") 0x10UL 1.5e-3 'a'"#),
            vec![
                TokenKind::Ident("asm".into()),
                TokenKind::Punct("("),
                TokenKind::Str("\"foo\"".into()),
                TokenKind::Str(r#""\"bar""#.into()),
                TokenKind::Punct(")"),
                TokenKind::Number("0x10UL".into()),
                TokenKind::Number("1.5e-3".into()),
                TokenKind::Char("'a'".into()),
            ]
        );
    }

    #[test]
    fn errors() {
        assert_eq!(
            tokenize("int x; /* open").unwrap_err(),
            ParseError::new(1, ParseErrorKind::UnterminatedComment)
        );
        assert_eq!(
            tokenize("\n\"open").unwrap_err(),
            ParseError::new(2, ParseErrorKind::UnterminatedLiteral)
        );
        assert_eq!(
            tokenize("int @x;").unwrap_err(),
            ParseError::new(1, ParseErrorKind::InvalidCharacter('@'))
        );
    }
}
