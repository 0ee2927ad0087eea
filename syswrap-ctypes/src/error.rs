/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use thiserror::Error;

/// What went wrong while parsing declarations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A token that cannot appear at this point of a declaration.
    #[error("unexpected `{found}`, expected {expected}")]
    UnexpectedToken {
        /// The offending token, as written.
        found: String,
        /// What the parser was looking for.
        expected: &'static str,
    },
    /// The input ended in the middle of a declaration.
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEof(&'static str),
    /// A `/*` without a matching `*/`.
    #[error("unterminated block comment")]
    UnterminatedComment,
    /// A string or character literal without its closing quote.
    #[error("unterminated literal")]
    UnterminatedLiteral,
    /// A character that is not part of C's token set.
    #[error("invalid character {0:?}")]
    InvalidCharacter(char),
    /// A declaration without any type specifier.
    #[error("missing type specifier before `{0}`")]
    UnknownType(String),
}

/// An error produced by the tokenizer or the declaration parser. Parsing does
/// not attempt to recover from malformed input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    line: usize,
    kind: ParseErrorKind,
}

impl ParseError {
    /// Creates a new `ParseError`.
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }

    /// The 1-based line of the declaration text the error was found on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Gets the error kind.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}
