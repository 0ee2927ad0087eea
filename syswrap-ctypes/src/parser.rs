/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! A parser for the declarations found in preprocessed system headers.
//!
//! This is not a C compiler front end. It understands the declaration
//! grammar (specifiers, declarators, struct/union/enum definitions and the
//! GNU extensions glibc headers use) well enough to build a type graph, and
//! skips over everything with no bearing on types: initializers, function
//! bodies, array length expressions, `asm` labels and static assertions.

use tracing::debug;
use tracing::trace;

use crate::error::ParseError;
use crate::error::ParseErrorKind;
use crate::lexer::tokenize;
use crate::lexer::Token;
use crate::lexer::TokenKind;
use crate::types::AggregateKind;
use crate::types::CType;
use crate::types::Field;
use crate::types::FunctionType;
use crate::types::Param;
use crate::types::Qualifiers;
use crate::types::TypeId;
use crate::types::TypeTable;

/// Storage class of a declaration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StorageClass {
    /// `typedef`
    Typedef,
    /// `extern`
    Extern,
    /// `static`
    Static,
    /// `auto`
    Auto,
    /// `register`
    Register,
    /// `_Thread_local` or `__thread`
    ThreadLocal,
}

/// A named top-level declaration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Declaration {
    /// The declared identifier.
    pub name: String,
    /// The declared type, including any trailing attributes.
    pub ty: TypeId,
    /// The storage class, if one was written.
    pub storage: Option<StorageClass>,
}

/// The result of parsing declaration text: the type graph plus every named
/// top-level declaration in source order.
#[derive(Debug, Default)]
pub struct TranslationUnit {
    /// Owns every type referenced by the declarations.
    pub types: TypeTable,
    declarations: Vec<Declaration>,
    typedefs: Vec<Declaration>,
}

impl TranslationUnit {
    /// Functions and variables, in source order. Typedefs are excluded.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Typedefs, in source order.
    pub fn typedefs(&self) -> &[Declaration] {
        &self.typedefs
    }

    /// Finds the first declaration of `name`.
    pub fn find(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|decl| decl.name == name)
    }
}

/// Parses a sequence of C declarations.
pub fn parse(src: &str) -> Result<TranslationUnit, ParseError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        unit: TranslationUnit::default(),
    };
    parser.translation_unit()?;

    debug!(
        "Parsed {} declarations, {} typedefs, {} type nodes",
        parser.unit.declarations.len(),
        parser.unit.typedefs.len(),
        parser.unit.types.len()
    );

    Ok(parser.unit)
}

fn storage_class(word: &str) -> Option<StorageClass> {
    Some(match word {
        "typedef" => StorageClass::Typedef,
        "extern" => StorageClass::Extern,
        "static" => StorageClass::Static,
        "auto" => StorageClass::Auto,
        "register" => StorageClass::Register,
        "_Thread_local" | "__thread" => StorageClass::ThreadLocal,
        _ => return None,
    })
}

fn qualifier(word: &str) -> Option<Qualifiers> {
    Some(match word {
        "const" | "__const" | "__const__" => Qualifiers::CONST,
        "volatile" | "__volatile" | "__volatile__" => Qualifiers::VOLATILE,
        "restrict" | "__restrict" | "__restrict__" => Qualifiers::RESTRICT,
        "_Atomic" => Qualifiers::ATOMIC,
        _ => return None,
    })
}

/// Returns the canonical spelling of a builtin type keyword.
fn scalar_word(word: &str) -> Option<&'static str> {
    Some(match word {
        "void" => "void",
        "char" => "char",
        "short" => "short",
        "int" => "int",
        "long" => "long",
        "float" => "float",
        "double" => "double",
        "signed" | "__signed" | "__signed__" => "signed",
        "unsigned" => "unsigned",
        "_Bool" => "_Bool",
        "_Complex" | "__complex__" => "_Complex",
        "__int128" => "__int128",
        "__int128_t" => "__int128_t",
        "__uint128_t" => "__uint128_t",
        "__builtin_va_list" => "__builtin_va_list",
        "__float128" => "__float128",
        "_Float16" => "_Float16",
        "_Float32" => "_Float32",
        "_Float64" => "_Float64",
        "_Float128" => "_Float128",
        "_Float32x" => "_Float32x",
        "_Float64x" => "_Float64x",
        _ => return None,
    })
}

/// Specifiers that can be ignored: they do not change the type.
fn is_ignored_specifier(word: &str) -> bool {
    matches!(
        word,
        "inline" | "__inline" | "__inline__" | "_Noreturn" | "__extension__"
    )
}

fn is_attribute(word: &str) -> bool {
    matches!(word, "__attribute__" | "__attribute")
}

fn is_asm(word: &str) -> bool {
    matches!(word, "asm" | "__asm" | "__asm__")
}

fn is_typeof(word: &str) -> bool {
    matches!(word, "typeof" | "__typeof" | "__typeof__")
}

fn is_keyword(word: &str) -> bool {
    storage_class(word).is_some()
        || qualifier(word).is_some()
        || scalar_word(word).is_some()
        || is_ignored_specifier(word)
        || is_attribute(word)
        || is_asm(word)
        || is_typeof(word)
        || matches!(
            word,
            "struct" | "union" | "enum" | "_Alignas" | "_Static_assert" | "static_assert"
        )
}

fn parse_int(text: &str) -> Option<u64> {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).ok()
    } else {
        digits.parse().ok()
    }
}

fn token_text(token: &Token) -> String {
    match &token.kind {
        TokenKind::Ident(s) | TokenKind::Number(s) | TokenKind::Str(s) | TokenKind::Char(s) => {
            s.clone()
        }
        TokenKind::Punct(p) => (*p).to_owned(),
    }
}

/// Declaration specifiers collected before a declarator.
#[derive(Default)]
struct Specifiers {
    storage: Option<StorageClass>,
    qualifiers: Qualifiers,
    base: Option<TypeId>,
    words: Vec<&'static str>,
    attributes: Vec<String>,
    seen: bool,
}

/// One suffix of a direct declarator.
enum Suffix {
    Array(Option<u64>),
    Function(Vec<Param>, bool),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    unit: TranslationUnit,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn peek_punct(&self, p: &str) -> bool {
        self.peek().map_or(false, |t| t.is_punct(p))
    }

    fn peek_ident(&self) -> Option<&str> {
        self.peek().and_then(|t| t.ident())
    }

    fn line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::new(
                token.line,
                ParseErrorKind::UnexpectedToken {
                    found: token_text(token),
                    expected,
                },
            ),
            None => ParseError::new(self.line(), ParseErrorKind::UnexpectedEof(expected)),
        }
    }

    fn expect_punct(&mut self, p: &'static str) -> Result<(), ParseError> {
        if self.peek_punct(p) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(p))
        }
    }

    fn is_typedef_name(&self, word: &str) -> bool {
        !is_keyword(word) && self.unit.types.typedef(word).is_some()
    }

    /// Returns true if the current token can begin a declaration.
    fn at_type_start(&self) -> bool {
        match self.peek_ident() {
            Some(word) => is_keyword(word) || self.is_typedef_name(word),
            None => false,
        }
    }

    /// Skips a bracketed group starting at the current `open` token and
    /// returns the text of the tokens strictly inside it.
    fn skip_balanced(&mut self, open: &'static str, close: &'static str) -> Result<String, ParseError> {
        self.expect_punct(open)?;
        let mut depth = 1;
        let mut text = Vec::new();
        loop {
            let token = match self.peek() {
                Some(token) => token,
                None => return Err(self.unexpected(close)),
            };
            if token.is_punct(open) {
                depth += 1;
            } else if token.is_punct(close) {
                depth -= 1;
                if depth == 0 {
                    self.pos += 1;
                    return Ok(text.join(" "));
                }
            }
            text.push(token_text(token));
            self.pos += 1;
        }
    }

    /// Parses `__attribute__((...))` and returns the inner text.
    fn attribute(&mut self) -> Result<String, ParseError> {
        self.pos += 1;
        let text = self.skip_balanced("(", ")")?;
        let text = text
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(&text)
            .trim()
            .to_owned();
        Ok(text)
    }

    /// Collects any attributes and `asm` labels following a declarator.
    fn trailing_attributes(&mut self) -> Result<Vec<String>, ParseError> {
        let mut attributes = Vec::new();
        while let Some(word) = self.peek_ident() {
            if is_attribute(word) {
                attributes.push(self.attribute()?);
            } else if is_asm(word) {
                self.pos += 1;
                self.skip_balanced("(", ")")?;
            } else {
                break;
            }
        }
        Ok(attributes)
    }

    fn translation_unit(&mut self) -> Result<(), ParseError> {
        while let Some(token) = self.peek() {
            if token.is_punct(";") {
                self.pos += 1;
            } else if token.is_ident("__extension__") {
                self.pos += 1;
            } else if token.is_ident("_Static_assert") || token.is_ident("static_assert") {
                self.pos += 1;
                self.skip_balanced("(", ")")?;
                self.expect_punct(";")?;
            } else if token.ident().map_or(false, is_asm) {
                self.pos += 1;
                self.skip_balanced("(", ")")?;
                self.expect_punct(";")?;
            } else {
                self.external_declaration()?;
            }
        }
        Ok(())
    }

    fn external_declaration(&mut self) -> Result<(), ParseError> {
        let specs = self.specifiers()?;
        if !specs.seen {
            return Err(self.unexpected("declaration"));
        }
        let base = self.base_type(&specs)?;

        if self.peek_punct(";") {
            // A bare struct/union/enum declaration.
            self.pos += 1;
            return Ok(());
        }

        loop {
            let (name, ty) = self.declarator(base)?;
            let attributes = self.trailing_attributes()?;
            let ty = self.unit.types.attribute(ty, attributes);

            let name = match name {
                Some(name) => name,
                None => return Err(self.unexpected("declarator name")),
            };

            let decl = Declaration {
                name,
                ty,
                storage: specs.storage,
            };
            if specs.storage == Some(StorageClass::Typedef) {
                self.unit.types.add_typedef(&decl.name, ty);
                self.unit.typedefs.push(decl);
            } else {
                self.unit.declarations.push(decl);
            }

            if self.peek_punct("=") {
                self.initializer()?;
            }

            if self.peek_punct("{") {
                // Function definition.
                self.skip_balanced("{", "}")?;
                return Ok(());
            } else if self.peek_punct(",") {
                self.pos += 1;
            } else {
                return self.expect_punct(";");
            }
        }
    }

    /// Skips `= ...` up to the next top-level `,` or `;`.
    fn initializer(&mut self) -> Result<(), ParseError> {
        self.pos += 1;
        let mut depth = 0usize;
        loop {
            let token = match self.peek() {
                Some(token) => token,
                None => return Err(self.unexpected(";")),
            };
            if token.is_punct("(") || token.is_punct("{") || token.is_punct("[") {
                depth += 1;
            } else if token.is_punct(")") || token.is_punct("}") || token.is_punct("]") {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && (token.is_punct(",") || token.is_punct(";")) {
                return Ok(());
            }
            self.pos += 1;
        }
    }

    fn specifiers(&mut self) -> Result<Specifiers, ParseError> {
        let mut specs = Specifiers::default();

        while let Some(word) = self.peek_ident().map(str::to_owned) {
            if let Some(storage) = storage_class(&word) {
                specs.storage = Some(storage);
                self.pos += 1;
            } else if word == "_Atomic" && self.peek_at(1).map_or(false, |t| t.is_punct("(")) {
                // `_Atomic(T)` is a type specifier, not a qualifier.
                self.pos += 1;
                self.expect_punct("(")?;
                let ty = self.type_name()?;
                self.expect_punct(")")?;
                specs.base = Some(self.unit.types.qualify(ty, Qualifiers::ATOMIC));
            } else if let Some(q) = qualifier(&word) {
                specs.qualifiers |= q;
                self.pos += 1;
            } else if is_ignored_specifier(&word) {
                self.pos += 1;
            } else if is_attribute(&word) {
                let attribute = self.attribute()?;
                specs.attributes.push(attribute);
            } else if word == "_Alignas" {
                self.pos += 1;
                self.skip_balanced("(", ")")?;
            } else if let Some(scalar) = scalar_word(&word) {
                specs.words.push(scalar);
                self.pos += 1;
            } else if word == "struct" || word == "union" {
                let kind = if word == "struct" {
                    AggregateKind::Struct
                } else {
                    AggregateKind::Union
                };
                self.pos += 1;
                specs.base = Some(self.aggregate(kind)?);
            } else if word == "enum" {
                self.pos += 1;
                specs.base = Some(self.enumeration()?);
            } else if is_typeof(&word) {
                self.pos += 1;
                specs.base = Some(self.type_of()?);
            } else if specs.base.is_none() && specs.words.is_empty() && self.is_typedef_name(&word)
            {
                specs.base = self.unit.types.typedef(&word);
                self.pos += 1;
            } else {
                break;
            }
            specs.seen = true;
        }

        Ok(specs)
    }

    fn base_type(&mut self, specs: &Specifiers) -> Result<TypeId, ParseError> {
        let base = match specs.base {
            Some(base) => base,
            None if !specs.words.is_empty() => self.unit.types.scalar(&specs.words.join(" ")),
            // Implicit `int`, e.g. `static x;`.
            None if specs.storage.is_some() || !specs.qualifiers.is_empty() => {
                self.unit.types.scalar("int")
            }
            None => {
                let found = self.peek().map(token_text).unwrap_or_default();
                return Err(ParseError::new(
                    self.line(),
                    ParseErrorKind::UnknownType(found),
                ));
            }
        };
        let ty = self.unit.types.qualify(base, specs.qualifiers);
        Ok(self
            .unit
            .types
            .attribute(ty, specs.attributes.clone()))
    }

    /// Parses a type name, as in a cast or `sizeof`.
    fn type_name(&mut self) -> Result<TypeId, ParseError> {
        let specs = self.specifiers()?;
        if !specs.seen {
            return Err(self.unexpected("type name"));
        }
        let base = self.base_type(&specs)?;
        let (_, ty) = self.declarator(base)?;
        Ok(ty)
    }

    /// `typeof(...)`. Types are parsed; expressions become an opaque scalar.
    fn type_of(&mut self) -> Result<TypeId, ParseError> {
        if !self.peek_punct("(") {
            return Err(self.unexpected("("));
        }
        if self.peek_at(1).and_then(|t| t.ident()).map_or(false, |w| {
            is_keyword(w) || self.is_typedef_name(w)
        }) {
            self.pos += 1;
            let ty = self.type_name()?;
            self.expect_punct(")")?;
            Ok(ty)
        } else {
            let text = self.skip_balanced("(", ")")?;
            Ok(self.unit.types.scalar(&format!("__typeof__({})", text)))
        }
    }

    fn aggregate(&mut self, kind: AggregateKind) -> Result<TypeId, ParseError> {
        // Attributes on a struct (e.g. `packed`) do not change which fields
        // it has.
        self.trailing_attributes()?;

        let tag = match self.peek_ident() {
            Some(word) if !is_keyword(word) => {
                let tag = word.to_owned();
                self.pos += 1;
                Some(tag)
            }
            _ => None,
        };

        let id = match &tag {
            Some(tag) => self.unit.types.intern_aggregate(kind, tag),
            None if self.peek_punct("{") => self.unit.types.anonymous_aggregate(kind),
            None => return Err(self.unexpected("aggregate tag or body")),
        };

        if self.peek_punct("{") {
            let fields = self.fields()?;
            let count = fields.len();
            if self.unit.types.define_fields(id, fields) {
                trace!(
                    "Defined {} with {} fields",
                    self.unit.types.display(id),
                    count
                );
            } else {
                debug!(
                    "Ignoring redefinition of {}",
                    self.unit.types.display(id)
                );
            }
            self.trailing_attributes()?;
        }

        Ok(id)
    }

    fn fields(&mut self) -> Result<Vec<Field>, ParseError> {
        self.expect_punct("{")?;
        let mut fields = Vec::new();

        loop {
            if self.peek_punct("}") {
                self.pos += 1;
                return Ok(fields);
            }
            if self.peek_punct(";") {
                self.pos += 1;
                continue;
            }
            if self
                .peek_ident()
                .map_or(false, |w| w == "_Static_assert" || w == "static_assert")
            {
                self.pos += 1;
                self.skip_balanced("(", ")")?;
                self.expect_punct(";")?;
                continue;
            }

            let specs = self.specifiers()?;
            if !specs.seen {
                return Err(self.unexpected("member declaration"));
            }
            let base = self.base_type(&specs)?;

            if self.peek_punct(";") {
                // Anonymous struct or union member.
                self.pos += 1;
                fields.push(Field {
                    ty: base,
                    name: None,
                });
                continue;
            }

            loop {
                let (name, ty) = if self.peek_punct(":") {
                    (None, base)
                } else {
                    self.declarator(base)?
                };
                if self.peek_punct(":") {
                    // Bit-field width.
                    self.pos += 1;
                    while !self.peek_punct(",") && !self.peek_punct(";") {
                        if self.peek().is_none() {
                            return Err(self.unexpected(";"));
                        }
                        if self.peek_ident().map_or(false, is_attribute) {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                let attributes = self.trailing_attributes()?;
                let ty = self.unit.types.attribute(ty, attributes);
                fields.push(Field { ty, name });

                if self.peek_punct(",") {
                    self.pos += 1;
                } else {
                    self.expect_punct(";")?;
                    break;
                }
            }
        }
    }

    fn enumeration(&mut self) -> Result<TypeId, ParseError> {
        self.trailing_attributes()?;
        let tag = match self.peek_ident() {
            Some(word) if !is_keyword(word) => {
                let tag = word.to_owned();
                self.pos += 1;
                Some(tag)
            }
            _ => None,
        };
        if self.peek_punct("{") {
            self.skip_balanced("{", "}")?;
            self.trailing_attributes()?;
        } else if tag.is_none() {
            return Err(self.unexpected("enum tag or body"));
        }
        Ok(self.unit.types.add(CType::Enum(tag)))
    }

    /// Decides whether a `(` starts a parenthesized declarator rather than a
    /// parameter list.
    fn at_nested_declarator(&self) -> bool {
        match self.peek_at(1) {
            Some(token) if token.is_punct("*") || token.is_punct("(") => true,
            Some(token) => match token.ident() {
                Some(word) if is_attribute(word) => true,
                Some(word) => !is_keyword(word) && !self.is_typedef_name(word),
                None => false,
            },
            None => false,
        }
    }

    /// Parses a (possibly abstract) declarator applied to `base`. Returns
    /// the declared name, if any, and the full type.
    fn declarator(&mut self, base: TypeId) -> Result<(Option<String>, TypeId), ParseError> {
        let mut ty = base;

        while self.peek_punct("*") {
            self.pos += 1;
            ty = self.unit.types.pointer_to(ty);
            let mut qualifiers = Qualifiers::empty();
            let mut attributes = Vec::new();
            while let Some(word) = self.peek_ident() {
                if let Some(q) = qualifier(word) {
                    qualifiers |= q;
                    self.pos += 1;
                } else if is_attribute(word) {
                    attributes.push(self.attribute()?);
                } else {
                    break;
                }
            }
            ty = self.unit.types.qualify(ty, qualifiers);
            ty = self.unit.types.attribute(ty, attributes);
        }

        let mut name = None;
        let mut nested = None;

        if self.peek_punct("(") && self.at_nested_declarator() {
            nested = Some(self.pos + 1);
            self.skip_balanced("(", ")")?;
        } else if let Some(word) = self.peek_ident() {
            if !is_keyword(word) {
                name = Some(word.to_owned());
                self.pos += 1;
            }
        }

        let mut suffixes = Vec::new();
        loop {
            if self.peek_punct("[") {
                let text = self.skip_balanced("[", "]")?;
                suffixes.push(Suffix::Array(parse_int(&text)));
            } else if self.peek_punct("(") {
                let (params, variadic) = self.parameters()?;
                suffixes.push(Suffix::Function(params, variadic));
            } else {
                break;
            }
        }

        for suffix in suffixes.into_iter().rev() {
            ty = match suffix {
                Suffix::Array(len) => self.unit.types.add(CType::Array { element: ty, len }),
                Suffix::Function(params, variadic) => {
                    self.unit.types.add(CType::Function(FunctionType {
                        ret: ty,
                        params,
                        variadic,
                    }))
                }
            };
        }

        if let Some(start) = nested {
            let end = self.pos;
            self.pos = start;
            let (inner_name, inner_ty) = self.declarator(ty)?;
            self.trailing_attributes()?;
            self.expect_punct(")")?;
            self.pos = end;
            name = inner_name;
            ty = inner_ty;
        }

        Ok((name, ty))
    }

    fn parameters(&mut self) -> Result<(Vec<Param>, bool), ParseError> {
        self.expect_punct("(")?;
        let mut params = Vec::new();

        if self.peek_punct(")") {
            // Unprototyped `f()`.
            self.pos += 1;
            return Ok((params, false));
        }
        if self.peek().map_or(false, |t| t.is_ident("void"))
            && self.peek_at(1).map_or(false, |t| t.is_punct(")"))
        {
            self.pos += 2;
            return Ok((params, false));
        }

        loop {
            if self.peek_punct("...") {
                self.pos += 1;
                self.expect_punct(")")?;
                return Ok((params, true));
            }

            let param = if self.at_type_start() {
                let specs = self.specifiers()?;
                let base = self.base_type(&specs)?;
                let (name, ty) = self.declarator(base)?;
                let attributes = self.trailing_attributes()?;
                let ty = self.unit.types.attribute(ty, attributes);
                Param { ty, name }
            } else if let Some(word) = self.peek_ident() {
                // K&R identifier list.
                let name = Some(word.to_owned());
                self.pos += 1;
                Param {
                    ty: self.unit.types.scalar("int"),
                    name,
                }
            } else {
                return Err(self.unexpected("parameter declaration"));
            };
            params.push(param);

            if self.peek_punct(",") {
                self.pos += 1;
            } else {
                self.expect_punct(")")?;
                return Ok((params, false));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;

    fn decl_type(unit: &TranslationUnit, name: &str) -> String {
        let decl = unit.find(name).unwrap();
        unit.types.display(decl.ty).to_string()
    }

    #[test]
    fn simple_prototypes() {
        let unit = parse(
            "extern ssize_t read (int __fd, void *__buf, size_t __nbytes);\n\
             typedef long ssize_t;",
        );
        // `ssize_t` is not yet a typedef name when `read` is declared.
        assert!(unit.is_err());

        let unit = parse(
            "typedef unsigned long size_t;\n\
             typedef long ssize_t;\n\
             extern ssize_t read (int __fd, void *__buf, size_t __nbytes);\n\
             extern int close (int __fd);\n\
             extern int pause (void);",
        )
        .unwrap();

        assert_eq!(unit.declarations().len(), 3);
        assert_eq!(unit.typedefs().len(), 2);
        assert_eq!(
            decl_type(&unit, "read"),
            "ssize_t (int __fd, void *__buf, size_t __nbytes)"
        );
        assert_eq!(decl_type(&unit, "pause"), "int (void)");

        let read = unit.find("read").unwrap();
        assert_eq!(read.storage, Some(StorageClass::Extern));
        let func = unit.types.function(read.ty).unwrap();
        assert_eq!(func.params.len(), 3);
        assert_eq!(unit.types.kind(func.params[1].ty), TypeKind::Pointer);
        assert_eq!(func.params[2].name.as_deref(), Some("__nbytes"));
    }

    #[test]
    fn structs_and_self_reference() {
        let unit = parse(
            "struct node { struct node *next; int value; unsigned flags : 3, : 5; };\n\
             struct node *head (struct node *);",
        )
        .unwrap();
        let node = unit
            .types
            .aggregate(AggregateKind::Struct, "node")
            .unwrap();
        let fields = unit.types.fields(node);
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].name.as_deref(), Some("next"));
        assert_eq!(unit.types.pointee(fields[0].ty), Some(node));
        assert_eq!(fields[3].name, None);
    }

    #[test]
    fn forward_declaration_then_definition() {
        let unit = parse(
            "struct later;\n\
             int use_later (struct later *);\n\
             struct later { char *p; };",
        )
        .unwrap();
        let func = unit.types.function(unit.find("use_later").unwrap().ty).unwrap();
        let pointee = unit.types.pointee(func.params[0].ty).unwrap();
        assert_eq!(unit.types.fields(pointee).len(), 1);
    }

    #[test]
    fn function_pointers() {
        let unit = parse(
            "typedef void (*__sighandler_t) (int);\n\
             extern __sighandler_t signal (int __sig, __sighandler_t __handler);\n\
             void (*bsd_signal (int sig, void (*func)(int)))(int);",
        )
        .unwrap();
        assert_eq!(
            decl_type(&unit, "signal"),
            "__sighandler_t (int __sig, __sighandler_t __handler)"
        );
        assert_eq!(
            decl_type(&unit, "bsd_signal"),
            "void (*(int sig, void (*func)(int)))(int)"
        );
        let func = unit.types.function(unit.find("bsd_signal").unwrap().ty).unwrap();
        let ret = unit.types.pointee(func.ret).unwrap();
        assert_eq!(unit.types.kind(ret), TypeKind::Function);
    }

    #[test]
    fn gnu_extensions() {
        let unit = parse(
            "typedef union { struct sockaddr *__restrict __sockaddr__; } __SOCKADDR_ARG \
                 __attribute__ ((__transparent_union__));\n\
             extern int getpeername (int __fd, __SOCKADDR_ARG __addr,\n\
                 unsigned int *__restrict __len) __attribute__ ((__nothrow__ , __leaf__));\n\
             extern long int syscall (long int __sysno, ...) __asm__ (\"\" \"syscall\");\n\
             __extension__ typedef struct { long long int quot; } lldiv_t;\n\
             static __inline __attribute__ ((__always_inline__)) int\n\
             ident (int x) { if (x) { return x; } return 0; }\n\
             _Static_assert (sizeof (int) == 4, \"int\");\n\
             extern int table[16], *cursor = &table[0];",
        )
        .unwrap();

        let getpeername = unit.find("getpeername").unwrap();
        assert!(matches!(
            unit.types.get(getpeername.ty),
            CType::Attributed { .. }
        ));
        let func = unit.types.function(getpeername.ty).unwrap();
        assert_eq!(unit.types.kind(func.params[1].ty), TypeKind::Union);

        let syscall = unit.types.function(unit.find("syscall").unwrap().ty).unwrap();
        assert!(syscall.variadic);
        assert_eq!(decl_type(&unit, "syscall"), "long int (long int __sysno, ...)");

        assert!(unit.find("ident").is_some());
        assert_eq!(decl_type(&unit, "table"), "int [16]");
        assert_eq!(decl_type(&unit, "cursor"), "int *");
    }

    #[test]
    fn anonymous_members_and_nested_definitions() {
        let unit = parse(
            "struct outer {\n\
                 union { int *a; long b; };\n\
                 struct inner { char *s; } in;\n\
                 enum { A = 1, B = 2 } e;\n\
                 int arr[0x10];\n\
             };",
        )
        .unwrap();
        let outer = unit
            .types
            .aggregate(AggregateKind::Struct, "outer")
            .unwrap();
        let fields = unit.types.fields(outer);
        assert_eq!(fields.len(), 4);
        assert_eq!(unit.types.kind(fields[0].ty), TypeKind::Union);
        assert_eq!(fields[0].name, None);
        assert!(unit
            .types
            .aggregate(AggregateKind::Struct, "inner")
            .is_some());
        assert_eq!(unit.types.kind(fields[2].ty), TypeKind::Other);
        assert_eq!(unit.types.display(fields[3].ty).to_string(), "int [16]");
    }

    #[test]
    fn malformed_input() {
        let err = parse("int foo(int x;").unwrap_err();
        assert_eq!(err.line(), 1);
        assert!(matches!(err.kind(), ParseErrorKind::UnexpectedToken { .. }));

        let err = parse("struct s { int x;").unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::UnexpectedEof(_)));

        let err = parse("\n\nfoo bar;").unwrap_err();
        assert_eq!(err.line(), 3);
        assert!(matches!(err.kind(), ParseErrorKind::UnexpectedToken { .. }));
    }
}
