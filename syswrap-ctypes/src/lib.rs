/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! This crate turns preprocessed C declarations into a type graph that can be
//! walked safely:
//! 1. Every type is a node in a [`TypeTable`] arena, so cyclic structs are
//!    plain data rather than reference cycles.
//! 2. Tagged structs and unions are interned by name, so two mentions of
//!    `struct iovec` are the same [`TypeId`].
//! 3. Typedefs, qualifiers and attributes are kept (types print back out the
//!    way they were written) but can be stripped with [`TypeTable::resolve`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod error;
mod lexer;
mod parser;
mod printer;
mod types;

pub use crate::error::*;
pub use crate::lexer::tokenize;
pub use crate::lexer::Token;
pub use crate::lexer::TokenKind;
pub use crate::parser::*;
pub use crate::printer::*;
pub use crate::types::*;
