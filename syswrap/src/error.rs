/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Error handling.

use std::io;

use syswrap_ctypes::ParseError;
use thiserror::Error;

/// The pairing table disagrees with the declared types. These are always
/// fatal: ignoring them would leave a syscall argument under-wrapped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A paired field does not point to a struct that has a wrapper.
    #[error("({owner}, {member}) pairs a pointer to `{pointee}`, which has no struct wrapper")]
    NotAWrappedStruct {
        /// The struct the pairing belongs to.
        owner: String,
        /// The paired field.
        member: String,
        /// The printed type the field points to.
        pointee: String,
    },
    /// The length field of a struct pairing does not exist.
    #[error("({owner}, {member}) names length field `{field}`, which `{owner}` does not have")]
    UnknownField {
        /// The struct the pairing belongs to.
        owner: String,
        /// The paired field.
        member: String,
        /// The missing length field.
        field: String,
    },
    /// A syscall pairing points past the argument list.
    #[error(
        "({owner}, {member}) pairs argument {index} with argument {length_index}, \
         but `{owner}` takes {arity} arguments"
    )]
    LengthOutOfRange {
        /// The syscall the pairing belongs to.
        owner: String,
        /// The paired struct type.
        member: String,
        /// Position of the array argument.
        index: usize,
        /// Computed position of the length argument.
        length_index: isize,
        /// Number of declared parameters.
        arity: usize,
    },
    /// A struct type used as a syscall argument was paired with a field name.
    #[error("({owner}, {member}) must be an argument offset")]
    ExpectedOffset {
        /// The syscall the pairing belongs to.
        owner: String,
        /// The paired struct type.
        member: String,
    },
    /// A struct field was paired with an argument offset.
    #[error("({owner}, {member}) must name a length field")]
    ExpectedField {
        /// The struct the pairing belongs to.
        owner: String,
        /// The paired field.
        member: String,
    },
}

/// A general error.
#[derive(Error, Debug)]
pub enum Error {
    /// The declaration text is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The pairing table is inconsistent with the declarations.
    #[error("configuration inconsistency: {0}")]
    Config(#[from] ConfigError),

    /// A struct with pointer fields has neither a tag nor a typedef name, so
    /// no directive can refer to it.
    #[error("struct `{0}` needs a wrapper but has no tag or typedef name")]
    UnnamedStruct(String),

    /// The pairing table could not be deserialized.
    #[error("invalid pairing table: {0}")]
    Pairings(#[from] serde_json::Error),

    /// The syscall number prefix does not form a valid pattern.
    #[error("invalid syscall prefix: {0}")]
    Pattern(#[from] regex::Error),

    /// An I/O error.
    #[error(transparent)]
    Io(#[from] io::Error),
}
