/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Wrap directives and how they are written out.
//!
//! The `Display` impls produce the macro vocabulary consumed by the
//! instrumentation runtime, which expands each line with its own definitions
//! of `WRAP_SYSCALL`, `WRAP_STRUCT` and friends. The text format is
//! positional, so it must not change.

use core::fmt;
use std::io;
use std::io::Write;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// How to wrap one syscall argument.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArgDirective {
    /// The argument is a pointer. Only the pointer itself is wrapped.
    Pointer {
        /// Argument position.
        index: usize,
    },
    /// The argument points to a single struct with a wrapper.
    Struct {
        /// Argument position.
        index: usize,
        /// Printed struct type.
        ty: String,
    },
    /// The argument points to an array of structs whose length is another
    /// argument.
    ArrayOfStruct {
        /// Argument position.
        index: usize,
        /// Position of the element count argument.
        length_index: usize,
        /// Printed struct type.
        ty: String,
        /// Printed type of the element count argument.
        length_ty: String,
    },
}

impl fmt::Display for ArgDirective {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Pointer { index } => write!(f, "WRAP_SYSCALL_ARG_POINTER({})", index),
            Self::Struct { index, ty } => write!(f, "WRAP_SYSCALL_ARG_PSTRUCT({}, {})", index, ty),
            Self::ArrayOfStruct {
                index,
                length_index,
                ty,
                length_ty,
            } => write!(
                f,
                "WRAP_SYSCALL_ARG_ASTRUCT({},{},{},{})",
                index, length_index, ty, length_ty
            ),
        }
    }
}

/// How to wrap one struct field.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldDirective {
    /// A plain pointer field.
    Pointer {
        /// Field name.
        field: String,
    },
    /// A pointer to an array of structs whose length is another field.
    ArrayOfStruct {
        /// Field name.
        field: String,
        /// Name of the element count field.
        length_field: String,
    },
}

impl fmt::Display for FieldDirective {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Pointer { field } => write!(f, "WRAP_STRUCT_PFIELD({})", field),
            Self::ArrayOfStruct {
                field,
                length_field,
            } => write!(f, "WRAP_STRUCT_ASTRUCT({},{})", field, length_field),
        }
    }
}

/// A wrapper for every pointer field of a struct.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StructWrapper {
    /// Printed struct type.
    pub ty: String,
    /// Field directives, in declaration order. Never empty.
    pub fields: Vec<FieldDirective>,
}

impl fmt::Display for StructWrapper {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "WRAP_STRUCT({},", self.ty)?;
        write_joined(f, &self.fields)?;
        f.write_str(")")
    }
}

/// The decision made for one syscall.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyscallDirective {
    /// No argument needs wrapping.
    NoWrap {
        /// Syscall name.
        name: String,
    },
    /// There is no type information; every argument slot is treated as a
    /// potential pointer.
    GenericWrap {
        /// Syscall name.
        name: String,
        /// Number of argument slots to treat as pointers.
        arity: usize,
    },
    /// Wrap the listed arguments.
    Wrap {
        /// Syscall name.
        name: String,
        /// Argument directives, ordered by position. Never empty.
        args: Vec<ArgDirective>,
    },
}

impl SyscallDirective {
    /// The syscall this directive is for.
    pub fn name(&self) -> &str {
        match self {
            Self::NoWrap { name } | Self::GenericWrap { name, .. } | Self::Wrap { name, .. } => {
                name
            }
        }
    }
}

impl fmt::Display for SyscallDirective {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NoWrap { name } => write!(f, "NO_WRAP_SYSCALL({})", name),
            Self::GenericWrap { name, .. } => write!(f, "GENERIC_WRAP_SYSCALL({})", name),
            Self::Wrap { name, args } => {
                write!(f, "WRAP_SYSCALL({},", name)?;
                write_joined(f, args)?;
                f.write_str(")")
            }
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(";")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// One line of generator output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum Record {
    /// A struct wrapper. Always precedes the first record that uses it.
    Struct(StructWrapper),
    /// A syscall decision.
    Syscall(SyscallDirective),
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Struct(wrapper) => fmt::Display::fmt(wrapper, f),
            Self::Syscall(directive) => fmt::Display::fmt(directive, f),
        }
    }
}

/// Output format of the generated records.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// One macro invocation per line.
    #[default]
    Macros,
    /// One JSON object per line.
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "macros" => Ok(Self::Macros),
            "json" => Ok(Self::Json),
            _ => Err(format!("invalid format '{}', expected 'macros' or 'json'", s)),
        }
    }
}

/// Writes `records` to `w`, one per line.
pub fn emit<W: Write>(records: &[Record], format: Format, mut w: W) -> io::Result<()> {
    for record in records {
        match format {
            Format::Macros => writeln!(w, "{}", record)?,
            Format::Json => {
                serde_json::to_writer(&mut w, record)?;
                writeln!(w)?;
            }
        }
    }
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_vocabulary() {
        assert_eq!(
            ArgDirective::Pointer { index: 0 }.to_string(),
            "WRAP_SYSCALL_ARG_POINTER(0)"
        );
        assert_eq!(
            ArgDirective::Struct {
                index: 1,
                ty: "struct bar".into()
            }
            .to_string(),
            "WRAP_SYSCALL_ARG_PSTRUCT(1, struct bar)"
        );
        assert_eq!(
            ArgDirective::ArrayOfStruct {
                index: 1,
                length_index: 2,
                ty: "struct iovec".into(),
                length_ty: "int".into()
            }
            .to_string(),
            "WRAP_SYSCALL_ARG_ASTRUCT(1,2,struct iovec,int)"
        );
        assert_eq!(
            StructWrapper {
                ty: "struct msghdr".into(),
                fields: vec![
                    FieldDirective::Pointer {
                        field: "msg_name".into()
                    },
                    FieldDirective::ArrayOfStruct {
                        field: "msg_iov".into(),
                        length_field: "msg_iovlen".into()
                    },
                ],
            }
            .to_string(),
            "WRAP_STRUCT(struct msghdr,WRAP_STRUCT_PFIELD(msg_name);WRAP_STRUCT_ASTRUCT(msg_iov,msg_iovlen))"
        );
        assert_eq!(
            SyscallDirective::NoWrap {
                name: "getpid".into()
            }
            .to_string(),
            "NO_WRAP_SYSCALL(getpid)"
        );
        assert_eq!(
            SyscallDirective::GenericWrap {
                name: "bar".into(),
                arity: 6
            }
            .to_string(),
            "GENERIC_WRAP_SYSCALL(bar)"
        );
        assert_eq!(
            SyscallDirective::Wrap {
                name: "pipe".into(),
                args: vec![ArgDirective::Pointer { index: 0 }],
            }
            .to_string(),
            "WRAP_SYSCALL(pipe,WRAP_SYSCALL_ARG_POINTER(0))"
        );
    }

    #[test]
    fn emit_json() {
        let records = vec![Record::Syscall(SyscallDirective::GenericWrap {
            name: "bar".into(),
            arity: 6,
        })];
        let mut out = Vec::new();
        emit(&records, Format::Json, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"record\":\"syscall\",\"kind\":\"generic_wrap\",\"name\":\"bar\",\"arity\":6}\n"
        );
    }

    #[test]
    fn parse_format() {
        assert_eq!("json".parse(), Ok(Format::Json));
        assert_eq!("macros".parse(), Ok(Format::Macros));
        assert!("yaml".parse::<Format>().is_err());
    }
}
