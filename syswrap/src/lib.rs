/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Generates the directives that tell a taint-tracking runtime which syscall
//! arguments carry pointers.
//!
//! The input is preprocessed C: the `#define __NR_<name>` lines name the
//! syscalls, and the declarations describe their prototypes. For every known
//! syscall exactly one [`SyscallDirective`] is produced:
//!
//!  - [`SyscallDirective::Wrap`] lists the pointer arguments. Pointers to
//!    structs that themselves contain pointers are described by a
//!    [`StructWrapper`], emitted once before its first use.
//!  - [`SyscallDirective::NoWrap`] when no argument carries a pointer.
//!  - [`SyscallDirective::GenericWrap`] when there is no prototype to look at.
//!
//! ```
//! use syswrap::Config;
//! use syswrap::PairingTable;
//!
//! let input = "#define __NR_foo 1\n\
//!              struct bar { int *p; };\n\
//!              void foo (int x, struct bar *b);\n";
//! let records = syswrap::run(input, &PairingTable::linux(), &Config::default()).unwrap();
//! assert_eq!(records[0].to_string(), "WRAP_STRUCT(struct bar,WRAP_STRUCT_PFIELD(p))");
//! assert_eq!(
//!     records[1].to_string(),
//!     "WRAP_SYSCALL(foo,WRAP_SYSCALL_ARG_PSTRUCT(1, struct bar))"
//! );
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod classify;
mod config;
mod directive;
mod error;
mod extract;
mod generate;
mod memo;
mod pairing;

pub use crate::classify::*;
pub use crate::config::*;
pub use crate::directive::*;
pub use crate::error::*;
pub use crate::extract::*;
pub use crate::generate::*;
pub use crate::memo::StructMemo;
pub use crate::pairing::*;
