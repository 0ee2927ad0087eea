/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Turns syscall prototypes into wrap directives.

use std::collections::BTreeSet;

use syswrap_ctypes::parse;
use syswrap_ctypes::FunctionType;
use syswrap_ctypes::TranslationUnit;
use syswrap_ctypes::TypeId;
use syswrap_ctypes::TypeKind;
use syswrap_ctypes::TypeTable;
use tracing::debug;
use tracing::info;

use crate::classify::is_function_pointer;
use crate::classify::pointer_in_union;
use crate::config::Config;
use crate::config::MAX_SYSCALL_ARGS;
use crate::directive::ArgDirective;
use crate::directive::Record;
use crate::directive::SyscallDirective;
use crate::error::ConfigError;
use crate::error::Error;
use crate::extract::Extractor;
use crate::extract::SyscallSource;
use crate::memo::StructMemo;
use crate::pairing::PairingTable;
use crate::pairing::PairingValue;

/// The state of one generator run.
///
/// Records are produced in the order decisions are made. A struct wrapper is
/// pushed as soon as its walk finishes, so it always precedes the syscall (or
/// the enclosing struct) that first refers to it.
#[derive(Debug)]
pub struct Generator<'a> {
    pub(crate) types: &'a TypeTable,
    pub(crate) pairings: &'a PairingTable,
    pub(crate) memo: StructMemo,
    max_args: usize,
    records: Vec<Record>,
}

impl<'a> Generator<'a> {
    /// Creates a run over `types`, with the default generic arity.
    pub fn new(types: &'a TypeTable, pairings: &'a PairingTable) -> Self {
        Self::with_max_args(types, pairings, MAX_SYSCALL_ARGS)
    }

    /// Creates a run whose generic wrappers cover `max_args` argument slots.
    pub fn with_max_args(types: &'a TypeTable, pairings: &'a PairingTable, max_args: usize) -> Self {
        Self {
            types,
            pairings,
            memo: StructMemo::new(),
            max_args,
            records: Vec::new(),
        }
    }

    /// Records emitted so far.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The struct decisions made so far.
    pub fn memo(&self) -> &StructMemo {
        &self.memo
    }

    /// Consumes the run, returning its records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub(crate) fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Emits the directive for syscall `name` declared with type `ty`, preceded
    /// by any struct wrappers it needs that have not been emitted yet.
    pub fn wrap_syscall(&mut self, name: &str, ty: TypeId) -> Result<(), Error> {
        let directive = self.syscall_directive(name, ty)?;
        debug!("{} -> {}", name, directive);
        self.push(Record::Syscall(directive));
        Ok(())
    }

    /// Emits a generic wrapper for a syscall we have no prototype for.
    pub fn generic_wrap(&mut self, name: &str) {
        debug!("{} has no declaration, wrapping {} slots", name, self.max_args);
        self.push(Record::Syscall(SyscallDirective::GenericWrap {
            name: name.to_owned(),
            arity: self.max_args,
        }));
    }

    fn syscall_directive(&mut self, name: &str, ty: TypeId) -> Result<SyscallDirective, Error> {
        let types = self.types;
        let func = match types.function(types.unattributed(ty)) {
            Some(func) => func,
            None => {
                return Ok(SyscallDirective::NoWrap {
                    name: name.to_owned(),
                });
            }
        };

        let mut args = Vec::new();
        for (index, param) in func.params.iter().enumerate() {
            let ty = types.resolve(param.ty);
            let directive = match types.kind(ty) {
                TypeKind::Pointer if is_function_pointer(types, ty) => None,
                TypeKind::Pointer => self.pointer_arg(name, func, index, ty)?,
                TypeKind::Array => None,
                // Any member of the union may be passed, so even a union
                // whose first pointer is a callback is wrapped.
                TypeKind::Function
                | TypeKind::Struct
                | TypeKind::Union
                | TypeKind::Scalar
                | TypeKind::Other => match pointer_in_union(types, ty) {
                    Some(pointer) => self.pointer_arg(name, func, index, pointer)?,
                    None => None,
                },
            };
            args.extend(directive);
        }

        if args.is_empty() {
            Ok(SyscallDirective::NoWrap {
                name: name.to_owned(),
            })
        } else {
            Ok(SyscallDirective::Wrap {
                name: name.to_owned(),
                args,
            })
        }
    }

    /// The directive for argument `index`, which is the pointer `ty`.
    fn pointer_arg(
        &mut self,
        syscall: &str,
        func: &FunctionType,
        index: usize,
        ty: TypeId,
    ) -> Result<Option<ArgDirective>, Error> {
        let pointee = self.types.pointee(ty).map(|p| self.types.resolve(p));
        match pointee {
            Some(pointee) if self.types.kind(pointee) == TypeKind::Struct => {
                self.struct_arg(syscall, func, index, pointee)
            }
            _ => Ok(Some(ArgDirective::Pointer { index })),
        }
    }

    /// The directive for argument `index`, which points to the struct `id`.
    fn struct_arg(
        &mut self,
        syscall: &str,
        func: &FunctionType,
        index: usize,
        id: TypeId,
    ) -> Result<Option<ArgDirective>, Error> {
        if !self.needs_wrapper(id)? {
            return Ok(Some(ArgDirective::Pointer { index }));
        }

        let types = self.types;
        let ty = types.display(id).to_string();
        match self.pairings.get(syscall, &ty) {
            None => Ok(Some(ArgDirective::Struct { index, ty })),
            Some(PairingValue::Offset(offset)) => {
                // Saturates, which is out of range for any parameter list.
                let length_index = (index as isize).saturating_add(*offset);
                let param = usize::try_from(length_index)
                    .ok()
                    .and_then(|j| func.params.get(j).map(|param| (j, param)));
                match param {
                    Some((length_index, param)) => Ok(Some(ArgDirective::ArrayOfStruct {
                        index,
                        length_index,
                        ty,
                        length_ty: types.display(param.ty).to_string(),
                    })),
                    None => Err(ConfigError::LengthOutOfRange {
                        owner: syscall.to_owned(),
                        member: ty,
                        index,
                        length_index,
                        arity: func.params.len(),
                    }
                    .into()),
                }
            }
            Some(PairingValue::Field(_)) => Err(ConfigError::ExpectedOffset {
                owner: syscall.to_owned(),
                member: ty,
            }
            .into()),
        }
    }
}

/// Generates the records for every syscall in `source`.
///
/// Declarations are visited in source order and each known syscall is
/// matched at most once. Known syscalls without a declaration get generic
/// wrappers, emitted last in name order.
pub fn generate(
    source: &SyscallSource,
    unit: &TranslationUnit,
    pairings: &PairingTable,
    config: &Config,
) -> Result<Vec<Record>, Error> {
    let mut pending: BTreeSet<&str> = source.names.iter().map(String::as_str).collect();
    let mut gen = Generator::with_max_args(&unit.types, pairings, config.max_args);

    for decl in unit.declarations() {
        if pending.remove(decl.name.as_str()) {
            gen.wrap_syscall(&decl.name, decl.ty)?;
        }
    }

    let declared = source.names.len() - pending.len();
    for name in &pending {
        gen.generic_wrap(name);
    }

    info!(
        "Generated directives for {} syscalls ({} declared, {} generic), {} struct wrappers",
        source.names.len(),
        declared,
        pending.len(),
        gen.records()
            .iter()
            .filter(|r| matches!(r, Record::Struct(_)))
            .count(),
    );

    Ok(gen.into_records())
}

/// Extracts, parses and generates in one go.
pub fn run(input: &str, pairings: &PairingTable, config: &Config) -> Result<Vec<Record>, Error> {
    let extractor = Extractor::new(&config.syscall_prefix)?;
    let source = extractor.extract(input.lines());
    let unit = parse(&source.declarations)?;
    generate(&source, &unit, pairings, config)
}
