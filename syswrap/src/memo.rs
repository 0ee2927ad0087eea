/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Decides, once per struct, whether the struct needs a field wrapper.

use std::collections::HashMap;

use syswrap_ctypes::TypeId;
use syswrap_ctypes::TypeKind;
use tracing::trace;

use crate::classify::is_function_pointer;
use crate::directive::FieldDirective;
use crate::directive::Record;
use crate::directive::StructWrapper;
use crate::error::ConfigError;
use crate::error::Error;
use crate::generate::Generator;
use crate::pairing::PairingValue;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Entry {
    /// The struct is being walked. Reaching it again means the type graph
    /// has a cycle through it; it is assumed to need a wrapper.
    Provisional,
    Resolved(bool),
}

/// Per-run memo of struct wrapper decisions, keyed by interned struct type.
#[derive(Debug, Default)]
pub struct StructMemo {
    entries: HashMap<TypeId, Entry>,
}

impl StructMemo {
    /// Creates an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded decision for `id`. Structs still being walked answer
    /// `true`.
    pub fn get(&self, id: TypeId) -> Option<bool> {
        self.entries.get(&id).map(|entry| match entry {
            Entry::Provisional => true,
            Entry::Resolved(wraps) => *wraps,
        })
    }

    /// Returns true if a decision for `id` is final.
    pub fn is_resolved(&self, id: TypeId) -> bool {
        matches!(self.entries.get(&id), Some(Entry::Resolved(_)))
    }

    fn mark_provisional(&mut self, id: TypeId) {
        self.entries.insert(id, Entry::Provisional);
    }

    fn resolve(&mut self, id: TypeId, wraps: bool) {
        self.entries.insert(id, Entry::Resolved(wraps));
    }

    /// Number of structs seen so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no struct has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> Generator<'a> {
    /// Returns true if the struct `id` has pointer fields that must be
    /// wrapped. The first time a struct is found to need a wrapper, a
    /// [`Record::Struct`] is emitted for it.
    ///
    /// A struct that reaches itself through paired array fields is assumed to
    /// need a wrapper rather than being walked forever. Structs with no
    /// pointer fields, including ones we only have a forward declaration for,
    /// never get a wrapper.
    pub fn needs_wrapper(&mut self, id: TypeId) -> Result<bool, Error> {
        let types = self.types;
        let pairings = self.pairings;
        let id = types.resolve(id);

        if let Some(wraps) = self.memo.get(id) {
            return Ok(wraps);
        }
        self.memo.mark_provisional(id);

        let name = types.display(id).to_string();
        let mut fields = Vec::new();

        for field in types.fields(id) {
            let field_name = match &field.name {
                Some(name) => name,
                None => continue,
            };
            let ty = types.resolve(field.ty);
            if types.kind(ty) != TypeKind::Pointer || is_function_pointer(types, ty) {
                continue;
            }

            match pairings.get(&name, field_name) {
                None => fields.push(FieldDirective::Pointer {
                    field: field_name.clone(),
                }),
                Some(PairingValue::Field(length_field)) => {
                    let pointee = types.pointee(ty).map(|p| types.resolve(p));
                    let wrapped = match pointee {
                        Some(p) if types.kind(p) == TypeKind::Struct => self.needs_wrapper(p)?,
                        _ => false,
                    };
                    if !wrapped {
                        return Err(ConfigError::NotAWrappedStruct {
                            owner: name,
                            member: field_name.clone(),
                            pointee: pointee
                                .map(|p| types.display(p).to_string())
                                .unwrap_or_default(),
                        }
                        .into());
                    }
                    if !types
                        .fields(id)
                        .iter()
                        .any(|f| f.name.as_deref() == Some(length_field.as_str()))
                    {
                        return Err(ConfigError::UnknownField {
                            owner: name,
                            member: field_name.clone(),
                            field: length_field.clone(),
                        }
                        .into());
                    }
                    fields.push(FieldDirective::ArrayOfStruct {
                        field: field_name.clone(),
                        length_field: length_field.clone(),
                    });
                }
                Some(PairingValue::Offset(_)) => {
                    return Err(ConfigError::ExpectedField {
                        owner: name,
                        member: field_name.clone(),
                    }
                    .into());
                }
            }
        }

        if fields.is_empty() {
            trace!("{} has no pointer fields", name);
            self.memo.resolve(id, false);
            return Ok(false);
        }

        // An inline body cannot be spliced into the macro arguments.
        let named = types
            .aggregate_of(id)
            .map_or(false, |agg| agg.tag.is_some() || agg.alias.is_some());
        if !named {
            return Err(Error::UnnamedStruct(name));
        }

        trace!("{} needs a wrapper for {} fields", name, fields.len());
        self.memo.resolve(id, true);
        self.push(Record::Struct(StructWrapper { ty: name, fields }));
        Ok(true)
    }
}
