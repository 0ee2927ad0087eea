/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Pure predicates over the type graph.

use syswrap_ctypes::TypeId;
use syswrap_ctypes::TypeKind;
use syswrap_ctypes::TypeTable;

/// Returns true if `ty` is a pointer to a function. Callbacks are never
/// wrapped.
pub fn is_function_pointer(types: &TypeTable, ty: TypeId) -> bool {
    match types.kind(ty) {
        TypeKind::Pointer => types
            .pointee(ty)
            .map_or(false, |pointee| types.kind(pointee) == TypeKind::Function),
        TypeKind::Function
        | TypeKind::Struct
        | TypeKind::Union
        | TypeKind::Array
        | TypeKind::Scalar
        | TypeKind::Other => false,
    }
}

/// If `ty` is a union, returns the (resolved) type of its first pointer
/// member. This covers transparent unions such as `__SOCKADDR_ARG`, where one
/// argument slot holds one of several pointer types.
pub fn pointer_in_union(types: &TypeTable, ty: TypeId) -> Option<TypeId> {
    match types.kind(ty) {
        TypeKind::Union => types
            .fields(ty)
            .iter()
            .map(|field| types.resolve(field.ty))
            .find(|&field| types.kind(field) == TypeKind::Pointer),
        TypeKind::Function
        | TypeKind::Pointer
        | TypeKind::Struct
        | TypeKind::Array
        | TypeKind::Scalar
        | TypeKind::Other => None,
    }
}
