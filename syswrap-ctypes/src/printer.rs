/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Prints types back out as C. The output is what a C compiler would accept
//! as a type name in a cast, e.g. `const char *` or `void (*)(int)`.

use core::fmt;

use crate::types::Aggregate;
use crate::types::CType;
use crate::types::TypeId;
use crate::types::TypeTable;

/// A wrapper that combines a type table and a type. Displaying it prints the
/// type as a C abstract declarator.
pub struct TypeDisplay<'a> {
    table: &'a TypeTable,
    id: TypeId,
    name: Option<&'a str>,
}

impl<'a> fmt::Display for TypeDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = self.name.unwrap_or_default().to_owned();
        f.write_str(&declarator(self.table, self.id, inner))
    }
}

impl TypeTable {
    /// Returns an object that displays `id` as a C type name.
    pub fn display(&self, id: TypeId) -> TypeDisplay<'_> {
        TypeDisplay {
            table: self,
            id,
            name: None,
        }
    }

    /// Returns an object that displays a declaration of `name` with type `id`.
    pub fn display_decl<'a>(&'a self, id: TypeId, name: &'a str) -> TypeDisplay<'a> {
        TypeDisplay {
            table: self,
            id,
            name: Some(name),
        }
    }
}

fn join(base: &str, inner: &str) -> String {
    if inner.is_empty() {
        base.to_owned()
    } else {
        format!("{} {}", base, inner)
    }
}

fn aggregate_name(table: &TypeTable, agg: &Aggregate) -> String {
    let keyword = agg.kind.keyword();
    if let Some(tag) = &agg.tag {
        return format!("{} {}", keyword, tag);
    }
    if let Some(alias) = &agg.alias {
        return alias.clone();
    }
    match &agg.fields {
        None => keyword.to_owned(),
        Some(fields) => {
            let mut s = format!("{} {{", keyword);
            for field in fields {
                let name = field.name.clone().unwrap_or_default();
                s.push(' ');
                s.push_str(&declarator(table, field.ty, name));
                s.push(';');
            }
            s.push_str(" }");
            s
        }
    }
}

/// Builds the declaration of `inner` (an identifier, or a partially built
/// declarator) with type `id`. Declarators are built inside out.
fn declarator(table: &TypeTable, id: TypeId, inner: String) -> String {
    match table.get(id) {
        CType::Scalar(name) => join(name, &inner),
        CType::Enum(tag) => match tag {
            Some(tag) => join(&format!("enum {}", tag), &inner),
            None => join("enum", &inner),
        },
        CType::Struct(agg) | CType::Union(agg) => join(&aggregate_name(table, agg), &inner),
        CType::Typedef { name, .. } => join(name, &inner),
        CType::Attributed { inner: ty, .. } => declarator(table, *ty, inner),
        CType::Qualified { qualifiers, inner: ty } => {
            match table.get(table.unattributed(*ty)) {
                // Qualifiers on a pointer go after the `*`.
                CType::Pointer(pointee) => {
                    let star = if inner.is_empty() {
                        format!("*{}", qualifiers)
                    } else {
                        format!("*{} {}", qualifiers, inner)
                    };
                    pointer_declarator(table, *pointee, star)
                }
                _ => format!("{} {}", qualifiers, declarator(table, *ty, inner)),
            }
        }
        CType::Pointer(pointee) => pointer_declarator(table, *pointee, format!("*{}", inner)),
        CType::Array { element, len } => {
            let suffix = match len {
                Some(len) => format!("{}[{}]", inner, len),
                None => format!("{}[]", inner),
            };
            declarator(table, *element, suffix)
        }
        CType::Function(func) => {
            let mut params = func
                .params
                .iter()
                .map(|param| declarator(table, param.ty, param.name.clone().unwrap_or_default()))
                .collect::<Vec<_>>();
            if func.variadic {
                params.push("...".to_owned());
            }
            let params = if params.is_empty() {
                "void".to_owned()
            } else {
                params.join(", ")
            };
            declarator(table, func.ret, format!("{}({})", inner, params))
        }
    }
}

fn pointer_declarator(table: &TypeTable, pointee: TypeId, star: String) -> String {
    match table.get(table.unattributed(pointee)) {
        CType::Array { .. } | CType::Function(_) => declarator(table, pointee, format!("({})", star)),
        _ => declarator(table, pointee, star),
    }
}
