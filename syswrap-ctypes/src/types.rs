/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The C type graph. Every type node lives in a [`TypeTable`] arena and is
//! referred to by a [`TypeId`]. The graph may be cyclic (a struct can point
//! back to itself), so consumers must never assume a walk terminates on its
//! own.

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

use bitflags::bitflags;

/// A handle to a type node inside a [`TypeTable`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TypeId(u32);

impl TypeId {
    /// The position of this node inside its table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Type qualifiers. None of these change the structure of a type.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct Qualifiers: u8 {
        /// `const`
        const CONST = 1 << 0;
        /// `volatile`
        const VOLATILE = 1 << 1;
        /// `restrict` (and the `__restrict` spellings)
        const RESTRICT = 1 << 2;
        /// `_Atomic`
        const ATOMIC = 1 << 3;
    }
}

impl fmt::Display for Qualifiers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for (flag, name) in [
            (Qualifiers::CONST, "const"),
            (Qualifiers::VOLATILE, "volatile"),
            (Qualifiers::RESTRICT, "__restrict"),
            (Qualifiers::ATOMIC, "_Atomic"),
        ] {
            if self.contains(flag) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Distinguishes the two kinds of field-carrying types.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AggregateKind {
    /// `struct`
    Struct,
    /// `union`
    Union,
}

impl AggregateKind {
    /// The C keyword introducing this aggregate.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::Union => "union",
        }
    }
}

/// A member of a struct or union.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Field {
    /// The declared type of the field.
    pub ty: TypeId,
    /// The field name. Anonymous members (padding bit-fields, C11 anonymous
    /// structs) have none.
    pub name: Option<String>,
}

/// A struct or union.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Aggregate {
    /// Whether this is a struct or a union.
    pub kind: AggregateKind,
    /// The tag, i.e. the `foo` in `struct foo`.
    pub tag: Option<String>,
    /// The first typedef naming this aggregate. Only used to print
    /// anonymous aggregates.
    pub alias: Option<String>,
    /// The members, in declaration order. `None` if we have only seen a
    /// forward declaration.
    pub fields: Option<Vec<Field>>,
}

/// A function parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Param {
    /// The declared parameter type.
    pub ty: TypeId,
    /// The parameter name, if the prototype gave one.
    pub name: Option<String>,
}

/// A function prototype.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FunctionType {
    /// Return type.
    pub ret: TypeId,
    /// Parameters in positional order. `f(void)` has none.
    pub params: Vec<Param>,
    /// Whether the prototype ends in `...`.
    pub variadic: bool,
}

/// A node of the type graph.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CType {
    /// An arithmetic type, `void`, or a compiler builtin like
    /// `__builtin_va_list`.
    Scalar(String),
    /// An enumeration, optionally tagged.
    Enum(Option<String>),
    /// A pointer to another type.
    Pointer(TypeId),
    /// A fixed or incomplete array.
    Array {
        /// The element type.
        element: TypeId,
        /// The declared length, when it is an integer literal.
        len: Option<u64>,
    },
    /// A function prototype.
    Function(FunctionType),
    /// A struct type.
    Struct(Aggregate),
    /// A union type.
    Union(Aggregate),
    /// A named alias for another type.
    Typedef {
        /// The typedef name.
        name: String,
        /// The aliased type.
        target: TypeId,
    },
    /// A qualified type, e.g. `const char`.
    Qualified {
        /// The qualifiers applied.
        qualifiers: Qualifiers,
        /// The qualified type.
        inner: TypeId,
    },
    /// A type carrying `__attribute__((...))` annotations.
    Attributed {
        /// The raw text of each attribute.
        attributes: Vec<String>,
        /// The annotated type.
        inner: TypeId,
    },
}

impl CType {
    fn aggregate(&self) -> Option<&Aggregate> {
        match self {
            Self::Struct(agg) | Self::Union(agg) => Some(agg),
            _ => None,
        }
    }

    fn aggregate_mut(&mut self) -> Option<&mut Aggregate> {
        match self {
            Self::Struct(agg) | Self::Union(agg) => Some(agg),
            _ => None,
        }
    }
}

/// The structural category of a type once typedefs, qualifiers and attributes
/// have been stripped away.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeKind {
    /// A function prototype.
    Function,
    /// A pointer.
    Pointer,
    /// A struct.
    Struct,
    /// A union.
    Union,
    /// An array.
    Array,
    /// An arithmetic or builtin type.
    Scalar,
    /// Anything else (enumerations).
    Other,
}

/// Arena that owns every type node produced while parsing a translation unit.
///
/// Tagged structs and unions are interned by name: every mention of
/// `struct foo` yields the same [`TypeId`], and a later definition completes
/// an earlier forward declaration in place. Anonymous aggregates are never
/// deduplicated.
#[derive(Debug, Default)]
pub struct TypeTable {
    nodes: Vec<CType>,
    aggregates: HashMap<(AggregateKind, String), TypeId>,
    typedefs: HashMap<String, TypeId>,
    scalars: HashMap<String, TypeId>,
}

impl TypeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the table.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node has been added yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a node and returns its handle.
    pub fn add(&mut self, ty: CType) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(ty);
        id
    }

    /// Gets the node behind a handle.
    pub fn get(&self, id: TypeId) -> &CType {
        &self.nodes[id.index()]
    }

    /// Returns the interned scalar type with the given spelling.
    pub fn scalar(&mut self, name: &str) -> TypeId {
        if let Some(&id) = self.scalars.get(name) {
            return id;
        }
        let id = self.add(CType::Scalar(name.to_owned()));
        self.scalars.insert(name.to_owned(), id);
        id
    }

    /// Creates a pointer to `pointee`.
    pub fn pointer_to(&mut self, pointee: TypeId) -> TypeId {
        self.add(CType::Pointer(pointee))
    }

    /// Wraps `inner` with qualifiers. Empty qualifier sets are a no-op.
    pub fn qualify(&mut self, inner: TypeId, qualifiers: Qualifiers) -> TypeId {
        if qualifiers.is_empty() {
            inner
        } else {
            self.add(CType::Qualified { qualifiers, inner })
        }
    }

    /// Wraps `inner` with attributes. An empty attribute list is a no-op.
    pub fn attribute(&mut self, inner: TypeId, attributes: Vec<String>) -> TypeId {
        if attributes.is_empty() {
            inner
        } else {
            self.add(CType::Attributed { attributes, inner })
        }
    }

    /// Returns the unique node for `struct tag` / `union tag`, creating a
    /// forward declaration if the tag has not been seen yet.
    pub fn intern_aggregate(&mut self, kind: AggregateKind, tag: &str) -> TypeId {
        if let Some(&id) = self.aggregates.get(&(kind, tag.to_owned())) {
            return id;
        }
        let id = self.anonymous_aggregate(kind);
        if let Some(agg) = self.nodes[id.index()].aggregate_mut() {
            agg.tag = Some(tag.to_owned());
        }
        self.aggregates.insert((kind, tag.to_owned()), id);
        id
    }

    /// Creates a fresh aggregate without a tag.
    pub fn anonymous_aggregate(&mut self, kind: AggregateKind) -> TypeId {
        let agg = Aggregate {
            kind,
            tag: None,
            alias: None,
            fields: None,
        };
        self.add(match kind {
            AggregateKind::Struct => CType::Struct(agg),
            AggregateKind::Union => CType::Union(agg),
        })
    }

    /// Completes an aggregate with its member list. Returns false (and leaves
    /// the node untouched) if the aggregate was already defined.
    pub fn define_fields(&mut self, id: TypeId, fields: Vec<Field>) -> bool {
        match self.nodes[id.index()].aggregate_mut() {
            Some(agg) if agg.fields.is_none() => {
                agg.fields = Some(fields);
                true
            }
            _ => false,
        }
    }

    /// Registers a typedef and returns the typedef node.
    pub fn add_typedef(&mut self, name: &str, target: TypeId) -> TypeId {
        // Remember the first name given to an anonymous aggregate so that it
        // can be printed.
        let resolved = self.resolve(target);
        if let Some(agg) = self.nodes[resolved.index()].aggregate_mut() {
            if agg.tag.is_none() && agg.alias.is_none() {
                agg.alias = Some(name.to_owned());
            }
        }

        let id = self.add(CType::Typedef {
            name: name.to_owned(),
            target,
        });
        self.typedefs.entry(name.to_owned()).or_insert(id);
        id
    }

    /// Looks up a typedef by name.
    pub fn typedef(&self, name: &str) -> Option<TypeId> {
        self.typedefs.get(name).copied()
    }

    /// Looks up a tagged aggregate without creating it.
    pub fn aggregate(&self, kind: AggregateKind, tag: &str) -> Option<TypeId> {
        self.aggregates.get(&(kind, tag.to_owned())).copied()
    }

    /// Strips typedefs, qualifiers and attributes until a structural node is
    /// reached.
    pub fn resolve(&self, mut id: TypeId) -> TypeId {
        loop {
            match self.get(id) {
                CType::Typedef { target, .. } => id = *target,
                CType::Qualified { inner, .. } | CType::Attributed { inner, .. } => id = *inner,
                _ => return id,
            }
        }
    }

    /// Strips attribute annotations only.
    pub fn unattributed(&self, mut id: TypeId) -> TypeId {
        while let CType::Attributed { inner, .. } = self.get(id) {
            id = *inner;
        }
        id
    }

    /// The structural category of `id`.
    pub fn kind(&self, id: TypeId) -> TypeKind {
        match self.get(self.resolve(id)) {
            CType::Function(_) => TypeKind::Function,
            CType::Pointer(_) => TypeKind::Pointer,
            CType::Struct(_) => TypeKind::Struct,
            CType::Union(_) => TypeKind::Union,
            CType::Array { .. } => TypeKind::Array,
            CType::Scalar(_) => TypeKind::Scalar,
            CType::Enum(_) => TypeKind::Other,
            CType::Typedef { .. } | CType::Qualified { .. } | CType::Attributed { .. } => {
                unreachable!("resolve() strips non-structural nodes")
            }
        }
    }

    /// The type pointed to by `id`, if it resolves to a pointer.
    pub fn pointee(&self, id: TypeId) -> Option<TypeId> {
        match self.get(self.resolve(id)) {
            CType::Pointer(pointee) => Some(*pointee),
            _ => None,
        }
    }

    /// The prototype of `id`, if it resolves to a function.
    pub fn function(&self, id: TypeId) -> Option<&FunctionType> {
        match self.get(self.resolve(id)) {
            CType::Function(func) => Some(func),
            _ => None,
        }
    }

    /// The struct or union behind `id`, if any.
    pub fn aggregate_of(&self, id: TypeId) -> Option<&Aggregate> {
        self.get(self.resolve(id)).aggregate()
    }

    /// The declared members of the struct or union behind `id`, in order.
    /// Forward declarations and non-aggregates have no members.
    pub fn fields(&self, id: TypeId) -> &[Field] {
        self.aggregate_of(id)
            .and_then(|agg| agg.fields.as_deref())
            .unwrap_or(&[])
    }
}

impl Index<TypeId> for TypeTable {
    type Output = CType;

    fn index(&self, id: TypeId) -> &CType {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_aggregates_are_interned() {
        let mut table = TypeTable::new();
        let a = table.intern_aggregate(AggregateKind::Struct, "iovec");
        let b = table.intern_aggregate(AggregateKind::Struct, "iovec");
        let u = table.intern_aggregate(AggregateKind::Union, "iovec");
        assert_eq!(a, b);
        assert_ne!(a, u);

        let x = table.anonymous_aggregate(AggregateKind::Struct);
        let y = table.anonymous_aggregate(AggregateKind::Struct);
        assert_ne!(x, y);
    }

    #[test]
    fn definition_completes_forward_declaration() {
        let mut table = TypeTable::new();
        let id = table.intern_aggregate(AggregateKind::Struct, "bar");
        assert!(table.fields(id).is_empty());

        let int = table.scalar("int");
        let field = Field {
            ty: table.pointer_to(int),
            name: Some("p".into()),
        };
        assert!(table.define_fields(id, vec![field.clone()]));
        assert!(!table.define_fields(id, Vec::new()));
        assert_eq!(table.fields(id), &[field]);
    }

    #[test]
    fn resolve_strips_wrappers() {
        let mut table = TypeTable::new();
        let int = table.scalar("int");
        let ptr = table.pointer_to(int);
        let td = table.add_typedef("int_ptr", ptr);
        let qualified = table.qualify(td, Qualifiers::CONST);
        let attributed = table.attribute(qualified, vec!["__aligned__(8)".into()]);

        assert_eq!(table.resolve(attributed), ptr);
        assert_eq!(table.unattributed(attributed), qualified);
        assert_eq!(table.kind(attributed), TypeKind::Pointer);
        assert_eq!(table.pointee(attributed), Some(int));
        assert_eq!(table.kind(int), TypeKind::Scalar);
    }

    #[test]
    fn typedef_names_anonymous_aggregate() {
        let mut table = TypeTable::new();
        let anon = table.anonymous_aggregate(AggregateKind::Union);
        table.add_typedef("__SOCKADDR_ARG", anon);
        table.add_typedef("other_name", anon);
        assert_eq!(
            table.aggregate_of(anon).and_then(|agg| agg.alias.as_deref()),
            Some("__SOCKADDR_ARG")
        );
    }

    #[test]
    fn qualifiers_display() {
        assert_eq!(Qualifiers::CONST.to_string(), "const");
        assert_eq!(
            (Qualifiers::CONST | Qualifiers::VOLATILE).to_string(),
            "const volatile"
        );
        assert_eq!(Qualifiers::empty().to_string(), "");
    }
}
