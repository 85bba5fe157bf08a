// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Canonicalizes context-sensitive elements (§4.1).
//!
//! The "seven nested mappings" of the distilled spec collapse to two arenas
//! here: contexts ([`crate::context::ContextCache`]) and heap objects
//! (`CSManager`'s own `obj_arena`). CSVar/InstanceField/ArrayIndex/StaticField
//! need no separate canonicalization table of their own — as a tagged
//! [`Pointer`] enum deriving structural equality, two equal-by-value
//! `Pointer`s already *are* the same CS element; the remaining
//! canonicalization work (assigning each one a single points-to set) is the
//! pointer-flow graph's node map (`graph::pfg::Pfg`), exactly mirroring how
//! the teacher's own `PAG<P>::values: HashMap<P, NodeId>` does double duty as
//! both a canonicalization table and a points-to-set key.
//!
//! `null`-argument failures from the distilled spec have no counterpart
//! here: Rust's `Option<Var>` already rules out the null case at the type
//! level, so every getter below is infallible.

use std::collections::HashMap;

use crate::context::ContextId;
use crate::heap::Obj;
use crate::ir::{Field, MethodId, Var};
use crate::util::index::define_index;

define_index!(
    /// A canonical, interned (Context, Obj) pair.
    CSObjId
);

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct CSObj {
    pub heap_ctx: ContextId,
    pub obj: Obj,
}

/// A context-sensitive method: `(Context, Method)`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct CSMethod {
    pub ctx: ContextId,
    pub method: MethodId,
}

/// A context-sensitive call site: `(Context, Invoke)`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct CSCallSite {
    pub ctx: ContextId,
    pub invoke: crate::ir::InvokeId,
}

/// The tagged union of pointer kinds named in §3. Each variant is a PFG node
/// and owns exactly one points-to set (invariant 3).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Pointer {
    CSVar(ContextId, Var),
    InstanceField(CSObjId, Field),
    /// Array indices are collapsed per-object (§3): one pointer per array.
    ArrayIndex(CSObjId),
    StaticField(Field),
}

/// Canonicalizes CS elements and owns the heap-object arena.
pub struct CSManager {
    pub contexts: crate::context::ContextCache,
    obj_arena: Vec<CSObj>,
    obj_ids: HashMap<CSObj, CSObjId>,
}

impl CSManager {
    pub fn new() -> Self {
        CSManager { contexts: crate::context::ContextCache::new(), obj_arena: Vec::new(), obj_ids: HashMap::new() }
    }

    /// `getCSObj(heapCtx, obj)`. Idempotent: the same `(heap_ctx, obj)` pair
    /// always returns the same id.
    pub fn get_cs_obj(&mut self, heap_ctx: ContextId, obj: Obj) -> CSObjId {
        let cs_obj = CSObj { heap_ctx, obj };
        if let Some(id) = self.obj_ids.get(&cs_obj) {
            return *id;
        }
        let id = CSObjId::from_usize(self.obj_arena.len());
        self.obj_arena.push(cs_obj.clone());
        self.obj_ids.insert(cs_obj, id);
        id
    }

    pub fn cs_obj(&self, id: CSObjId) -> &CSObj {
        &self.obj_arena[id.as_usize()]
    }

    /// Streaming accessor: `objects()`.
    pub fn objects(&self) -> impl Iterator<Item = (CSObjId, &CSObj)> {
        self.obj_arena.iter().enumerate().map(|(i, o)| (CSObjId::from_usize(i), o))
    }

    #[inline]
    pub fn get_cs_var(&self, ctx: ContextId, var: Var) -> Pointer {
        Pointer::CSVar(ctx, var)
    }

    #[inline]
    pub fn get_cs_method(&self, ctx: ContextId, method: MethodId) -> CSMethod {
        CSMethod { ctx, method }
    }

    #[inline]
    pub fn get_cs_call_site(&self, ctx: ContextId, invoke: crate::ir::InvokeId) -> CSCallSite {
        CSCallSite { ctx, invoke }
    }

    #[inline]
    pub fn get_instance_field(&self, base: CSObjId, field: Field) -> Pointer {
        Pointer::InstanceField(base, field)
    }

    #[inline]
    pub fn get_array_index(&self, base: CSObjId) -> Pointer {
        Pointer::ArrayIndex(base)
    }

    #[inline]
    pub fn get_static_field(&self, field: Field) -> Pointer {
        Pointer::StaticField(field)
    }
}

impl Default for CSManager {
    fn default() -> Self {
        Self::new()
    }
}
