// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Contexts and the cache that canonicalizes them.
//!
//! A [`Context`] is a bounded sequence of [`CtxElem`]s — call sites for
//! k-CFA, heap objects for k-object-sensitivity. [`ContextCache`] interns
//! these sequences into dense [`ContextId`]s, guaranteeing invariant 5 of §3:
//! there is exactly one empty context, always `ContextId`'s zeroth slot.

use std::collections::HashMap;
use std::rc::Rc;

use crate::cs_manager::CSObjId;
use crate::ir::InvokeId;
use crate::util::index::define_index;

define_index!(
    /// A canonical, interned context.
    ContextId
);

/// One element of a bounded calling/allocation history.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum CtxElem {
    /// A call site, used by call-site-sensitive (k-CFA) strategies.
    CallSite(InvokeId),
    /// A heap object, used by object-sensitive strategies.
    Obj(CSObjId),
}

pub type Context = Rc<Vec<CtxElem>>;

/// Interns [`Context`]s by structural equality so that `get_or_intern` is
/// idempotent, matching the CS Manager's canonicalization invariant (§3.1).
pub struct ContextCache {
    arena: Vec<Context>,
    ids: HashMap<Context, ContextId>,
}

impl ContextCache {
    pub fn new() -> Self {
        let mut cache = ContextCache { arena: Vec::new(), ids: HashMap::new() };
        let empty_id = cache.get_or_intern(Vec::new());
        debug_assert_eq!(empty_id, ContextId::from_usize(0));
        cache
    }

    /// The single distinguished empty context (invariant 5, §3).
    #[inline]
    pub fn empty_context(&self) -> ContextId {
        ContextId::from_usize(0)
    }

    pub fn get_or_intern(&mut self, elems: Vec<CtxElem>) -> ContextId {
        let elems: Context = Rc::new(elems);
        if let Some(id) = self.ids.get(&elems) {
            return *id;
        }
        let id = ContextId::from_usize(self.arena.len());
        self.arena.push(elems.clone());
        self.ids.insert(elems, id);
        id
    }

    pub fn context_of(&self, id: ContextId) -> &Context {
        &self.arena[id.as_usize()]
    }

    /// Extends `base` by `new_elem`, keeping at most the last `k` elements
    /// (k-limited context composition, per the Context Selector of §4).
    /// `k == 0` always yields the empty context — full context-insensitivity.
    pub fn k_limited_extend(&mut self, base: ContextId, new_elem: CtxElem, k: usize) -> ContextId {
        if k == 0 {
            return self.empty_context();
        }
        let base_elems = self.context_of(base).clone();
        let start = base_elems.len().saturating_sub(k - 1);
        let mut elems: Vec<CtxElem> = base_elems[start..].to_vec();
        elems.push(new_elem);
        self.get_or_intern(elems)
    }
}

impl Default for ContextCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut cache = ContextCache::new();
        let c1 = cache.get_or_intern(vec![CtxElem::CallSite(InvokeId::from_usize(1))]);
        let c2 = cache.get_or_intern(vec![CtxElem::CallSite(InvokeId::from_usize(1))]);
        assert_eq!(c1, c2);
        let c3 = cache.get_or_intern(vec![CtxElem::CallSite(InvokeId::from_usize(2))]);
        assert_ne!(c1, c3);
    }

    #[test]
    fn k_limit_keeps_only_last_k_elements() {
        let mut cache = ContextCache::new();
        let empty = cache.empty_context();
        let c1 = cache.k_limited_extend(empty, CtxElem::CallSite(InvokeId::from_usize(1)), 2);
        let c2 = cache.k_limited_extend(c1, CtxElem::CallSite(InvokeId::from_usize(2)), 2);
        let c3 = cache.k_limited_extend(c2, CtxElem::CallSite(InvokeId::from_usize(3)), 2);
        assert_eq!(cache.context_of(c3).len(), 2);
        // c3 should equal directly interning [2,3]
        let direct = cache.get_or_intern(vec![
            CtxElem::CallSite(InvokeId::from_usize(2)),
            CtxElem::CallSite(InvokeId::from_usize(3)),
        ]);
        assert_eq!(c3, direct);
    }

    #[test]
    fn zero_limited_context_is_always_empty() {
        let mut cache = ContextCache::new();
        let empty = cache.empty_context();
        let c1 = cache.k_limited_extend(empty, CtxElem::CallSite(InvokeId::from_usize(1)), 0);
        assert_eq!(c1, empty);
    }
}
