// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Reflective/dynamic-dispatch calls the solver cannot resolve soundly
//! (§7, §8 scenario 5: `Class.forName(...).newInstance()`-style code).
//!
//! The solver already records every call site where dispatch failed because
//! [`crate::heap::HeapModel::type_of`] returned `None` for the receiver's
//! dynamic type, in `Solver::unsound_invokes`. This module only turns that
//! raw set into a report a caller can act on; it adds no analysis of its
//! own, since soundly resolving reflection is out of scope (§1 Non-goals).

use crate::ir::{Invoke, InvokeId};
use crate::solver::Solver;

/// One call site the solver could not dispatch because its receiver's
/// dynamic type was unknown.
#[derive(Clone, Debug)]
pub struct UnsoundCallSite {
    pub invoke: InvokeId,
    pub signature: std::rc::Rc<str>,
}

/// Collects [`UnsoundCallSite`]s for reporting (§7 "recorded in a set and
/// reported at the end; never fatal").
pub fn unsound_call_sites(solver: &Solver) -> Vec<UnsoundCallSite> {
    solver
        .unsound_invokes
        .iter()
        .map(|&id| {
            let Invoke { signature, .. } = solver.invoke(id);
            UnsoundCallSite { invoke: id, signature: signature.clone() }
        })
        .collect()
}
