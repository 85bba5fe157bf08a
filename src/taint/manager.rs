// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Mints and identifies taint objects (§4.3).

use std::collections::HashSet;

use crate::heap::Obj;
use crate::ir::{InvokeId, MethodId, Type};

/// Where a taint value was minted. Identity is by value, which is exactly
/// what makes two calls to `make_taint` with the same point collapse to the
/// same `Obj::Taint` (invariant 4, §3).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum SourcePoint {
    /// The returned value or an argument of a source call, keyed by the
    /// `-1=BASE, -2=RESULT, n>=0=argument` convention.
    CallSource(InvokeId, i32),
    /// A tainted formal parameter observed on method entry.
    ParamSource(MethodId, i32),
}

/// Where a tainted value was observed consumed.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SinkPoint {
    pub invoke: InvokeId,
    pub index: i32,
}

/// A witnessed source-to-sink flow. Set semantics: the same pair is recorded
/// once regardless of how many times the solver rediscovers it.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TaintFlow {
    pub source: SourcePoint,
    pub sink: SinkPoint,
}

/// Mints and deduplicates taint [`Obj`]s (§4.3). `Obj::Taint` already derives
/// structural equality, so deduplication falls out of the heap model; this
/// manager's job is bookkeeping the reverse mapping and the identity check.
#[derive(Default)]
pub struct TaintManager {
    taints: HashSet<(SourcePoint, Type)>,
}

impl TaintManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent over equal `(source, type)`.
    pub fn make_taint(&mut self, source: SourcePoint, ty: Type) -> Obj {
        self.taints.insert((source.clone(), ty.clone()));
        Obj::Taint(source, ty)
    }

    pub fn is_taint(&self, obj: &Obj) -> bool {
        matches!(obj, Obj::Taint(_, _))
    }

    pub fn source_point(&self, obj: &Obj) -> Option<&SourcePoint> {
        match obj {
            Obj::Taint(source, _) => Some(source),
            _ => None,
        }
    }

    pub fn taint_objs(&self) -> impl Iterator<Item = Obj> + '_ {
        self.taints.iter().map(|(s, t)| Obj::Taint(s.clone(), t.clone()))
    }
}
