// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Plugin dispatch (§4.2 "Plugin API"). The solver invokes every registered
//! plugin on three triggers: a new call edge, a points-to delta reaching a
//! reached CSVar, and a newly encountered IR statement during reachable-
//! method expansion. The taint analysis (§4.3-§4.5) is implemented entirely
//! as one such plugin; nothing in the solver is taint-specific.

use crate::cs_manager::{CSCallSite, CSMethod, CSObjId, Pointer};
use crate::ir::Stmt;
use crate::pts_set::points_to::HybridPointsToSet;
use crate::solver::Solver;

/// An actual/formal argument slot, using the `-1=BASE, -2=RESULT, n>=0=arg`
/// convention of §4.4/§4.5.
pub type ActualIndex = i32;
pub const BASE: ActualIndex = -1;
pub const RESULT: ActualIndex = -2;

/// A handler invoked by the solver at well-defined points in the fixpoint
/// computation. Default method bodies are no-ops, so a plugin only
/// overrides the triggers it cares about.
pub trait Plugin {
    fn on_call_edge(&mut self, solver: &mut Solver, callsite: CSCallSite, caller: CSMethod, callee: CSMethod) -> crate::Result<()> {
        let _ = (solver, callsite, caller, callee);
        Ok(())
    }

    /// Invoked the first time a `CSMethod` is reached by any means, including
    /// an entry method seeded with no call site at all. Needed for
    /// `ParamSource`, which fires "on the first reach of method" rather than
    /// on a call edge (§4.5).
    fn on_method_reached(&mut self, solver: &mut Solver, method: CSMethod) -> crate::Result<()> {
        let _ = (solver, method);
        Ok(())
    }

    fn on_points_to_delta(&mut self, solver: &mut Solver, var: Pointer, delta: &HybridPointsToSet<CSObjId>) -> crate::Result<()> {
        let _ = (solver, var, delta);
        Ok(())
    }

    fn on_new_stmt(&mut self, solver: &mut Solver, method: CSMethod, stmt: &Stmt) -> crate::Result<()> {
        let _ = (solver, method, stmt);
        Ok(())
    }
}
