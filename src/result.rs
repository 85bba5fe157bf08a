// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The read-only result surface handed to callers once [`Solver::run`]
//! reaches quiescence (§5). Thin accessors over the solver's own state plus
//! the taint flows and pruned [`crate::tfg::TaintFlowGraph`] contributed by
//! the taint plugin; nothing here re-derives anything the solver already
//! computed.

use std::collections::HashSet;

use crate::context::ContextId;
use crate::cs_manager::{CSMethod, CSObjId, Pointer};
use crate::ir::{Field, Var};
use crate::pts_set::points_to::HybridPointsToSet;
use crate::solver::{AnalysisOutcome, Solver};
use crate::taint::manager::TaintFlow;
use crate::tfg::TaintFlowGraph;

/// Everything a driver needs after a run: the pointer analysis results still
/// live on [`Solver`] itself (this wraps rather than copies them), plus the
/// taint-specific outputs that only the plugin knows.
pub struct AnalysisResult<'a> {
    pub outcome: AnalysisOutcome,
    solver: &'a Solver,
    pub taint_flows: HashSet<TaintFlow>,
    pub taint_flow_graph: TaintFlowGraph,
}

impl<'a> AnalysisResult<'a> {
    pub fn new(outcome: AnalysisOutcome, solver: &'a Solver, taint_flows: HashSet<TaintFlow>, taint_flow_graph: TaintFlowGraph) -> Self {
        AnalysisResult { outcome, solver, taint_flows, taint_flow_graph }
    }

    pub fn points_to_set_of_var(&self, ctx: ContextId, var: Var) -> HybridPointsToSet<CSObjId> {
        self.solver.get_points_to_set_of(&Pointer::CSVar(ctx, var))
    }

    pub fn points_to_set_of(&self, pointer: &Pointer) -> HybridPointsToSet<CSObjId> {
        self.solver.get_points_to_set_of(pointer)
    }

    pub fn points_to_set_of_field(&self, base: CSObjId, field: Field) -> HybridPointsToSet<CSObjId> {
        self.solver.get_points_to_set_of(&Pointer::InstanceField(base, field))
    }

    pub fn reached_methods(&self) -> impl Iterator<Item = &CSMethod> {
        self.solver.reached_methods()
    }

    pub fn call_graph(&self) -> &crate::graph::call_graph::CallGraph {
        &self.solver.call_graph
    }

    pub fn pointer_flow_graph(&self) -> &crate::graph::pfg::Pfg {
        &self.solver.pfg
    }

    pub fn unsound_invokes(&self) -> &HashSet<crate::ir::InvokeId> {
        &self.solver.unsound_invokes
    }
}
