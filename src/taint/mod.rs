// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The taint analysis, expressed entirely as a [`crate::plugin::Plugin`]
//! (§4.3-§4.5). Nothing here is solver-specific machinery; it only calls
//! back into the solver's public mutator API.

pub mod config;
pub mod manager;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::debug;

use crate::context::ContextId;
use crate::cs_manager::{CSCallSite, CSMethod, CSObjId, Pointer};
use crate::ir::{Field, Stmt, Type, Var};
use crate::plugin::{Plugin, BASE};
use crate::pts_set::points_to::{HybridPointsToSet, PointsToSet};
use crate::solver::Solver;
use crate::taint::config::{SinkRule, SourceKind, SourceRule, TaintConfig, TransferRule};
use crate::taint::manager::{SinkPoint, SourcePoint, TaintFlow, TaintManager};

type VarKey = (ContextId, Var);

/// Everything a caller needs once the solver reaches quiescence. Held behind
/// a shared handle since [`TaintPlugin`] itself is moved into the solver's
/// `Vec<Box<dyn Plugin>>` by [`Solver::register_plugin`] — a caller grabs
/// [`TaintPlugin::outputs`] before registering, then reads through it after
/// `solver.run()`.
#[derive(Default)]
pub struct TaintOutputs {
    pub flows: HashSet<TaintFlow>,
    /// `from -> [(to, type)]`, consulted on every points-to delta (§4.4 "on
    /// new points-to delta").
    var_transfers: HashMap<VarKey, Vec<(VarKey, Type)>>,
}

impl TaintOutputs {
    pub fn var_transfers(&self) -> &HashMap<VarKey, Vec<(VarKey, Type)>> {
        &self.var_transfers
    }
}

pub struct TaintPlugin {
    sources_by_method: HashMap<crate::ir::MethodId, Vec<SourceRule>>,
    sinks_by_method: HashMap<crate::ir::MethodId, Vec<SinkRule>>,
    transfers_by_method: HashMap<crate::ir::MethodId, Vec<TransferRule>>,
    sanitized_formals: HashSet<(crate::ir::MethodId, i32)>,

    taint_manager: TaintManager,
    param_sources_fired: HashSet<CSMethod>,
    outputs: Rc<RefCell<TaintOutputs>>,
    back_propagated: HashSet<(CSCallSite, i32)>,
}

impl TaintPlugin {
    pub fn new(config: TaintConfig) -> Self {
        let mut sources_by_method: HashMap<crate::ir::MethodId, Vec<SourceRule>> = HashMap::new();
        for rule in config.sources {
            sources_by_method.entry(rule.method).or_default().push(rule);
        }
        let mut sinks_by_method: HashMap<crate::ir::MethodId, Vec<SinkRule>> = HashMap::new();
        for rule in config.sinks {
            sinks_by_method.entry(rule.method).or_default().push(rule);
        }
        let mut transfers_by_method: HashMap<crate::ir::MethodId, Vec<TransferRule>> = HashMap::new();
        for rule in config.transfers {
            transfers_by_method.entry(rule.method).or_default().push(rule);
        }
        let sanitized_formals = config.sanitizers.into_iter().map(|s| (s.method, s.index)).collect();

        TaintPlugin {
            sources_by_method,
            sinks_by_method,
            transfers_by_method,
            sanitized_formals,
            taint_manager: TaintManager::new(),
            param_sources_fired: HashSet::new(),
            outputs: Rc::new(RefCell::new(TaintOutputs::default())),
            back_propagated: HashSet::new(),
        }
    }

    /// A shared handle onto this plugin's results, readable after
    /// `solver.run()` even though `self` is consumed by `register_plugin`.
    pub fn outputs(&self) -> Rc<RefCell<TaintOutputs>> {
        Rc::clone(&self.outputs)
    }

    fn is_sanitized(&self, method: crate::ir::MethodId, index: i32) -> bool {
        self.sanitized_formals.contains(&(method, index))
    }

    fn mint_at(&mut self, solver: &mut Solver, source: SourcePoint, ty: Type) -> CSObjId {
        let taint_obj = self.taint_manager.make_taint(source, ty);
        let empty_ctx = solver.cs_manager.contexts.empty_context();
        solver.cs_manager.get_cs_obj(empty_ctx, taint_obj)
    }

    fn emit_call_sources(&mut self, solver: &mut Solver, callsite: CSCallSite, callee: CSMethod) {
        let Some(rules) = self.sources_by_method.get(&callee.method).cloned() else { return };
        let invoke = solver.invoke(callsite.invoke).clone();
        for rule in rules.into_iter().filter(|r| r.kind == SourceKind::Call) {
            let Some(actual) = invoke.actual_at(rule.index) else { continue };
            if self.is_sanitized(callee.method, rule.index) {
                continue;
            }
            let source = SourcePoint::CallSource(callsite.invoke, rule.index);
            let cs_obj = self.mint_at(solver, source, rule.ty);
            solver.add_var_points_to(callsite.ctx, actual, cs_obj);
        }
    }

    fn emit_param_sources(&mut self, solver: &mut Solver, method: CSMethod) {
        if !self.param_sources_fired.insert(method) {
            return;
        }
        let Some(rules) = self.sources_by_method.get(&method.method).cloned() else { return };
        let ir_method = solver.method_of(method).clone();
        for rule in rules.into_iter().filter(|r| r.kind == SourceKind::Param) {
            let Some(formal) = ir_method.formal_at(rule.index) else { continue };
            if self.is_sanitized(method.method, rule.index) {
                continue;
            }
            let source = SourcePoint::ParamSource(method.method, rule.index);
            let cs_obj = self.mint_at(solver, source, rule.ty);
            solver.add_var_points_to(method.ctx, formal, cs_obj);
        }
    }

    fn record_sinks(&mut self, solver: &mut Solver, callsite: CSCallSite, callee: CSMethod) {
        let Some(rules) = self.sinks_by_method.get(&callee.method).cloned() else { return };
        let invoke = solver.invoke(callsite.invoke).clone();
        for rule in rules {
            let Some(actual) = invoke.actual_at(rule.index) else { continue };
            let pts = solver.get_points_to_set_of(&Pointer::CSVar(callsite.ctx, actual));
            for obj_id in pts.iter() {
                let obj = solver.cs_manager.cs_obj(obj_id).obj.clone();
                if let Some(source) = self.taint_manager.source_point(&obj) {
                    self.outputs.borrow_mut().flows.insert(TaintFlow {
                        source: source.clone(),
                        sink: SinkPoint { invoke: callsite.invoke, index: rule.index },
                    });
                }
            }
        }
    }

    /// `(method, from, to, type)` rules: register the variable-level
    /// transfer edge, immediately propagate `from`'s current taints, and
    /// back-propagate into fields the callee writes through `this` (§4.4).
    fn install_transfers(&mut self, solver: &mut Solver, callsite: CSCallSite, caller: CSMethod, callee: CSMethod) {
        let Some(rules) = self.transfers_by_method.get(&callee.method).cloned() else { return };
        let invoke = solver.invoke(callsite.invoke).clone();
        let ctx = callsite.ctx;
        for rule in rules {
            if self.is_sanitized(callee.method, rule.to) {
                continue;
            }
            let Some(from_var) = invoke.actual_at(rule.from) else { continue };
            let Some(to_var) = invoke.actual_at(rule.to) else { continue };

            self.outputs.borrow_mut().var_transfers.entry((ctx, from_var)).or_default().push(((ctx, to_var), rule.ty.clone()));
            self.propagate_taint(solver, ctx, from_var, ctx, to_var, &rule.ty);

            // A transfer that writes into BASE or an argument (rather than
            // RESULT) may mutate a field the callee exposes through loads on
            // `this`; RESULT never needs back-propagation since the tainted
            // value is already visible at the call's result variable.
            if rule.to == BASE || rule.to >= 0 {
                self.maybe_back_propagate(solver, callsite, caller, callee, rule.to, to_var, from_var);
            }
        }
    }

    /// Re-mints every taint currently at `(from_ctx, from_var)` under `ty`
    /// and adds the result to `(to_ctx, to_var)` (§4.4 "on new points-to
    /// delta").
    fn propagate_taint(&mut self, solver: &mut Solver, from_ctx: ContextId, from_var: Var, to_ctx: ContextId, to_var: Var, ty: &Type) {
        let pts = solver.get_points_to_set_of(&Pointer::CSVar(from_ctx, from_var));
        let mut retyped_ids = Vec::new();
        for obj_id in pts.iter() {
            let obj = solver.cs_manager.cs_obj(obj_id).obj.clone();
            if let Some(source) = self.taint_manager.source_point(&obj).cloned() {
                retyped_ids.push(self.mint_at(solver, source, ty.clone()));
            }
        }
        for id in retyped_ids {
            solver.add_var_points_to(to_ctx, to_var, id);
        }
    }

    /// Synthesizes, at the call site's own scope, `%tmp = <receiver>;
    /// %tmp.field = <from_var>` for every field the callee stores one of its
    /// own formals/`this` into (§4.4 "back-propagation"): `receiver` is the
    /// actual the transfer targets (BASE or an argument), and `from_var` is
    /// the actual carrying the taint the transfer rule names as its source —
    /// the value a matching `this.field = <param>` write inside the callee
    /// would have stored. Skips constructors: a constructor's field writes
    /// are already visible to the ordinary solver via the wired `this`/param
    /// edges, since the receiver didn't exist before the call.
    fn maybe_back_propagate(
        &mut self,
        solver: &mut Solver,
        callsite: CSCallSite,
        caller: CSMethod,
        callee: CSMethod,
        to_index: i32,
        receiver: Var,
        from_var: Var,
    ) {
        let ir_method = solver.method_of(callee).clone();
        if ir_method.is_constructor {
            return;
        }
        if !self.back_propagated.insert((callsite, to_index)) {
            return;
        }
        let Some(this_var) = ir_method.this_var else { return };
        let fields: Vec<Field> = ir_method
            .body
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::StoreField { base, field, .. } if *base == this_var => Some(field.clone()),
                _ => None,
            })
            .collect();
        if fields.is_empty() {
            return;
        }

        // `receiver` and `from_var` are both variables in the *caller's*
        // scope (`invoke.actual_at` indexes the call site's own actuals), so
        // the synthetic statements are injected into `caller`, not `callee`
        // — otherwise the PFG nodes they create would mix a caller-scope
        // `Var` with the callee's context.
        let receiver_ty = solver.var_type(receiver).unwrap_or_else(|| ir_method.declaring_type.clone());
        for field in fields {
            let tmp_base = solver.new_temp_var(receiver_ty.clone());
            let from_ty = solver.var_type(from_var).unwrap_or_else(|| field.field_type.clone());
            let value_var = if from_ty == field.field_type {
                from_var
            } else {
                let casted = solver.new_temp_var(field.field_type.clone());
                solver.add_stmts(caller, vec![Stmt::Cast { lhs: casted, rhs: from_var, cast_type: field.field_type.clone() }]);
                casted
            };
            solver.add_stmts(
                caller,
                vec![
                    Stmt::Copy { lhs: tmp_base, rhs: receiver },
                    Stmt::StoreField { base: tmp_base, field, rhs: value_var },
                ],
            );
            debug!("back-propagated taint through field write via synthetic temp {:?}", tmp_base);
        }
    }
}

impl Plugin for TaintPlugin {
    fn on_method_reached(&mut self, solver: &mut Solver, method: CSMethod) -> crate::Result<()> {
        self.emit_param_sources(solver, method);
        Ok(())
    }

    fn on_call_edge(&mut self, solver: &mut Solver, callsite: CSCallSite, caller: CSMethod, callee: CSMethod) -> crate::Result<()> {
        self.emit_call_sources(solver, callsite, callee);
        self.install_transfers(solver, callsite, caller, callee);
        self.record_sinks(solver, callsite, callee);
        Ok(())
    }

    fn on_points_to_delta(&mut self, solver: &mut Solver, var: Pointer, delta: &HybridPointsToSet<CSObjId>) -> crate::Result<()> {
        let Pointer::CSVar(ctx, v) = var else { return Ok(()) };
        let Some(targets) = self.outputs.borrow().var_transfers.get(&(ctx, v)).cloned() else { return Ok(()) };
        let mut additions: Vec<(ContextId, Var, CSObjId)> = Vec::new();
        for obj_id in delta.iter() {
            let obj = solver.cs_manager.cs_obj(obj_id).obj.clone();
            let Some(source) = self.taint_manager.source_point(&obj).cloned() else { continue };
            for ((to_ctx, to_var), ty) in &targets {
                let retyped_id = self.mint_at(solver, source.clone(), ty.clone());
                additions.push((*to_ctx, *to_var, retyped_id));
            }
        }
        for (to_ctx, to_var, id) in additions {
            solver.add_var_points_to(to_ctx, to_var, id);
        }
        Ok(())
    }
}
