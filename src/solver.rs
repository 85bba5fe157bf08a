// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The worklist-driven fixed-point engine (§4.2). Builds the call graph and
//! the pointer flow graph on the fly, dispatching to registered [`Plugin`]s
//! on every call edge, points-to delta, and newly encountered statement.
//!
//! Grounded on the teacher's `pta/context_sensitive.rs` (the `initialize` /
//! `propagate` / `finalize` driving loop) and `pta/propagator/propagator.rs`
//! (the worklist, `process_node` dispatch, and `add_direct_edge`/`propagate`
//! pairing with immediate flush). The MIR-specific and dynamic-dispatch
//! caching details of those files are not ported; only the general
//! "per-node handler dispatch, then `pt_data.flush`" shape is.

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::context::ContextId;
use crate::context_selector::ContextSelector;
use crate::cs_manager::{CSCallSite, CSManager, CSMethod, CSObjId, Pointer};
use crate::graph::call_graph::{CallGraph, Kind as CgKind};
use crate::graph::pfg::{DirectKind, Pfg, PfgEdgeKind, PfgNodeId};
use crate::heap::HeapModel;
use crate::ir::{Field, Invoke, InvokeId, Method, ObjId, Program, Stmt, Type, Var};
use crate::plugin::Plugin;
use crate::pts_set::pt_data::DiffPTData;
use crate::pts_set::points_to::{HybridPointsToSet, PointsToSet};

#[derive(Clone, Debug)]
struct LoadConstraint {
    dst: PfgNodeId,
    field: Field,
}

#[derive(Clone, Debug)]
struct StoreConstraint {
    src: PfgNodeId,
    field: Field,
}

#[derive(Clone, Debug)]
struct DispatchConstraint {
    caller: CSMethod,
    invoke_id: InvokeId,
}

/// Outcome of running a solver to completion. `Cancelled` is not an error:
/// points-to sets remain internally consistent, just incomplete (§5).
#[derive(Debug)]
pub enum AnalysisOutcome {
    Completed,
    Cancelled,
}

pub struct Solver {
    pub program: Rc<Program>,
    pub cs_manager: CSManager,
    context_selector: Box<dyn ContextSelector>,
    pub pfg: Pfg,
    pub call_graph: CallGraph,
    pt_data: DiffPTData<PfgNodeId, CSObjId, HybridPointsToSet<CSObjId>>,

    worklist: VecDeque<PfgNodeId>,
    queued: HashSet<PfgNodeId>,

    reached_methods: HashSet<CSMethod>,
    invokes: HashMap<InvokeId, Invoke>,

    load_constraints: HashMap<PfgNodeId, Vec<LoadConstraint>>,
    store_constraints: HashMap<PfgNodeId, Vec<StoreConstraint>>,
    array_load_constraints: HashMap<PfgNodeId, Vec<PfgNodeId>>,
    array_store_constraints: HashMap<PfgNodeId, Vec<PfgNodeId>>,
    dispatch_constraints: HashMap<PfgNodeId, Vec<DispatchConstraint>>,
    dispatch_cache: HashMap<(CSObjId, Rc<str>), Option<crate::ir::MethodId>>,

    extra_stmts: HashMap<CSMethod, Vec<Stmt>>,
    extra_var_types: HashMap<Var, Type>,
    next_temp_var: u32,

    /// Every registered plugin sees every trigger; a plugin filters by
    /// signature/index itself (§9 "re-express as a table" becomes, in Rust,
    /// each plugin owning its own `HashMap<signature, HookSpec>` rather than
    /// the solver keeping a `dyn Fn` table it would have to downcast).
    plugins: Vec<Box<dyn Plugin>>,

    pub unsound_invokes: HashSet<InvokeId>,
    cancel: Arc<AtomicBool>,
}

impl Solver {
    pub fn new(program: Rc<Program>, context_selector: Box<dyn ContextSelector>) -> Self {
        let next_temp_var = program.methods().map(|m| m.params.len() + m.body.len()).sum::<usize>() as u32 + 1_000_000;
        Solver {
            program,
            cs_manager: CSManager::new(),
            context_selector,
            pfg: Pfg::new(),
            call_graph: CallGraph::new(),
            pt_data: DiffPTData::new(),
            worklist: VecDeque::new(),
            queued: HashSet::new(),
            reached_methods: HashSet::new(),
            invokes: HashMap::new(),
            load_constraints: HashMap::new(),
            store_constraints: HashMap::new(),
            array_load_constraints: HashMap::new(),
            array_store_constraints: HashMap::new(),
            dispatch_constraints: HashMap::new(),
            dispatch_cache: HashMap::new(),
            extra_stmts: HashMap::new(),
            extra_var_types: HashMap::new(),
            next_temp_var,
            plugins: Vec::new(),
            unsound_invokes: HashSet::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Registers a plugin. It is dispatched to on every trigger regardless
    /// of what it actually cares about (unused triggers fall through to the
    /// trait's no-op defaults).
    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn cancellation_token(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    // ---- public mutator API available to plugins (§4.2) ----------------

    pub fn make_points_to_set(&self) -> HybridPointsToSet<CSObjId> {
        HybridPointsToSet::new()
    }

    /// Never returns a missing set: an un-created pointer simply has none.
    pub fn get_points_to_set_of(&self, pointer: &Pointer) -> HybridPointsToSet<CSObjId> {
        let node = match self.pfg.node_of(pointer) {
            Some(n) => n,
            None => return HybridPointsToSet::new(),
        };
        self.combined_pts(node)
    }

    pub fn add_var_points_to(&mut self, ctx: ContextId, var: Var, obj: CSObjId) {
        self.add_points_to(Pointer::CSVar(ctx, var), obj);
    }

    pub fn add_points_to(&mut self, pointer: Pointer, obj: CSObjId) {
        let node = self.pfg.get_or_insert_node(pointer);
        if self.pt_data.add_pts(node, obj) {
            self.enqueue(node);
        }
    }

    pub fn add_points_to_set(&mut self, pointer: Pointer, objs: &HybridPointsToSet<CSObjId>) {
        let node = self.pfg.get_or_insert_node(pointer);
        if self.pt_data.union_pts_to(node, objs) {
            self.enqueue(node);
        }
    }

    /// Injects synthetic statements into an already-reached method,
    /// processing them immediately and re-firing statement hooks for them
    /// (used by back-propagation, §4.4).
    pub fn add_stmts(&mut self, cs_method: CSMethod, stmts: Vec<Stmt>) {
        for stmt in stmts {
            self.extra_stmts.entry(cs_method).or_default().push(stmt.clone());
            self.process_stmt(cs_method, &stmt);
            self.fire_stmt_hooks(cs_method, &stmt);
        }
    }

    /// Mints a fresh synthetic variable (the back-propagation rewrite's
    /// `%taint-temp-*`, §4.4). The IR has no variable-name table, so the
    /// "sentinel name" invariant is tracked only in `extra_var_types`'
    /// companion `synthetic` marker rather than as a literal string.
    pub fn new_temp_var(&mut self, ty: Type) -> Var {
        let id = Var::from_usize(self.next_temp_var as usize);
        self.next_temp_var += 1;
        self.extra_var_types.insert(id, ty);
        id
    }

    pub fn var_type(&self, var: Var) -> Option<Type> {
        self.program.var_type(var).cloned().or_else(|| self.extra_var_types.get(&var).cloned())
    }

    // ---- driving loop ----------------------------------------------------

    /// Seeds entry methods at the empty context and runs to quiescence.
    pub fn run(&mut self) -> AnalysisOutcome {
        let entries: Vec<_> = self.program.entry_methods().to_vec();
        let empty_ctx = self.cs_manager.contexts.empty_context();
        for method in entries {
            let cs_method = self.cs_manager.get_cs_method(empty_ctx, method);
            self.reach_method(cs_method);
        }
        self.solve_worklist()
    }

    fn solve_worklist(&mut self) -> AnalysisOutcome {
        while let Some(node) = self.worklist.pop_front() {
            self.queued.remove(&node);
            if self.cancel.load(Ordering::Relaxed) {
                return AnalysisOutcome::Cancelled;
            }
            self.process_node(node);
        }
        AnalysisOutcome::Completed
    }

    fn enqueue(&mut self, node: PfgNodeId) {
        if self.queued.insert(node) {
            self.worklist.push_back(node);
        }
    }

    fn combined_pts(&self, node: PfgNodeId) -> HybridPointsToSet<CSObjId> {
        let mut combined = HybridPointsToSet::new();
        if let Some(propa) = self.pt_data.get_propa_pts(node) {
            combined.union(propa);
        }
        if let Some(diff) = self.pt_data.get_diff_pts(node) {
            combined.union(diff);
        }
        combined
    }

    /// Step 1-5 of the main loop (§4.2), for one dequeued node.
    fn process_node(&mut self, node: PfgNodeId) {
        let delta = match self.pt_data.get_diff_pts(node) {
            Some(d) if !d.is_empty() => d.clone(),
            _ => {
                self.pt_data.flush(node);
                return;
            }
        };
        let pointer = self.pfg.pointer_of(node).clone();
        trace!("process_node {:?} delta={}", pointer, delta.count());

        if let Pointer::CSVar(_, _) = &pointer {
            self.materialize_field_and_array_constraints(node, &delta);
            self.resolve_new_dispatches(node, &delta);
        }

        for (dst, kind) in self.pfg.out_edges(node).map(|(d, k)| (d, k.clone())).collect::<Vec<_>>() {
            self.propagate_edge(dst, &kind, &delta);
        }

        if let Pointer::CSVar(ctx, var) = pointer {
            self.run_points_to_hooks(ctx, var, &delta);
        }

        self.pt_data.flush(node);
    }

    fn propagate_edge(&mut self, dst: PfgNodeId, kind: &PfgEdgeKind, delta: &HybridPointsToSet<CSObjId>) {
        let filtered = match kind {
            PfgEdgeKind::Cast(target_ty) => self.filter_by_type(delta, target_ty),
            _ => delta.clone(),
        };
        if filtered.is_empty() {
            return;
        }
        if self.pt_data.union_pts_to(dst, &filtered) {
            self.enqueue(dst);
        }
    }

    fn filter_by_type(&self, objs: &HybridPointsToSet<CSObjId>, target: &Type) -> HybridPointsToSet<CSObjId> {
        let mut out = HybridPointsToSet::new();
        for obj_id in objs.iter() {
            let cs_obj = self.cs_manager.cs_obj(obj_id);
            match HeapModel::type_of(&cs_obj.obj) {
                Some(ty) if self.program.class_hierarchy.is_subtype(&ty, target) => {
                    out.insert(obj_id);
                }
                Some(_) => {}
                // An unknown dynamic type (reflection) is conservatively kept:
                // we cannot prove the cast fails.
                None => {
                    out.insert(obj_id);
                }
            }
        }
        out
    }

    /// Adds a direct PFG edge and, if new, immediately propagates the
    /// source's already-installed points-to set (mirrors the teacher's
    /// `add_direct_edge` + eager `propagate` pairing).
    fn add_direct_edge(&mut self, src: Pointer, dst: Pointer, kind: DirectKind) {
        let src_node = self.pfg.get_or_insert_node(src);
        let dst_node = self.pfg.get_or_insert_node(dst);
        if self.pfg.add_edge_between(src_node, dst_node, PfgEdgeKind::Direct(kind)) {
            let existing = self.combined_pts(src_node);
            if !existing.is_empty() && self.pt_data.union_pts_to(dst_node, &existing) {
                self.enqueue(dst_node);
            }
        }
    }

    // ---- reachable-method expansion --------------------------------------

    fn reach_method(&mut self, cs_method: CSMethod) {
        if !self.reached_methods.insert(cs_method) {
            return;
        }
        self.call_graph.add_node(cs_method);
        let method = self.program.method(cs_method.method).clone();
        debug!("reach method {}", method.signature);
        for stmt in &method.body {
            self.process_stmt(cs_method, stmt);
        }
        for stmt in &method.body {
            self.fire_stmt_hooks(cs_method, stmt);
        }
        self.run_method_reached_hooks(cs_method);
    }

    fn process_stmt(&mut self, cs_method: CSMethod, stmt: &Stmt) {
        let ctx = cs_method.ctx;
        match stmt {
            Stmt::Copy { lhs, rhs } => {
                self.add_direct_edge(Pointer::CSVar(ctx, *rhs), Pointer::CSVar(ctx, *lhs), DirectKind::LocalAssign);
            }
            Stmt::Cast { lhs, rhs, cast_type } => {
                let src = Pointer::CSVar(ctx, *rhs);
                let dst = Pointer::CSVar(ctx, *lhs);
                let src_node = self.pfg.get_or_insert_node(src);
                let dst_node = self.pfg.get_or_insert_node(dst);
                if self.pfg.add_edge_between(src_node, dst_node, PfgEdgeKind::Cast(cast_type.clone())) {
                    let existing = self.combined_pts(src_node);
                    let filtered = self.filter_by_type(&existing, cast_type);
                    if !filtered.is_empty() && self.pt_data.union_pts_to(dst_node, &filtered) {
                        self.enqueue(dst_node);
                    }
                }
            }
            Stmt::New { lhs, obj_id, obj_kind } => {
                let obj = HeapModel::obj_for_alloc(*obj_id, obj_kind);
                let heap_ctx = self.context_selector.select_heap_context(&mut self.cs_manager.contexts, ctx, *obj_id);
                let cs_obj = self.cs_manager.get_cs_obj(heap_ctx, obj);
                self.add_points_to(Pointer::CSVar(ctx, *lhs), cs_obj);
            }
            Stmt::LoadField { lhs, base, field } => {
                let base_node = self.pfg.get_or_insert_node(Pointer::CSVar(ctx, *base));
                let dst_node = self.pfg.get_or_insert_node(Pointer::CSVar(ctx, *lhs));
                self.load_constraints.entry(base_node).or_default().push(LoadConstraint { dst: dst_node, field: field.clone() });
                let existing = self.combined_pts(base_node);
                if !existing.is_empty() {
                    self.materialize_load(base_node, dst_node, field, &existing);
                }
            }
            Stmt::StoreField { base, field, rhs } => {
                let base_node = self.pfg.get_or_insert_node(Pointer::CSVar(ctx, *base));
                let src_node = self.pfg.get_or_insert_node(Pointer::CSVar(ctx, *rhs));
                self.store_constraints.entry(base_node).or_default().push(StoreConstraint { src: src_node, field: field.clone() });
                let existing = self.combined_pts(base_node);
                if !existing.is_empty() {
                    self.materialize_store(base_node, src_node, field, &existing);
                }
            }
            Stmt::LoadArray { lhs, base } => {
                let base_node = self.pfg.get_or_insert_node(Pointer::CSVar(ctx, *base));
                let dst_node = self.pfg.get_or_insert_node(Pointer::CSVar(ctx, *lhs));
                self.array_load_constraints.entry(base_node).or_default().push(dst_node);
                let existing = self.combined_pts(base_node);
                if !existing.is_empty() {
                    self.materialize_array_load(base_node, dst_node, &existing);
                }
            }
            Stmt::StoreArray { base, rhs } => {
                let base_node = self.pfg.get_or_insert_node(Pointer::CSVar(ctx, *base));
                let src_node = self.pfg.get_or_insert_node(Pointer::CSVar(ctx, *rhs));
                self.array_store_constraints.entry(base_node).or_default().push(src_node);
                let existing = self.combined_pts(base_node);
                if !existing.is_empty() {
                    self.materialize_array_store(base_node, src_node, &existing);
                }
            }
            Stmt::Invoke(invoke) => {
                self.invokes.insert(invoke.id, invoke.clone());
                match invoke.static_callee {
                    Some(callee_method_id) => {
                        let callsite = self.cs_manager.get_cs_call_site(ctx, invoke.id);
                        let callee_ctx = self.context_selector.select_method_context(&mut self.cs_manager.contexts, ctx, invoke.id, None);
                        let callee = self.cs_manager.get_cs_method(callee_ctx, callee_method_id);
                        self.add_call_edge(callsite, cs_method, callee, CgKind::Local);
                    }
                    None => {
                        let recv = invoke.recv.expect("virtual call site must have a receiver");
                        let base_node = self.pfg.get_or_insert_node(Pointer::CSVar(ctx, recv));
                        self.dispatch_constraints
                            .entry(base_node)
                            .or_default()
                            .push(DispatchConstraint { caller: cs_method, invoke_id: invoke.id });
                        let existing = self.combined_pts(base_node);
                        if !existing.is_empty() {
                            self.resolve_dispatch_for(base_node, cs_method, invoke.id, &existing);
                        }
                    }
                }
            }
            Stmt::Return { .. } => {}
        }
    }

    fn materialize_field_and_array_constraints(&mut self, base_node: PfgNodeId, delta: &HybridPointsToSet<CSObjId>) {
        if let Some(constraints) = self.load_constraints.get(&base_node).cloned() {
            for c in constraints {
                self.materialize_load(base_node, c.dst, &c.field, delta);
            }
        }
        if let Some(constraints) = self.store_constraints.get(&base_node).cloned() {
            for c in constraints {
                self.materialize_store(base_node, c.src, &c.field, delta);
            }
        }
        if let Some(dsts) = self.array_load_constraints.get(&base_node).cloned() {
            for dst in dsts {
                self.materialize_array_load(base_node, dst, delta);
            }
        }
        if let Some(srcs) = self.array_store_constraints.get(&base_node).cloned() {
            for src in srcs {
                self.materialize_array_store(base_node, src, delta);
            }
        }
    }

    fn materialize_load(&mut self, _base_node: PfgNodeId, dst: PfgNodeId, field: &Field, bases: &HybridPointsToSet<CSObjId>) {
        for obj_id in bases.iter() {
            let field_ptr = self.cs_manager.get_instance_field(obj_id, field.clone());
            let field_node = self.pfg.get_or_insert_node(field_ptr);
            if self.pfg.add_edge_between(field_node, dst, PfgEdgeKind::InstanceLoad(field.clone())) {
                let existing = self.combined_pts(field_node);
                if !existing.is_empty() && self.pt_data.union_pts_to(dst, &existing) {
                    self.enqueue(dst);
                }
            }
        }
    }

    fn materialize_store(&mut self, _base_node: PfgNodeId, src: PfgNodeId, field: &Field, bases: &HybridPointsToSet<CSObjId>) {
        for obj_id in bases.iter() {
            let field_ptr = self.cs_manager.get_instance_field(obj_id, field.clone());
            let field_node = self.pfg.get_or_insert_node(field_ptr);
            if self.pfg.add_edge_between(src, field_node, PfgEdgeKind::InstanceStore(field.clone())) {
                let existing = self.combined_pts(src);
                if !existing.is_empty() && self.pt_data.union_pts_to(field_node, &existing) {
                    self.enqueue(field_node);
                }
            }
        }
    }

    fn materialize_array_load(&mut self, _base_node: PfgNodeId, dst: PfgNodeId, bases: &HybridPointsToSet<CSObjId>) {
        for obj_id in bases.iter() {
            let idx_ptr = self.cs_manager.get_array_index(obj_id);
            let idx_node = self.pfg.get_or_insert_node(idx_ptr);
            if self.pfg.add_edge_between(idx_node, dst, PfgEdgeKind::ArrayLoad) {
                let existing = self.combined_pts(idx_node);
                if !existing.is_empty() && self.pt_data.union_pts_to(dst, &existing) {
                    self.enqueue(dst);
                }
            }
        }
    }

    fn materialize_array_store(&mut self, _base_node: PfgNodeId, src: PfgNodeId, bases: &HybridPointsToSet<CSObjId>) {
        for obj_id in bases.iter() {
            let idx_ptr = self.cs_manager.get_array_index(obj_id);
            let idx_node = self.pfg.get_or_insert_node(idx_ptr);
            if self.pfg.add_edge_between(src, idx_node, PfgEdgeKind::ArrayStore) {
                let existing = self.combined_pts(src);
                if !existing.is_empty() && self.pt_data.union_pts_to(idx_node, &existing) {
                    self.enqueue(idx_node);
                }
            }
        }
    }

    // ---- virtual dispatch --------------------------------------------------

    fn resolve_new_dispatches(&mut self, base_node: PfgNodeId, delta: &HybridPointsToSet<CSObjId>) {
        if let Some(constraints) = self.dispatch_constraints.get(&base_node).cloned() {
            for c in constraints {
                self.resolve_dispatch_for(base_node, c.caller, c.invoke_id, delta);
            }
        }
    }

    fn resolve_dispatch_for(&mut self, _base_node: PfgNodeId, caller: CSMethod, invoke_id: InvokeId, objs: &HybridPointsToSet<CSObjId>) {
        let invoke = self.invokes[&invoke_id].clone();
        for obj_id in objs.iter() {
            let cs_obj = self.cs_manager.cs_obj(obj_id).clone();
            let dyn_type = match HeapModel::type_of(&cs_obj.obj) {
                Some(t) => t,
                None => {
                    self.unsound_invokes.insert(invoke_id);
                    warn!("unresolved dynamic dispatch at {:?}: unknown dynamic type", invoke_id);
                    continue;
                }
            };
            let cache_key = (obj_id, invoke.selector.clone());
            let callee_method_id = *self
                .dispatch_cache
                .entry(cache_key)
                .or_insert_with(|| self.program.class_hierarchy.dispatch(&dyn_type, &invoke.selector));
            let callee_method_id = match callee_method_id {
                Some(m) => m,
                None => continue,
            };
            let callsite = self.cs_manager.get_cs_call_site(caller.ctx, invoke_id);
            let callee_ctx =
                self.context_selector
                    .select_method_context(&mut self.cs_manager.contexts, caller.ctx, invoke_id, Some(obj_id));
            let callee = self.cs_manager.get_cs_method(callee_ctx, callee_method_id);
            self.add_call_edge(callsite, caller, callee, CgKind::Call);
        }
    }

    // ---- call edges --------------------------------------------------------

    fn add_call_edge(&mut self, callsite: CSCallSite, caller: CSMethod, callee: CSMethod, kind: CgKind) {
        if !self.call_graph.add_edge(callsite, caller, callee, kind) {
            return;
        }
        self.wire_call(callsite, callee);
        self.reach_method(callee);
        self.run_call_edge_hooks(callsite, caller, callee);
    }

    fn wire_call(&mut self, callsite: CSCallSite, callee: CSMethod) {
        let invoke = self.invokes[&callsite.invoke].clone();
        let callee_method = self.program.method(callee.method).clone();
        let caller_ctx = callsite.ctx;

        if let (Some(recv), Some(this_var)) = (invoke.recv, callee_method.this_var) {
            self.add_direct_edge(Pointer::CSVar(caller_ctx, recv), Pointer::CSVar(callee.ctx, this_var), DirectKind::ThisPassing);
        }
        for (actual, formal) in invoke.args.iter().zip(callee_method.params.iter()) {
            self.add_direct_edge(Pointer::CSVar(caller_ctx, *actual), Pointer::CSVar(callee.ctx, *formal), DirectKind::ParamPassing);
        }
        if let (Some(ret_var), Some(result_var)) = (callee_method.return_var, invoke.result) {
            self.add_direct_edge(Pointer::CSVar(callee.ctx, ret_var), Pointer::CSVar(caller_ctx, result_var), DirectKind::Return);
        }
    }

    // ---- plugin dispatch ----------------------------------------------------

    fn run_points_to_hooks(&mut self, ctx: ContextId, var: Var, delta: &HybridPointsToSet<CSObjId>) {
        let mut plugins = std::mem::take(&mut self.plugins);
        let pointer = Pointer::CSVar(ctx, var);
        for plugin in plugins.iter_mut() {
            if let Err(e) = plugin.on_points_to_delta(self, pointer.clone(), delta) {
                warn!("plugin points-to hook failed: {e}");
            }
        }
        self.plugins = plugins;
    }

    fn run_call_edge_hooks(&mut self, callsite: CSCallSite, caller: CSMethod, callee: CSMethod) {
        let mut plugins = std::mem::take(&mut self.plugins);
        for plugin in plugins.iter_mut() {
            if let Err(e) = plugin.on_call_edge(self, callsite, caller, callee) {
                warn!("plugin call-edge hook failed: {e}");
            }
        }
        self.plugins = plugins;
    }

    fn run_method_reached_hooks(&mut self, method: CSMethod) {
        let mut plugins = std::mem::take(&mut self.plugins);
        for plugin in plugins.iter_mut() {
            if let Err(e) = plugin.on_method_reached(self, method) {
                warn!("plugin method-reached hook failed: {e}");
            }
        }
        self.plugins = plugins;
    }

    fn fire_stmt_hooks(&mut self, cs_method: CSMethod, stmt: &Stmt) {
        let mut plugins = std::mem::take(&mut self.plugins);
        for plugin in plugins.iter_mut() {
            if let Err(e) = plugin.on_new_stmt(self, cs_method, stmt) {
                warn!("plugin statement hook failed: {e}");
            }
        }
        self.plugins = plugins;
    }

    // ---- accessors used by the taint plugin and result surface -------------

    pub fn invoke(&self, invoke_id: InvokeId) -> &Invoke {
        &self.invokes[&invoke_id]
    }

    pub fn method_of(&self, method: CSMethod) -> &Method {
        self.program.method(method.method)
    }

    pub fn reached_methods(&self) -> impl Iterator<Item = &CSMethod> {
        self.reached_methods.iter()
    }
}
