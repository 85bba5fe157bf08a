// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Builds the taint flow graph from the solved pointer flow graph (§4.6): a
//! forward reachability graph from source variables to sink variables,
//! pruned to the nodes that actually reach a witnessed [`TaintFlow`].
//!
//! Grounded on the teacher's PFG/call-graph `to_dot` dumping style
//! (`graph::call_graph::CallGraph::to_dot`): a small wrapper graph with its
//! own node/edge types, built once after the solver reaches quiescence.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::context::ContextId;
use crate::cs_manager::Pointer;
use crate::graph::pfg::{DirectKind, PfgEdgeKind, PfgNodeId};
use crate::heap::Obj;
use crate::ir::{ObjId, Type, Var};
use crate::solver::Solver;
use crate::taint::manager::{SourcePoint, TaintFlow};

pub type TfgNodeId = NodeIndex;

/// Whether a PFG edge is always taint-preserving or only conditionally so
/// (kept iff its target's points-to set actually contains a taint object at
/// build time), plus the synthetic edges contributed by transfer rules.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TfgEdgeKind {
    Unconditional,
    Conditional,
    Transfer,
}

fn is_conditional(kind: &PfgEdgeKind) -> bool {
    matches!(
        kind,
        PfgEdgeKind::Cast(_) | PfgEdgeKind::InstanceLoad(_) | PfgEdgeKind::ArrayLoad | PfgEdgeKind::Direct(DirectKind::Return)
    )
}

pub struct TaintFlowGraph {
    graph: DiGraph<Pointer, TfgEdgeKind>,
    nodes: HashMap<Pointer, TfgNodeId>,
}

impl TaintFlowGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, pointer: &Pointer) -> bool {
        self.nodes.contains_key(pointer)
    }

    pub fn to_dot(&self) -> String {
        format!("{:?}", petgraph::dot::Dot::with_config(&self.graph, &[petgraph::dot::Config::EdgeNoLabel]))
    }
}

/// A var's owning method, derived once per build so `onlyApp` pruning (§4.6)
/// can tell a library variable from an application one; the IR itself keeps
/// no such reverse map since vars are otherwise addressed only by id.
fn application_vars(solver: &Solver) -> HashSet<Var> {
    let mut app_vars = HashSet::new();
    for method in solver.program.methods() {
        if !method.is_application {
            continue;
        }
        app_vars.extend(method.params.iter().copied());
        app_vars.extend(method.this_var);
        app_vars.extend(method.return_var);
        for stmt in &method.body {
            collect_stmt_vars(stmt, &mut app_vars);
        }
    }
    app_vars
}

/// Allocation sites (`New` statements) whose containing method is
/// application code, so instance/array nodes can be classified the same way
/// as vars (§4.6 step 4, "InstanceNode: any containing method is
/// application").
fn application_obj_ids(solver: &Solver) -> HashSet<ObjId> {
    let mut app_objs = HashSet::new();
    for method in solver.program.methods() {
        if !method.is_application {
            continue;
        }
        for stmt in &method.body {
            if let crate::ir::Stmt::New { obj_id, .. } = stmt {
                app_objs.insert(*obj_id);
            }
        }
    }
    app_objs
}

fn collect_stmt_vars(stmt: &crate::ir::Stmt, out: &mut HashSet<Var>) {
    use crate::ir::Stmt::*;
    match stmt {
        Copy { lhs, rhs } => {
            out.insert(*lhs);
            out.insert(*rhs);
        }
        Cast { lhs, rhs, .. } => {
            out.insert(*lhs);
            out.insert(*rhs);
        }
        LoadField { lhs, base, .. } => {
            out.insert(*lhs);
            out.insert(*base);
        }
        StoreField { base, rhs, .. } => {
            out.insert(*base);
            out.insert(*rhs);
        }
        LoadArray { lhs, base } => {
            out.insert(*lhs);
            out.insert(*base);
        }
        StoreArray { base, rhs } => {
            out.insert(*base);
            out.insert(*rhs);
        }
        New { lhs, .. } => {
            out.insert(*lhs);
        }
        Invoke(invoke) => {
            out.extend(invoke.recv);
            out.extend(invoke.args.iter().copied());
            out.extend(invoke.result);
        }
        Return { value } => {
            out.extend(*value);
        }
    }
}

fn is_taint(solver: &Solver, cs_obj_id: crate::cs_manager::CSObjId) -> bool {
    matches!(solver.cs_manager.cs_obj(cs_obj_id).obj, Obj::Taint(_, _))
}

/// Builds the pruned taint flow graph (§4.6): a forward BFS from every
/// source variable, classifying PFG edges as unconditional/conditional plus
/// synthetic transfer edges, then keeping only nodes that can reach a sink
/// actually witnessed in `flows`.
pub fn build(
    solver: &Solver,
    flows: &HashSet<TaintFlow>,
    var_transfers: &HashMap<(ContextId, Var), Vec<((ContextId, Var), Type)>>,
    only_app: bool,
) -> TaintFlowGraph {
    let app_vars = application_vars(solver);
    let app_objs = application_obj_ids(solver);
    let pfg = &solver.pfg;

    let mut source_vars = HashSet::new();
    let mut sink_vars = HashSet::new();
    for flow in flows {
        let source_var = match &flow.source {
            SourcePoint::CallSource(invoke_id, idx) => solver.invoke(*invoke_id).actual_at(*idx),
            SourcePoint::ParamSource(method_id, idx) => solver.program.method(*method_id).formal_at(*idx),
        };
        source_vars.extend(source_var);
        sink_vars.extend(solver.invoke(flow.sink.invoke).actual_at(flow.sink.index));
    }

    // `onlyApp` never stops traversal at a library-owned node — library code
    // can still relay taint onward into application code — it only decides
    // whether an edge *targeting* such a node is kept in the emitted graph
    // (§4.6 step 4). Covers both VarNode and InstanceNode (instance
    // field/array element) per the spec's own wording; StaticField has no
    // "containing method" to classify by, so it is never pruned.
    let keep_node = |pointer: &Pointer| -> bool {
        if !only_app {
            return true;
        }
        match pointer {
            Pointer::CSVar(_, v) => app_vars.contains(v),
            Pointer::InstanceField(base, _) | Pointer::ArrayIndex(base) => match &solver.cs_manager.cs_obj(*base).obj {
                Obj::Alloc(obj_id, _) => app_objs.contains(obj_id),
                _ => false,
            },
            Pointer::StaticField(_) => true,
        }
    };

    let mut visited: HashSet<PfgNodeId> = HashSet::new();
    let mut queue: VecDeque<PfgNodeId> = VecDeque::new();
    for &source_var in &source_vars {
        for ctx in pfg.cs_vars_of(source_var) {
            let Some(node) = pfg.node_of(&Pointer::CSVar(ctx, source_var)) else { continue };
            visited.insert(node);
            queue.push_back(node);
        }
    }

    let mut edges: Vec<(PfgNodeId, PfgNodeId, TfgEdgeKind)> = Vec::new();
    while let Some(node) = queue.pop_front() {
        for edge in pfg.graph.edges_directed(node, Direction::Outgoing) {
            let dst = edge.target();
            let kind = &edge.weight().kind;
            let conditional = is_conditional(kind);
            if conditional {
                let dst_pts = solver.get_points_to_set_of(pfg.pointer_of(dst));
                use crate::pts_set::points_to::PointsToSet;
                if !dst_pts.iter().any(|obj_id| is_taint(solver, obj_id)) {
                    continue;
                }
            }
            if keep_node(pfg.pointer_of(dst)) {
                edges.push((node, dst, if conditional { TfgEdgeKind::Conditional } else { TfgEdgeKind::Unconditional }));
            }
            if visited.insert(dst) {
                queue.push_back(dst);
            }
        }

        if let Pointer::CSVar(ctx, v) = pfg.pointer_of(node) {
            if let Some(targets) = var_transfers.get(&(*ctx, *v)) {
                for ((to_ctx, to_var), _ty) in targets {
                    let dst = pfg.node_of(&Pointer::CSVar(*to_ctx, *to_var));
                    let Some(dst) = dst else { continue };
                    if keep_node(pfg.pointer_of(dst)) {
                        edges.push((node, dst, TfgEdgeKind::Transfer));
                    }
                    if visited.insert(dst) {
                        queue.push_back(dst);
                    }
                }
            }
        }
    }

    // Prune to nodes that can reach a sink: reverse BFS from sink nodes over
    // the collected edge set, restricted to `visited`.
    let sink_nodes: HashSet<PfgNodeId> = visited
        .iter()
        .copied()
        .filter(|&n| matches!(pfg.pointer_of(n), Pointer::CSVar(_, v) if sink_vars.contains(v)))
        .collect();

    let mut reverse_adj: HashMap<PfgNodeId, Vec<PfgNodeId>> = HashMap::new();
    for &(src, dst, _) in &edges {
        reverse_adj.entry(dst).or_default().push(src);
    }
    let mut reaches_sink: HashSet<PfgNodeId> = HashSet::new();
    let mut rqueue: VecDeque<PfgNodeId> = sink_nodes.iter().copied().collect();
    reaches_sink.extend(sink_nodes.iter().copied());
    while let Some(n) = rqueue.pop_front() {
        if let Some(preds) = reverse_adj.get(&n) {
            for &p in preds {
                if reaches_sink.insert(p) {
                    rqueue.push_back(p);
                }
            }
        }
    }

    let mut graph = DiGraph::new();
    let mut nodes: HashMap<Pointer, TfgNodeId> = HashMap::new();
    let mut get_or_add = |graph: &mut DiGraph<Pointer, TfgEdgeKind>, nodes: &mut HashMap<Pointer, TfgNodeId>, pointer: Pointer| -> TfgNodeId {
        if let Some(&id) = nodes.get(&pointer) {
            return id;
        }
        let id = graph.add_node(pointer.clone());
        nodes.insert(pointer, id);
        id
    };
    for (src, dst, kind) in edges {
        if !reaches_sink.contains(&src) || !reaches_sink.contains(&dst) {
            continue;
        }
        let src_ptr = pfg.pointer_of(src).clone();
        let dst_ptr = pfg.pointer_of(dst).clone();
        let src_id = get_or_add(&mut graph, &mut nodes, src_ptr);
        let dst_id = get_or_add(&mut graph, &mut nodes, dst_ptr);
        graph.add_edge(src_id, dst_id, kind);
    }

    TaintFlowGraph { graph, nodes }
}
