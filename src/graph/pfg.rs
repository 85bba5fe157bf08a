// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The pointer flow graph (PFG, §4.2): nodes are [`Pointer`]s, directed edges
//! indicate assignment flow, some filtered by a cast/load/store kind.
//!
//! This graph also serves as the object flow graph once solved: after
//! fixpoint, each node's installed points-to set *is* the OFG's per-node
//! object set, so no separate structure is kept. `InstanceLoad`/
//! `InstanceStore`/`ArrayLoad`/`ArrayStore` edges are materialized on the fly
//! as new CSObjs reach a base variable (§4.2 "load/store edges unfold field/
//! array access") rather than existing statically ahead of time; the solver
//! is responsible for calling `add_edge` as each base object is discovered.
//! There is no `Addr` edge kind: allocation (`Stmt::New`) seeds a points-to
//! set directly rather than through a reference-taking statement.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DefaultIx, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use petgraph::Graph;

use crate::context::ContextId;
use crate::cs_manager::{CSObjId, Pointer};
use crate::ir::{Field, Type, Var};

pub type PfgNodeId = NodeIndex<DefaultIx>;
pub type PfgEdgeId = EdgeIndex<DefaultIx>;

/// Sub-kinds of a direct (unfiltered) assignment edge. All four move a
/// points-to set through unchanged; they are distinguished only so that the
/// taint flow graph builder (§4.6) can attribute a reported flow to the
/// statement shape that produced it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum DirectKind {
    LocalAssign,
    ThisPassing,
    ParamPassing,
    Return,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum PfgEdgeKind {
    Direct(DirectKind),
    /// Drops objects whose dynamic type is not a subtype of the target.
    Cast(Type),
    InstanceLoad(Field),
    InstanceStore(Field),
    ArrayLoad,
    ArrayStore,
}

#[derive(Debug)]
pub struct PfgNode {
    pub pointer: Pointer,
}

#[derive(Debug)]
pub struct PfgEdge {
    pub kind: PfgEdgeKind,
}

/// The pointer flow graph. `nodes` doubles as the canonicalization table for
/// [`Pointer`] (mirroring the teacher's `PAG<P>::values` pattern) and as the
/// key space for the solver's diff points-to data.
pub struct Pfg {
    pub graph: Graph<PfgNode, PfgEdge>,
    nodes: HashMap<Pointer, PfgNodeId>,
    edge_index: HashSet<(PfgNodeId, PfgNodeId, PfgEdgeKind)>,
}

impl Pfg {
    pub fn new() -> Self {
        Pfg { graph: Graph::new(), nodes: HashMap::new(), edge_index: HashSet::new() }
    }

    /// Returns the node for `pointer`, creating it (with an implicit empty
    /// points-to set, owned by the solver's PT data, not here) if absent.
    pub fn get_or_insert_node(&mut self, pointer: Pointer) -> PfgNodeId {
        if let Some(&id) = self.nodes.get(&pointer) {
            return id;
        }
        let id = self.graph.add_node(PfgNode { pointer: pointer.clone() });
        self.nodes.insert(pointer, id);
        id
    }

    pub fn node_of(&self, pointer: &Pointer) -> Option<PfgNodeId> {
        self.nodes.get(pointer).copied()
    }

    pub fn pointer_of(&self, node: PfgNodeId) -> &Pointer {
        &self.graph.node_weight(node).unwrap().pointer
    }

    pub fn has_edge(&self, src: PfgNodeId, dst: PfgNodeId, kind: &PfgEdgeKind) -> bool {
        self.edge_index.contains(&(src, dst, kind.clone()))
    }

    /// Adds `src -> dst` labeled `kind`. Returns `true` if a new edge was
    /// created, `false` if it already existed (edges are never duplicated).
    pub fn add_edge(&mut self, src: Pointer, dst: Pointer, kind: PfgEdgeKind) -> bool {
        let src_id = self.get_or_insert_node(src);
        let dst_id = self.get_or_insert_node(dst);
        self.add_edge_between(src_id, dst_id, kind)
    }

    /// Node-id form of [`Self::add_edge`], for callers that already hold the
    /// endpoints (the solver, mostly, to avoid re-hashing a `Pointer`).
    pub fn add_edge_between(&mut self, src_id: PfgNodeId, dst_id: PfgNodeId, kind: PfgEdgeKind) -> bool {
        if self.edge_index.contains(&(src_id, dst_id, kind.clone())) {
            return false;
        }
        self.graph.add_edge(src_id, dst_id, PfgEdge { kind: kind.clone() });
        self.edge_index.insert((src_id, dst_id, kind));
        true
    }

    /// Outgoing edges of `node`, as `(target node, edge kind)` pairs.
    pub fn out_edges(&self, node: PfgNodeId) -> impl Iterator<Item = (PfgNodeId, &PfgEdgeKind)> {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.target(), &e.weight().kind))
    }

    /// Streaming accessor: every `CSVar` node currently in the graph (§4.1).
    /// `nodes` is the only table that actually knows which CS elements have
    /// ever reached a node, so this lives here rather than on `CSManager`.
    pub fn cs_vars(&self) -> impl Iterator<Item = (ContextId, Var)> + '_ {
        self.nodes.keys().filter_map(|p| match p {
            Pointer::CSVar(ctx, v) => Some((*ctx, *v)),
            _ => None,
        })
    }

    /// Streaming accessor: every context a given [`Var`] has a node under.
    pub fn cs_vars_of(&self, var: Var) -> impl Iterator<Item = ContextId> + '_ {
        self.nodes.keys().filter_map(move |p| match p {
            Pointer::CSVar(ctx, v) if *v == var => Some(*ctx),
            _ => None,
        })
    }

    /// Streaming accessor: every `InstanceField` node currently in the graph.
    pub fn instance_fields(&self) -> impl Iterator<Item = (CSObjId, Field)> + '_ {
        self.nodes.keys().filter_map(|p| match p {
            Pointer::InstanceField(base, field) => Some((*base, field.clone())),
            _ => None,
        })
    }

    /// Streaming accessor: every `ArrayIndex` node currently in the graph.
    pub fn array_indexes(&self) -> impl Iterator<Item = CSObjId> + '_ {
        self.nodes.keys().filter_map(|p| match p {
            Pointer::ArrayIndex(base) => Some(*base),
            _ => None,
        })
    }

    /// Streaming accessor: every `StaticField` node currently in the graph.
    pub fn static_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.nodes.keys().filter_map(|p| match p {
            Pointer::StaticField(field) => Some(field.clone()),
            _ => None,
        })
    }
}

impl Default for Pfg {
    fn default() -> Self {
        Self::new()
    }
}
