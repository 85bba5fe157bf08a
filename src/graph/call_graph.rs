// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! On-the-fly call graph over context-sensitive methods (§2, §3 "Call graph").
//!
//! Built incrementally by the solver as resolved virtual dispatch uncovers
//! new callees; nodes and edges are never removed once added.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DefaultIx, EdgeIndex, NodeIndex};
use petgraph::Graph;

use crate::cs_manager::{CSCallSite, CSMethod};
use crate::util::chunked_queue::{self, ChunkedQueue};

pub type CGNodeId = NodeIndex<DefaultIx>;
pub type CGEdgeId = EdgeIndex<DefaultIx>;

/// The kind of a call edge, named in §3's call graph definition.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Kind {
    /// A statically resolved direct call.
    Local,
    /// A virtual call resolved against a concrete receiver type.
    Call,
    /// The synthetic edge from a call site back to its continuation.
    Return,
    /// Anything not cleanly one of the above (e.g. reflection-induced).
    Other,
}

#[derive(Debug)]
pub struct CallGraphNode {
    pub method: CSMethod,
}

#[derive(Debug)]
pub struct CallGraphEdge {
    pub callsite: CSCallSite,
    pub kind: Kind,
}

pub struct CallGraph {
    pub graph: Graph<CallGraphNode, CallGraphEdge>,
    pub method_nodes: HashMap<CSMethod, CGNodeId>,
    pub callsite_to_edges: HashMap<CSCallSite, HashSet<CGEdgeId>>,
    reach_methods: ChunkedQueue<CSMethod>,
}

impl CallGraph {
    pub fn new() -> Self {
        CallGraph {
            graph: Graph::new(),
            method_nodes: HashMap::new(),
            callsite_to_edges: HashMap::new(),
            reach_methods: ChunkedQueue::new(),
        }
    }

    /// Adds `method` as a reachable node if it is not already present.
    pub fn add_node(&mut self, method: CSMethod) {
        if let Entry::Vacant(e) = self.method_nodes.entry(method) {
            let node_id = self.graph.add_node(CallGraphNode { method });
            e.insert(node_id);
            self.reach_methods.push(method);
        }
    }

    fn get_or_insert_node(&mut self, method: CSMethod) -> CGNodeId {
        match self.method_nodes.entry(method) {
            Entry::Occupied(o) => *o.get(),
            Entry::Vacant(v) => {
                self.reach_methods.push(method);
                let node_id = self.graph.add_node(CallGraphNode { method });
                *v.insert(node_id)
            }
        }
    }

    pub fn get_callees(&self, callsite: &CSCallSite) -> HashSet<CSMethod> {
        match self.callsite_to_edges.get(callsite) {
            Some(edges) => edges
                .iter()
                .filter_map(|edge_id| self.graph.edge_endpoints(*edge_id))
                .map(|(_, target)| self.graph.node_weight(target).unwrap().method)
                .collect(),
            None => HashSet::new(),
        }
    }

    pub fn has_edge(&self, callsite: &CSCallSite, callee: CSMethod) -> bool {
        self.get_callees(callsite).contains(&callee)
    }

    /// Adds a call edge `caller --callsite(kind)--> callee`. Returns `false`
    /// if this callsite already targets `callee` (the edge is a no-op).
    pub fn add_edge(&mut self, callsite: CSCallSite, caller: CSMethod, callee: CSMethod, kind: Kind) -> bool {
        let caller_node = self.get_or_insert_node(caller);
        let callee_node = self.get_or_insert_node(callee);

        if self.has_edge(&callsite, callee) {
            return false;
        }
        let edge_id = self.graph.add_edge(caller_node, callee_node, CallGraphEdge { callsite, kind });
        self.callsite_to_edges.entry(callsite).or_default().insert(edge_id);
        true
    }

    /// Iterates reachable methods in discovery order.
    pub fn reach_methods_iter(&self) -> chunked_queue::IterCopied<CSMethod> {
        self.reach_methods.iter_copied()
    }

    pub fn callers_of(&self, method: CSMethod) -> HashSet<CSMethod> {
        match self.method_nodes.get(&method) {
            Some(&node) => self
                .graph
                .neighbors_directed(node, petgraph::Direction::Incoming)
                .map(|n| self.graph.node_weight(n).unwrap().method)
                .collect(),
            None => HashSet::new(),
        }
    }

    /// Renders the graph in Graphviz DOT format.
    pub fn to_dot(&self) -> String {
        format!(
            "{:?}",
            petgraph::dot::Dot::with_attr_getters(
                &self.graph,
                &[],
                &|_, _| String::new(),
                &|_, (_, node)| format!("label=\"{:?}\"", node.method),
            )
        )
    }
}

impl Default for CallGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallGraph")
            .field("methods", &self.method_nodes.len())
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}
