// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph evaluation.
//!
//! Values are resolved on demand: evaluating a node resolves each of its
//! declared inputs through the connection registry, evaluates the source
//! node recursively, then runs the node's compute function. Each node is
//! computed at most once per pass.
//!
//! Before a node is computed, the longest chain of connections feeding it
//! is measured. A wiring loop surfaces as
//! [`EvaluationError::CyclicDependency`] instead of recursing forever, and
//! a chain longer than [`EvaluationLimits::max_depth`] is rejected no matter
//! which nodes were already computed or cached.

use crate::compute::ResolvedInputs;
use crate::graph::Graph;
use crate::node::NodeId;
use crate::value::TokenValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a pass decides which nodes to recompute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStrategy {
    /// Recompute every node on every trigger
    Full,
    /// Recompute the changed node and everything downstream of it
    #[default]
    Incremental,
}

/// Bounds applied while resolving inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationLimits {
    /// Longest dependency chain that may be resolved
    pub max_depth: usize,
}

impl Default for EvaluationLimits {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// Values computed by one pass, in computation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    values: IndexMap<NodeId, Option<TokenValue>>,
}

impl Evaluation {
    /// Value computed for a node, if it was computed in this pass
    pub fn get(&self, node_id: NodeId) -> Option<&Option<TokenValue>> {
        self.values.get(&node_id)
    }

    /// Nodes computed in this pass, dependencies first
    pub fn computed(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.values.keys().copied()
    }

    /// Number of nodes computed
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was computed
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Store the computed values as the nodes' cached values
    pub fn apply(&self, graph: &mut Graph) {
        for (node_id, value) in &self.values {
            if let Some(node) = graph.node_mut(*node_id) {
                node.cached_value = value.clone();
            }
        }
    }
}

/// Resolves node values over a borrowed graph
pub struct Evaluator<'a> {
    /// The graph being evaluated
    graph: &'a Graph,
    /// Limits for this pass
    limits: EvaluationLimits,
    /// Values known before the pass started
    seeded: HashMap<NodeId, Option<TokenValue>>,
    /// Values computed during the pass
    computed: Evaluation,
    /// Longest chain ending at each measured node, the node included
    depths: HashMap<NodeId, usize>,
    /// Nodes currently being measured, outermost first
    stack: Vec<NodeId>,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator that computes everything it touches
    pub fn new(graph: &'a Graph, limits: EvaluationLimits) -> Self {
        Self {
            graph,
            limits,
            seeded: HashMap::new(),
            computed: Evaluation::default(),
            depths: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Reuse the cached values of the given nodes instead of recomputing them
    ///
    /// Nodes without a cached value are still computed when needed.
    pub fn with_cached(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        for node_id in nodes {
            if let Some(value) = self.graph.node(node_id).and_then(|n| n.cached_value.clone()) {
                self.seeded.insert(node_id, Some(value));
            }
        }
        self
    }

    /// Evaluate a node, resolving its inputs first
    pub fn evaluate(&mut self, node_id: NodeId) -> Result<Option<TokenValue>, EvaluationError> {
        if let Some(value) = self.seeded.get(&node_id).or_else(|| self.computed.get(node_id)) {
            return Ok(value.clone());
        }

        self.chain_depth(node_id)?;

        let graph = self.graph;
        let node = graph
            .node(node_id)
            .ok_or(EvaluationError::NodeNotFound(node_id))?;

        let mut inputs = ResolvedInputs::new();
        for socket in node.inputs() {
            if let Some(value) = self.resolve_input(node_id, socket.name)? {
                inputs.insert(socket.name, value);
            }
        }

        let value = (node.kind.spec().compute)(&node.controls, &inputs);
        tracing::debug!(
            "Computed {} ({node_id}): {}",
            node.kind,
            value.as_ref().map_or_else(|| "-".to_string(), ToString::to_string)
        );
        self.computed.values.insert(node_id, value.clone());
        Ok(value)
    }

    /// Resolve the value arriving at an input socket
    ///
    /// An unwired input, a source node that no longer exists, or a source
    /// socket the node does not declare all resolve to `None`.
    pub fn resolve_input(
        &mut self,
        node_id: NodeId,
        socket: &str,
    ) -> Result<Option<TokenValue>, EvaluationError> {
        match self.graph.resolvable_source(node_id, socket) {
            Some(source) => self.evaluate(source),
            None => Ok(None),
        }
    }

    /// Number of nodes on the longest chain ending at `node_id`
    ///
    /// Walks the graph itself, so cached sources still count toward the
    /// limit.
    fn chain_depth(&mut self, node_id: NodeId) -> Result<usize, EvaluationError> {
        if let Some(depth) = self.depths.get(&node_id) {
            return Ok(*depth);
        }

        if let Some(start) = self.stack.iter().position(|n| *n == node_id) {
            let mut path = self.stack[start..].to_vec();
            path.push(node_id);
            return Err(EvaluationError::CyclicDependency { path });
        }

        let limit = self.limits.max_depth;
        if self.stack.len() >= limit {
            return Err(EvaluationError::DepthExceeded { limit });
        }

        let graph = self.graph;
        let node = graph
            .node(node_id)
            .ok_or(EvaluationError::NodeNotFound(node_id))?;

        self.stack.push(node_id);
        let mut deepest = 0;
        for socket in node.inputs() {
            let Some(source) = graph.resolvable_source(node_id, socket.name) else {
                continue;
            };
            match self.chain_depth(source) {
                Ok(depth) => deepest = deepest.max(depth),
                Err(err) => {
                    self.stack.pop();
                    return Err(err);
                }
            }
        }
        self.stack.pop();

        let depth = deepest + 1;
        if depth > limit {
            return Err(EvaluationError::DepthExceeded { limit });
        }
        self.depths.insert(node_id, depth);
        Ok(depth)
    }

    /// Finish the pass, returning everything computed
    pub fn finish(self) -> Evaluation {
        self.computed
    }
}

/// Evaluate a single node without touching cached values
pub fn evaluate_node(
    graph: &Graph,
    node_id: NodeId,
    limits: EvaluationLimits,
) -> Result<Option<TokenValue>, EvaluationError> {
    Evaluator::new(graph, limits).evaluate(node_id)
}

/// Recompute every node and store the results
///
/// Nothing is stored if any node fails to evaluate.
pub fn evaluate_all(
    graph: &mut Graph,
    limits: EvaluationLimits,
) -> Result<Evaluation, EvaluationError> {
    let nodes: Vec<NodeId> = graph.node_ids().collect();
    evaluate_nodes(graph, &nodes, &[], limits)
}

/// Recompute only the given nodes, reusing cached values for the rest
///
/// Nothing is stored if any node fails to evaluate.
pub fn evaluate_affected(
    graph: &mut Graph,
    affected: &[NodeId],
    limits: EvaluationLimits,
) -> Result<Evaluation, EvaluationError> {
    let unaffected: Vec<NodeId> = graph
        .node_ids()
        .filter(|id| !affected.contains(id))
        .collect();
    evaluate_nodes(graph, affected, &unaffected, limits)
}

fn evaluate_nodes(
    graph: &mut Graph,
    targets: &[NodeId],
    cached: &[NodeId],
    limits: EvaluationLimits,
) -> Result<Evaluation, EvaluationError> {
    let evaluation = {
        let mut evaluator = Evaluator::new(graph, limits).with_cached(cached.iter().copied());
        for node_id in targets {
            if graph.contains(*node_id) {
                evaluator.evaluate(*node_id)?;
            }
        }
        evaluator.finish()
    };

    evaluation.apply(graph);
    Ok(evaluation)
}

/// Error during evaluation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// Resolving a node led back to the node itself
    #[error("Cyclic dependency: {}", format_path(.path))]
    CyclicDependency {
        /// The loop, starting and ending at the same node
        path: Vec<NodeId>,
    },

    /// The dependency chain is longer than allowed
    #[error("Dependency chain exceeds {limit} nodes")]
    DepthExceeded {
        /// The configured bound
        limit: usize,
    },

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Export payload could not be serialized
    #[error("Failed to serialize export: {0}")]
    Serialization(String),
}

fn format_path(path: &[NodeId]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
