// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change propagation.
//!
//! A [`Trigger`] names what changed. The pass recomputes the nodes whose
//! values can depend on that change and reports what the presentation
//! and export layers need to refresh.

use crate::evaluation::{
    evaluate_affected, evaluate_all, Evaluation, EvaluationError, EvaluationLimits,
    EvaluationStrategy,
};
use crate::graph::Graph;
use crate::node::{Node, NodeId, NodeKind};
use crate::tokens::{export_variable_name, ExportPayload, TokenBinding, TokenName};
use crate::value::TokenValue;
use serde::{Deserialize, Serialize};

/// What caused an evaluation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// A control on the node was edited
    ControlEdited(NodeId),
    /// An input of the node was connected or disconnected
    ConnectionChanged(NodeId),
    /// The node was just created
    NodeAdded(NodeId),
    /// A node was removed; these nodes were downstream of it
    NodeRemoved {
        /// Former consumers of the removed node
        downstream: Vec<NodeId>,
    },
}

/// Nodes whose values may change because of a trigger, dependencies first
pub fn affected_nodes(graph: &Graph, trigger: &Trigger) -> Vec<NodeId> {
    match trigger {
        Trigger::ControlEdited(node_id) | Trigger::ConnectionChanged(node_id) => {
            if !graph.contains(*node_id) {
                return Vec::new();
            }
            let mut affected = vec![*node_id];
            affected.extend(graph.downstream_closure(*node_id));
            affected
        }
        Trigger::NodeAdded(node_id) => {
            if graph.contains(*node_id) {
                vec![*node_id]
            } else {
                Vec::new()
            }
        }
        Trigger::NodeRemoved { downstream } => downstream
            .iter()
            .copied()
            .filter(|id| graph.contains(*id))
            .collect(),
    }
}

/// A recomputed producer value, for swatches and previews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    /// Producer node
    pub node: NodeId,
    /// Its new value
    pub value: TokenValue,
}

/// New state of a sink node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SinkUpdate {
    /// An output token node; `value` is `None` when its input is empty
    Token {
        /// Output node
        node: NodeId,
        /// Selected token
        token: TokenName,
        /// Value now bound to the token
        value: Option<TokenValue>,
    },
    /// An export node; `payload` is `None` when its input is empty
    Export {
        /// Export node
        node: NodeId,
        /// Variable name the file will be written under
        variable_name: String,
        /// Serialized value
        payload: Option<ExportPayload>,
    },
}

impl SinkUpdate {
    /// Build the update for a sink node holding `value`
    pub fn for_node(
        node: &Node,
        value: Option<&TokenValue>,
    ) -> Result<Option<Self>, EvaluationError> {
        let update = match node.kind {
            NodeKind::OutputToken => SinkUpdate::Token {
                node: node.id,
                token: token_of(node),
                value: value.cloned(),
            },
            NodeKind::ExportSink => {
                let name = node.controls.text("name").unwrap_or_default();
                let payload = value
                    .map(|v| ExportPayload::new(node.id, name, v))
                    .transpose()
                    .map_err(|e| EvaluationError::Serialization(e.to_string()))?;
                SinkUpdate::Export {
                    node: node.id,
                    variable_name: export_variable_name(name),
                    payload,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(update))
    }

    /// The sink node
    pub fn node(&self) -> NodeId {
        match self {
            SinkUpdate::Token { node, .. } | SinkUpdate::Export { node, .. } => *node,
        }
    }

    /// The token binding, if this is a bound output token
    pub fn binding(&self) -> Option<TokenBinding> {
        match self {
            SinkUpdate::Token {
                node,
                token,
                value: Some(value),
            } => Some(TokenBinding {
                node: *node,
                token: *token,
                value: value.clone(),
            }),
            _ => None,
        }
    }
}

/// Token selected on an output node
pub fn token_of(node: &Node) -> TokenName {
    node.controls
        .text("token")
        .and_then(|t| t.parse().ok())
        .unwrap_or(TokenName::PrimaryColor)
}

/// Outcome of one evaluation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    /// Strategy the pass ran with
    pub strategy: EvaluationStrategy,
    /// Nodes recomputed, dependencies first
    pub recomputed: Vec<NodeId>,
    /// New producer values
    pub previews: Vec<Preview>,
    /// New sink states
    pub sink_updates: Vec<SinkUpdate>,
}

impl PassReport {
    /// Describe a finished evaluation
    pub fn from_evaluation(
        graph: &Graph,
        strategy: EvaluationStrategy,
        evaluation: &Evaluation,
    ) -> Result<Self, EvaluationError> {
        let mut report = Self {
            strategy,
            recomputed: Vec::with_capacity(evaluation.len()),
            previews: Vec::new(),
            sink_updates: Vec::new(),
        };

        for node_id in evaluation.computed() {
            report.recomputed.push(node_id);
            let Some(node) = graph.node(node_id) else {
                continue;
            };
            let value = evaluation.get(node_id).and_then(Option::as_ref);

            if node.kind.is_sink() {
                if let Some(update) = SinkUpdate::for_node(node, value)? {
                    report.sink_updates.push(update);
                }
            } else if let Some(value) = value {
                report.previews.push(Preview {
                    node: node_id,
                    value: value.clone(),
                });
            }
        }

        Ok(report)
    }

    /// Whether a node was recomputed in this pass
    pub fn recomputed(&self, node_id: NodeId) -> bool {
        self.recomputed.contains(&node_id)
    }

    /// The update for a sink, if it was touched
    pub fn sink_update(&self, node_id: NodeId) -> Option<&SinkUpdate> {
        self.sink_updates.iter().find(|u| u.node() == node_id)
    }
}

/// Run one synchronous pass for a trigger
pub fn run_pass(
    graph: &mut Graph,
    trigger: &Trigger,
    strategy: EvaluationStrategy,
    limits: EvaluationLimits,
) -> Result<PassReport, EvaluationError> {
    let evaluation = match strategy {
        EvaluationStrategy::Full => evaluate_all(graph, limits)?,
        EvaluationStrategy::Incremental => {
            let affected = affected_nodes(graph, trigger);
            evaluate_affected(graph, &affected, limits)?
        }
    };

    let report = PassReport::from_evaluation(graph, strategy, &evaluation)?;
    tracing::debug!(
        "{:?} pass for {:?}: {} node(s) recomputed, {} sink update(s)",
        strategy,
        trigger,
        report.recomputed.len(),
        report.sink_updates.len()
    );
    Ok(report)
}
