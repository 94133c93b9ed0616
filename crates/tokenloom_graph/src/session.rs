// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing session: the owner of the graph and the entry point for UI events.
//!
//! Each [`InputEvent`] mutates the graph and runs exactly one evaluation
//! pass before returning, so callers always observe a settled graph. An
//! event whose pass fails is undone.

use crate::evaluation::{evaluate_all, EvaluationError, EvaluationLimits, EvaluationStrategy};
use crate::graph::{Graph, GraphError};
use crate::node::{Node, NodeId, NodeKind};
use crate::propagation::{run_pass, token_of, PassReport, SinkUpdate, Trigger};
use crate::tokens::{ExportPayload, TokenBinding};
use serde::{Deserialize, Serialize};

/// A discrete event reported by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// A control on a node was edited
    ControlChanged {
        /// Edited node
        node: NodeId,
        /// Control name
        control: String,
        /// Raw value from the widget
        value: String,
    },
    /// The user dragged from an output socket onto an input socket
    ConnectRequested {
        /// Source node
        from_node: NodeId,
        /// Source output socket
        from_socket: String,
        /// Target node
        to_node: NodeId,
        /// Target input socket
        to_socket: String,
    },
    /// The user asked to clear an input socket
    DisconnectRequested {
        /// Target node
        node: NodeId,
        /// Target input socket
        socket: String,
    },
    /// A node was dropped onto the canvas
    NodeCreated {
        /// Kind of node
        kind: NodeKind,
        /// Canvas position
        position: [f32; 2],
    },
    /// A node was deleted
    NodeRemoved {
        /// Deleted node
        node: NodeId,
    },
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    /// Node created by the event, if any
    pub created: Option<NodeId>,
    /// The evaluation pass run for the event
    pub report: PassReport,
}

/// A token editing session
#[derive(Debug, Clone)]
pub struct Session {
    graph: Graph,
    strategy: EvaluationStrategy,
    limits: EvaluationLimits,
}

impl Session {
    /// Start a session over an empty graph
    pub fn new(strategy: EvaluationStrategy, limits: EvaluationLimits) -> Self {
        Self::with_graph(Graph::default(), strategy, limits)
    }

    /// Start a session over an existing graph
    pub fn with_graph(
        graph: Graph,
        strategy: EvaluationStrategy,
        limits: EvaluationLimits,
    ) -> Self {
        Self {
            graph,
            strategy,
            limits,
        }
    }

    /// The graph being edited
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Strategy used for passes
    pub fn strategy(&self) -> EvaluationStrategy {
        self.strategy
    }

    /// Limits used for passes
    pub fn limits(&self) -> EvaluationLimits {
        self.limits
    }

    /// Apply an event and run its evaluation pass
    ///
    /// On error the graph, its connections and cached values are left as
    /// they were before the event.
    pub fn handle(&mut self, event: InputEvent) -> Result<EventOutcome, SessionError> {
        let snapshot = self.graph.clone();
        let outcome = self.apply(event);
        if let Err(err) = &outcome {
            tracing::debug!("Rolled back rejected event: {err}");
            self.graph = snapshot;
        }
        outcome
    }

    fn apply(&mut self, event: InputEvent) -> Result<EventOutcome, SessionError> {
        match event {
            InputEvent::ControlChanged {
                node,
                control,
                value,
            } => {
                self.graph.set_control(node, &control, &value)?;
                self.pass(Trigger::ControlEdited(node), None)
            }
            InputEvent::ConnectRequested {
                from_node,
                from_socket,
                to_node,
                to_socket,
            } => self.connect(from_node, from_socket, to_node, to_socket),
            InputEvent::DisconnectRequested { node, socket } => {
                if self.graph.disconnect(node, &socket).is_none() {
                    tracing::debug!("Nothing connected to {node}.{socket}");
                    return Ok(self.empty_outcome());
                }
                self.pass(Trigger::ConnectionChanged(node), None)
            }
            InputEvent::NodeCreated { kind, position } => {
                let node = Node::new(kind).with_position(position[0], position[1]);
                let id = self.graph.add_node(node);
                tracing::info!("Created {kind} ({id})");
                self.pass(Trigger::NodeAdded(id), Some(id))
            }
            InputEvent::NodeRemoved { node } => {
                if !self.graph.contains(node) {
                    return Err(GraphError::NodeNotFound(node).into());
                }
                let downstream = self.graph.downstream_closure(node);
                self.graph.remove_node(node);
                self.pass(Trigger::NodeRemoved { downstream }, None)
            }
        }
    }

    /// Shorthand for [`InputEvent::NodeCreated`], returning the new node's ID
    pub fn create_node(
        &mut self,
        kind: NodeKind,
        position: [f32; 2],
    ) -> Result<NodeId, SessionError> {
        let outcome = self.handle(InputEvent::NodeCreated { kind, position })?;
        outcome
            .created
            .ok_or_else(|| SessionError::Rejected("node was not created".to_string()))
    }

    /// Re-evaluate every node
    pub fn evaluate(&mut self) -> Result<PassReport, SessionError> {
        let evaluation = evaluate_all(&mut self.graph, self.limits)?;
        Ok(PassReport::from_evaluation(
            &self.graph,
            EvaluationStrategy::Full,
            &evaluation,
        )?)
    }

    /// Current bindings of all output tokens that have a value
    pub fn tokens(&self) -> Vec<TokenBinding> {
        self.graph
            .sinks()
            .filter(|n| n.kind == NodeKind::OutputToken)
            .filter_map(|n| {
                n.cached_value.clone().map(|value| TokenBinding {
                    node: n.id,
                    token: token_of(n),
                    value,
                })
            })
            .collect()
    }

    /// Current payloads of all export nodes that have a value
    pub fn exports(&self) -> Result<Vec<ExportPayload>, SessionError> {
        let mut payloads = Vec::new();
        for node in self.graph.sinks() {
            if let Some(SinkUpdate::Export {
                payload: Some(payload),
                ..
            }) = SinkUpdate::for_node(node, node.cached_value.as_ref())?
            {
                payloads.push(payload);
            }
        }
        Ok(payloads)
    }

    fn connect(
        &mut self,
        from_node: NodeId,
        from_socket: String,
        to_node: NodeId,
        to_socket: String,
    ) -> Result<EventOutcome, SessionError> {
        if let Some(mut path) = self.graph.path_between(to_node, from_node) {
            path.push(to_node);
            tracing::warn!(
                "Rejected connection {from_node}.{from_socket} -> {to_node}.{to_socket}: \
                 would form a cycle"
            );
            return Err(EvaluationError::CyclicDependency { path }.into());
        }

        if let Some(replaced) = self
            .graph
            .connect(from_node, from_socket, to_node, to_socket)
        {
            tracing::debug!(
                "Replaced connection from {}.{}",
                replaced.from_node,
                replaced.from_socket
            );
        }
        self.pass(Trigger::ConnectionChanged(to_node), None)
    }

    fn pass(
        &mut self,
        trigger: Trigger,
        created: Option<NodeId>,
    ) -> Result<EventOutcome, SessionError> {
        let report = run_pass(&mut self.graph, &trigger, self.strategy, self.limits)?;
        tracing::info!(
            "Evaluated {} node(s), {} sink(s) updated",
            report.recomputed.len(),
            report.sink_updates.len()
        );
        Ok(EventOutcome { created, report })
    }

    fn empty_outcome(&self) -> EventOutcome {
        EventOutcome {
            created: None,
            report: PassReport {
                strategy: self.strategy,
                recomputed: Vec::new(),
                previews: Vec::new(),
                sink_updates: Vec::new(),
            },
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EvaluationStrategy::default(), EvaluationLimits::default())
    }
}

/// Error when handling an input event
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// The edit was rejected by the graph
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The evaluation pass failed
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// The event could not be applied
    #[error("Event rejected: {0}")]
    Rejected(String),
}
