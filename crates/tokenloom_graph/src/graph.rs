// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and connections.

use crate::connection::{Connection, ConnectionRegistry, InputKey, OutputRef};
use crate::node::{ControlError, Node, NodeId};
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashSet, VecDeque};

/// A token graph
#[derive(Debug, Clone)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Connections between nodes
    connections: ConnectionRegistry,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            connections: ConnectionRegistry::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and every connection that names it
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.shift_remove(&node_id)?;
        let removed = self.connections.remove_node(node_id);
        tracing::debug!(
            "Removed {} ({node_id}) with {} connection(s)",
            node.kind,
            removed.len()
        );
        Some(node)
    }

    /// Check whether a node is in the graph
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes, in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get all sink nodes, in creation order
    pub fn sinks(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.kind.is_sink())
    }

    /// Validate and store a control edit
    pub fn set_control(
        &mut self,
        node_id: NodeId,
        control: &str,
        raw: &str,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.set_control(control, raw)?;
        Ok(())
    }

    /// Connect an output to an input, returning the connection it replaced
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_socket: impl Into<String>,
        to_node: NodeId,
        to_socket: impl Into<String>,
    ) -> Option<Connection> {
        self.connections.connect(from_node, from_socket, to_node, to_socket)
    }

    /// Remove the connection feeding an input
    pub fn disconnect(&mut self, to_node: NodeId, to_socket: &str) -> Option<Connection> {
        self.connections.disconnect(to_node, to_socket)
    }

    /// The output feeding an input
    pub fn find_source(&self, to_node: NodeId, to_socket: &str) -> Option<&OutputRef> {
        self.connections.find_source(to_node, to_socket)
    }

    /// Node whose output reaches an input during evaluation
    ///
    /// `None` when the input is unwired or undeclared, or when the source
    /// node is gone or does not declare the named output.
    pub fn resolvable_source(&self, to_node: NodeId, to_socket: &str) -> Option<NodeId> {
        if !self.nodes.get(&to_node)?.has_input(to_socket) {
            return None;
        }
        let source = self.connections.find_source(to_node, to_socket)?;
        self.nodes
            .get(&source.node)
            .filter(|node| node.has_output(&source.socket))
            .map(|node| node.id)
    }

    /// Nodes that read a value from `from_node`, skipping dangling connections
    fn dependents_of(&self, from_node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.connections
            .downstream_of(from_node)
            .into_iter()
            .filter(move |key| self.resolvable_source(key.node, &key.socket) == Some(from_node))
            .map(|key| key.node)
    }

    /// Inputs fed by the given node
    pub fn downstream_of(&self, from_node: NodeId) -> Vec<InputKey> {
        self.connections.downstream_of(from_node)
    }

    /// Outputs feeding the node's inputs, in input order
    pub fn upstream_of(&self, node_id: NodeId) -> Vec<OutputRef> {
        let Some(node) = self.nodes.get(&node_id) else {
            return Vec::new();
        };
        node.inputs()
            .iter()
            .filter_map(|socket| self.connections.find_source(node_id, socket.name))
            .cloned()
            .collect()
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.connections.iter()
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = Connection> + '_ {
        self.connections.iter().filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Every node reachable by following connections forward, nearest first
    pub fn downstream_closure(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut seen = IndexSet::new();
        let mut queue = VecDeque::from([node_id]);

        while let Some(current) = queue.pop_front() {
            for target in self.dependents_of(current) {
                if target != node_id && seen.insert(target) {
                    queue.push_back(target);
                }
            }
        }

        seen.into_iter().collect()
    }

    /// Whether connecting `from_node` into `to_node` would close a loop
    pub fn would_create_cycle(&self, from_node: NodeId, to_node: NodeId) -> bool {
        from_node == to_node || self.downstream_closure(to_node).contains(&from_node)
    }

    /// Shortest chain of resolvable connections from `start` to `end`, both included
    pub fn path_between(&self, start: NodeId, end: NodeId) -> Option<Vec<NodeId>> {
        if start == end {
            return Some(vec![start]);
        }

        let mut parents: IndexMap<NodeId, NodeId> = IndexMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for target in self.dependents_of(current) {
                if target == start || parents.contains_key(&target) {
                    continue;
                }
                parents.insert(target, current);
                if target == end {
                    let mut path = vec![end];
                    let mut cursor = end;
                    while let Some(parent) = parents.get(&cursor) {
                        path.push(*parent);
                        cursor = *parent;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(target);
            }
        }

        None
    }

    /// Get nodes in dependency order (sources before consumers)
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                self.visit(*node_id, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit(
        &self,
        node_id: NodeId,
        visited: &mut HashSet<NodeId>,
        temp_mark: &mut HashSet<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), CycleError> {
        if temp_mark.contains(&node_id) {
            return Err(CycleError { node: node_id });
        }
        if visited.contains(&node_id) {
            return Ok(());
        }

        temp_mark.insert(node_id);

        // Visit all nodes that this node depends on
        for connection in self.connections_for_node(node_id) {
            if connection.to_node == node_id && self.contains(connection.from_node) {
                self.visit(connection.from_node, visited, temp_mark, order)?;
            }
        }

        temp_mark.remove(&node_id);
        visited.insert(node_id);
        order.push(node_id);

        Ok(())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when editing the graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Rejected control edit
    #[error(transparent)]
    Control(#[from] ControlError),
}

/// Error when graph contains a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Graph contains a cycle through node {node}")]
pub struct CycleError {
    /// A node on the cycle
    pub node: NodeId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn chain() -> (Graph, NodeId, NodeId, NodeId) {
        let mut graph = Graph::default();
        let color = graph.add_node(Node::new(NodeKind::ColorInput));
        let mix = graph.add_node(Node::new(NodeKind::MixColors));
        let out = graph.add_node(Node::new(NodeKind::OutputToken));
        graph.connect(color, "color", mix, "A");
        graph.connect(mix, "result", out, "value");
        (graph, color, mix, out)
    }

    #[test]
    fn test_remove_node_cascades_connections() {
        let (mut graph, color, mix, out) = chain();
        assert_eq!(graph.connection_count(), 2);

        let removed = graph.remove_node(mix).unwrap();
        assert_eq!(removed.kind, NodeKind::MixColors);
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.find_source(out, "value").is_none());
        assert!(graph.downstream_of(color).is_empty());
        assert!(graph.remove_node(mix).is_none());
    }

    #[test]
    fn test_downstream_closure() {
        let (graph, color, mix, out) = chain();
        assert_eq!(graph.downstream_closure(color), vec![mix, out]);
        assert_eq!(graph.downstream_closure(mix), vec![out]);
        assert!(graph.downstream_closure(out).is_empty());
    }

    #[test]
    fn test_upstream_of() {
        let (mut graph, color, mix, _) = chain();
        let other = graph.add_node(Node::new(NodeKind::ColorInput));
        graph.connect(other, "color", mix, "B");

        let sources: Vec<NodeId> = graph.upstream_of(mix).into_iter().map(|s| s.node).collect();
        assert_eq!(sources, vec![color, other]);
        assert!(graph.upstream_of(color).is_empty());
    }

    #[test]
    fn test_would_create_cycle() {
        let (graph, color, mix, out) = chain();
        assert!(graph.would_create_cycle(mix, mix));
        assert!(graph.would_create_cycle(mix, color));
        assert!(!graph.would_create_cycle(color, out));
    }

    #[test]
    fn test_path_between() {
        let (graph, color, mix, out) = chain();
        assert_eq!(graph.path_between(color, out), Some(vec![color, mix, out]));
        assert_eq!(graph.path_between(mix, mix), Some(vec![mix]));
        assert_eq!(graph.path_between(out, color), None);
    }

    #[test]
    fn test_dangling_connections_are_not_followed() {
        let (mut graph, color, mix, out) = chain();
        let stray = graph.add_node(Node::new(NodeKind::MixColors));
        // Undeclared output on the source, undeclared input on the target
        graph.connect(out, "value", stray, "A");
        graph.connect(stray, "result", color, "color");

        assert_eq!(graph.resolvable_source(stray, "A"), None);
        assert_eq!(graph.resolvable_source(mix, "A"), Some(color));
        assert_eq!(graph.path_between(out, stray), None);
        assert_eq!(graph.path_between(stray, mix), None);
        assert!(graph.downstream_closure(out).is_empty());
        assert!(!graph.would_create_cycle(stray, out));
    }

    #[test]
    fn test_topological_order() {
        let (mut graph, color, mix, out) = chain();
        let order = graph.topological_order().unwrap();
        let pos = |id| order.iter().position(|n| *n == id).unwrap();
        assert!(pos(color) < pos(mix));
        assert!(pos(mix) < pos(out));

        let second = graph.add_node(Node::new(NodeKind::MixColors));
        graph.connect(mix, "result", second, "A");
        graph.connect(second, "result", mix, "B");
        assert!(graph.topological_order().is_err());
    }

    #[test]
    fn test_set_control_errors() {
        let (mut graph, color, _, _) = chain();
        assert!(graph.set_control(color, "color", "#000000").is_ok());
        assert!(matches!(
            graph.set_control(color, "color", "nope"),
            Err(GraphError::Control(ControlError::InvalidColor(_)))
        ));
        let missing = NodeId::new();
        assert_eq!(
            graph.set_control(missing, "color", "#000000"),
            Err(GraphError::NodeNotFound(missing))
        );
    }
}
