// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions and the connection registry.
//!
//! The registry is keyed by target input, so an input socket can hold at
//! most one source. Connecting an occupied input replaces its source.

use crate::node::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An input socket on a specific node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputKey {
    /// Target node
    pub node: NodeId,
    /// Input socket name
    pub socket: String,
}

impl InputKey {
    /// Create a new input key
    pub fn new(node: NodeId, socket: impl Into<String>) -> Self {
        Self {
            node,
            socket: socket.into(),
        }
    }
}

/// An output socket on a specific node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    /// Source node
    pub node: NodeId,
    /// Output socket name
    pub socket: String,
}

impl OutputRef {
    /// Create a new output reference
    pub fn new(node: NodeId, socket: impl Into<String>) -> Self {
        Self {
            node,
            socket: socket.into(),
        }
    }
}

/// A connection between two sockets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Source node ID
    pub from_node: NodeId,
    /// Source output socket
    pub from_socket: String,
    /// Target node ID
    pub to_node: NodeId,
    /// Target input socket
    pub to_socket: String,
}

impl Connection {
    /// Create a new connection
    pub fn new(
        from_node: NodeId,
        from_socket: impl Into<String>,
        to_node: NodeId,
        to_socket: impl Into<String>,
    ) -> Self {
        Self {
            from_node,
            from_socket: from_socket.into(),
            to_node,
            to_socket: to_socket.into(),
        }
    }

    fn from_parts(target: InputKey, source: OutputRef) -> Self {
        Self {
            from_node: source.node,
            from_socket: source.socket,
            to_node: target.node,
            to_socket: target.socket,
        }
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }
}

/// The set of connections, at most one per target input
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    sources: IndexMap<InputKey, OutputRef>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect an output to an input, replacing whatever fed that input
    ///
    /// Socket names are not checked; a connection naming a socket that
    /// does not exist simply never resolves to a value.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_socket: impl Into<String>,
        to_node: NodeId,
        to_socket: impl Into<String>,
    ) -> Option<Connection> {
        let target = InputKey::new(to_node, to_socket);
        // Remove-then-insert keeps the newest connection last in iteration order
        let replaced = self.sources.shift_remove_entry(&target);
        self.sources
            .insert(target, OutputRef::new(from_node, from_socket));
        replaced.map(|(target, source)| Connection::from_parts(target, source))
    }

    /// Remove the connection feeding an input, if any
    pub fn disconnect(&mut self, to_node: NodeId, to_socket: &str) -> Option<Connection> {
        let target = InputKey::new(to_node, to_socket);
        self.sources
            .shift_remove_entry(&target)
            .map(|(target, source)| Connection::from_parts(target, source))
    }

    /// The output feeding an input
    pub fn find_source(&self, to_node: NodeId, to_socket: &str) -> Option<&OutputRef> {
        self.sources.get(&InputKey::new(to_node, to_socket))
    }

    /// Inputs fed by any output of the given node
    pub fn downstream_of(&self, from_node: NodeId) -> Vec<InputKey> {
        self.sources
            .iter()
            .filter(|(_, source)| source.node == from_node)
            .map(|(target, _)| target.clone())
            .collect()
    }

    /// Remove every connection involving a node
    pub fn remove_node(&mut self, node_id: NodeId) -> Vec<Connection> {
        let mut removed = Vec::new();
        self.sources.retain(|target, source| {
            if target.node == node_id || source.node == node_id {
                removed.push(Connection::from_parts(target.clone(), source.clone()));
                false
            } else {
                true
            }
        });
        removed
    }

    /// All connections, oldest first
    pub fn iter(&self) -> impl Iterator<Item = Connection> + '_ {
        self.sources
            .iter()
            .map(|(target, source)| Connection::from_parts(target.clone(), source.clone()))
    }

    /// Number of connections
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether there are no connections
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
