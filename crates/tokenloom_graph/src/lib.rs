// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dataflow engine for the Tokenloom design-token editor.
//!
//! Users compose design tokens (colors, sizes, fonts, palettes, type
//! scales) by wiring nodes together; this crate owns everything behind
//! the canvas:
//! - Node kinds with their sockets, controls and compute functions
//! - A connection registry that holds at most one source per input
//! - Recursive, memoised graph evaluation with cycle detection
//! - Change propagation to output and export sinks
//!
//! ## Architecture
//!
//! A [`Session`] owns the [`Graph`] and turns each [`InputEvent`] into
//! exactly one synchronous evaluation pass, returning a [`PassReport`]
//! that names every recomputed node and every sink that changed.

pub mod value;
pub mod socket;
pub mod color;
pub mod node;
pub mod compute;
pub mod tokens;
pub mod connection;
pub mod graph;
pub mod evaluation;
pub mod propagation;
pub mod session;

pub use color::ColorSpace;
pub use connection::{Connection, ConnectionRegistry, InputKey, OutputRef};
pub use evaluation::{EvaluationError, EvaluationLimits, EvaluationStrategy, Evaluator};
pub use graph::{Graph, GraphError};
pub use node::{ControlError, Node, NodeCategory, NodeId, NodeKind};
pub use propagation::{PassReport, Preview, SinkUpdate, Trigger};
pub use session::{EventOutcome, InputEvent, Session, SessionError};
pub use socket::{SocketDef, SocketDirection};
pub use tokens::{ExportPayload, TokenBinding, TokenName};
pub use value::{TokenValue, ValueType};
