// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket definitions for node inputs/outputs.

use crate::value::ValueType;
use serde::{Deserialize, Serialize};

/// Socket direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketDirection {
    /// Input socket
    Input,
    /// Output socket
    Output,
}

/// A named socket declared by a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketDef {
    /// Socket name, unique per direction within a kind
    pub name: &'static str,
    /// Socket direction
    pub direction: SocketDirection,
    /// Shape of the value carried, `None` for pass-through sockets
    pub value_type: Option<ValueType>,
}

impl SocketDef {
    /// Declare an input socket
    pub const fn input(name: &'static str, value_type: Option<ValueType>) -> Self {
        Self {
            name,
            direction: SocketDirection::Input,
            value_type,
        }
    }

    /// Declare an output socket
    pub const fn output(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            direction: SocketDirection::Output,
            value_type: Some(value_type),
        }
    }
}
