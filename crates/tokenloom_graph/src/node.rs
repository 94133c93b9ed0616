// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the token graph.
//!
//! Every [`NodeKind`] is described by a static [`KindSpec`]: its sockets,
//! its controls with their defaults, and the pure function that computes
//! its value. Adding a kind means adding a variant and a table entry.

use crate::color::{parse_hex, ColorSpace};
use crate::compute::{self, ComputeFn};
use crate::socket::SocketDef;
use crate::tokens::TOKEN_NAMES;
use crate::value::{TokenValue, ValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node kind category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Constant inputs edited by the user
    Input,
    /// Operations over other nodes' values
    Operation,
    /// Generators producing sequences
    Generator,
    /// Sinks consuming values (tokens, exports)
    Output,
}

/// The fixed set of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A single color
    ColorInput,
    /// A number with a unit
    NumberInput,
    /// A font-family stack
    FontInput,
    /// Half-and-half mix of two colors
    MixColors,
    /// Color ramp from white through a base color to black
    PaletteGenerator,
    /// Modular type scale
    TypeScaleGenerator,
    /// Applies a value to a named design token
    OutputToken,
    /// Hands a value to the JSON exporter
    ExportSink,
}

/// Input choices for the `unit` control of a number node
pub const UNIT_CHOICES: &[&str] = &["px", "rem", ""];

/// Input choices for the `font` control of a font node
pub const FONT_CHOICES: &[&str] = &["Inter, sans-serif", "JetBrains Mono, monospace", "serif"];

/// Input choices for the `space` control of a palette node
pub const SPACE_CHOICES: &[&str] = &["oklch", "rgb", "hsl"];

/// Input choices for the `ratio` control of a type scale node
pub const RATIO_CHOICES: &[&str] = &["1.25", "1.414", "1.5", "1.618"];

/// How a control's raw value is validated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    /// `#rrggbb` color
    Color,
    /// Finite number
    Number,
    /// One of a fixed list
    Choice(&'static [&'static str]),
    /// Any text
    Text,
}

/// Default value of a control
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlDefault {
    /// Textual default
    Text(&'static str),
    /// Numeric default
    Number(f64),
}

/// A control declared by a node kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    /// Control name
    pub name: &'static str,
    /// Validation rule
    pub kind: ControlKind,
    /// Value on node creation
    pub default: ControlDefault,
}

impl ControlSpec {
    const fn new(name: &'static str, kind: ControlKind, default: ControlDefault) -> Self {
        Self { name, kind, default }
    }

    /// The default as a control value
    pub fn default_value(&self) -> ControlValue {
        match self.default {
            ControlDefault::Text(text) => ControlValue::Text(text.to_string()),
            ControlDefault::Number(number) => ControlValue::Number(number),
        }
    }

    /// Validate a raw value coming from the UI
    pub fn parse(&self, kind: NodeKind, raw: &str) -> Result<ControlValue, ControlError> {
        match self.kind {
            ControlKind::Color => {
                if parse_hex(raw).is_none() {
                    return Err(ControlError::InvalidColor(raw.to_string()));
                }
                Ok(ControlValue::Text(raw.to_string()))
            }
            ControlKind::Number => match raw.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => Ok(ControlValue::Number(number)),
                _ => Err(ControlError::InvalidNumber(raw.to_string())),
            },
            ControlKind::Choice(choices) => {
                if !choices.contains(&raw) {
                    return Err(ControlError::InvalidChoice {
                        kind,
                        control: self.name.to_string(),
                        value: raw.to_string(),
                    });
                }
                Ok(ControlValue::Text(raw.to_string()))
            }
            ControlKind::Text => Ok(ControlValue::Text(raw.to_string())),
        }
    }
}

/// Static description of a node kind
#[derive(Debug, Clone, Copy)]
pub struct KindSpec {
    /// Display title
    pub name: &'static str,
    /// Category
    pub category: NodeCategory,
    /// One-line description
    pub description: &'static str,
    /// Input sockets, in order
    pub inputs: &'static [SocketDef],
    /// Output sockets, in order
    pub outputs: &'static [SocketDef],
    /// Controls, in order
    pub controls: &'static [ControlSpec],
    /// Value computation
    pub compute: ComputeFn,
}

static COLOR_INPUT: KindSpec = KindSpec {
    name: "Color Input",
    category: NodeCategory::Input,
    description: "A single color",
    inputs: &[],
    outputs: &[SocketDef::output("color", ValueType::Color)],
    controls: &[ControlSpec::new("color", ControlKind::Color, ControlDefault::Text("#3b82f6"))],
    compute: compute::color_input,
};

static NUMBER_INPUT: KindSpec = KindSpec {
    name: "Number Input",
    category: NodeCategory::Input,
    description: "A number with an optional unit",
    inputs: &[],
    outputs: &[SocketDef::output("value", ValueType::Dimension)],
    controls: &[
        ControlSpec::new("value", ControlKind::Number, ControlDefault::Number(16.0)),
        ControlSpec::new("unit", ControlKind::Choice(UNIT_CHOICES), ControlDefault::Text("px")),
    ],
    compute: compute::number_input,
};

static FONT_INPUT: KindSpec = KindSpec {
    name: "Font Input",
    category: NodeCategory::Input,
    description: "A font-family stack",
    inputs: &[],
    outputs: &[SocketDef::output("font", ValueType::Font)],
    controls: &[ControlSpec::new(
        "font",
        ControlKind::Choice(FONT_CHOICES),
        ControlDefault::Text("Inter, sans-serif"),
    )],
    compute: compute::font_input,
};

static MIX_COLORS: KindSpec = KindSpec {
    name: "Mix Colors",
    category: NodeCategory::Operation,
    description: "Even mix of colors A and B",
    inputs: &[
        SocketDef::input("A", Some(ValueType::Color)),
        SocketDef::input("B", Some(ValueType::Color)),
    ],
    outputs: &[SocketDef::output("result", ValueType::Color)],
    controls: &[],
    compute: compute::mix_colors,
};

static PALETTE_GENERATOR: KindSpec = KindSpec {
    name: "Palette Generator",
    category: NodeCategory::Generator,
    description: "Color ramp from white through the base color to black",
    inputs: &[SocketDef::input("color", Some(ValueType::Color))],
    outputs: &[SocketDef::output("palette", ValueType::List)],
    controls: &[
        ControlSpec::new("steps", ControlKind::Number, ControlDefault::Number(5.0)),
        ControlSpec::new(
            "space",
            ControlKind::Choice(SPACE_CHOICES),
            ControlDefault::Text("oklch"),
        ),
    ],
    compute: compute::palette_generator,
};

static TYPE_SCALE_GENERATOR: KindSpec = KindSpec {
    name: "Type Scale",
    category: NodeCategory::Generator,
    description: "Font sizes growing by a fixed ratio",
    inputs: &[SocketDef::input("base", Some(ValueType::Dimension))],
    outputs: &[SocketDef::output("scale", ValueType::List)],
    controls: &[
        ControlSpec::new("base_size", ControlKind::Number, ControlDefault::Number(16.0)),
        ControlSpec::new("ratio", ControlKind::Choice(RATIO_CHOICES), ControlDefault::Text("1.25")),
        ControlSpec::new("steps", ControlKind::Number, ControlDefault::Number(5.0)),
    ],
    compute: compute::type_scale_generator,
};

static OUTPUT_TOKEN: KindSpec = KindSpec {
    name: "Output Token",
    category: NodeCategory::Output,
    description: "Applies its input to a design token",
    inputs: &[SocketDef::input("value", None)],
    outputs: &[],
    controls: &[ControlSpec::new(
        "token",
        ControlKind::Choice(TOKEN_NAMES),
        ControlDefault::Text("Primary Color"),
    )],
    compute: compute::output_token,
};

static EXPORT_SINK: KindSpec = KindSpec {
    name: "Export",
    category: NodeCategory::Output,
    description: "Exports its input as a JSON file",
    inputs: &[SocketDef::input("data", None)],
    outputs: &[],
    controls: &[ControlSpec::new("name", ControlKind::Text, ControlDefault::Text("tokens"))],
    compute: compute::export_sink,
};

impl NodeKind {
    /// Every kind, in palette order
    pub const ALL: [NodeKind; 8] = [
        NodeKind::ColorInput,
        NodeKind::NumberInput,
        NodeKind::FontInput,
        NodeKind::MixColors,
        NodeKind::PaletteGenerator,
        NodeKind::TypeScaleGenerator,
        NodeKind::OutputToken,
        NodeKind::ExportSink,
    ];

    /// The static description of this kind
    pub fn spec(self) -> &'static KindSpec {
        match self {
            NodeKind::ColorInput => &COLOR_INPUT,
            NodeKind::NumberInput => &NUMBER_INPUT,
            NodeKind::FontInput => &FONT_INPUT,
            NodeKind::MixColors => &MIX_COLORS,
            NodeKind::PaletteGenerator => &PALETTE_GENERATOR,
            NodeKind::TypeScaleGenerator => &TYPE_SCALE_GENERATOR,
            NodeKind::OutputToken => &OUTPUT_TOKEN,
            NodeKind::ExportSink => &EXPORT_SINK,
        }
    }

    /// Display title
    pub fn display_name(self) -> &'static str {
        self.spec().name
    }

    /// Category
    pub fn category(self) -> NodeCategory {
        self.spec().category
    }

    /// Whether this kind consumes values without producing any
    pub fn is_sink(self) -> bool {
        self.spec().outputs.is_empty()
    }

    /// Look up a control declaration
    pub fn control(self, name: &str) -> Option<&'static ControlSpec> {
        self.spec().controls.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Current value of a control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlValue {
    /// Text, color or choice
    Text(String),
    /// Number
    Number(f64),
}

/// Control values of a node, keyed by control name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Controls(IndexMap<String, ControlValue>);

impl Controls {
    /// Controls of a fresh node of the given kind
    pub fn defaults(kind: NodeKind) -> Self {
        Self(
            kind.spec()
                .controls
                .iter()
                .map(|c| (c.name.to_string(), c.default_value()))
                .collect(),
        )
    }

    /// Get a control value
    pub fn get(&self, name: &str) -> Option<&ControlValue> {
        self.0.get(name)
    }

    /// Get a textual control value
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.0.get(name)? {
            ControlValue::Text(text) => Some(text),
            ControlValue::Number(_) => None,
        }
    }

    /// Get a numeric control value
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.0.get(name)? {
            ControlValue::Number(number) => Some(*number),
            ControlValue::Text(_) => None,
        }
    }

    /// Palette color space from the `space` control, or the default
    pub fn color_space(&self) -> ColorSpace {
        self.text("space")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Set a control value
    pub fn insert(&mut self, name: impl Into<String>, value: ControlValue) {
        self.0.insert(name.into(), value);
    }

    /// Iterate over controls in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ControlValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// A node instance in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node kind
    pub kind: NodeKind,
    /// Display name (can be customized)
    pub name: String,
    /// Position on the canvas
    pub position: [f32; 2],
    /// Control values
    pub controls: Controls,
    /// Last computed value; written only by evaluation
    pub cached_value: Option<TokenValue>,
}

impl Node {
    /// Create a new node of the given kind with default controls
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            name: kind.display_name().to_string(),
            position: [0.0, 0.0],
            controls: Controls::defaults(kind),
            cached_value: None,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Set a control, builder style
    pub fn with_control(mut self, name: &str, raw: &str) -> Result<Self, ControlError> {
        self.set_control(name, raw)?;
        Ok(self)
    }

    /// Get a control value
    pub fn control(&self, name: &str) -> Option<&ControlValue> {
        self.controls.get(name)
    }

    /// Validate and store a raw control value
    pub fn set_control(&mut self, name: &str, raw: &str) -> Result<(), ControlError> {
        let spec = self.kind.control(name).ok_or_else(|| ControlError::UnknownControl {
            kind: self.kind,
            control: name.to_string(),
        })?;
        let value = spec.parse(self.kind, raw)?;
        self.controls.insert(name, value);
        Ok(())
    }

    /// Whether the node declares an input socket with this name
    pub fn has_input(&self, socket: &str) -> bool {
        self.kind.spec().inputs.iter().any(|s| s.name == socket)
    }

    /// Whether the node declares an output socket with this name
    pub fn has_output(&self, socket: &str) -> bool {
        self.kind.spec().outputs.iter().any(|s| s.name == socket)
    }

    /// Input sockets
    pub fn inputs(&self) -> &'static [SocketDef] {
        self.kind.spec().inputs
    }

    /// Output sockets
    pub fn outputs(&self) -> &'static [SocketDef] {
        self.kind.spec().outputs
    }
}

/// Error when editing a control
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    /// The kind has no such control
    #[error("{kind} has no control named {control:?}")]
    UnknownControl {
        /// Node kind
        kind: NodeKind,
        /// Requested control
        control: String,
    },

    /// Not a finite number
    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),

    /// Not a `#rrggbb` color
    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    /// Not one of the offered choices
    #[error("{value:?} is not a valid choice for {kind} control {control:?}")]
    InvalidChoice {
        /// Node kind
        kind: NodeKind,
        /// Control name
        control: String,
        /// Rejected value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_has_default_controls() {
        let node = Node::new(NodeKind::NumberInput);
        assert_eq!(node.name, "Number Input");
        assert_eq!(node.controls.number("value"), Some(16.0));
        assert_eq!(node.controls.text("unit"), Some("px"));
        assert!(node.cached_value.is_none());
    }

    #[test]
    fn test_socket_tables() {
        let mix = Node::new(NodeKind::MixColors);
        assert!(mix.has_input("A"));
        assert!(mix.has_input("B"));
        assert!(mix.has_output("result"));
        assert!(!mix.has_output("A"));

        assert!(NodeKind::OutputToken.is_sink());
        assert!(NodeKind::ExportSink.is_sink());
        assert!(!NodeKind::PaletteGenerator.is_sink());
        assert_eq!(NodeKind::PaletteGenerator.spec().outputs[0].name, "palette");
    }

    #[test]
    fn test_set_control_validation() {
        let mut node = Node::new(NodeKind::ColorInput);
        assert!(node.set_control("color", "#ff0000").is_ok());
        assert_eq!(node.controls.text("color"), Some("#ff0000"));

        assert_eq!(
            node.set_control("color", "red"),
            Err(ControlError::InvalidColor("red".to_string()))
        );
        assert!(matches!(
            node.set_control("size", "3"),
            Err(ControlError::UnknownControl { .. })
        ));

        let mut number = Node::new(NodeKind::NumberInput);
        assert!(number.set_control("unit", "").is_ok());
        assert!(number.set_control("unit", "em").is_err());
        assert!(number.set_control("value", " 2.5 ").is_ok());
        assert_eq!(number.controls.number("value"), Some(2.5));
        assert!(number.set_control("value", "abc").is_err());
        assert!(number.set_control("value", "inf").is_err());
    }

    #[test]
    fn test_palette_color_space_control() {
        let mut palette = Node::new(NodeKind::PaletteGenerator);
        assert_eq!(palette.controls.color_space(), ColorSpace::Oklch);
        palette.set_control("space", "hsl").unwrap();
        assert_eq!(palette.controls.color_space(), ColorSpace::Hsl);
        assert_eq!(Node::new(NodeKind::ColorInput).controls.color_space(), ColorSpace::Oklch);
    }

    #[test]
    fn test_every_kind_has_defaults_for_its_controls() {
        for kind in NodeKind::ALL {
            let node = Node::new(kind);
            for control in kind.spec().controls {
                assert!(node.control(control.name).is_some(), "{kind} {}", control.name);
            }
        }
    }
}
