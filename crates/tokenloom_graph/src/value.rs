// SPDX-License-Identifier: MIT OR Apache-2.0
//! Values that flow through sockets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of a value, as seen by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Hex color string
    Color,
    /// Number with a unit suffix
    Dimension,
    /// Font-family string
    Font,
    /// Ordered sequence of strings (palettes, type scales)
    List,
}

/// A computed token value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenValue {
    /// Color as `#rrggbb`
    Color(String),
    /// Number plus unit, e.g. `16px` (the unit may be empty)
    Dimension {
        /// Numeric part
        value: f64,
        /// Unit suffix
        unit: String,
    },
    /// Font-family stack
    Font(String),
    /// Ordered list of rendered values
    List(Vec<String>),
}

impl TokenValue {
    /// Create a dimension value
    pub fn dimension(value: f64, unit: impl Into<String>) -> Self {
        Self::Dimension {
            value,
            unit: unit.into(),
        }
    }

    /// Get the value type
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Color(_) => ValueType::Color,
            Self::Dimension { .. } => ValueType::Dimension,
            Self::Font(_) => ValueType::Font,
            Self::List(_) => ValueType::List,
        }
    }

    /// Borrow the color string, if this is a color
    pub fn as_color(&self) -> Option<&str> {
        match self {
            Self::Color(hex) => Some(hex),
            _ => None,
        }
    }

    /// Numeric part of a dimension
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Dimension { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Structured form used for export
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::List(items) => serde_json::Value::Array(
                items.iter().cloned().map(serde_json::Value::String).collect(),
            ),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(hex) => f.write_str(hex),
            Self::Dimension { value, unit } => write!(f, "{value}{unit}"),
            Self::Font(family) => f.write_str(family),
            Self::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_display() {
        assert_eq!(TokenValue::dimension(16.0, "px").to_string(), "16px");
        assert_eq!(TokenValue::dimension(1.5, "rem").to_string(), "1.5rem");
        assert_eq!(TokenValue::dimension(4.0, "").to_string(), "4");
    }

    #[test]
    fn test_to_json() {
        let list = TokenValue::List(vec!["16px".into(), "20px".into()]);
        assert_eq!(list.to_json(), serde_json::json!(["16px", "20px"]));

        let color = TokenValue::Color("#3b82f6".into());
        assert_eq!(color.to_json(), serde_json::json!("#3b82f6"));
        assert_eq!(color.value_type(), ValueType::Color);
    }
}
