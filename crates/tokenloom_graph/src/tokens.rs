// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hand-off types for sink nodes.
//!
//! `OutputToken` nodes yield [`TokenBinding`]s for the styling layer and
//! `ExportSink` nodes yield [`ExportPayload`]s for the file exporter.

use crate::node::NodeId;
use crate::value::TokenValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display names of the design tokens, in menu order
pub const TOKEN_NAMES: &[&str] = &[
    "Primary Color",
    "Border Radius",
    "Border Width",
    "Padding",
    "Gap",
    "Font Family",
];

/// Variable name used when an export node's name is blank
pub const DEFAULT_EXPORT_NAME: &str = "tokens";

/// Variable name usable as a file stem, or the default when blank
///
/// Path separators become `-` and leading or trailing dots are dropped,
/// so the name always stays a single file inside the export directory.
pub fn export_variable_name(raw: &str) -> String {
    let flattened: String = raw
        .trim()
        .chars()
        .map(|c| {
            if matches!(c, '/' | '\\' | ':') || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect();
    let stem = flattened.trim_matches(|c: char| c == '.' || c == '-' || c.is_whitespace());
    if stem.is_empty() {
        DEFAULT_EXPORT_NAME.to_string()
    } else {
        stem.to_string()
    }
}

/// A design token an output node can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenName {
    /// Accent color
    PrimaryColor,
    /// Corner radius
    BorderRadius,
    /// Border thickness
    BorderWidth,
    /// Inner spacing
    Padding,
    /// Spacing between children
    Gap,
    /// Typeface
    FontFamily,
}

impl TokenName {
    /// All tokens, in menu order
    pub const ALL: [TokenName; 6] = [
        TokenName::PrimaryColor,
        TokenName::BorderRadius,
        TokenName::BorderWidth,
        TokenName::Padding,
        TokenName::Gap,
        TokenName::FontFamily,
    ];

    /// Display name, as offered by the output node's menu
    pub fn display_name(&self) -> &'static str {
        match self {
            TokenName::PrimaryColor => TOKEN_NAMES[0],
            TokenName::BorderRadius => TOKEN_NAMES[1],
            TokenName::BorderWidth => TOKEN_NAMES[2],
            TokenName::Padding => TOKEN_NAMES[3],
            TokenName::Gap => TOKEN_NAMES[4],
            TokenName::FontFamily => TOKEN_NAMES[5],
        }
    }
}

impl fmt::Display for TokenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for TokenName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|token| token.display_name() == s)
            .ok_or_else(|| format!("unknown token: {s}"))
    }
}

/// A value bound to a design token by an output node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBinding {
    /// The output node
    pub node: NodeId,
    /// Token selected on the node
    pub token: TokenName,
    /// Value arriving at the node
    pub value: TokenValue,
}

/// Serialized value ready to be written by the exporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    /// The export node
    pub node: NodeId,
    /// Variable name, also the file stem
    pub variable_name: String,
    /// Pretty-printed JSON
    pub contents: String,
}

impl ExportPayload {
    /// Serialize a value under the given variable name
    pub fn new(
        node: NodeId,
        variable_name: &str,
        value: &TokenValue,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            node,
            variable_name: export_variable_name(variable_name),
            contents: serde_json::to_string_pretty(&value.to_json())?,
        })
    }

    /// File name of the exported artifact
    pub fn file_name(&self) -> String {
        format!("{}.json", self.variable_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_names_round_trip_through_menu_text() {
        for token in TokenName::ALL {
            assert_eq!(token.display_name().parse::<TokenName>(), Ok(token));
        }
        assert!("Shadow".parse::<TokenName>().is_err());
    }

    #[test]
    fn test_export_payload() {
        let value = TokenValue::List(vec!["#ffffff".into(), "#000000".into()]);
        let payload = ExportPayload::new(NodeId::new(), "brand", &value).unwrap();
        assert_eq!(payload.file_name(), "brand.json");
        assert_eq!(payload.contents, "[\n  \"#ffffff\",\n  \"#000000\"\n]");
    }

    #[test]
    fn test_export_payload_blank_name() {
        let value = TokenValue::Color("#3b82f6".into());
        let payload = ExportPayload::new(NodeId::new(), "  ", &value).unwrap();
        assert_eq!(payload.file_name(), "tokens.json");
        assert_eq!(payload.contents, "\"#3b82f6\"");
    }

    #[test]
    fn test_export_name_stays_a_single_file() {
        assert_eq!(export_variable_name(" brand "), "brand");
        assert_eq!(export_variable_name("../escaped"), "escaped");
        assert_eq!(export_variable_name("/etc/passwd"), "etc-passwd");
        assert_eq!(export_variable_name("C:\\temp\\x"), "C--temp-x");
        assert_eq!(export_variable_name("brand/dark"), "brand-dark");
        assert_eq!(export_variable_name(".."), DEFAULT_EXPORT_NAME);
        assert_eq!(export_variable_name("v1.2"), "v1.2");
    }
}
