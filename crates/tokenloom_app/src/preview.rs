// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview styling.
//!
//! Maps token bindings onto the style properties of a mock widget and
//! renders the result as CSS.

use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokenloom_graph::{TokenBinding, TokenName};

/// Mock widget the tokens are previewed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PreviewWidget {
    /// A single button
    #[default]
    Button,
    /// A card with a title and a call-to-action button
    Card,
    /// A labelled text input
    Input,
}

impl PreviewWidget {
    /// Selector of the widget's main element
    pub fn target(&self) -> &'static str {
        match self {
            PreviewWidget::Button => ".preview-button button",
            PreviewWidget::Card => ".preview-card",
            PreviewWidget::Input => ".preview-input input",
        }
    }
}

impl fmt::Display for PreviewWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PreviewWidget::Button => "button",
            PreviewWidget::Card => "card",
            PreviewWidget::Input => "input",
        };
        f.write_str(name)
    }
}

const CARD_BUTTON: &str = ".preview-card button";
const CARD_TITLE: &str = ".preview-card h2";
const INPUT_GROUP: &str = ".preview-input .input-group";

/// One CSS property set on one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDeclaration {
    /// Element selector
    pub selector: &'static str,
    /// CSS property
    pub property: &'static str,
    /// CSS value
    pub value: String,
}

impl StyleDeclaration {
    fn new(selector: &'static str, property: &'static str, value: impl Into<String>) -> Self {
        Self {
            selector,
            property,
            value: value.into(),
        }
    }
}

/// Declarations a token binding produces on the given widget
pub fn style_declarations(widget: PreviewWidget, binding: &TokenBinding) -> Vec<StyleDeclaration> {
    let value = binding.value.to_string();
    let target = widget.target();

    match binding.token {
        TokenName::PrimaryColor => match widget {
            PreviewWidget::Card => vec![
                StyleDeclaration::new(CARD_BUTTON, "background-color", &value),
                StyleDeclaration::new(CARD_TITLE, "color", value),
            ],
            PreviewWidget::Button => vec![StyleDeclaration::new(target, "background-color", value)],
            PreviewWidget::Input => vec![StyleDeclaration::new(target, "border-color", value)],
        },
        TokenName::BorderRadius => {
            let mut declarations = vec![StyleDeclaration::new(target, "border-radius", &value)];
            if widget == PreviewWidget::Card {
                declarations.push(StyleDeclaration::new(CARD_BUTTON, "border-radius", value));
            }
            declarations
        }
        TokenName::BorderWidth => vec![
            StyleDeclaration::new(target, "border-width", value),
            StyleDeclaration::new(target, "border-style", "solid"),
        ],
        TokenName::Padding => vec![StyleDeclaration::new(target, "padding", value)],
        TokenName::Gap => {
            let selector = if widget == PreviewWidget::Input {
                INPUT_GROUP
            } else {
                target
            };
            vec![StyleDeclaration::new(selector, "gap", value)]
        }
        TokenName::FontFamily => vec![StyleDeclaration::new(target, "font-family", value)],
    }
}

/// Accumulated styles for one preview widget
///
/// Applying a binding overrides earlier values of the same property on
/// the same element; everything else is kept.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    widget: PreviewWidget,
    rules: IndexMap<&'static str, IndexMap<&'static str, String>>,
}

impl StyleSheet {
    /// Create an empty stylesheet for a widget
    pub fn new(widget: PreviewWidget) -> Self {
        Self {
            widget,
            rules: IndexMap::new(),
        }
    }

    /// The widget being styled
    pub fn widget(&self) -> PreviewWidget {
        self.widget
    }

    /// Apply a token binding
    pub fn apply(&mut self, binding: &TokenBinding) {
        for declaration in style_declarations(self.widget, binding) {
            self.rules
                .entry(declaration.selector)
                .or_default()
                .insert(declaration.property, declaration.value);
        }
    }

    /// Whether no binding has been applied
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> Extend<&'a TokenBinding> for StyleSheet {
    fn extend<I: IntoIterator<Item = &'a TokenBinding>>(&mut self, iter: I) {
        for binding in iter {
            self.apply(binding);
        }
    }
}

impl fmt::Display for StyleSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (selector, properties) in &self.rules {
            writeln!(f, "{selector} {{")?;
            for (property, value) in properties {
                writeln!(f, "  {property}: {value};")?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenloom_graph::{NodeId, TokenValue};

    fn binding(token: TokenName, value: TokenValue) -> TokenBinding {
        TokenBinding {
            node: NodeId::new(),
            token,
            value,
        }
    }

    #[test]
    fn test_primary_color_per_widget() {
        let color = binding(TokenName::PrimaryColor, TokenValue::Color("#3b82f6".into()));

        let card = style_declarations(PreviewWidget::Card, &color);
        assert_eq!(
            card,
            vec![
                StyleDeclaration::new(CARD_BUTTON, "background-color", "#3b82f6"),
                StyleDeclaration::new(CARD_TITLE, "color", "#3b82f6"),
            ]
        );

        let input = style_declarations(PreviewWidget::Input, &color);
        assert_eq!(input[0].property, "border-color");
        assert_eq!(input[0].selector, ".preview-input input");
    }

    #[test]
    fn test_border_width_sets_solid_style() {
        let width = binding(TokenName::BorderWidth, TokenValue::dimension(2.0, "px"));
        let declarations = style_declarations(PreviewWidget::Button, &width);
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].value, "2px");
        assert_eq!(declarations[1].value, "solid");
    }

    #[test]
    fn test_gap_on_input_targets_group() {
        let gap = binding(TokenName::Gap, TokenValue::dimension(1.0, "rem"));
        let declarations = style_declarations(PreviewWidget::Input, &gap);
        assert_eq!(declarations[0].selector, INPUT_GROUP);
        assert_eq!(declarations[0].value, "1rem");
    }

    #[test]
    fn test_stylesheet_later_binding_wins() {
        let mut sheet = StyleSheet::new(PreviewWidget::Card);
        sheet.extend(&[
            binding(TokenName::BorderRadius, TokenValue::dimension(4.0, "px")),
            binding(TokenName::Padding, TokenValue::dimension(16.0, "px")),
            binding(TokenName::BorderRadius, TokenValue::dimension(12.0, "px")),
        ]);

        assert_eq!(
            sheet.to_string(),
            ".preview-card {\n  border-radius: 12px;\n  padding: 16px;\n}\n\
             .preview-card button {\n  border-radius: 12px;\n}\n"
        );
    }
}
