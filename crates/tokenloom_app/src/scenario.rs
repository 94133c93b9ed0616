// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scripted editing sessions.
//!
//! A scenario replays the events a user would produce on the canvas.
//! Steps refer to nodes by labels chosen in the script; the runner maps
//! them to node IDs as nodes are created.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokenloom_graph::{InputEvent, NodeId, NodeKind, PassReport, Session, SessionError};

/// A named list of editing steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Steps, in order
    pub steps: Vec<Step>,
}

/// One user action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Drop a node onto the canvas
    Create {
        /// Label the node is referred to by
        label: String,
        /// Kind of node
        kind: NodeKind,
        /// Canvas position
        #[serde(default)]
        position: [f32; 2],
    },
    /// Edit a control
    Set {
        /// Node label
        label: String,
        /// Control name
        control: String,
        /// Raw value
        value: String,
    },
    /// Drag from an output onto an input
    Connect {
        /// Source node label
        from: String,
        /// Source output socket
        from_socket: String,
        /// Target node label
        to: String,
        /// Target input socket
        to_socket: String,
    },
    /// Clear an input
    Disconnect {
        /// Target node label
        node: String,
        /// Target input socket
        socket: String,
    },
    /// Delete a node
    Remove {
        /// Node label
        label: String,
    },
}

impl Scenario {
    /// Load a scenario from a RON file
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse a scenario from RON text
    pub fn parse(content: &str) -> Result<Self, ScenarioError> {
        ron::from_str(content).map_err(|e| ScenarioError::Parse(e.to_string()))
    }
}

/// Feeds scenario steps into a session
pub struct ScenarioRunner<'a> {
    session: &'a mut Session,
    labels: IndexMap<String, NodeId>,
}

impl<'a> ScenarioRunner<'a> {
    /// Create a runner driving the given session
    pub fn new(session: &'a mut Session) -> Self {
        Self {
            session,
            labels: IndexMap::new(),
        }
    }

    /// Node ID bound to a label
    pub fn node(&self, label: &str) -> Result<NodeId, ScenarioError> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownLabel(label.to_string()))
    }

    /// Run every step, returning the report of each pass
    pub fn run(&mut self, scenario: &Scenario) -> Result<Vec<PassReport>, ScenarioError> {
        tracing::info!("Running scenario '{}' ({} steps)", scenario.name, scenario.steps.len());
        scenario
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.step(index, step))
            .collect()
    }

    /// Run a single step
    pub fn step(&mut self, index: usize, step: &Step) -> Result<PassReport, ScenarioError> {
        let event = self.event_for(step)?;
        let outcome = self
            .session
            .handle(event)
            .map_err(|source| ScenarioError::Step { index, source })?;

        if let (Step::Create { label, .. }, Some(id)) = (step, outcome.created) {
            self.labels.insert(label.clone(), id);
        }
        if let Step::Remove { label } = step {
            self.labels.shift_remove(label);
        }

        tracing::debug!(
            "Step {index}: {} node(s) recomputed",
            outcome.report.recomputed.len()
        );
        Ok(outcome.report)
    }

    fn event_for(&self, step: &Step) -> Result<InputEvent, ScenarioError> {
        let event = match step {
            Step::Create { label, kind, position } => {
                if self.labels.contains_key(label) {
                    return Err(ScenarioError::DuplicateLabel(label.clone()));
                }
                InputEvent::NodeCreated {
                    kind: *kind,
                    position: *position,
                }
            }
            Step::Set { label, control, value } => InputEvent::ControlChanged {
                node: self.node(label)?,
                control: control.clone(),
                value: value.clone(),
            },
            Step::Connect {
                from,
                from_socket,
                to,
                to_socket,
            } => InputEvent::ConnectRequested {
                from_node: self.node(from)?,
                from_socket: from_socket.clone(),
                to_node: self.node(to)?,
                to_socket: to_socket.clone(),
            },
            Step::Disconnect { node, socket } => InputEvent::DisconnectRequested {
                node: self.node(node)?,
                socket: socket.clone(),
            },
            Step::Remove { label } => InputEvent::NodeRemoved {
                node: self.node(label)?,
            },
        };
        Ok(event)
    }
}

/// Error loading or running a scenario
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Scenario path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not a valid scenario
    #[error("Invalid scenario: {0}")]
    Parse(String),

    /// A step names a label no node was created under
    #[error("Unknown node label: {0}")]
    UnknownLabel(String),

    /// Two nodes were created under the same label
    #[error("Label already in use: {0}")]
    DuplicateLabel(String),

    /// The session rejected a step
    #[error("Step {index} failed: {source}")]
    Step {
        /// Zero-based step index
        index: usize,
        /// Rejection reason
        source: SessionError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenloom_graph::{EvaluationError, TokenName, TokenValue};

    const BRAND: &str = r##"
        (
            name: "brand",
            steps: [
                Create(label: "base", kind: ColorInput, position: (40.0, 40.0)),
                Create(label: "ramp", kind: PaletteGenerator),
                Create(label: "primary", kind: OutputToken),
                Create(label: "export", kind: ExportSink),
                Set(label: "base", control: "color", value: "#10b981"),
                Set(label: "ramp", control: "space", value: "rgb"),
                Set(label: "export", control: "name", value: "brand"),
                Connect(from: "base", from_socket: "color", to: "primary", to_socket: "value"),
                Connect(from: "base", from_socket: "color", to: "ramp", to_socket: "color"),
                Connect(from: "ramp", from_socket: "palette", to: "export", to_socket: "data"),
            ],
        )
    "##;

    #[test]
    fn test_run_scenario() {
        let scenario = Scenario::parse(BRAND).unwrap();
        assert_eq!(scenario.steps.len(), 10);

        let mut session = Session::default();
        let reports = ScenarioRunner::new(&mut session).run(&scenario).unwrap();
        assert_eq!(reports.len(), 10);

        let tokens = session.tokens();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, TokenName::PrimaryColor);
        assert_eq!(tokens[0].value, TokenValue::Color("#10b981".into()));

        let exports = session.exports().unwrap();
        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].file_name(), "brand.json");
    }

    #[test]
    fn test_demo_scenario() {
        let scenario = Scenario::parse(include_str!("../../../demos/brand.ron")).unwrap();
        let mut session = Session::default();
        ScenarioRunner::new(&mut session).run(&scenario).unwrap();

        let tokens: Vec<(TokenName, String)> = session
            .tokens()
            .into_iter()
            .map(|b| (b.token, b.value.to_string()))
            .collect();
        assert_eq!(
            tokens,
            vec![
                (TokenName::PrimaryColor, "#7c3aed".to_string()),
                (TokenName::BorderRadius, "0.5rem".to_string()),
                (TokenName::FontFamily, "Inter, sans-serif".to_string()),
            ]
        );

        let names: Vec<String> = session.exports().unwrap().iter().map(|e| e.file_name()).collect();
        assert_eq!(names, vec!["brand-palette.json", "type-scale.json"]);
    }

    #[test]
    fn test_unknown_label() {
        let mut session = Session::default();
        let mut runner = ScenarioRunner::new(&mut session);
        let step = Step::Set {
            label: "missing".into(),
            control: "color".into(),
            value: "#000000".into(),
        };
        assert!(matches!(
            runner.step(0, &step),
            Err(ScenarioError::UnknownLabel(label)) if label == "missing"
        ));
    }

    #[test]
    fn test_removed_label_is_released() {
        let mut session = Session::default();
        let mut runner = ScenarioRunner::new(&mut session);
        let create = Step::Create {
            label: "n".into(),
            kind: NodeKind::NumberInput,
            position: [0.0, 0.0],
        };
        runner.step(0, &create).unwrap();
        assert!(matches!(runner.step(1, &create), Err(ScenarioError::DuplicateLabel(_))));

        runner.step(2, &Step::Remove { label: "n".into() }).unwrap();
        assert!(matches!(runner.node("n"), Err(ScenarioError::UnknownLabel(_))));
        runner.step(3, &create).unwrap();
    }

    #[test]
    fn test_cycle_reports_step_index() {
        let scenario = Scenario::parse(
            r#"(
                name: "loop",
                steps: [
                    Create(label: "a", kind: MixColors),
                    Create(label: "b", kind: MixColors),
                    Connect(from: "a", from_socket: "result", to: "b", to_socket: "A"),
                    Connect(from: "b", from_socket: "result", to: "a", to_socket: "B"),
                ],
            )"#,
        )
        .unwrap();

        let mut session = Session::default();
        let err = ScenarioRunner::new(&mut session).run(&scenario).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Step {
                index: 3,
                source: SessionError::Evaluation(EvaluationError::CyclicDependency { .. }),
            }
        ));
    }
}
