// SPDX-License-Identifier: MIT OR Apache-2.0
//! Writes export payloads to disk as `<name>.json`.

use std::path::{Component, Path, PathBuf};
use tokenloom_graph::ExportPayload;

/// Write every payload into `dir`, creating it if needed
///
/// Returns the written paths in payload order. Payloads sharing a
/// variable name overwrite each other, last one wins.
pub fn write_exports(
    dir: &Path,
    payloads: &[ExportPayload],
) -> Result<Vec<PathBuf>, ExportError> {
    if payloads.is_empty() {
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(dir).map_err(|source| ExportError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let file_name = payload.file_name();
        let path = dir.join(&file_name);
        if !is_plain_file_name(&file_name) {
            return Err(ExportError {
                path,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "export name must not leave the export directory",
                ),
            });
        }
        std::fs::write(&path, &payload.contents).map_err(|source| ExportError {
            path: path.clone(),
            source,
        })?;
        tracing::info!("Exported {} ({} bytes)", path.display(), payload.contents.len());
        written.push(path);
    }

    Ok(written)
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Error writing an export file
#[derive(Debug, thiserror::Error)]
#[error("Failed to write {}: {source}", path.display())]
pub struct ExportError {
    /// File or directory being written
    pub path: PathBuf,
    /// Underlying error
    pub source: std::io::Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenloom_graph::{NodeId, TokenValue};

    #[test]
    fn test_write_exports() {
        let dir = std::env::temp_dir()
            .join(format!("tokenloom-export-{}", uuid::Uuid::new_v4()))
            .join("nested");
        let payloads = vec![
            ExportPayload::new(NodeId::new(), "spacing", &TokenValue::dimension(8.0, "px"))
                .unwrap(),
            ExportPayload::new(NodeId::new(), "", &TokenValue::Font("serif".into())).unwrap(),
        ];

        let written = write_exports(&dir, &payloads).unwrap();
        assert_eq!(written, vec![dir.join("spacing.json"), dir.join("tokens.json")]);
        assert_eq!(std::fs::read_to_string(&written[0]).unwrap(), "\"8px\"");
        assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), "\"serif\"");

        if let Some(parent) = dir.parent() {
            std::fs::remove_dir_all(parent).unwrap();
        }
    }

    #[test]
    fn test_traversal_names_stay_in_dir() {
        let dir = std::env::temp_dir().join(format!("tokenloom-export-{}", uuid::Uuid::new_v4()));
        let value = TokenValue::Color("#3b82f6".into());
        let payloads = vec![
            ExportPayload::new(NodeId::new(), "../escaped", &value).unwrap(),
            ExportPayload::new(NodeId::new(), "/tmp/absolute", &value).unwrap(),
        ];

        let written = write_exports(&dir, &payloads).unwrap();
        assert_eq!(written, vec![dir.join("escaped.json"), dir.join("tmp-absolute.json")]);
        assert!(written.iter().all(|path| path.parent() == Some(dir.as_path())));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rejects_hand_built_traversal_payload() {
        let dir = std::env::temp_dir().join(format!("tokenloom-export-{}", uuid::Uuid::new_v4()));
        let payload = ExportPayload {
            node: NodeId::new(),
            variable_name: "../outside".into(),
            contents: "{}".into(),
        };

        let err = write_exports(&dir, &[payload]).unwrap_err();
        assert_eq!(err.source.kind(), std::io::ErrorKind::InvalidInput);
        assert!(!dir.join("../outside.json").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_nothing_to_write() {
        let dir = std::env::temp_dir().join(format!("tokenloom-export-{}", uuid::Uuid::new_v4()));
        assert!(write_exports(&dir, &[]).unwrap().is_empty());
        assert!(!dir.exists());
    }
}
