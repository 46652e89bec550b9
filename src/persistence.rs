//! Workflow documents - saving and loading node graphs
//!
//! Handles the on-disk document and the "which file, is it dirty" state that
//! goes with it.

use crate::constants::document::{CREATOR, VERSION};
use crate::error::{Error, Result};
use crate::nodes::{HostContext, NodeGraph, NodeRegistry, NodeSnapshot};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Saved workflow: a version, timestamps and one snapshot per node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub version: String,
    pub metadata: DocumentMetadata,
    pub nodes: Vec<NodeSnapshot>,
    /// Host data outside the node list, written back untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub created: String,  // RFC 3339
    pub modified: String, // RFC 3339
    pub creator: String,
}

impl WorkflowDocument {
    /// A new document holding `nodes`, stamped now
    pub fn new(nodes: Vec<NodeSnapshot>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: VERSION.to_string(),
            metadata: DocumentMetadata {
                created: now.clone(),
                modified: now,
                creator: CREATOR.to_string(),
            },
            nodes,
            extra: Map::new(),
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let document: Self = serde_json::from_str(content)?;
        if document.version != VERSION {
            warn!(
                "Workflow document version {} differs from {}; loading anyway",
                document.version, VERSION
            );
        }
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&content)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let content = self.to_json()?;
        std::fs::write(path, content).map_err(|e| Error::io(path, e))
    }
}

/// Tracks the file backing the current graph
#[derive(Debug, Default)]
pub struct FileManager {
    /// Current file path (None if unsaved/new file)
    current_file_path: Option<PathBuf>,
    /// Whether the graph has been modified since last save
    is_modified: bool,
    /// Metadata and host fields of the loaded document, kept across saves
    loaded: Option<(DocumentMetadata, Map<String, Value>)>,
}

impl FileManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_file_path(&self) -> Option<&Path> {
        self.current_file_path.as_deref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.is_modified
    }

    pub fn mark_modified(&mut self) {
        self.is_modified = true;
    }

    /// File name with a trailing `*` when there are unsaved changes
    pub fn display_name(&self) -> String {
        let name = self
            .current_file_path
            .as_ref()
            .and_then(|path| path.file_name())
            .and_then(|name| name.to_str())
            .unwrap_or("Untitled");
        if self.is_modified {
            format!("{}*", name)
        } else {
            name.to_string()
        }
    }

    /// Save the graph to `path`
    pub fn save_to_file(&mut self, path: &Path, graph: &NodeGraph) -> Result<()> {
        let mut document = WorkflowDocument::new(graph.snapshot());
        if let Some((metadata, extra)) = &self.loaded {
            document.metadata.created = metadata.created.clone();
            document.extra = extra.clone();
        }
        document.write(path)?;

        info!("Saved {} node(s) to {}", document.nodes.len(), path.display());
        self.current_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        self.loaded = Some((document.metadata, document.extra));
        Ok(())
    }

    /// Save to the current file, if there is one
    pub fn save(&mut self, graph: &NodeGraph) -> Result<()> {
        let path = self
            .current_file_path
            .clone()
            .ok_or_else(|| Error::Config("no file to save to".to_string()))?;
        self.save_to_file(&path, graph)
    }

    /// Load a graph from `path`, running each node's creation and restore hooks
    pub fn load_from_file(
        &mut self,
        path: &Path,
        registry: NodeRegistry,
        ctx: &HostContext<'_>,
    ) -> Result<NodeGraph> {
        let document = WorkflowDocument::read(path)?;
        let graph = NodeGraph::restore(registry, &document.nodes, ctx)?;

        info!("Loaded {} node(s) from {}", graph.len(), path.display());
        self.current_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        self.loaded = Some((document.metadata, document.extra));
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DirtyCanvas, ExecutionMessage, NoOverlay};
    use egui::Pos2;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_document_keeps_unknown_fields() {
        let content = json!({
            "version": "1.0",
            "metadata": {"created": "2024-01-01T00:00:00+00:00", "modified": "2024-01-01T00:00:00+00:00", "creator": "host"},
            "nodes": [],
            "links": [[1, 2, 0, 3, 0, "IMAGE"]],
            "extra": {"ds": {"scale": 1.0}}
        })
        .to_string();
        let document = WorkflowDocument::from_json(&content).unwrap();
        assert!(document.extra.contains_key("links"));

        let written: Value = serde_json::from_str(&document.to_json().unwrap()).unwrap();
        assert_eq!(written["links"], json!([[1, 2, 0, 3, 0, "IMAGE"]]));
        assert_eq!(written["extra"]["ds"]["scale"], json!(1.0));
    }

    #[test]
    fn test_timestamps_are_rfc3339() {
        let document = WorkflowDocument::new(vec![]);
        assert!(chrono::DateTime::parse_from_rfc3339(&document.metadata.created).is_ok());
        assert_eq!(document.metadata.creator, CREATOR);
    }

    #[test]
    fn test_save_and_load_graph() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workflow.json");
        let canvas = DirtyCanvas::new();
        let ctx = HostContext {
            redraw: &canvas,
            overlay: &NoOverlay,
            overlay_selector: ".caption",
        };

        let mut graph = NodeGraph::default();
        let id = graph
            .create_node("ViewImagePropertiesSG", Pos2::new(12.0, 34.0), &ctx)
            .unwrap();
        let lines = vec!["1024x768 | 0.79MP".to_string(), "Ratio: 4:3 or 1.33:1".to_string()];
        graph
            .deliver_execution(id, &ExecutionMessage::with_text(lines.clone()), &ctx)
            .unwrap();

        let mut files = FileManager::new();
        files.mark_modified();
        assert_eq!(files.display_name(), "Untitled*");
        files.save_to_file(&path, &graph).unwrap();
        assert_eq!(files.display_name(), "workflow.json");
        assert!(!files.has_unsaved_changes());

        let mut reopened = FileManager::new();
        let loaded = reopened
            .load_from_file(&path, NodeRegistry::default(), &ctx)
            .unwrap();
        let node = loaded.get(id).unwrap();
        assert_eq!(node.borrow().display().lines(), lines.as_slice());
        assert_eq!(node.borrow().node.position, Pos2::new(12.0, 34.0));
        assert_eq!(reopened.current_file_path(), Some(path.as_path()));
    }

    #[test]
    fn test_save_without_file_fails() {
        let mut files = FileManager::new();
        assert!(files.save(&NodeGraph::default()).is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let canvas = DirtyCanvas::new();
        let ctx = HostContext {
            redraw: &canvas,
            overlay: &NoOverlay,
            overlay_selector: "",
        };
        let err = FileManager::new()
            .load_from_file(&dir.path().join("nope.json"), NodeRegistry::default(), &ctx)
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
