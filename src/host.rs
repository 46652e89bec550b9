//! Capabilities of the host editor that the property engine calls out to
//!
//! The host owns drawing and the page the editor lives in; the engine only
//! needs a one-way redraw signal, a way to hide the host's own caption
//! overlay, and the shape of the execution results it delivers.

use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// One-way "visible content changed" signal; no acknowledgement
pub trait RedrawSink {
    fn request_redraw(&self);
}

/// Redraw sink that just records that a repaint is owed, like a dirty canvas flag
#[derive(Debug, Default)]
pub struct DirtyCanvas {
    requests: Cell<usize>,
}

impl DirtyCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a repaint was requested since the last `take`
    pub fn is_dirty(&self) -> bool {
        self.requests.get() > 0
    }

    /// Number of requests since the last `take`, resetting the counter
    pub fn take(&self) -> usize {
        self.requests.replace(0)
    }
}

impl RedrawSink for DirtyCanvas {
    fn request_redraw(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

/// Hides host-rendered presentation elements matching a selector
pub trait OverlayController {
    /// Returns how many elements were hidden
    fn hide(&self, selector: &str) -> usize;
}

/// Overlay controller for hosts without a caption overlay
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverlay;

impl OverlayController for NoOverlay {
    fn hide(&self, _selector: &str) -> usize {
        0
    }
}

/// Reference to an image served by the host, as carried in execution results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default = "ImageRequest::default_kind")]
    pub kind: String,
}

impl ImageRequest {
    /// Request for a file in the host's input folder
    pub fn input(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            subfolder: String::new(),
            kind: Self::default_kind(),
        }
    }

    fn default_kind() -> String {
        "input".to_string()
    }
}

/// Result of an upstream computation delivered to a node.
///
/// When `text` is present it replaces the node's display lines verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRequest>>,
}

impl ExecutionMessage {
    pub fn with_text(lines: Vec<String>) -> Self {
        Self {
            text: Some(lines),
            images: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_canvas_counts_requests() {
        let canvas = DirtyCanvas::new();
        assert!(!canvas.is_dirty());
        canvas.request_redraw();
        canvas.request_redraw();
        assert!(canvas.is_dirty());
        assert_eq!(canvas.take(), 2);
        assert!(!canvas.is_dirty());
    }

    #[test]
    fn test_execution_message_wire_format() {
        let message: ExecutionMessage = serde_json::from_str(
            r#"{"text": ["a", "b"], "images": [{"filename": "x.png", "subfolder": "", "type": "output"}]}"#,
        )
        .unwrap();
        assert_eq!(message.text, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(message.images.as_ref().unwrap()[0].kind, "output");

        let empty: ExecutionMessage = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text, None);
        assert_eq!(serde_json::to_string(&empty).unwrap(), "{}");
    }

    #[test]
    fn test_input_request_defaults() {
        let request = ImageRequest::input("photo.png");
        assert_eq!(request.kind, "input");
        assert!(request.subfolder.is_empty());
    }
}
