//! Serialized form of a node inside a workflow document

use super::node::{pos2_serde, vec2_serde, Node, NodeId};
use super::widget::WidgetValue;
use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One node as stored in a workflow document.
///
/// Fields this crate doesn't understand are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(with = "pos2_serde")]
    pub pos: Pos2,
    #[serde(with = "vec2_serde")]
    pub size: Vec2,
    #[serde(default)]
    pub widgets_values: Vec<WidgetValue>,
    #[serde(
        rename = "imageParamsText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_params_text: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeSnapshot {
    /// Capture the host-side fields of `node`
    pub fn from_node(node: &Node) -> Self {
        Self {
            id: node.id,
            node_type: node.node_type.clone(),
            pos: node.position,
            size: node.size,
            widgets_values: node.widgets_values(),
            image_params_text: None,
            extra: Map::new(),
        }
    }

    /// Write position, size and widget values back onto `node`
    pub fn apply_to(&self, node: &mut Node) {
        node.id = self.id;
        node.position = self.pos;
        node.size = self.size;
        node.apply_widgets_values(&self.widgets_values);
    }
}
