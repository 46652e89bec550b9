//! Node factory system - metadata-driven creation of the property nodes

use super::engine::{NodeVariant, PropertiesNode};
use super::geometry::{GeometryPolicy, MeasuredRegion, SizingConfig};
use super::node::Node;
use super::presentation::{PNG, SAVE_FORMATS, SAVE_IMAGE_FORMATS};
use super::watcher::CompletionOrder;
use super::widget::Widget;
use crate::constants::node::{DEFAULT_MIN_WIDTH, SAVE_MIN_WIDTH};
use crate::constants::widget::{DISPLAY, FORMAT, IMAGE, PROPERTIES};
use crate::error::{Error, Result};
use egui::Pos2;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

/// Data types that can flow through ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Image,
    Int,
    Float,
}

impl DataType {
    /// Type name as the host spells it on slots
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Image => "IMAGE",
            DataType::Int => "INT",
            DataType::Float => "FLOAT",
        }
    }
}

/// Hierarchical category system for organizing nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeCategory {
    path: Vec<String>,
}

impl NodeCategory {
    /// Create a new category from path components
    pub fn new(path: &[&str]) -> Self {
        Self {
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Get the category name (last component)
    pub fn name(&self) -> &str {
        self.path.last().map(|s| s.as_str()).unwrap_or("")
    }

    /// Slash-joined path, the way the host's node menu spells it
    pub fn display_string(&self) -> String {
        self.path.join("/")
    }

    pub fn image() -> Self {
        Self::new(&["image"])
    }

    pub fn image_analysis() -> Self {
        Self::new(&["image", "analysis"])
    }
}

/// Port definition for node creation
#[derive(Debug, Clone)]
pub struct PortDefinition {
    pub name: String,
    pub data_type: DataType,
}

impl PortDefinition {
    pub fn required(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
        }
    }
}

/// The seven outputs shared by the pass-through analysis nodes
fn analysis_outputs() -> Vec<PortDefinition> {
    vec![
        PortDefinition::required("image", DataType::Image),
        PortDefinition::required("batch_count", DataType::Int),
        PortDefinition::required("width", DataType::Int),
        PortDefinition::required("height", DataType::Int),
        PortDefinition::required("width_ratio", DataType::Float),
        PortDefinition::required("height_ratio", DataType::Float),
        PortDefinition::required("Resolution_in_MP", DataType::Float),
    ]
}

/// Everything needed to build a node of one type
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub node_type: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub category: NodeCategory,
    pub inputs: Vec<PortDefinition>,
    pub outputs: Vec<PortDefinition>,
    pub widgets: Vec<Widget>,
    pub variant: NodeVariant,
}

impl NodeMetadata {
    pub fn new(
        node_type: &'static str,
        display_name: &'static str,
        category: NodeCategory,
        description: &'static str,
        variant: NodeVariant,
    ) -> Self {
        Self {
            node_type,
            display_name,
            description,
            category,
            inputs: vec![],
            outputs: vec![],
            widgets: vec![],
            variant,
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<PortDefinition>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<PortDefinition>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_widgets(mut self, widgets: Vec<Widget>) -> Self {
        self.widgets = widgets;
        self
    }
}

/// Node factory trait with rich metadata
pub trait NodeFactory {
    fn metadata() -> NodeMetadata
    where
        Self: Sized;

    /// Create a node instance at the given position
    fn create(position: Pos2) -> PropertiesNode
    where
        Self: Sized,
    {
        let meta = Self::metadata();
        let mut node = Node::new(0, meta.node_type, meta.display_name, position);

        for input in &meta.inputs {
            node.add_input(&input.name, input.data_type);
        }
        for output in &meta.outputs {
            node.add_output(&output.name, output.data_type);
        }
        for widget in meta.widgets {
            node.add_widget(widget);
        }

        PropertiesNode::new(node, meta.variant)
    }
}

/// Loads an image from the input folder and shows its properties as soon as it is picked
pub struct LoadImagePropertiesNode;

impl NodeFactory for LoadImagePropertiesNode {
    fn metadata() -> NodeMetadata {
        let variant = NodeVariant::new(GeometryPolicy::GrowOnly, SizingConfig::new(DEFAULT_MIN_WIDTH))
            .watching(IMAGE);
        NodeMetadata::new(
            "LoadImageandviewPropertiesSG",
            "Load Image and view Properties-SG",
            NodeCategory::image_analysis(),
            "Load an image and display its dimensions, ratio and size",
            variant,
        )
        .with_outputs(analysis_outputs())
        .with_widgets(vec![Widget::combo(IMAGE, &[], "")])
    }
}

/// Saves images in a chosen format and shows their properties after execution
pub struct SaveImagePropertiesNode;

impl NodeFactory for SaveImagePropertiesNode {
    fn metadata() -> NodeMetadata {
        let sizing = SizingConfig::new(SAVE_MIN_WIDTH).with_text_block(0.0, 0.0);
        let variant = NodeVariant::new(GeometryPolicy::GrowOnce, sizing)
            .with_region(MeasuredRegion::default())
            .with_formats(&SAVE_IMAGE_FORMATS)
            .hiding_overlay();
        NodeMetadata::new(
            "SaveImageandviewPropertiesSG",
            "Save Image and view Properties-SG",
            NodeCategory::image(),
            "Save images with format and quality options and display their properties",
            variant,
        )
        .with_inputs(vec![PortDefinition::required("images", DataType::Image)])
        .with_widgets(vec![
            Widget::text("filename_prefix", "ComfyUI"),
            Widget::combo(PROPERTIES, &["None", "Basic", "Metadata", "Both"], "Both"),
            Widget::combo(FORMAT, &SAVE_FORMATS, PNG),
            Widget::int("png_compress_level", 9, 0, 9),
            Widget::int("jpeg_quality", 95, 1, 100),
            Widget::toggle("jpeg_optimize", true),
            Widget::combo(
                "jpeg_subsampling",
                &[
                    "4:4:4 (No subsampling, best quality)",
                    "4:2:2 (Moderate subsampling)",
                    "4:2:0 (Maximum subsampling, smaller files)",
                    "Auto (based on quality)",
                ],
                "Auto (based on quality)",
            ),
            Widget::int("webp_quality", 90, 1, 100),
            Widget::int("webp_method", 4, 0, 6),
            Widget::toggle("webp_lossless", false),
            Widget::combo(
                "tiff_compression",
                &[
                    "none (uncompressed, largest)",
                    "lzw (lossless, good compression)",
                    "tiff_deflate (lossless, better compression)",
                    "jpeg (lossy, smallest)",
                    "packbits (lossless, basic)",
                ],
                "tiff_deflate (lossless, better compression)",
            ),
            Widget::int("tiff_jpeg_quality", 90, 1, 100),
            Widget::display_region(DISPLAY),
        ])
    }
}

/// Previews images and shows their properties after execution
pub struct PreviewImagePropertiesNode;

impl NodeFactory for PreviewImagePropertiesNode {
    fn metadata() -> NodeMetadata {
        let variant = NodeVariant::new(GeometryPolicy::NoResize, SizingConfig::new(DEFAULT_MIN_WIDTH));
        NodeMetadata::new(
            "PreviewImageandviewPropertiesSG",
            "Preview Image and view Properties-SG",
            NodeCategory::image(),
            "Preview images and display their properties",
            variant,
        )
        .with_inputs(vec![PortDefinition::required("images", DataType::Image)])
        .with_outputs(analysis_outputs())
    }
}

/// Passes an image through and shows its properties after execution
pub struct ViewImagePropertiesNode;

impl NodeFactory for ViewImagePropertiesNode {
    fn metadata() -> NodeMetadata {
        let variant = NodeVariant::new(GeometryPolicy::NoResize, SizingConfig::new(DEFAULT_MIN_WIDTH));
        NodeMetadata::new(
            "ViewImagePropertiesSG",
            "View Image Properties-SG",
            NodeCategory::image_analysis(),
            "Display the properties of an image flowing through the graph",
            variant,
        )
        .with_inputs(vec![PortDefinition::required("image", DataType::Image)])
        .with_outputs(analysis_outputs())
    }
}

/// Function pointer type for creating nodes
type NodeCreator = fn(Pos2) -> PropertiesNode;
type MetadataProvider = fn() -> NodeMetadata;

/// Registry for managing node factories
#[derive(Debug)]
pub struct NodeRegistry {
    creators: BTreeMap<String, NodeCreator>,
    metadata_providers: BTreeMap<String, MetadataProvider>,
    categories: HashMap<NodeCategory, Vec<String>>,
    completion_order: CompletionOrder,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new(completion_order: CompletionOrder) -> Self {
        Self {
            creators: BTreeMap::new(),
            metadata_providers: BTreeMap::new(),
            categories: HashMap::new(),
            completion_order,
        }
    }

    /// Registry with the four image property nodes
    pub fn with_builtin_nodes(completion_order: CompletionOrder) -> Self {
        let mut registry = Self::new(completion_order);
        registry.register::<LoadImagePropertiesNode>();
        registry.register::<SaveImagePropertiesNode>();
        registry.register::<PreviewImagePropertiesNode>();
        registry.register::<ViewImagePropertiesNode>();
        registry
    }

    /// Register a node factory
    pub fn register<T: NodeFactory + 'static>(&mut self) {
        let metadata = T::metadata();
        let node_type = metadata.node_type.to_string();

        if self.creators.insert(node_type.clone(), T::create).is_some() {
            warn!("Node type {} registered twice; keeping the latest", node_type);
        }
        self.metadata_providers.insert(node_type.clone(), T::metadata);

        let entries = self.categories.entry(metadata.category.clone()).or_default();
        if !entries.contains(&node_type) {
            entries.push(node_type.clone());
        }
        debug!("Registered node type {} in {}", node_type, metadata.category.display_string());
    }

    /// Create a node by type name; hooks have not run yet
    pub fn create_node(&self, node_type: &str, position: Pos2) -> Result<PropertiesNode> {
        let creator = self
            .creators
            .get(node_type)
            .ok_or_else(|| Error::UnknownNodeType(node_type.to_string()))?;
        Ok(creator(position).with_completion_order(self.completion_order))
    }

    pub fn metadata(&self, node_type: &str) -> Option<NodeMetadata> {
        self.metadata_providers.get(node_type).map(|provider| provider())
    }

    pub fn node_types(&self) -> impl Iterator<Item = &str> {
        self.creators.keys().map(String::as_str)
    }

    pub fn nodes_in_category(&self, category: &NodeCategory) -> &[String] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn completion_order(&self) -> CompletionOrder {
        self.completion_order
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::with_builtin_nodes(CompletionOrder::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_types() {
        let registry = NodeRegistry::default();
        let types: Vec<&str> = registry.node_types().collect();
        assert_eq!(
            types,
            vec![
                "LoadImageandviewPropertiesSG",
                "PreviewImageandviewPropertiesSG",
                "SaveImageandviewPropertiesSG",
                "ViewImagePropertiesSG",
            ]
        );
        assert_eq!(
            registry.nodes_in_category(&NodeCategory::image_analysis()).len(),
            2
        );
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let registry = NodeRegistry::default();
        let err = registry.create_node("KSampler", Pos2::ZERO).unwrap_err();
        assert!(matches!(err, Error::UnknownNodeType(name) if name == "KSampler"));
    }

    #[test]
    fn test_created_node_carries_metadata() {
        let registry = NodeRegistry::with_builtin_nodes(CompletionOrder::LastCompletedWins);
        let load = registry
            .create_node("LoadImageandviewPropertiesSG", Pos2::new(5.0, 5.0))
            .unwrap();
        assert_eq!(load.node.title, "Load Image and view Properties-SG");
        assert_eq!(load.node.outputs.len(), 7);
        assert_eq!(load.node.outputs[6].name, "Resolution_in_MP");
        assert_eq!(load.node.outputs[6].data_type.name(), "FLOAT");
        assert_eq!(load.variant().watched_widget, Some(IMAGE));

        let save = registry
            .create_node("SaveImageandviewPropertiesSG", Pos2::ZERO)
            .unwrap();
        assert!(save.node.outputs.is_empty());
        assert_eq!(save.node.widget_text(FORMAT), Some(PNG));
        assert!(save.variant().hide_overlay_on_execute);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(NodeCategory::image_analysis().display_string(), "image/analysis");
        assert_eq!(NodeCategory::image_analysis().name(), "analysis");
    }
}
