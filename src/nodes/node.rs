//! Node types and core node functionality

use super::factory::DataType;
use super::port::{Port, PortType};
use super::widget::{Widget, WidgetValue};
use crate::constants::node::{BOTTOM_PADDING, DEFAULT_SIZE, SLOT_HEIGHT, TITLE_HEIGHT};
use egui::{Pos2, Rect, Vec2};

/// Unique identifier for a node
pub type NodeId = usize;

/// Host-side model of a node: slots, widgets and on-canvas geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub node_type: String,
    pub title: String,
    pub position: Pos2,
    pub size: Vec2,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
    pub widgets: Vec<Widget>,
}

impl Node {
    /// Creates a new node with the default size
    pub fn new(id: NodeId, node_type: impl Into<String>, title: impl Into<String>, position: Pos2) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            title: title.into(),
            position,
            size: Vec2::new(DEFAULT_SIZE[0], DEFAULT_SIZE[1]),
            inputs: vec![],
            outputs: vec![],
            widgets: vec![],
        }
    }

    /// Adds an input port to the node
    pub fn add_input(&mut self, name: impl Into<String>, data_type: DataType) -> &mut Self {
        let port_id = self.inputs.len();
        self.inputs.push(Port::new(port_id, name, data_type, PortType::Input));
        self
    }

    /// Adds an output port to the node
    pub fn add_output(&mut self, name: impl Into<String>, data_type: DataType) -> &mut Self {
        let port_id = self.outputs.len();
        self.outputs.push(Port::new(port_id, name, data_type, PortType::Output));
        self
    }

    pub fn add_widget(&mut self, widget: Widget) -> &mut Self {
        self.widgets.push(widget);
        self
    }

    pub fn widget(&self, name: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.name == name)
    }

    pub fn widget_mut(&mut self, name: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.name == name)
    }

    /// Text value of a widget, if it exists and holds text
    pub fn widget_text(&self, name: &str) -> Option<&str> {
        self.widget(name).and_then(|w| w.value.as_str())
    }

    /// Returns false if there is no widget called `name`
    pub fn set_widget_value(&mut self, name: &str, value: WidgetValue) -> bool {
        match self.widget_mut(name) {
            Some(widget) => {
                widget.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Values of the persisted widgets, in widget order
    pub fn widgets_values(&self) -> Vec<WidgetValue> {
        self.widgets
            .iter()
            .filter(|w| w.is_persisted())
            .map(|w| w.value.clone())
            .collect()
    }

    /// Restore persisted widget values positionally; extra values are ignored
    pub fn apply_widgets_values(&mut self, values: &[WidgetValue]) {
        let persisted = self.widgets.iter_mut().filter(|w| w.is_persisted());
        for (widget, value) in persisted.zip(values) {
            widget.set_value(value.clone());
        }
    }

    /// Size the node needs for its title, slots and visible widgets.
    ///
    /// `region_height` is the measured height of the display region, if any.
    pub fn compute_size(&self, region_height: f32) -> Vec2 {
        let slot_rows = self.inputs.len().max(self.outputs.len()) as f32;
        let widgets: f32 = self
            .widgets
            .iter()
            .map(|w| w.layout_height(region_height))
            .sum();
        Vec2::new(
            DEFAULT_SIZE[0],
            TITLE_HEIGHT + slot_rows * SLOT_HEIGHT + widgets + BOTTOM_PADDING,
        )
    }

    /// Returns the bounding rectangle of the node
    pub fn get_rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }
}

// Serde helper modules for egui types
pub(crate) mod pos2_serde {
    use egui::Pos2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(pos: &Pos2, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [pos.x, pos.y].serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Pos2, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [x, y] = <[f32; 2]>::deserialize(deserializer)?;
        Ok(Pos2::new(x, y))
    }
}

pub(crate) mod vec2_serde {
    use egui::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(vec: &Vec2, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [vec.x, vec.y].serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec2, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [x, y] = <[f32; 2]>::deserialize(deserializer)?;
        Ok(Vec2::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::node::{WIDGET_HEIGHT, WIDGET_SPACING};

    fn sample_node() -> Node {
        let mut node = Node::new(0, "Sample", "Sample", Pos2::ZERO);
        node.add_input("images", DataType::Image);
        node.add_output("width", DataType::Int)
            .add_output("height", DataType::Int);
        node.add_widget(Widget::combo("format", &["PNG", "JPEG"], "PNG"))
            .add_widget(Widget::int("quality", 90, 1, 100))
            .add_widget(Widget::display_region("display_info"));
        node
    }

    #[test]
    fn test_ports_are_indexed_per_side() {
        let node = sample_node();
        assert_eq!(node.inputs[0].id, 0);
        assert!(node.inputs[0].is_input());
        assert_eq!(node.outputs[1].id, 1);
        assert!(node.outputs[1].is_output());
    }

    #[test]
    fn test_compute_size_counts_visible_widgets_and_region() {
        let mut node = sample_node();
        let widget_row = WIDGET_HEIGHT + WIDGET_SPACING;
        let base = TITLE_HEIGHT + 2.0 * SLOT_HEIGHT + BOTTOM_PADDING;

        assert_eq!(node.compute_size(0.0).y, base + 2.0 * widget_row);
        assert_eq!(node.compute_size(46.0).y, base + 2.0 * widget_row + 46.0);

        node.widget_mut("quality").unwrap().hidden = true;
        assert_eq!(node.compute_size(0.0).y, base + widget_row);
    }

    #[test]
    fn test_widgets_values_skip_display_region() {
        let mut node = sample_node();
        assert_eq!(
            node.widgets_values(),
            vec![WidgetValue::from("PNG"), WidgetValue::from(90)]
        );

        node.apply_widgets_values(&[WidgetValue::from("JPEG"), WidgetValue::from(70)]);
        assert_eq!(node.widget_text("format"), Some("JPEG"));
        assert_eq!(node.widget("quality").unwrap().value.as_int(), Some(70));
    }

    #[test]
    fn test_set_unknown_widget() {
        let mut node = sample_node();
        assert!(!node.set_widget_value("missing", WidgetValue::from(1)));
        assert!(node.set_widget_value("format", WidgetValue::from("JPEG")));
    }
}
