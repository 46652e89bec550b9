//! Node widgets - the editable controls stacked below a node's slots

use crate::constants::node::{WIDGET_HEIGHT, WIDGET_SPACING};
use serde::{Deserialize, Serialize};

/// Value held by a widget, serialized the way workflow documents store it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidgetValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl WidgetValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            WidgetValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            WidgetValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WidgetValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for WidgetValue {
    fn from(value: &str) -> Self {
        WidgetValue::Text(value.to_string())
    }
}

impl From<i64> for WidgetValue {
    fn from(value: i64) -> Self {
        WidgetValue::Int(value)
    }
}

impl From<bool> for WidgetValue {
    fn from(value: bool) -> Self {
        WidgetValue::Bool(value)
    }
}

/// What kind of control a widget is
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    Combo { options: Vec<String> },
    Int { min: i64, max: i64 },
    Toggle,
    Text,
    /// Read-only text region whose height is measured from the display lines
    DisplayRegion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub name: String,
    pub kind: WidgetKind,
    pub value: WidgetValue,
    pub hidden: bool,
}

impl Widget {
    fn new(name: &str, kind: WidgetKind, value: WidgetValue) -> Self {
        Self {
            name: name.to_string(),
            kind,
            value,
            hidden: false,
        }
    }

    pub fn combo(name: &str, options: &[&str], default: &str) -> Self {
        let options = options.iter().map(|o| o.to_string()).collect();
        Self::new(name, WidgetKind::Combo { options }, default.into())
    }

    pub fn int(name: &str, default: i64, min: i64, max: i64) -> Self {
        Self::new(name, WidgetKind::Int { min, max }, default.into())
    }

    pub fn toggle(name: &str, default: bool) -> Self {
        Self::new(name, WidgetKind::Toggle, default.into())
    }

    pub fn text(name: &str, default: &str) -> Self {
        Self::new(name, WidgetKind::Text, default.into())
    }

    pub fn display_region(name: &str) -> Self {
        Self::new(name, WidgetKind::DisplayRegion, "".into())
    }

    /// Whether the value belongs in a workflow document's `widgets_values`
    pub fn is_persisted(&self) -> bool {
        !matches!(self.kind, WidgetKind::DisplayRegion)
    }

    /// Vertical space the widget takes in the node body.
    ///
    /// Hidden widgets take none; a display region takes `region_height`.
    pub fn layout_height(&self, region_height: f32) -> f32 {
        if self.hidden {
            return 0.0;
        }
        match self.kind {
            WidgetKind::DisplayRegion => region_height,
            _ => WIDGET_HEIGHT + WIDGET_SPACING,
        }
    }

    /// Set the value, clamping integers to their range
    pub fn set_value(&mut self, value: WidgetValue) {
        self.value = match (&self.kind, value) {
            (WidgetKind::Int { min, max }, WidgetValue::Int(v)) => WidgetValue::Int(v.clamp(*min, *max)),
            (_, value) => value,
        };
    }
}
