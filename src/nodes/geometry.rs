//! Node geometry policies - how a node's size reacts to new display lines

use super::display::DisplayState;
use super::node::Node;
use crate::constants::node::{FLOOR_HEIGHT, LINE_HEIGHT, REGION_PADDING, TEXT_BLOCK_HEIGHT};
use serde::{Deserialize, Serialize};

/// Resize behaviour applied after the display lines change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryPolicy {
    /// Recompute height on every change (computed + text block, at least the floor)
    GrowOnly,
    /// Like `GrowOnly` but only for the first change after creation
    GrowOnce,
    /// Never resize
    NoResize,
    /// The display region measures itself from the lines during layout
    SelfMeasuring,
}

/// Per-variant sizing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingConfig {
    pub min_width: f32,
    pub text_block_height: f32,
    pub floor_height: f32,
}

impl SizingConfig {
    pub fn new(min_width: f32) -> Self {
        Self {
            min_width,
            text_block_height: TEXT_BLOCK_HEIGHT,
            floor_height: FLOOR_HEIGHT,
        }
    }

    pub fn with_text_block(mut self, text_block_height: f32, floor_height: f32) -> Self {
        self.text_block_height = text_block_height;
        self.floor_height = floor_height;
        self
    }
}

/// Height function of a display region: one line height per line plus padding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasuredRegion {
    pub line_height: f32,
    pub padding: f32,
}

impl Default for MeasuredRegion {
    fn default() -> Self {
        Self {
            line_height: LINE_HEIGHT,
            padding: REGION_PADDING,
        }
    }
}

impl MeasuredRegion {
    /// Zero until the display state has been set
    pub fn height(&self, display: &DisplayState) -> f32 {
        if !display.is_set() {
            return 0.0;
        }
        display.lines().len() as f32 * self.line_height + self.padding
    }
}

/// Applies a [`GeometryPolicy`] to one node, remembering whether it already grew
#[derive(Debug, Clone)]
pub struct GeometrySync {
    policy: GeometryPolicy,
    sizing: SizingConfig,
    has_resized: bool,
}

impl GeometrySync {
    pub fn new(policy: GeometryPolicy, sizing: SizingConfig) -> Self {
        Self {
            policy,
            sizing,
            has_resized: false,
        }
    }

    pub fn policy(&self) -> GeometryPolicy {
        self.policy
    }

    pub fn has_resized(&self) -> bool {
        self.has_resized
    }

    /// Widen a freshly created node to the variant's minimum width
    pub fn on_created(&self, node: &mut Node) {
        node.size.x = node.size.x.max(self.sizing.min_width);
    }

    /// React to new display lines; returns whether the node's size changed
    pub fn on_display_changed(&mut self, node: &mut Node, region_height: f32) -> bool {
        match self.policy {
            GeometryPolicy::GrowOnly => self.grow(node, region_height),
            GeometryPolicy::GrowOnce => {
                if self.has_resized {
                    return false;
                }
                self.has_resized = true;
                self.grow(node, region_height)
            }
            GeometryPolicy::NoResize | GeometryPolicy::SelfMeasuring => false,
        }
    }

    fn grow(&self, node: &mut Node, region_height: f32) -> bool {
        let computed = node.compute_size(region_height).y;
        let height = (computed + self.sizing.text_block_height).max(self.sizing.floor_height);
        let changed = node.size.y != height;
        node.size.y = height;
        changed
    }
}
