//! Node lifecycle hooks
//!
//! The host calls these at fixed points in a node's life. Every hook has a
//! no-op default so a node only overrides what it reacts to.

use super::snapshot::NodeSnapshot;
use crate::host::{ExecutionMessage, OverlayController, RedrawSink};

/// Host capabilities available while a hook runs
#[derive(Clone, Copy)]
pub struct HostContext<'a> {
    pub redraw: &'a dyn RedrawSink,
    pub overlay: &'a dyn OverlayController,
    pub overlay_selector: &'a str,
}

/// Trait for node-specific lifecycle hooks
pub trait NodeLifecycleHooks {
    /// Called once after the node is constructed with its default widgets
    fn on_created(&mut self, _ctx: &HostContext<'_>) {}

    /// Called when an upstream computation delivers results to the node
    fn on_executed(&mut self, _message: &ExecutionMessage, _ctx: &HostContext<'_>) {}

    /// Called while the node is written into a workflow document
    fn on_serialize(&self, _snapshot: &mut NodeSnapshot) {}

    /// Called after the node was restored from a workflow document
    fn on_configure(&mut self, _snapshot: &NodeSnapshot, _ctx: &HostContext<'_>) {}

    /// Called after the user changed a widget's value
    fn on_widget_changed(&mut self, _widget: &str, _ctx: &HostContext<'_>) {}

    /// Called when the node is removed from the graph
    fn on_removed(&mut self) {}
}
