//! Per-node property engine
//!
//! A [`PropertiesNode`] pairs the host-side [`Node`] with the display lines it
//! shows and the behaviour of its variant: how it resizes, which slot it
//! watches, and which widgets depend on the chosen format.

use super::display::DisplayState;
use super::geometry::{GeometryPolicy, GeometrySync, MeasuredRegion, SizingConfig};
use super::hooks::{HostContext, NodeLifecycleHooks};
use super::node::{Node, NodeId};
use super::presentation::{apply_format_visibility, hide_host_overlay, FormatVisibilityTable};
use super::snapshot::NodeSnapshot;
use super::watcher::{ChangeWatcher, CompletionOrder, Observation, ProbeTicket, WatcherState};
use super::widget::WidgetValue;
use crate::constants::widget::FORMAT;
use crate::host::ExecutionMessage;
use crate::metrics::{ImageDimensions, MetricsResult};
use crate::probe::ProbeError;
use egui::Vec2;
use log::{debug, error, info};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Behaviour that distinguishes one property node type from another
#[derive(Debug, Clone)]
pub struct NodeVariant {
    pub geometry: GeometryPolicy,
    pub sizing: SizingConfig,
    /// Display region measured from the lines, if the variant has one
    pub region: Option<MeasuredRegion>,
    /// Widget whose image reference is probed client-side
    pub watched_widget: Option<&'static str>,
    pub formats: Option<&'static FormatVisibilityTable>,
    pub hide_overlay_on_execute: bool,
}

impl NodeVariant {
    pub fn new(geometry: GeometryPolicy, sizing: SizingConfig) -> Self {
        Self {
            geometry,
            sizing,
            region: None,
            watched_widget: None,
            formats: None,
            hide_overlay_on_execute: false,
        }
    }

    pub fn with_region(mut self, region: MeasuredRegion) -> Self {
        self.region = Some(region);
        self
    }

    pub fn watching(mut self, widget: &'static str) -> Self {
        self.watched_widget = Some(widget);
        self
    }

    pub fn with_formats(mut self, table: &'static FormatVisibilityTable) -> Self {
        self.formats = Some(table);
        self
    }

    pub fn hiding_overlay(mut self) -> Self {
        self.hide_overlay_on_execute = true;
        self
    }
}

/// A node instance together with its property-display state
#[derive(Debug, Clone)]
pub struct PropertiesNode {
    pub node: Node,
    variant: NodeVariant,
    display: DisplayState,
    geometry: GeometrySync,
    watcher: Option<ChangeWatcher>,
    completion_order: CompletionOrder,
    unknown_fields: Map<String, Value>,
}

impl PropertiesNode {
    pub fn new(node: Node, variant: NodeVariant) -> Self {
        let geometry = GeometrySync::new(variant.geometry, variant.sizing);
        Self {
            node,
            variant,
            display: DisplayState::new(),
            geometry,
            watcher: None,
            completion_order: CompletionOrder::default(),
            unknown_fields: Map::new(),
        }
    }

    pub fn with_completion_order(mut self, order: CompletionOrder) -> Self {
        self.completion_order = order;
        self
    }

    pub fn completion_order(&self) -> CompletionOrder {
        self.completion_order
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn variant(&self) -> &NodeVariant {
        &self.variant
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn geometry(&self) -> &GeometrySync {
        &self.geometry
    }

    pub fn watcher(&self) -> Option<&ChangeWatcher> {
        self.watcher.as_ref()
    }

    pub fn watcher_state(&self) -> Option<WatcherState> {
        self.watcher.as_ref().map(ChangeWatcher::state)
    }

    /// Current height of the display region; zero without one
    pub fn region_height(&self) -> f32 {
        self.variant
            .region
            .map(|region| region.height(&self.display))
            .unwrap_or(0.0)
    }

    /// Size the host should lay the node out at for its current content
    pub fn layout_size(&self) -> Vec2 {
        Vec2::new(self.node.size.x, self.node.compute_size(self.region_height()).y)
    }

    /// Replace the display lines, apply the geometry policy and request a redraw.
    ///
    /// Setting the lines already shown does nothing.
    pub fn set_display_lines(&mut self, lines: Vec<String>, ctx: &HostContext<'_>) {
        if !self.display.set(lines) {
            debug!("Node {} display lines unchanged", self.node.id);
            return;
        }
        let region_height = self.region_height();
        if self.geometry.on_display_changed(&mut self.node, region_height) {
            debug!("Node {} resized to {:?}", self.node.id, self.node.size);
        }
        ctx.redraw.request_redraw();
    }

    /// Look at the watched widget's current value
    pub fn poll_watched_slot(&mut self) -> Observation {
        let Some(widget) = self.variant.watched_widget else {
            return Observation::Unchanged;
        };
        let current = self.node.widget_text(widget).map(str::to_string);
        match self.watcher.as_mut() {
            Some(watcher) => watcher.observe(current.as_deref()),
            None => Observation::Unchanged,
        }
    }

    /// Store a new value in the watched widget and observe it
    pub fn observe_reference(&mut self, value: Option<&str>) -> Observation {
        if let Some(widget) = self.variant.watched_widget {
            self.node
                .set_widget_value(widget, WidgetValue::from(value.unwrap_or("")));
        }
        match self.watcher.as_mut() {
            Some(watcher) => watcher.observe(value),
            None => Observation::Unchanged,
        }
    }

    /// Apply the outcome of a probe issued by this node's watcher.
    ///
    /// Returns whether the display lines were updated. Failures are logged and
    /// leave the display as it was.
    pub fn complete_probe(
        &mut self,
        ticket: &ProbeTicket,
        result: Result<ImageDimensions, ProbeError>,
        location: &str,
        ctx: &HostContext<'_>,
    ) -> bool {
        let Some(watcher) = self.watcher.as_mut() else {
            return false;
        };
        if watcher.state() == WatcherState::Stopped {
            debug!(
                "Node {}: ignoring probe of {} after teardown",
                self.node.id, ticket.reference
            );
            return false;
        }
        let apply = watcher.complete(ticket);

        match result {
            Ok(dimensions) if apply => {
                let metrics = MetricsResult::compute(dimensions);
                info!(
                    "Node {}: {} is {}x{}",
                    self.node.id,
                    ticket.reference,
                    metrics.dimensions.width(),
                    metrics.dimensions.height()
                );
                self.set_display_lines(metrics.display_lines(), ctx);
                true
            }
            Ok(_) => {
                debug!(
                    "Node {}: discarding stale result for {}",
                    self.node.id, ticket.reference
                );
                false
            }
            Err(err) => {
                error!(
                    "Node {}: Failed to load image: {} ({})",
                    self.node.id, location, err
                );
                false
            }
        }
    }

    /// Stop the watcher for good; returns false if there was nothing to stop
    pub fn stop_watching(&mut self) -> bool {
        self.watcher.as_mut().map(ChangeWatcher::stop).unwrap_or(false)
    }

    /// Re-apply format visibility for the selected format, if the variant has a table
    pub fn refresh_format_visibility(&mut self) -> Option<BTreeSet<String>> {
        let table = self.variant.formats?;
        let format = self.node.widget_text(FORMAT).unwrap_or("").to_string();
        let region_height = self.region_height();
        Some(apply_format_visibility(&mut self.node, table, &format, region_height))
    }

    /// Set a widget's value the way a user edit would, firing the change hook
    pub fn set_widget_value(&mut self, name: &str, value: WidgetValue, ctx: &HostContext<'_>) -> bool {
        if !self.node.set_widget_value(name, value) {
            return false;
        }
        self.on_widget_changed(name, ctx);
        true
    }

    /// Serialize the node for a workflow document
    pub fn snapshot(&self) -> NodeSnapshot {
        let mut snapshot = NodeSnapshot::from_node(&self.node);
        snapshot.extra = self.unknown_fields.clone();
        self.on_serialize(&mut snapshot);
        snapshot
    }

    /// Restore saved state onto a freshly created node
    pub fn configure(&mut self, snapshot: &NodeSnapshot, ctx: &HostContext<'_>) {
        snapshot.apply_to(&mut self.node);
        self.unknown_fields = snapshot.extra.clone();
        self.on_configure(snapshot, ctx);
    }
}

impl NodeLifecycleHooks for PropertiesNode {
    fn on_created(&mut self, _ctx: &HostContext<'_>) {
        self.geometry.on_created(&mut self.node);

        if let Some(widget) = self.variant.watched_widget {
            let initial = self.node.widget_text(widget);
            self.watcher = Some(ChangeWatcher::new(initial, self.completion_order));
        }
        self.refresh_format_visibility();

        debug!(
            "Created {} node {} ({:?})",
            self.node.node_type, self.node.id, self.variant.geometry
        );
    }

    fn on_executed(&mut self, message: &ExecutionMessage, ctx: &HostContext<'_>) {
        let Some(text) = &message.text else {
            return;
        };
        if self.variant.hide_overlay_on_execute {
            hide_host_overlay(ctx.overlay, ctx.overlay_selector);
        }
        self.set_display_lines(text.clone(), ctx);
    }

    fn on_serialize(&self, snapshot: &mut NodeSnapshot) {
        snapshot.image_params_text = self.display.serialize();
    }

    fn on_configure(&mut self, snapshot: &NodeSnapshot, ctx: &HostContext<'_>) {
        self.display.restore(snapshot.image_params_text.as_deref());
        // The restored slot value comes with its lines; don't look it up again
        if let (Some(widget), Some(watcher)) = (self.variant.watched_widget, self.watcher.as_mut()) {
            watcher.rebase(self.node.widget_text(widget));
        }
        self.refresh_format_visibility();
        ctx.redraw.request_redraw();
    }

    fn on_widget_changed(&mut self, widget: &str, ctx: &HostContext<'_>) {
        if widget == FORMAT && self.refresh_format_visibility().is_some() {
            ctx.redraw.request_redraw();
        }
    }

    fn on_removed(&mut self) {
        if self.stop_watching() {
            debug!("Stopped watching node {}", self.node.id);
        }
    }
}
