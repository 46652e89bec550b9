//! Node graph - owns the property nodes and their running watchers

use super::engine::PropertiesNode;
use super::factory::NodeRegistry;
use super::hooks::{HostContext, NodeLifecycleHooks};
use super::node::NodeId;
use super::snapshot::NodeSnapshot;
use crate::error::{Error, Result};
use crate::host::ExecutionMessage;
use crate::runtime::WatcherHandle;
use egui::Pos2;
use log::{debug, info};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// A node shared between the graph and the tasks that watch it
pub type SharedNode = Rc<RefCell<PropertiesNode>>;

/// A graph of property nodes
#[derive(Debug)]
pub struct NodeGraph {
    nodes: BTreeMap<NodeId, SharedNode>,
    watchers: HashMap<NodeId, WatcherHandle>,
    registry: NodeRegistry,
    next_node_id: NodeId,
}

impl NodeGraph {
    pub fn new(registry: NodeRegistry) -> Self {
        Self {
            nodes: BTreeMap::new(),
            watchers: HashMap::new(),
            registry,
            next_node_id: 0,
        }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Create a node of `node_type`, run its creation hook and add it to the graph
    pub fn create_node(
        &mut self,
        node_type: &str,
        position: Pos2,
        ctx: &HostContext<'_>,
    ) -> Result<NodeId> {
        let node = self.registry.create_node(node_type, position)?;
        let id = self.add_node(node);
        if let Some(node) = self.nodes.get(&id) {
            node.borrow_mut().on_created(ctx);
        }
        Ok(id)
    }

    /// Adds a node to the graph and returns its ID
    pub fn add_node(&mut self, mut node: PropertiesNode) -> NodeId {
        let id = self.next_node_id;
        node.node.id = id;
        self.nodes.insert(id, Rc::new(RefCell::new(node)));
        self.next_node_id += 1;
        id
    }

    /// Adds a node under a specific ID, as when restoring a document
    pub fn add_node_with_id(&mut self, id: NodeId, mut node: PropertiesNode) -> NodeId {
        node.node.id = id;
        self.nodes.insert(id, Rc::new(RefCell::new(node)));
        if id >= self.next_node_id {
            self.next_node_id = id + 1;
        }
        id
    }

    pub fn get(&self, id: NodeId) -> Option<SharedNode> {
        self.nodes.get(&id).cloned()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Keep `handle` alive for as long as node `id` is in the graph
    pub fn attach_watcher(&mut self, id: NodeId, handle: WatcherHandle) -> Result<()> {
        if !self.nodes.contains_key(&id) {
            handle.stop();
            return Err(Error::NodeNotFound(id));
        }
        if let Some(previous) = self.watchers.insert(id, handle) {
            previous.stop();
        }
        Ok(())
    }

    pub fn has_watcher(&self, id: NodeId) -> bool {
        self.watchers.contains_key(&id)
    }

    /// Removes a node, stopping its watcher first
    pub fn remove_node(&mut self, id: NodeId) -> Option<SharedNode> {
        let node = self.nodes.remove(&id)?;
        node.borrow_mut().on_removed();
        if let Some(handle) = self.watchers.remove(&id) {
            handle.stop();
        }
        debug!("Removed node {}", id);
        Some(node)
    }

    /// Deliver an execution result to node `id`
    pub fn deliver_execution(
        &self,
        id: NodeId,
        message: &ExecutionMessage,
        ctx: &HostContext<'_>,
    ) -> Result<()> {
        let node = self.nodes.get(&id).ok_or(Error::NodeNotFound(id))?;
        node.borrow_mut().on_executed(message, ctx);
        Ok(())
    }

    /// Snapshots of every node, in id order
    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        self.nodes.values().map(|node| node.borrow().snapshot()).collect()
    }

    /// Rebuild a graph from saved snapshots.
    ///
    /// Each node is created, gets its creation hook, then has the snapshot
    /// applied, matching how a freshly loaded document comes to life.
    pub fn restore(
        registry: NodeRegistry,
        snapshots: &[NodeSnapshot],
        ctx: &HostContext<'_>,
    ) -> Result<Self> {
        let mut graph = Self::new(registry);
        for snapshot in snapshots {
            let mut node = graph.registry.create_node(&snapshot.node_type, snapshot.pos)?;
            node.node.id = snapshot.id;
            node.on_created(ctx);
            node.configure(snapshot, ctx);
            graph.add_node_with_id(snapshot.id, node);
        }
        info!("Restored {} node(s)", graph.len());
        Ok(graph)
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new(NodeRegistry::default())
    }
}

impl Drop for NodeGraph {
    fn drop(&mut self) {
        for (_, handle) in self.watchers.drain() {
            handle.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DirtyCanvas, NoOverlay};
    use crate::nodes::watcher::WatcherState;

    fn with_ctx<R>(f: impl FnOnce(&HostContext<'_>) -> R) -> R {
        let canvas = DirtyCanvas::new();
        let ctx = HostContext {
            redraw: &canvas,
            overlay: &NoOverlay,
            overlay_selector: ".caption",
        };
        f(&ctx)
    }

    #[test]
    fn test_create_runs_creation_hook() {
        with_ctx(|ctx| {
            let mut graph = NodeGraph::default();
            let id = graph
                .create_node("LoadImageandviewPropertiesSG", Pos2::ZERO, ctx)
                .unwrap();
            let node = graph.get(id).unwrap();
            let node = node.borrow();
            assert_eq!(node.node.size.x, 300.0);
            assert_eq!(node.watcher_state(), Some(WatcherState::Idle));
        });
    }

    #[test]
    fn test_ids_are_sequential() {
        with_ctx(|ctx| {
            let mut graph = NodeGraph::default();
            let a = graph.create_node("ViewImagePropertiesSG", Pos2::ZERO, ctx).unwrap();
            let b = graph.create_node("ViewImagePropertiesSG", Pos2::ZERO, ctx).unwrap();
            assert_eq!((a, b), (0, 1));
        });
    }

    #[test]
    fn test_remove_stops_watcher() {
        with_ctx(|ctx| {
            let mut graph = NodeGraph::default();
            let id = graph
                .create_node("LoadImageandviewPropertiesSG", Pos2::ZERO, ctx)
                .unwrap();
            let node = graph.remove_node(id).unwrap();
            assert_eq!(node.borrow().watcher_state(), Some(WatcherState::Stopped));
            assert!(graph.get(id).is_none());
            assert!(graph.remove_node(id).is_none());
        });
    }

    #[test]
    fn test_deliver_to_missing_node() {
        with_ctx(|ctx| {
            let graph = NodeGraph::default();
            let err = graph
                .deliver_execution(3, &ExecutionMessage::default(), ctx)
                .unwrap_err();
            assert!(matches!(err, Error::NodeNotFound(3)));
        });
    }

    #[test]
    fn test_snapshot_restore_keeps_display_and_ids() {
        with_ctx(|ctx| {
            let mut graph = NodeGraph::default();
            graph.create_node("ViewImagePropertiesSG", Pos2::ZERO, ctx).unwrap();
            let id = graph
                .create_node("PreviewImageandviewPropertiesSG", Pos2::new(40.0, 40.0), ctx)
                .unwrap();
            graph.remove_node(0);

            let lines = vec!["640x480 | 0.31MP".to_string()];
            graph
                .deliver_execution(id, &ExecutionMessage::with_text(lines.clone()), ctx)
                .unwrap();

            let snapshots = graph.snapshot();
            let restored = NodeGraph::restore(NodeRegistry::default(), &snapshots, ctx).unwrap();
            let node = restored.get(id).unwrap();
            assert_eq!(node.borrow().display().lines(), lines.as_slice());
            assert_eq!(node.borrow().node.position, Pos2::new(40.0, 40.0));
            assert_eq!(restored.snapshot(), snapshots);
        });
    }
}
