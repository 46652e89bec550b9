//! Node system - property nodes, their lifecycle and presentation

pub mod display;
pub mod engine;
pub mod factory;
pub mod geometry;
pub mod graph;
pub mod hooks;
pub mod node;
pub mod port;
pub mod presentation;
pub mod snapshot;
pub mod watcher;
pub mod widget;

// Re-export core types
pub use display::DisplayState;
pub use engine::{NodeVariant, PropertiesNode};
pub use factory::{DataType, NodeCategory, NodeFactory, NodeMetadata, NodeRegistry, PortDefinition};
pub use geometry::{GeometryPolicy, GeometrySync, MeasuredRegion, SizingConfig};
pub use graph::{NodeGraph, SharedNode};
pub use hooks::{HostContext, NodeLifecycleHooks};
pub use node::{Node, NodeId};
pub use port::{Port, PortId, PortType};
pub use presentation::FormatVisibilityTable;
pub use snapshot::NodeSnapshot;
pub use watcher::{ChangeWatcher, CompletionOrder, Observation, ProbeTicket, WatcherState};
pub use widget::{Widget, WidgetKind, WidgetValue};
