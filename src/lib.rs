//! Nodle image properties
//!
//! Derived image metrics (dimensions, megapixels, aspect ratio, nearest
//! standard ratio, tensor footprint) for graph editor nodes, kept in sync
//! with node geometry and persisted node state.

pub mod config;
pub mod constants;
pub mod error;
pub mod host;
pub mod metrics;
pub mod nodes;
pub mod persistence;
pub mod probe;
pub mod runtime;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use host::{ExecutionMessage, OverlayController, RedrawSink};
pub use metrics::{ImageDimensions, MetricsResult};
pub use nodes::{NodeGraph, NodeRegistry, PropertiesNode};
pub use probe::{ImageProbe, ImageReference, ProbeError};
pub use runtime::{HostServices, WatchRuntime, WatchTrigger, WatcherHandle};
