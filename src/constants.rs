//! Application-wide constants and default values
//!
//! Centralized location for all hard-coded values to improve maintainability

/// Change detection constants
pub mod watch {
    /// Default poll cadence for the watched image slot (milliseconds)
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
}

/// Image retrieval constants
pub mod probe {
    /// Largest response body the HTTP probe reads (bytes)
    pub const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;
}

/// Well-known widget names
pub mod widget {
    /// Combo holding the current image reference on the load node
    pub const IMAGE: &str = "image";

    /// Combo selecting the output format on the save node
    pub const FORMAT: &str = "format";

    /// Combo selecting which property groups the save node reports
    pub const PROPERTIES: &str = "Properties";

    /// Read-only region that renders the display lines
    pub const DISPLAY: &str = "display_info";
}

/// Metric computation constants
pub mod metrics {
    /// Maximum distance between the decimal aspect and a table entry for a label to apply
    pub const STANDARD_RATIO_TOLERANCE: f64 = 0.05;

    /// Channels assumed by the tensor footprint estimate
    pub const TENSOR_CHANNELS: u64 = 3;

    /// Bytes per element assumed by the tensor footprint estimate (float32)
    pub const TENSOR_BYTES_PER_ELEMENT: u64 = 4;

    /// Pixels per megapixel
    pub const PIXELS_PER_MEGAPIXEL: f64 = 1_000_000.0;

    /// Bytes per megabyte for the footprint estimate
    pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

    /// Placeholder for metadata that could not be found
    pub const NOT_AVAILABLE: &str = "N/A";
}

/// Node geometry constants
pub mod node {
    /// Minimum width applied when most property nodes are created
    pub const DEFAULT_MIN_WIDTH: f32 = 300.0;

    /// Minimum width applied when the save node is created
    pub const SAVE_MIN_WIDTH: f32 = 410.0;

    /// Height reserved for the text block by the grow-only policy
    pub const TEXT_BLOCK_HEIGHT: f32 = 65.0;

    /// Smallest height the grow-only policy will produce
    pub const FLOOR_HEIGHT: f32 = 250.0;

    /// Height of one rendered display line
    pub const LINE_HEIGHT: f32 = 18.0;

    /// Vertical padding around the measured display region
    pub const REGION_PADDING: f32 = 10.0;

    /// Title bar height
    pub const TITLE_HEIGHT: f32 = 30.0;

    /// Height of one input/output slot row
    pub const SLOT_HEIGHT: f32 = 20.0;

    /// Height of a standard widget
    pub const WIDGET_HEIGHT: f32 = 20.0;

    /// Spacing below each visible widget
    pub const WIDGET_SPACING: f32 = 4.0;

    /// Padding below the last widget
    pub const BOTTOM_PADDING: f32 = 8.0;

    /// Default size of a freshly created node
    pub const DEFAULT_SIZE: [f32; 2] = [150.0, 30.0];
}

/// Host presentation constants
pub mod overlay {
    /// Selector matching the host-rendered dimension captions under image previews
    pub const CAPTION_SELECTOR: &str =
        ".comfy-img-preview .caption, .p-viewer-caption, [class*=\"caption\"]";
}

/// Persistence constants
pub mod document {
    /// Current workflow document version
    pub const VERSION: &str = "1.0";

    /// Creator string written into saved documents
    pub const CREATOR: &str = "Nōdle Image Properties 0.1";
}
