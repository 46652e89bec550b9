//! Image metric computation - ratio classification, derived metrics and display lines

pub mod analysis;
pub mod metadata;
pub mod ratio;

pub use analysis::{AnalysisOutputs, ImageAnalysis, ImageDimensions, MetricsResult, PropertiesMode};
pub use metadata::GenerationMetadata;
pub use ratio::{gcd, nearest_standard_ratio, StandardRatio, STANDARD_RATIOS};
