//! Derived image metrics and their display lines

use super::metadata::GenerationMetadata;
use super::ratio::{
    aspect_ratio, estimated_tensor_size_mb, megapixels, nearest_standard_ratio, round2,
    simplify_ratio,
};
use crate::host::ExecutionMessage;
use serde::{Deserialize, Serialize};

/// Natural pixel size of an image. Both sides are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageDimensions {
    width: u32,
    height: u32,
}

impl ImageDimensions {
    /// Returns `None` when either side is zero
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Metrics derived from one set of dimensions. Recomputed wholesale, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsResult {
    pub dimensions: ImageDimensions,
    /// Megapixels, rounded to 2 decimals
    pub resolution_megapixels: f64,
    /// `(width / g, height / g)` with `g = gcd(width, height)`
    pub simplified_ratio: (u64, u64),
    /// `width / height`, rounded to 2 decimals
    pub decimal_aspect: f64,
    pub nearest_standard_ratio: Option<&'static str>,
    /// Per-image float32 RGB footprint in MB, rounded to 2 decimals
    pub estimated_tensor_size_mb: f64,
}

impl MetricsResult {
    pub fn compute(dimensions: ImageDimensions) -> Self {
        let (width, height) = (dimensions.width, dimensions.height);
        Self {
            dimensions,
            resolution_megapixels: round2(megapixels(width, height)),
            simplified_ratio: simplify_ratio(width, height),
            decimal_aspect: round2(aspect_ratio(width, height)),
            nearest_standard_ratio: nearest_standard_ratio(width, height),
            estimated_tensor_size_mb: round2(estimated_tensor_size_mb(width, height)),
        }
    }

    /// `1920x1080 | 2.07MP`
    pub fn dimensions_line(&self) -> String {
        format!(
            "{}x{} | {:.2}MP",
            self.dimensions.width, self.dimensions.height, self.resolution_megapixels
        )
    }

    /// `Ratio: 16:9 or 1.78:1`, with ` or ~label` when a differing standard label applies
    pub fn ratio_line(&self) -> String {
        let (wr, hr) = self.simplified_ratio;
        let simplified = format!("{}:{}", wr, hr);
        match self.nearest_standard_ratio {
            Some(label) if label != simplified => format!(
                "Ratio: {} or {:.2}:1 or ~{}",
                simplified, self.decimal_aspect, label
            ),
            _ => format!("Ratio: {} or {:.2}:1", simplified, self.decimal_aspect),
        }
    }

    /// Footprint line; a batch reports the total across all images
    pub fn footprint_line(&self, batch_size: u32) -> String {
        if batch_size > 1 {
            let per_image =
                estimated_tensor_size_mb(self.dimensions.width, self.dimensions.height);
            format!(
                "Batch: {} images | Total Tensor: {:.2}MB",
                batch_size,
                round2(per_image * f64::from(batch_size))
            )
        } else {
            format!("Tensor Size: {:.2}MB", self.estimated_tensor_size_mb)
        }
    }

    /// The three display lines for a single image
    pub fn display_lines(&self) -> Vec<String> {
        self.display_lines_for_batch(1)
    }

    pub fn display_lines_for_batch(&self, batch_size: u32) -> Vec<String> {
        vec![
            self.dimensions_line(),
            self.ratio_line(),
            self.footprint_line(batch_size),
        ]
    }
}

/// Which groups of lines a server-side analysis delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertiesMode {
    /// Hides all information
    None,
    /// Resolution, aspect ratio and size
    Basic,
    /// Model, seed, steps, CFG, sampler, scheduler
    Metadata,
    /// Everything, separated by an empty line
    #[default]
    Both,
}

impl std::str::FromStr for PropertiesMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "basic" => Ok(Self::Basic),
            "metadata" => Ok(Self::Metadata),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown properties mode: {}", other)),
        }
    }
}

/// Numeric outputs a server-side analysis hands downstream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutputs {
    pub batch_count: u32,
    pub width: u32,
    pub height: u32,
    pub width_ratio: f64,
    pub height_ratio: f64,
    /// Unrounded megapixels
    pub resolution_mp: f64,
}

/// Analysis of an image tensor `[batch, height, width, channels]`, the upstream
/// counterpart of the client-side probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAnalysis {
    pub batch_size: u32,
    pub channels: u32,
    pub metrics: MetricsResult,
}

impl ImageAnalysis {
    /// `None` for an empty batch or a zero-sized image
    pub fn from_shape(batch_size: u32, height: u32, width: u32, channels: u32) -> Option<Self> {
        if batch_size == 0 {
            return None;
        }
        let dimensions = ImageDimensions::new(width, height)?;
        Some(Self {
            batch_size,
            channels,
            metrics: MetricsResult::compute(dimensions),
        })
    }

    pub fn outputs(&self) -> AnalysisOutputs {
        let (wr, hr) = self.metrics.simplified_ratio;
        let dims = self.metrics.dimensions;
        AnalysisOutputs {
            batch_count: self.batch_size,
            width: dims.width,
            height: dims.height,
            width_ratio: wr as f64,
            height_ratio: hr as f64,
            resolution_mp: megapixels(dims.width, dims.height),
        }
    }

    /// Lines selected by `mode`; metadata defaults to `N/A` entries when absent
    pub fn display_lines(
        &self,
        mode: PropertiesMode,
        metadata: Option<&GenerationMetadata>,
    ) -> Vec<String> {
        let basic = || self.metrics.display_lines_for_batch(self.batch_size);
        let meta = || {
            metadata
                .cloned()
                .unwrap_or_default()
                .display_lines()
        };

        match mode {
            PropertiesMode::None => Vec::new(),
            PropertiesMode::Basic => basic(),
            PropertiesMode::Metadata => meta(),
            PropertiesMode::Both => {
                let mut lines = basic();
                lines.push(String::new());
                lines.extend(meta());
                lines
            }
        }
    }

    /// Execution result carrying the display lines as its `text` field
    pub fn execution_message(
        &self,
        mode: PropertiesMode,
        metadata: Option<&GenerationMetadata>,
    ) -> ExecutionMessage {
        ExecutionMessage::with_text(self.display_lines(mode, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(width: u32, height: u32) -> MetricsResult {
        MetricsResult::compute(ImageDimensions::new(width, height).unwrap())
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(ImageDimensions::new(0, 10).is_none());
        assert!(ImageDimensions::new(10, 0).is_none());
        assert!(ImageDimensions::new(1, 1).is_some());
    }

    #[test]
    fn test_full_hd_metrics() {
        let m = metrics(1920, 1080);
        assert_eq!(m.resolution_megapixels, 2.07);
        assert_eq!(m.simplified_ratio, (16, 9));
        assert_eq!(m.decimal_aspect, 1.78);
        assert_eq!(m.nearest_standard_ratio, Some("16:9"));
        assert_eq!(m.estimated_tensor_size_mb, 23.73);
    }

    #[test]
    fn test_full_hd_lines_omit_redundant_label() {
        let lines = metrics(1920, 1080).display_lines();
        assert_eq!(
            lines,
            vec![
                "1920x1080 | 2.07MP".to_string(),
                "Ratio: 16:9 or 1.78:1".to_string(),
                "Tensor Size: 23.73MB".to_string(),
            ]
        );
    }

    #[test]
    fn test_square_lines() {
        let m = metrics(1000, 1000);
        assert_eq!(m.resolution_megapixels, 1.0);
        assert_eq!(m.decimal_aspect, 1.0);
        assert_eq!(m.nearest_standard_ratio, Some("1:1"));
        assert_eq!(m.dimensions_line(), "1000x1000 | 1.00MP");
        assert_eq!(m.ratio_line(), "Ratio: 1:1 or 1.00:1");
    }

    #[test]
    fn test_approximate_label_is_appended() {
        // 1366x768 reduces to 683:384 but is close to 16:9
        let m = metrics(1366, 768);
        assert_eq!(m.simplified_ratio, (683, 384));
        assert_eq!(m.ratio_line(), "Ratio: 683:384 or 1.78:1 or ~16:9");
    }

    #[test]
    fn test_unusual_ratio_has_no_label() {
        let m = metrics(700, 313);
        assert_eq!(m.nearest_standard_ratio, None);
        assert_eq!(m.ratio_line(), "Ratio: 700:313 or 2.24:1");
    }

    #[test]
    fn test_batch_footprint_line() {
        let m = metrics(1920, 1080);
        assert_eq!(m.footprint_line(1), "Tensor Size: 23.73MB");
        assert_eq!(m.footprint_line(4), "Batch: 4 images | Total Tensor: 94.92MB");
    }

    #[test]
    fn test_analysis_outputs() {
        let analysis = ImageAnalysis::from_shape(2, 1080, 1920, 3).unwrap();
        let outputs = analysis.outputs();
        assert_eq!(outputs.batch_count, 2);
        assert_eq!(outputs.width, 1920);
        assert_eq!(outputs.height, 1080);
        assert_eq!(outputs.width_ratio, 16.0);
        assert_eq!(outputs.height_ratio, 9.0);
        assert!((outputs.resolution_mp - 2.0736).abs() < 1e-9);
        assert!(ImageAnalysis::from_shape(0, 1080, 1920, 3).is_none());
        assert!(ImageAnalysis::from_shape(1, 0, 1920, 3).is_none());
    }

    #[test]
    fn test_properties_modes() {
        let analysis = ImageAnalysis::from_shape(1, 512, 512, 3).unwrap();
        assert!(analysis.display_lines(PropertiesMode::None, None).is_empty());
        assert_eq!(analysis.display_lines(PropertiesMode::Basic, None).len(), 3);

        let metadata = analysis.display_lines(PropertiesMode::Metadata, None);
        assert_eq!(metadata[0], "Model: N/A");

        let both = analysis.display_lines(PropertiesMode::Both, None);
        assert_eq!(both.len(), 7);
        assert_eq!(both[3], "");
        assert_eq!(both[0], "512x512 | 0.26MP");
    }

    #[test]
    fn test_execution_message_carries_text() {
        let analysis = ImageAnalysis::from_shape(1, 1080, 1920, 3).unwrap();
        let message = analysis.execution_message(PropertiesMode::Basic, None);
        assert_eq!(message.text.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Both".parse::<PropertiesMode>(), Ok(PropertiesMode::Both));
        assert_eq!("basic".parse::<PropertiesMode>(), Ok(PropertiesMode::Basic));
        assert!("verbose".parse::<PropertiesMode>().is_err());
    }
}
