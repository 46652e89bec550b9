//! Format-dependent widget visibility and host overlay control

use super::node::Node;
use crate::host::OverlayController;
use log::debug;
use once_cell::sync::Lazy;
use std::collections::BTreeSet;

pub const PNG: &str = "PNG (lossless, larger files)";
pub const JPEG: &str = "JPEG (lossy, smaller files)";
pub const WEBP: &str = "WEBP (modern, good compression)";
pub const BMP: &str = "BMP (uncompressed, largest)";
pub const TIFF: &str = "TIFF (flexible, lossless, limited support)";

/// Format labels offered by the save node, in menu order
pub const SAVE_FORMATS: [&str; 5] = [PNG, JPEG, WEBP, BMP, TIFF];

/// Controls relevant to each save format
pub static SAVE_IMAGE_FORMATS: Lazy<FormatVisibilityTable> = Lazy::new(|| {
    FormatVisibilityTable::new()
        .with_format(PNG, &["png_compress_level"])
        .with_format(JPEG, &["jpeg_quality", "jpeg_optimize", "jpeg_subsampling"])
        .with_format(WEBP, &["webp_quality", "webp_method", "webp_lossless"])
        .with_format(BMP, &[])
        .with_format(TIFF, &["tiff_compression", "tiff_jpeg_quality"])
});

/// Maps a format choice to the widgets that apply to it.
///
/// Every widget named anywhere in the table is a format-specific control;
/// all other widgets are never touched by visibility updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatVisibilityTable {
    entries: Vec<(String, Vec<String>)>,
}

impl FormatVisibilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: &str, controls: &[&str]) -> Self {
        self.entries.push((
            format.to_string(),
            controls.iter().map(|c| c.to_string()).collect(),
        ));
        self
    }

    /// Controls shown for `format`; an unknown format shows none
    pub fn active_controls(&self, format: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(name, _)| name == format)
            .map(|(_, controls)| controls.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_format_control(&self, widget: &str) -> bool {
        self.entries
            .iter()
            .any(|(_, controls)| controls.iter().any(|c| c == widget))
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

/// Show only the controls for `format`, then refit the height.
///
/// Width is preserved. Returns the format controls left visible; applying
/// the same format twice yields the same set and the same size.
pub fn apply_format_visibility(
    node: &mut Node,
    table: &FormatVisibilityTable,
    format: &str,
    region_height: f32,
) -> BTreeSet<String> {
    let active = table.active_controls(format);
    let mut visible = BTreeSet::new();

    for widget in node.widgets.iter_mut() {
        if !table.is_format_control(&widget.name) {
            continue;
        }
        widget.hidden = !active.contains(&widget.name);
        if !widget.hidden {
            visible.insert(widget.name.clone());
        }
    }

    node.size.y = node.compute_size(region_height).y;
    debug!(
        "Node {} format '{}' shows {:?}",
        node.id, format, visible
    );
    visible
}

/// Hide the host's own caption overlay so it doesn't duplicate the display lines
pub fn hide_host_overlay(overlay: &dyn OverlayController, selector: &str) -> usize {
    let hidden = overlay.hide(selector);
    if hidden > 0 {
        debug!("Hid {} host caption element(s)", hidden);
    }
    hidden
}
