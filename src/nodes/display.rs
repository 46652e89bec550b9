//! Display lines shown inside a node

/// Persisted field name for the display lines in a node snapshot
pub const DISPLAY_FIELD: &str = "imageParamsText";

/// The text lines a node currently shows.
///
/// `None` until something has computed or restored lines; a node in that
/// state renders nothing and its measured region has zero height.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    lines: Option<Vec<String>>,
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the lines; returns whether anything changed
    pub fn set(&mut self, lines: Vec<String>) -> bool {
        if self.lines.as_ref() == Some(&lines) {
            return false;
        }
        self.lines = Some(lines);
        true
    }

    pub fn is_set(&self) -> bool {
        self.lines.is_some()
    }

    /// Current lines, empty when unset
    pub fn lines(&self) -> &[String] {
        self.lines.as_deref().unwrap_or(&[])
    }

    /// Value to write under [`DISPLAY_FIELD`]
    pub fn serialize(&self) -> Option<Vec<String>> {
        self.lines.clone()
    }

    /// Restore from a snapshot; an absent field leaves the state untouched
    pub fn restore(&mut self, saved: Option<&[String]>) -> bool {
        match saved {
            Some(lines) => self.set(lines.to_vec()),
            None => false,
        }
    }
}
