//! Drag payloads and the reorder seam.

use indexmap::IndexMap;
use mirror_core::{Mirror, Variant};

/// Data carried by a drag gesture.
///
/// The controller only needs to stamp a format on drag start and check for
/// it later, which is enough to tell its own drags from foreign ones.
pub trait DragPayload {
    fn set_format(&mut self, format: &str);
    fn has_format(&self, format: &str) -> bool;
}

/// In-memory payload keyed by format, shaped after a browser `DataTransfer`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTransfer {
    entries: IndexMap<String, String>,
}

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_data(&mut self, format: impl Into<String>, data: impl Into<String>) {
        self.entries.insert(format.into(), data.into());
    }

    pub fn get_data(&self, format: &str) -> Option<&str> {
        self.entries.get(format).map(String::as_str)
    }

    /// Formats in the order they were first set.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl DragPayload for DataTransfer {
    fn set_format(&mut self, format: &str) {
        self.set_data(format, "");
    }

    fn has_format(&self, format: &str) -> bool {
        self.entries.contains_key(format)
    }
}

/// Target of a completed drop.
pub trait Reorder {
    fn move_item(&self, from: usize, to: usize);
}

impl<F> Reorder for F
where
    F: Fn(usize, usize),
{
    fn move_item(&self, from: usize, to: usize) {
        self(from, to)
    }
}

impl<V: Variant> Reorder for Mirror<V> {
    fn move_item(&self, from: usize, to: usize) {
        Mirror::move_item(self, from, to)
    }
}
