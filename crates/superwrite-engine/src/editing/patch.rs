use std::ops::Range;

use crate::editing::Selection;
use crate::editing::mapping::Mapping;

/// Result of applying a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub version: u64,
    /// Touched ranges in the coordinates of the new document, sorted and
    /// merged.
    pub changed: Vec<Range<usize>>,
    pub new_selection: Selection,
    pub mapping: Mapping,
}
