use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::editing::mapping::{Assoc, Mapping};

/// A selection as an `(anchor, head)` pair of positions. The anchor stays
/// put while the head moves; `from`/`to` give the normalized range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// An empty selection at `pos`.
    pub fn caret(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    pub fn range(&self) -> Range<usize> {
        self.from()..self.to()
    }

    /// Map both ends through edits.
    pub fn map(&self, mapping: &Mapping) -> Self {
        Self::new(
            mapping.map(self.anchor, Assoc::After),
            mapping.map(self.head, Assoc::After),
        )
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::caret(0)
    }
}

impl From<Range<usize>> for Selection {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::mapping::StepMap;

    #[test]
    fn normalizes_backwards_selection() {
        let sel = Selection::new(9, 4);
        assert_eq!(sel.from(), 4);
        assert_eq!(sel.to(), 9);
        assert_eq!(sel.range(), 4..9);
        assert!(!sel.is_empty());
        assert!(Selection::caret(3).is_empty());
    }

    #[test]
    fn maps_through_insertion_before() {
        let mapping: Mapping = [StepMap::replace(1, 0, 5)].into_iter().collect();
        assert_eq!(Selection::new(2, 4).map(&mapping), Selection::new(7, 9));
    }
}
