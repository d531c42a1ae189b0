use serde::{Deserialize, Serialize};

/// Which side a position at an edit boundary sticks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Assoc {
    /// Stay before content inserted at the position.
    Before,
    /// Move past content inserted at the position.
    #[default]
    After,
}

/// One replaced range: `old_size` units at `start` became `new_size` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedRange {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

/// Result of mapping a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// The position was inside a range that got replaced.
    pub deleted: bool,
}

/// Position map of a single edit. Ranges are sorted and expressed in the
/// coordinates of the document before the edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMap {
    ranges: Vec<MappedRange>,
}

impl StepMap {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn replace(start: usize, old_size: usize, new_size: usize) -> Self {
        if old_size == 0 && new_size == 0 {
            return Self::identity();
        }
        Self {
            ranges: vec![MappedRange {
                start,
                old_size,
                new_size,
            }],
        }
    }

    pub fn is_identity(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut diff: isize = 0;
        for range in &self.ranges {
            if range.start > pos {
                break;
            }
            let end = range.start + range.old_size;
            if pos <= end {
                let side = if range.old_size == 0 {
                    assoc
                } else if pos == range.start {
                    Assoc::Before
                } else if pos == end {
                    Assoc::After
                } else {
                    assoc
                };
                let base = offset(range.start, diff);
                let mapped = match side {
                    Assoc::Before => base,
                    Assoc::After => base + range.new_size,
                };
                return MapResult {
                    pos: mapped,
                    deleted: pos > range.start && pos < end,
                };
            }
            diff += range.new_size as isize - range.old_size as isize;
        }
        MapResult {
            pos: offset(pos, diff),
            deleted: false,
        }
    }
}

fn offset(pos: usize, diff: isize) -> usize {
    pos.saturating_add_signed(diff)
}

/// A sequence of step maps, one per applied edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// The maps from index `from` onwards.
    pub fn slice(&self, from: usize) -> Mapping {
        Mapping {
            maps: self.maps.get(from..).map(<[StepMap]>::to_vec).unwrap_or_default(),
        }
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        self.maps.iter().fold(
            MapResult {
                pos,
                deleted: false,
            },
            |acc, map| {
                let next = map.map_result(acc.pos, assoc);
                MapResult {
                    pos: next.pos,
                    deleted: acc.deleted || next.deleted,
                }
            },
        )
    }
}

impl FromIterator<StepMap> for Mapping {
    fn from_iter<I: IntoIterator<Item = StepMap>>(iter: I) -> Self {
        Self {
            maps: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_leaves_positions() {
        let map = StepMap::identity();
        assert_eq!(map.map(5, Assoc::After), 5);
        assert!(StepMap::replace(3, 0, 0).is_identity());
    }

    #[test]
    fn insertion_shifts_following_positions() {
        let map = StepMap::replace(4, 0, 3);
        assert_eq!(map.map(2, Assoc::After), 2);
        assert_eq!(map.map(4, Assoc::Before), 4);
        assert_eq!(map.map(4, Assoc::After), 7);
        assert_eq!(map.map(9, Assoc::After), 12);
    }

    #[test]
    fn deletion_collapses_inner_positions() {
        let map = StepMap::replace(2, 4, 0);
        assert_eq!(
            map.map_result(4, Assoc::After),
            MapResult {
                pos: 2,
                deleted: true
            }
        );
        assert_eq!(map.map(2, Assoc::After), 2);
        assert_eq!(map.map(6, Assoc::Before), 2);
        assert_eq!(map.map(10, Assoc::After), 6);
    }

    #[test]
    fn replacement_boundaries_stick_outward() {
        // 3 units at 5 replaced with 1 unit
        let map = StepMap::replace(5, 3, 1);
        assert_eq!(map.map(5, Assoc::After), 5);
        assert_eq!(map.map(8, Assoc::Before), 6);
        assert_eq!(map.map(7, Assoc::After), 6);
        assert_eq!(map.map(7, Assoc::Before), 5);
    }

    #[test]
    fn mapping_composes_in_order() {
        let mapping: Mapping = [StepMap::replace(0, 0, 2), StepMap::replace(5, 1, 0)]
            .into_iter()
            .collect();
        // 4 -> 6 after the insert; 6 is the end of the deleted range 5..6
        assert_eq!(mapping.map(4, Assoc::After), 5);
        assert_eq!(mapping.map(1, Assoc::After), 3);
        assert_eq!(mapping.slice(1).map(4, Assoc::After), 4);
        assert!(!mapping.map_result(3, Assoc::After).deleted);
    }
}
