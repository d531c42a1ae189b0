use serde::{Deserialize, Serialize};

/// Mark variants without their attributes.
///
/// Declaration order is the mark rank: mark sets are kept sorted by it and
/// markup nests marks in this order (outermost first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    Comment,
    Strong,
    Emphasis,
    Underline,
    Link,
    Inserted,
    Deleted,
}

impl MarkKind {
    pub fn name(self) -> &'static str {
        match self {
            MarkKind::Comment => "comment",
            MarkKind::Strong => "strong",
            MarkKind::Emphasis => "emphasis",
            MarkKind::Underline => "underline",
            MarkKind::Link => "link",
            MarkKind::Inserted => "inserted",
            MarkKind::Deleted => "deleted",
        }
    }

    /// Change-tracking marks, as opposed to formatting.
    pub fn is_tracking(self) -> bool {
        matches!(self, MarkKind::Inserted | MarkKind::Deleted)
    }
}

/// An annotation on a text leaf. Equality is by variant and attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
    Comment,
    Strong,
    Emphasis,
    Underline,
    Link { href: String },
    Inserted,
    Deleted,
}

impl Mark {
    pub fn link(href: impl Into<String>) -> Self {
        Mark::Link { href: href.into() }
    }

    pub fn kind(&self) -> MarkKind {
        match self {
            Mark::Comment => MarkKind::Comment,
            Mark::Strong => MarkKind::Strong,
            Mark::Emphasis => MarkKind::Emphasis,
            Mark::Underline => MarkKind::Underline,
            Mark::Link { .. } => MarkKind::Link,
            Mark::Inserted => MarkKind::Inserted,
            Mark::Deleted => MarkKind::Deleted,
        }
    }
}

/// Set of marks on a text leaf: at most one mark per [`MarkKind`], sorted
/// by rank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Copy of this set with `mark` added. A mark of the same kind is
    /// replaced, so a link with a new href overrides the old one.
    pub fn with(&self, mark: Mark) -> Self {
        let mut marks = self.0.clone();
        match marks.binary_search_by_key(&mark.kind(), Mark::kind) {
            Ok(index) => marks[index] = mark,
            Err(index) => marks.insert(index, mark),
        }
        Self(marks)
    }

    pub fn without(&self, kind: MarkKind) -> Self {
        Self(self.0.iter().filter(|m| m.kind() != kind).cloned().collect())
    }

    pub fn contains(&self, kind: MarkKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn get(&self, kind: MarkKind) -> Option<&Mark> {
        self.0.iter().find(|m| m.kind() == kind)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mark> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Mark] {
        &self.0
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        iter.into_iter()
            .fold(MarkSet::new(), |set, mark| set.with(mark))
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        marks.into_iter().collect()
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.0
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
