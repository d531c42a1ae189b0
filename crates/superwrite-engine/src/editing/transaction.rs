use std::ops::Range;

use thiserror::Error;

use crate::editing::edit::{Edit, EditError, apply_edit};
use crate::editing::mapping::{Assoc, Mapping};
use crate::editing::{Patch, Selection};
use crate::model::{Document, Mark, MarkKind, Node};

/// An ordered list of edits applied as one unit.
///
/// Build it with the consuming methods and hand it to [`Document::apply`]:
///
/// ```rust
/// # use superwrite_engine::editing::{Selection, Transaction};
/// # use superwrite_engine::model::{Document, Mark, Node};
/// let doc = Document::from_blocks(vec![Node::paragraph(vec![Node::text("Hello")])]).unwrap();
/// let tx = Transaction::new()
///     .insert(6, vec![Node::text(" world")])
///     .add_mark(1, 6, Mark::Strong);
/// let (next, patch) = doc.apply(Selection::caret(1), &tx).unwrap();
/// assert_eq!(next.text_content(" "), "Hello world");
/// assert_eq!(patch.version, 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    edits: Vec<Edit>,
    meta: Option<String>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, edit: Edit) -> Self {
        self.edits.push(edit);
        self
    }

    pub fn replace_range(self, from: usize, to: usize, content: Vec<Node>) -> Self {
        self.push(Edit::ReplaceRange { from, to, content })
    }

    pub fn delete(self, from: usize, to: usize) -> Self {
        self.replace_range(from, to, Vec::new())
    }

    pub fn insert(self, pos: usize, content: Vec<Node>) -> Self {
        self.push(Edit::InsertAt { pos, content })
    }

    pub fn add_mark(self, from: usize, to: usize, mark: Mark) -> Self {
        self.push(Edit::AddMark { from, to, mark })
    }

    pub fn remove_mark(self, from: usize, to: usize, kind: MarkKind) -> Self {
        self.push(Edit::RemoveMark { from, to, kind })
    }

    pub fn set_selection(self, anchor: usize, head: usize) -> Self {
        self.push(Edit::SetSelection { anchor, head })
    }

    /// Label shown in logs.
    pub fn with_meta(mut self, label: impl Into<String>) -> Self {
        self.meta = Some(label.into());
        self
    }

    pub fn meta(&self) -> Option<&str> {
        self.meta.as_deref()
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Whether any edit changes the tree rather than just the selection.
    pub fn changes_document(&self) -> bool {
        self.edits
            .iter()
            .any(|edit| !matches!(edit, Edit::SetSelection { .. }))
    }
}

/// A transaction failed; the document is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("edit {index} ({edit}) failed: {source}")]
pub struct TransactionError {
    pub index: usize,
    pub edit: &'static str,
    #[source]
    pub source: EditError,
}

/// Apply `transaction` to `doc`, either completely or not at all.
///
/// Edits run in order, each against the tree the previous one produced.
/// On success the returned document has version `doc.version() + 1` and
/// the patch describes where things moved. The first failing edit aborts
/// the whole transaction.
pub fn apply(
    doc: &Document,
    selection: Selection,
    transaction: &Transaction,
) -> Result<(Document, Patch), TransactionError> {
    let mut root = doc.root().clone();
    let mut mapping = Mapping::new();
    let mut changed: Vec<Range<usize>> = Vec::new();
    // Selections and insertion ends, with the number of maps already
    // applied to them.
    let mut explicit: Option<(Selection, usize)> = None;
    let mut last_insert: Option<(usize, usize)> = None;

    for (index, edit) in transaction.edits().iter().enumerate() {
        let outcome = apply_edit(&root, edit).map_err(|source| TransactionError {
            index,
            edit: edit.name(),
            source,
        })?;

        if !outcome.map.is_identity() {
            for range in &mut changed {
                *range = outcome.map.map(range.start, Assoc::Before)
                    ..outcome.map.map(range.end, Assoc::After);
            }
        }
        if let Some(range) = outcome.changed {
            changed.push(range);
        }

        mapping.push(outcome.map);
        if let Some(sel) = outcome.selection {
            explicit = Some((sel, mapping.len()));
        }
        if let Some(end) = outcome.inserted_end {
            last_insert = Some((end, mapping.len()));
        }
        root = outcome.root;
    }

    let size = root.content_size();
    let new_selection = match (explicit, last_insert) {
        (Some((sel, applied)), _) => sel.map(&mapping.slice(applied)),
        (None, Some((end, applied))) => {
            Selection::caret(mapping.slice(applied).map(end, Assoc::After))
        }
        (None, None) => selection.map(&mapping),
    };
    let new_selection = Selection::new(
        new_selection.anchor.min(size),
        new_selection.head.min(size),
    );

    let next = doc.next_version(root);
    let patch = Patch {
        version: next.version(),
        changed: merge_ranges(changed),
        new_selection,
        mapping,
    };

    log::debug!(
        "applied {} edit(s){} -> version {}, {} changed range(s)",
        transaction.edits().len(),
        transaction
            .meta()
            .map(|label| format!(" [{label}]"))
            .unwrap_or_default(),
        patch.version,
        patch.changed.len()
    );

    Ok((next, patch))
}

fn merge_ranges(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|range| (range.start, range.end));
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MarkSet;
    use crate::schema::SchemaError;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        Document::from_blocks(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::paragraph(vec![Node::text("This is very good.")]),
        ])
        .unwrap()
    }

    #[test]
    fn version_increments_and_old_document_is_untouched() {
        let doc = sample();
        let tx = Transaction::new().delete(16, 21);
        let (next, patch) = doc.apply(Selection::caret(8), &tx).unwrap();
        assert_eq!(next.version(), 1);
        assert_eq!(patch.version, 1);
        assert_eq!(next.text_content(" "), "Title This is good.");
        assert_eq!(doc.text_content(" "), "Title This is very good.");
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn failure_is_atomic() {
        let doc = sample();
        let tx = Transaction::new()
            .insert(8, vec![Node::text("Hey. ")])
            .delete(2, 12);
        let err = doc.apply(Selection::caret(1), &tx).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.edit, "replace_range");
        assert_eq!(err.source, EditError::MixedParents { from: 2, to: 12 });
        assert_eq!(doc, sample());
    }

    #[test]
    fn later_edits_see_earlier_results() {
        let doc = sample();
        // insert shifts "very" from 16..20 to 20..24
        let tx = Transaction::new()
            .insert(8, vec![Node::text("Now ")])
            .add_mark(20, 24, Mark::Strong);
        let (next, _) = doc.apply(Selection::caret(1), &tx).unwrap();
        assert_eq!(
            next.blocks()[1].content(),
            &[
                Node::text("Now This is "),
                Node::marked_text("very", MarkSet::from_iter([Mark::Strong])),
                Node::text(" good."),
            ]
        );
    }

    #[test]
    fn selection_collapses_after_last_insert() {
        let doc = sample();
        let tx = Transaction::new()
            .insert(8, vec![Node::text("A ")])
            .insert(28, vec![Node::text("!")])
            .insert(1, vec![Node::text("The ")]);
        let (next, patch) = doc.apply(Selection::new(16, 25), &tx).unwrap();
        assert_eq!(next.text_content("|"), "The Title|A This is very good.!");
        assert_eq!(patch.new_selection, Selection::caret(5));
    }

    #[test]
    fn explicit_selection_is_mapped_through_later_edits() {
        let doc = sample();
        let tx = Transaction::new()
            .set_selection(16, 25)
            .insert(8, vec![Node::text("So ")]);
        let (_, patch) = doc.apply(Selection::caret(1), &tx).unwrap();
        assert_eq!(patch.new_selection, Selection::new(19, 28));
    }

    #[test]
    fn previous_selection_is_mapped_without_inserts() {
        let doc = sample();
        let tx = Transaction::new().delete(8, 16);
        let (_, patch) = doc.apply(Selection::new(16, 25), &tx).unwrap();
        assert_eq!(patch.new_selection, Selection::new(8, 17));
    }

    #[test]
    fn changed_ranges_follow_later_edits() {
        let doc = sample();
        let tx = Transaction::new()
            .add_mark(16, 20, Mark::Emphasis)
            .insert(8, vec![Node::text("Oh ")])
            .insert(1, vec![Node::text("A ")]);
        let (_, patch) = doc.apply(Selection::caret(1), &tx).unwrap();
        assert_eq!(patch.changed, vec![1..3, 10..13, 21..25]);
    }

    #[test]
    fn invalid_content_is_rejected_with_schema_error() {
        let doc = sample();
        let tx = Transaction::new().insert(3, vec![Node::heading(2, vec![])]);
        let err = doc.apply(Selection::caret(1), &tx).unwrap_err();
        assert!(matches!(
            err.source,
            EditError::Schema(SchemaError::InvalidContent { .. })
        ));
    }

    #[test]
    fn empty_transaction_still_bumps_version() {
        let doc = sample();
        let (next, patch) = doc.apply(Selection::new(2, 4), &Transaction::new()).unwrap();
        assert_eq!(next.version(), 1);
        assert!(patch.changed.is_empty());
        assert_eq!(patch.new_selection, Selection::new(2, 4));
    }

    #[test]
    fn merge_ranges_joins_overlaps() {
        assert_eq!(merge_ranges(vec![5..8, 1..3, 2..4, 8..9]), vec![1..4, 5..9]);
    }
}
