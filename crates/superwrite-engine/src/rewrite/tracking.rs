use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editing::{Patch, Selection, Transaction, TransactionError};
use crate::model::{Document, Mark, MarkKind, MarkSet, Node};
use crate::rewrite::ValidSelection;

/// How a rewrite lands in the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteMode {
    /// Keep the original flagged as deleted and add the rewrite flagged as
    /// inserted, for review.
    #[default]
    Tracked,
    /// Overwrite the original.
    Replace,
}

impl RewriteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RewriteMode::Tracked => "tracked",
            RewriteMode::Replace => "replace",
        }
    }
}

impl std::fmt::Display for RewriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rewrite mode `{0}` (expected tracked or replace)")]
pub struct UnknownMode(pub String);

impl FromStr for RewriteMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tracked" => Ok(RewriteMode::Tracked),
            "replace" => Ok(RewriteMode::Replace),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

/// Transaction that lands `rewritten` over `from..to`, or `None` when the
/// text did not change.
pub fn rewrite_transaction(
    from: usize,
    to: usize,
    original: &str,
    rewritten: &str,
    mode: RewriteMode,
) -> Option<Transaction> {
    if rewritten == original {
        return None;
    }
    let tx = match mode {
        RewriteMode::Tracked => {
            let tx = Transaction::new().add_mark(from, to, Mark::Deleted);
            if rewritten.is_empty() {
                tx
            } else {
                tx.insert(
                    to,
                    vec![Node::marked_text(rewritten, MarkSet::from_iter([Mark::Inserted]))],
                )
            }
        }
        RewriteMode::Replace if rewritten.is_empty() => Transaction::new().delete(from, to),
        RewriteMode::Replace => {
            Transaction::new().replace_range(from, to, vec![Node::text(rewritten)])
        }
    };
    Some(tx.with_meta(format!("rewrite:{mode}")))
}

/// Apply a rewrite of a validated selection as a tracked change.
///
/// Returns `None` when `rewritten` equals the selected text; nothing is
/// dispatched in that case.
pub fn apply_change_tracking(
    doc: &Document,
    selection: &ValidSelection,
    rewritten: &str,
) -> Result<Option<(Document, Patch)>, TransactionError> {
    apply_rewrite(doc, selection, rewritten, RewriteMode::Tracked)
}

pub fn apply_rewrite(
    doc: &Document,
    selection: &ValidSelection,
    rewritten: &str,
    mode: RewriteMode,
) -> Result<Option<(Document, Patch)>, TransactionError> {
    let Some(tx) = rewrite_transaction(
        selection.from,
        selection.to,
        &selection.text,
        rewritten,
        mode,
    ) else {
        return Ok(None);
    };
    let current = Selection::new(selection.from, selection.to);
    doc.apply(current, &tx).map(Some)
}

/// Transaction that keeps every tracked rewrite: deleted text goes away and
/// inserted text loses its flag. `None` when there is nothing to resolve.
pub fn accept_all_transaction(doc: &Document) -> Option<Transaction> {
    resolve_all(doc, MarkKind::Deleted, MarkKind::Inserted, "accept_all")
}

/// Transaction that undoes every tracked rewrite.
pub fn reject_all_transaction(doc: &Document) -> Option<Transaction> {
    resolve_all(doc, MarkKind::Inserted, MarkKind::Deleted, "reject_all")
}

fn resolve_all(
    doc: &Document,
    drop: MarkKind,
    keep: MarkKind,
    label: &str,
) -> Option<Transaction> {
    let doomed = doc.mark_ranges(drop);
    let flagged = doc.mark_ranges(keep);
    if doomed.is_empty() && flagged.is_empty() {
        return None;
    }
    let mut tx = Transaction::new();
    for range in flagged {
        tx = tx.remove_mark(range.start, range.end, keep);
    }
    // back to front so earlier ranges stay valid
    for range in doomed.into_iter().rev() {
        tx = tx.delete(range.start, range.end);
    }
    Some(tx.with_meta(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::get_selection_info;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        Document::from_blocks(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::paragraph(vec![Node::text("This is very good.")]),
        ])
        .unwrap()
    }

    fn select(doc: &Document, from: usize, to: usize) -> ValidSelection {
        get_selection_info(doc, Selection::new(from, to))
            .valid()
            .cloned()
            .unwrap()
    }

    fn marks(kinds: &[Mark]) -> MarkSet {
        kinds.iter().cloned().collect()
    }

    #[test]
    fn unchanged_text_dispatches_nothing() {
        let doc = sample();
        let sel = select(&doc, 16, 25);
        assert_eq!(apply_change_tracking(&doc, &sel, "very good").unwrap(), None);
        assert!(rewrite_transaction(1, 2, "x", "x", RewriteMode::Replace).is_none());
    }

    #[test]
    fn tracked_rewrite_keeps_original_flagged() {
        let doc = sample();
        let sel = select(&doc, 16, 25);
        let (next, patch) = apply_change_tracking(&doc, &sel, "great").unwrap().unwrap();
        assert_eq!(
            next.blocks()[1].content(),
            &[
                Node::text("This is "),
                Node::marked_text("very good", marks(&[Mark::Deleted])),
                Node::marked_text("great", marks(&[Mark::Inserted])),
                Node::text("."),
            ]
        );
        assert_eq!(patch.new_selection, Selection::caret(30));
        assert_eq!(next.version(), 1);
    }

    #[test]
    fn tracked_rewrite_to_nothing_only_flags() {
        let doc = sample();
        let sel = select(&doc, 16, 21);
        let (next, _) = apply_change_tracking(&doc, &sel, "").unwrap().unwrap();
        assert_eq!(next.mark_ranges(MarkKind::Deleted), vec![16..21]);
        assert!(next.mark_ranges(MarkKind::Inserted).is_empty());
    }

    #[test]
    fn replace_mode_overwrites() {
        let doc = sample();
        let sel = select(&doc, 16, 25);
        let (next, _) = apply_rewrite(&doc, &sel, "fine", RewriteMode::Replace)
            .unwrap()
            .unwrap();
        assert_eq!(next.blocks()[1].content(), &[Node::text("This is fine.")]);
    }

    #[test]
    fn tracked_rewrite_keeps_other_marks_on_original() {
        let doc = Document::from_blocks(vec![Node::paragraph(vec![Node::marked_text(
            "bold words",
            marks(&[Mark::Strong]),
        )])])
        .unwrap();
        let sel = select(&doc, 1, 11);
        let (next, _) = apply_change_tracking(&doc, &sel, "strong").unwrap().unwrap();
        assert_eq!(
            next.blocks()[0].content()[0].marks(),
            &marks(&[Mark::Strong, Mark::Deleted])
        );
    }

    #[test]
    fn accept_and_reject_resolve_changes() {
        let doc = sample();
        let sel = select(&doc, 16, 25);
        let (tracked, _) = apply_change_tracking(&doc, &sel, "great").unwrap().unwrap();

        let accept = accept_all_transaction(&tracked).unwrap();
        let (accepted, _) = tracked.apply(Selection::caret(1), &accept).unwrap();
        assert_eq!(
            accepted.blocks()[1].content(),
            &[Node::text("This is great.")]
        );

        let reject = reject_all_transaction(&tracked).unwrap();
        let (rejected, _) = tracked.apply(Selection::caret(1), &reject).unwrap();
        assert_eq!(rejected.blocks(), doc.blocks());

        assert!(accept_all_transaction(&doc).is_none());
    }

    #[test]
    fn mode_parses() {
        assert_eq!("Replace".parse::<RewriteMode>(), Ok(RewriteMode::Replace));
        assert_eq!(RewriteMode::default(), RewriteMode::Tracked);
        assert!("both".parse::<RewriteMode>().is_err());
    }
}
