use serde::{Deserialize, Serialize};

use crate::editing::Selection;
use crate::model::Document;
use crate::schema::NodeKind;

/// Separator placed between blocks when extracting selected text.
pub const DEFAULT_BLOCK_SEPARATOR: &str = " ";

/// Why a selection cannot be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    Empty,
    CrossBlock,
    NotText,
    Whitespace,
    OutOfBounds,
}

impl InvalidReason {
    pub fn as_str(self) -> &'static str {
        match self {
            InvalidReason::Empty => "empty selection",
            InvalidReason::CrossBlock => "selection must be within a single block",
            InvalidReason::NotText => "selection must be text",
            InvalidReason::Whitespace => "selected text is empty whitespace",
            InvalidReason::OutOfBounds => "selection is outside the document",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selection that passed every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidSelection {
    pub block_kind: NodeKind,
    pub text: String,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SelectionInfo {
    Valid(ValidSelection),
    Invalid { reason: InvalidReason },
}

impl SelectionInfo {
    pub fn is_valid(&self) -> bool {
        matches!(self, SelectionInfo::Valid(_))
    }

    pub fn valid(&self) -> Option<&ValidSelection> {
        match self {
            SelectionInfo::Valid(valid) => Some(valid),
            SelectionInfo::Invalid { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            SelectionInfo::Valid(_) => None,
            SelectionInfo::Invalid { reason } => Some(*reason),
        }
    }

    fn invalid(reason: InvalidReason) -> Self {
        SelectionInfo::Invalid { reason }
    }
}

/// Decide whether `selection` can be sent for a rewrite.
///
/// Checks run in order and stop at the first failure: non-empty, both ends
/// in the same parent, parent is a text-bearing block, selected text is not
/// just whitespace.
pub fn get_selection_info(doc: &Document, selection: Selection) -> SelectionInfo {
    get_selection_info_with_separator(doc, selection, DEFAULT_BLOCK_SEPARATOR)
}

pub fn get_selection_info_with_separator(
    doc: &Document,
    selection: Selection,
    block_separator: &str,
) -> SelectionInfo {
    let (from, to) = (selection.from(), selection.to());
    if from == to {
        return SelectionInfo::invalid(InvalidReason::Empty);
    }

    let (Ok(start), Ok(end)) = (doc.resolve(from), doc.resolve(to)) else {
        return SelectionInfo::invalid(InvalidReason::OutOfBounds);
    };
    if !start.same_parent(&end) {
        return SelectionInfo::invalid(InvalidReason::CrossBlock);
    }

    let block_kind = start.parent_kind();
    if !block_kind.is_textblock() {
        return SelectionInfo::invalid(InvalidReason::NotText);
    }

    let Ok(text) = doc.text_between(from, to, block_separator) else {
        return SelectionInfo::invalid(InvalidReason::OutOfBounds);
    };
    if text.trim().is_empty() {
        return SelectionInfo::invalid(InvalidReason::Whitespace);
    }

    SelectionInfo::Valid(ValidSelection {
        block_kind,
        text,
        from,
        to,
    })
}
