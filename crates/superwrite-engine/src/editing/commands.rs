use serde::{Deserialize, Serialize};

use crate::editing::{Selection, Transaction};
use crate::model::{Document, Mark, Node};

/// Block formats offered by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    Heading { level: u8 },
}

impl BlockType {
    fn of(block: &Node) -> Option<Self> {
        match (block.is_textblock(), block.level()) {
            (true, Some(level)) => Some(BlockType::Heading { level }),
            (true, None) => Some(BlockType::Paragraph),
            (false, _) => None,
        }
    }

    fn build(self, content: Vec<Node>) -> Node {
        match self {
            BlockType::Paragraph => Node::paragraph(content),
            BlockType::Heading { level } => Node::heading(level, content),
        }
    }
}

/// Add `mark` to `from..to`, or remove its kind if any text in the range
/// already carries it. `None` for an empty range.
pub fn toggle_mark(doc: &Document, from: usize, to: usize, mark: Mark) -> Option<Transaction> {
    if from >= to {
        return None;
    }
    let kind = mark.kind();
    let tx = if doc.range_has_mark(from, to, kind) {
        Transaction::new().remove_mark(from, to, kind)
    } else {
        Transaction::new().add_mark(from, to, mark)
    };
    Some(tx.with_meta(format!("toggle {}", kind.name())))
}

/// Turn every textblock touched by `selection` into `block_type`.
///
/// Blocks are replaced whole at the root, keeping their content, so sizes
/// and positions do not move and the selection is set back as it was.
/// `None` when every touched block already has the type.
pub fn set_block_type(
    doc: &Document,
    selection: Selection,
    block_type: BlockType,
) -> Option<Transaction> {
    let (from, to) = (selection.from(), selection.to());
    let mut tx = Transaction::new();
    let mut pos = 0;
    for block in doc.blocks() {
        let end = pos + block.node_size();
        let touched = pos < to.max(from + 1) && end > from;
        if touched
            && let Some(current) = BlockType::of(block)
            && current != block_type
        {
            let replacement = block_type.build(block.content().to_vec());
            tx = tx.replace_range(pos, end, vec![replacement]);
        }
        pos = end;
    }
    if tx.is_empty() {
        return None;
    }
    Some(
        tx.set_selection(selection.anchor, selection.head)
            .with_meta("set block type"),
    )
}
