//! Clean export: the document as it reads once every tracked rewrite is
//! taken.

use crate::model::node::normalize_inline;
use crate::model::{Document, MarkKind, Node};

/// Resolve all tracked changes the way a reader would see them.
///
/// Text marked `deleted` is dropped; `inserted` and `deleted` marks are
/// stripped from what remains. Other marks are kept. A document left
/// without blocks gets one empty paragraph. The result keeps the version
/// of `doc`, and cleaning it again changes nothing.
pub fn clean_document(doc: &Document) -> Document {
    let blocks = match clean_node(doc.root()) {
        Some(root) if root.child_count() > 0 => root.content().to_vec(),
        _ => vec![Node::paragraph(vec![])],
    };
    doc.derive(doc.root().with_content(blocks))
}

fn clean_node(node: &Node) -> Option<Node> {
    if node.is_text() {
        if node.has_mark(MarkKind::Deleted) {
            return None;
        }
        let marks = node
            .marks()
            .iter()
            .filter(|mark| !mark.kind().is_tracking())
            .cloned()
            .collect();
        return Some(node.with_marks(marks));
    }
    let content = node.content().iter().filter_map(clean_node).collect();
    Some(node.with_content(normalize_inline(content)))
}
