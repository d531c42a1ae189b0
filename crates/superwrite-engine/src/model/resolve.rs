use thiserror::Error;

use crate::model::Node;
use crate::schema::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("position {pos} is outside the document (content size {size})")]
    OutOfRange { pos: usize, size: usize },
}

/// A document position resolved against the tree.
///
/// The parent is found by descending from the root, so there are no
/// parent pointers anywhere; two positions share a parent exactly when
/// their index paths are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPos<'a> {
    pos: usize,
    /// Child indices from the root down to the parent.
    path: Vec<usize>,
    parent: &'a Node,
    /// Absolute position where the parent's content starts.
    start: usize,
}

impl<'a> ResolvedPos<'a> {
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Depth of the parent: 0 for the root.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn parent(&self) -> &'a Node {
        self.parent
    }

    pub fn parent_kind(&self) -> NodeKind {
        self.parent.kind()
    }

    /// Offset of this position within the parent's content.
    pub fn parent_offset(&self) -> usize {
        self.pos - self.start
    }

    /// Absolute position of the start of the parent's content.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Absolute position of the end of the parent's content.
    pub fn end(&self) -> usize {
        self.start + self.parent.content_size()
    }

    pub fn same_parent(&self, other: &ResolvedPos<'_>) -> bool {
        self.path == other.path
    }
}

/// Resolve `pos` relative to the content of `root`.
///
/// Descends into a child only when `pos` lies strictly inside it, so a
/// position on a block boundary belongs to the block's parent.
pub fn resolve(root: &Node, pos: usize) -> Result<ResolvedPos<'_>, PositionError> {
    let size = root.content_size();
    if pos > size {
        return Err(PositionError::OutOfRange { pos, size });
    }

    let mut parent = root;
    let mut start = 0;
    let mut path = Vec::new();

    loop {
        let offset = pos - start;
        let Some((index, child_start)) = child_at(parent, offset) else {
            break;
        };
        let child = &parent.content()[index];
        if child.is_text() || offset == child_start {
            break;
        }
        path.push(index);
        start += child_start + 1;
        parent = child;
    }

    Ok(ResolvedPos {
        pos,
        path,
        parent,
        start,
    })
}

/// Index and content offset of the first child ending after `offset`.
pub(crate) fn child_at(node: &Node, offset: usize) -> Option<(usize, usize)> {
    let mut pos = 0;
    for (index, child) in node.content().iter().enumerate() {
        let end = pos + child.node_size();
        if end > offset {
            return Some((index, pos));
        }
        pos = end;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc() -> Node {
        // 0 <h1> 1 Title 6 </h1> 7 <p> 8 Body 12 </p> 13
        Node::doc(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::paragraph(vec![Node::text("Body")]),
        ])
    }

    #[test]
    fn boundaries_resolve_to_root() {
        let root = doc();
        for pos in [0, 7, 13] {
            let r = resolve(&root, pos).unwrap();
            assert_eq!(r.depth(), 0, "pos {pos}");
            assert_eq!(r.parent_kind(), NodeKind::Doc);
            assert_eq!(r.parent_offset(), pos);
        }
    }

    #[test]
    fn inside_blocks_resolve_to_block() {
        let root = doc();
        let r = resolve(&root, 3).unwrap();
        assert_eq!(r.parent_kind(), NodeKind::Heading);
        assert_eq!(r.path(), &[0]);
        assert_eq!(r.parent_offset(), 2);

        let start = resolve(&root, 8).unwrap();
        let end = resolve(&root, 12).unwrap();
        assert_eq!(start.parent_kind(), NodeKind::Paragraph);
        assert_eq!(start.parent_offset(), 0);
        assert_eq!(end.parent_offset(), 4);
        assert!(start.same_parent(&end));
        assert!(!start.same_parent(&r));
        assert_eq!((start.start(), start.end()), (8, 12));
    }

    #[test]
    fn empty_block_has_an_inside() {
        let root = Node::doc(vec![Node::paragraph(vec![])]);
        let r = resolve(&root, 1).unwrap();
        assert_eq!(r.parent_kind(), NodeKind::Paragraph);
        assert_eq!(r.parent_offset(), 0);
    }

    #[test]
    fn out_of_range() {
        assert_eq!(
            resolve(&doc(), 14).unwrap_err(),
            PositionError::OutOfRange { pos: 14, size: 13 }
        );
    }
}
