use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editing::Selection;
use crate::editing::mapping::StepMap;
use crate::model::node::{normalize, normalize_inline};
use crate::model::{Mark, MarkKind, MarkSet, Node, PositionError, resolve};
use crate::schema::{self, NodeKind, SchemaError};

/// A structural edit. Positions refer to the document as left by the
/// previous edit of the same transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    /// Replace `from..to` with `content`; empty content deletes.
    ReplaceRange {
        from: usize,
        to: usize,
        content: Vec<Node>,
    },
    InsertAt {
        pos: usize,
        content: Vec<Node>,
    },
    /// Add `mark` to every text leaf overlapping `from..to`, splitting
    /// leaves at the range ends.
    AddMark {
        from: usize,
        to: usize,
        mark: Mark,
    },
    RemoveMark {
        from: usize,
        to: usize,
        kind: MarkKind,
    },
    SetSelection {
        anchor: usize,
        head: usize,
    },
}

impl Edit {
    pub fn name(&self) -> &'static str {
        match self {
            Edit::ReplaceRange { .. } => "replace_range",
            Edit::InsertAt { .. } => "insert_at",
            Edit::AddMark { .. } => "add_mark",
            Edit::RemoveMark { .. } => "remove_mark",
            Edit::SetSelection { .. } => "set_selection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Position(#[from] PositionError),

    #[error("range {from}..{to} is inverted")]
    InvertedRange { from: usize, to: usize },

    #[error("range {from}..{to} spans more than one parent node")]
    MixedParents { from: usize, to: usize },

    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),
}

/// What applying one edit produced.
#[derive(Debug, Clone)]
pub(crate) struct EditOutcome {
    pub root: Node,
    pub map: StepMap,
    /// Range touched by the edit, in the coordinates after it.
    pub changed: Option<std::ops::Range<usize>>,
    /// End of inserted content, in the coordinates after the edit.
    pub inserted_end: Option<usize>,
    pub selection: Option<Selection>,
}

impl EditOutcome {
    fn unchanged(root: &Node) -> Self {
        Self {
            root: root.clone(),
            map: StepMap::identity(),
            changed: None,
            inserted_end: None,
            selection: None,
        }
    }
}

/// Apply one edit to a document root.
pub(crate) fn apply_edit(root: &Node, edit: &Edit) -> Result<EditOutcome, EditError> {
    match edit {
        Edit::ReplaceRange { from, to, content } => replace(root, *from, *to, content),
        Edit::InsertAt { pos, content } => replace(root, *pos, *pos, content),
        Edit::AddMark { from, to, mark } => {
            schema::check_mark(mark)?;
            let mark = mark.clone();
            update_marks(root, *from, *to, &|marks| marks.with(mark.clone()))
        }
        Edit::RemoveMark { from, to, kind } => {
            update_marks(root, *from, *to, &|marks| marks.without(*kind))
        }
        Edit::SetSelection { anchor, head } => {
            check_positions(root, *anchor, *head)?;
            Ok(EditOutcome {
                selection: Some(Selection::new(*anchor, *head)),
                ..EditOutcome::unchanged(root)
            })
        }
    }
}

fn check_positions(root: &Node, a: usize, b: usize) -> Result<(), PositionError> {
    let size = root.content_size();
    match [a, b].into_iter().find(|pos| *pos > size) {
        Some(pos) => Err(PositionError::OutOfRange { pos, size }),
        None => Ok(()),
    }
}

fn check_range(root: &Node, from: usize, to: usize) -> Result<(), EditError> {
    if from > to {
        return Err(EditError::InvertedRange { from, to });
    }
    check_positions(root, from, to)?;
    Ok(())
}

fn replace(root: &Node, from: usize, to: usize, content: &[Node]) -> Result<EditOutcome, EditError> {
    check_range(root, from, to)?;
    let start = resolve(root, from)?;
    let end = resolve(root, to)?;
    if !start.same_parent(&end) {
        return Err(EditError::MixedParents { from, to });
    }

    for node in content {
        schema::validate_node(node)?;
    }

    let parent = start.parent();
    let mut children = parent.cut_content(0, start.parent_offset());
    children.extend(content.iter().map(normalize));
    children.extend(parent.cut_content(end.parent_offset(), parent.content_size()));
    let children = normalize_inline(children);

    let kinds: Vec<NodeKind> = children.iter().map(Node::kind).collect();
    schema::check_content(parent.kind(), &kinds)?;
    if !parent.kind().allows_marks() && children.iter().any(|c| !c.marks().is_empty()) {
        return Err(SchemaError::MarksNotAllowed {
            kind: parent.kind(),
        }
        .into());
    }

    let inserted: usize = content.iter().map(Node::node_size).sum();
    let new_parent = parent.with_content(children);
    Ok(EditOutcome {
        root: replace_at_path(root, start.path(), new_parent),
        map: StepMap::replace(from, to - from, inserted),
        changed: Some(from..from + inserted),
        inserted_end: (inserted > 0).then_some(from + inserted),
        selection: None,
    })
}

/// Rebuild the ancestors along `path` around a replacement node.
fn replace_at_path(node: &Node, path: &[usize], replacement: Node) -> Node {
    let Some((&index, rest)) = path.split_first() else {
        return replacement;
    };
    let mut children = node.content().to_vec();
    children[index] = replace_at_path(&children[index], rest, replacement);
    node.with_content(children)
}

fn update_marks(
    root: &Node,
    from: usize,
    to: usize,
    update: &dyn Fn(&MarkSet) -> MarkSet,
) -> Result<EditOutcome, EditError> {
    check_range(root, from, to)?;
    if from == to {
        return Ok(EditOutcome::unchanged(root));
    }
    Ok(EditOutcome {
        root: map_text_in_range(root, from, to, update),
        map: StepMap::identity(),
        changed: Some(from..to),
        inserted_end: None,
        selection: None,
    })
}

/// Rewrite the marks of text overlapping `from..to`, given in `node`'s
/// content coordinates.
fn map_text_in_range(
    node: &Node,
    from: usize,
    to: usize,
    update: &dyn Fn(&MarkSet) -> MarkSet,
) -> Node {
    let mut out = Vec::with_capacity(node.child_count());
    let mut pos = 0;
    for child in node.content() {
        let size = child.node_size();
        let end = pos + size;
        if end <= from || pos >= to {
            out.push(child.clone());
        } else if child.is_text() {
            let start = from.saturating_sub(pos);
            let stop = (to - pos).min(size);
            out.push(child.cut_text(0, start));
            let middle = child.cut_text(start, stop);
            out.push(middle.with_marks(update(middle.marks())));
            out.push(child.cut_text(stop, size));
        } else {
            let inner_from = from.saturating_sub(pos + 1);
            let inner_to = to.saturating_sub(pos + 1).min(child.content_size());
            out.push(map_text_in_range(child, inner_from, inner_to, update));
        }
        pos = end;
    }
    node.with_content(normalize_inline(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn root() -> Node {
        Node::doc(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::paragraph(vec![Node::text("This is very good.")]),
        ])
    }

    #[test]
    fn insert_text_inside_paragraph() {
        let out = apply_edit(
            &root(),
            &Edit::InsertAt {
                pos: 16,
                content: vec![Node::text("not ")],
            },
        )
        .unwrap();
        assert_eq!(out.root.content()[1].text_content(), "This is not very good.");
        assert_eq!(out.inserted_end, Some(20));
        assert_eq!(out.changed, Some(16..20));
    }

    #[test]
    fn replace_joins_text_with_equal_marks() {
        let out = apply_edit(
            &root(),
            &Edit::ReplaceRange {
                from: 16,
                to: 25,
                content: vec![Node::text("fine")],
            },
        )
        .unwrap();
        assert_eq!(out.root.content()[1].content(), &[Node::text("This is fine.")]);
    }

    #[test]
    fn insert_block_at_root() {
        let out = apply_edit(
            &root(),
            &Edit::InsertAt {
                pos: 7,
                content: vec![Node::paragraph(vec![Node::text("New")])],
            },
        )
        .unwrap();
        assert_eq!(out.root.child_count(), 3);
        assert_eq!(out.root.content()[1].text_content(), "New");
    }

    #[test]
    fn block_inside_paragraph_is_rejected() {
        let err = apply_edit(
            &root(),
            &Edit::InsertAt {
                pos: 10,
                content: vec![Node::paragraph(vec![])],
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EditError::Schema(SchemaError::InvalidContent {
                kind: NodeKind::Paragraph,
                ..
            })
        ));
    }

    #[test]
    fn emptying_the_document_is_rejected() {
        let err = apply_edit(
            &root(),
            &Edit::ReplaceRange {
                from: 0,
                to: 27,
                content: vec![],
            },
        )
        .unwrap_err();
        assert!(matches!(err, EditError::Schema(SchemaError::InvalidContent { .. })));
    }

    #[test]
    fn replace_across_blocks_is_rejected() {
        let err = apply_edit(
            &root(),
            &Edit::ReplaceRange {
                from: 3,
                to: 10,
                content: vec![],
            },
        )
        .unwrap_err();
        assert_eq!(err, EditError::MixedParents { from: 3, to: 10 });
    }

    #[test]
    fn add_mark_splits_leaves() {
        let out = apply_edit(
            &root(),
            &Edit::AddMark {
                from: 16,
                to: 20,
                mark: Mark::Strong,
            },
        )
        .unwrap();
        assert_eq!(
            out.root.content()[1].content(),
            &[
                Node::text("This is "),
                Node::marked_text("very", MarkSet::from_iter([Mark::Strong])),
                Node::text(" good."),
            ]
        );
        assert!(out.map.is_identity());
    }

    #[test]
    fn add_mark_spans_blocks() {
        let out = apply_edit(
            &root(),
            &Edit::AddMark {
                from: 0,
                to: 27,
                mark: Mark::Emphasis,
            },
        )
        .unwrap();
        for block in out.root.content() {
            assert!(block.content().iter().all(|t| t.has_mark(MarkKind::Emphasis)));
        }
    }

    #[test]
    fn remove_mark_rejoins_text() {
        let marked = apply_edit(
            &root(),
            &Edit::AddMark {
                from: 16,
                to: 20,
                mark: Mark::Strong,
            },
        )
        .unwrap()
        .root;
        let out = apply_edit(
            &marked,
            &Edit::RemoveMark {
                from: 8,
                to: 26,
                kind: MarkKind::Strong,
            },
        )
        .unwrap();
        assert_eq!(out.root, root());
    }

    #[test]
    fn empty_href_is_rejected() {
        let err = apply_edit(
            &root(),
            &Edit::AddMark {
                from: 8,
                to: 12,
                mark: Mark::link(""),
            },
        )
        .unwrap_err();
        assert_eq!(err, EditError::Schema(SchemaError::EmptyHref));
    }

    #[test]
    fn positions_are_checked() {
        let err = apply_edit(
            &root(),
            &Edit::SetSelection {
                anchor: 0,
                head: 28,
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            EditError::Position(PositionError::OutOfRange { pos: 28, size: 27 })
        );
        assert!(matches!(
            apply_edit(
                &root(),
                &Edit::RemoveMark {
                    from: 9,
                    to: 8,
                    kind: MarkKind::Strong
                }
            ),
            Err(EditError::InvertedRange { .. })
        ));
    }
}
