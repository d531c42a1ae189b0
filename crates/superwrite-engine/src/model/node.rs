use serde::{Deserialize, Serialize};

use crate::model::{Mark, MarkKind, MarkSet};
use crate::schema::{self, NodeKind};

/// Kind-specific node attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAttrs {
    /// Heading level. Unset means the schema default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

impl NodeAttrs {
    pub fn is_empty(&self) -> bool {
        self.level.is_none()
    }
}

/// An element of the document tree.
///
/// Nodes are values: nothing hands out `&mut` access, and every edit builds
/// new nodes along the edited path (see [`Node::with_content`]). Whether a
/// node is *valid* is the schema's call ([`schema::validate_node`]); the
/// constructors here only build shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    kind: NodeKind,
    #[serde(default, skip_serializing_if = "NodeAttrs::is_empty")]
    attrs: NodeAttrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    content: Vec<Node>,
    #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
    marks: MarkSet,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    text: String,
}

impl Node {
    pub fn doc(blocks: Vec<Node>) -> Self {
        Self::container(NodeKind::Doc, NodeAttrs::default(), blocks)
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        Self::container(NodeKind::Paragraph, NodeAttrs::default(), content)
    }

    pub fn heading(level: u8, content: Vec<Node>) -> Self {
        Self::container(NodeKind::Heading, NodeAttrs { level: Some(level) }, content)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::marked_text(text, MarkSet::new())
    }

    pub fn marked_text(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            kind: NodeKind::Text,
            attrs: NodeAttrs::default(),
            content: Vec::new(),
            marks,
            text: text.into(),
        }
    }

    fn container(kind: NodeKind, attrs: NodeAttrs, content: Vec<Node>) -> Self {
        Self {
            kind,
            attrs,
            content,
            marks: MarkSet::new(),
            text: String::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn attrs(&self) -> &NodeAttrs {
        &self.attrs
    }

    /// Heading level with the schema default applied. `None` for non-headings.
    pub fn level(&self) -> Option<u8> {
        match self.kind {
            NodeKind::Heading => Some(
                self.attrs
                    .level
                    .unwrap_or_else(schema::default_heading_level),
            ),
            _ => None,
        }
    }

    pub fn content(&self) -> &[Node] {
        &self.content
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    pub fn has_mark(&self, kind: MarkKind) -> bool {
        self.marks.contains(kind)
    }

    /// The string of a text leaf; empty for every other kind.
    pub fn leaf_text(&self) -> &str {
        &self.text
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    pub fn is_textblock(&self) -> bool {
        self.kind.is_textblock()
    }

    /// Concatenated text of every leaf below this node, without separators.
    pub fn text_content(&self) -> String {
        if self.is_text() {
            return self.text.clone();
        }
        self.content.iter().map(Node::text_content).collect()
    }

    /// Size in the position space: one unit per character for text, the
    /// content plus an opening and a closing boundary for everything else.
    pub fn node_size(&self) -> usize {
        if self.is_text() {
            self.text.chars().count()
        } else {
            self.content_size() + 2
        }
    }

    pub fn content_size(&self) -> usize {
        self.content.iter().map(Node::node_size).sum()
    }

    /// Same node with different children.
    pub fn with_content(&self, content: Vec<Node>) -> Self {
        Self {
            kind: self.kind,
            attrs: self.attrs,
            content,
            marks: self.marks.clone(),
            text: self.text.clone(),
        }
    }

    /// Same text leaf with a different mark set.
    pub fn with_marks(&self, marks: MarkSet) -> Self {
        Self {
            marks,
            ..self.clone()
        }
    }

    pub fn with_mark(&self, mark: Mark) -> Self {
        self.with_marks(self.marks.with(mark))
    }

    /// Characters `from..to` of a text leaf, keeping its marks.
    pub fn cut_text(&self, from: usize, to: usize) -> Self {
        Self::marked_text(slice_chars(&self.text, from, to), self.marks.clone())
    }

    /// Whether two text leaves can be joined into one.
    pub fn same_markup(&self, other: &Node) -> bool {
        self.is_text() && other.is_text() && self.marks == other.marks
    }

    /// Children covering content offsets `from..to`, splitting text leaves
    /// and cutting into containers at the ends.
    pub fn cut_content(&self, from: usize, to: usize) -> Vec<Node> {
        let mut out = Vec::new();
        let mut pos = 0;
        for child in &self.content {
            let size = child.node_size();
            let end = pos + size;
            if end > from && pos < to {
                if child.is_text() {
                    let start = from.saturating_sub(pos);
                    let stop = (to - pos).min(size);
                    out.push(child.cut_text(start, stop));
                } else if pos >= from && end <= to {
                    out.push(child.clone());
                } else {
                    let inner_from = from.saturating_sub(pos + 1);
                    let inner_to = to.saturating_sub(pos + 1).min(child.content_size());
                    out.push(child.with_content(child.cut_content(inner_from, inner_to)));
                }
            }
            pos = end;
        }
        normalize_inline(out)
    }
}

/// Drop empty text leaves and join neighbours with equal marks.
pub(crate) fn normalize_inline(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if node.is_text() && node.text.is_empty() {
            continue;
        }
        if let Some(last) = out.last_mut()
            && last.same_markup(&node)
        {
            last.text.push_str(&node.text);
            continue;
        }
        out.push(node);
    }
    out
}

/// Bring a subtree into canonical form: inline content normalized at every
/// level.
pub(crate) fn normalize(node: &Node) -> Node {
    if node.is_text() {
        return node.clone();
    }
    let content = node.content.iter().map(normalize).collect();
    node.with_content(normalize_inline(content))
}

/// Slice a string by character offsets. Offsets past the end clamp.
pub(crate) fn slice_chars(s: &str, from: usize, to: usize) -> &str {
    let byte_at = |index: usize| {
        s.char_indices()
            .nth(index)
            .map_or(s.len(), |(byte, _)| byte)
    };
    let start = byte_at(from);
    let end = byte_at(to.max(from));
    &s[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sizes_count_characters_and_boundaries() {
        let p = Node::paragraph(vec![Node::text("héllo"), Node::text("!")]);
        assert_eq!(Node::text("héllo").node_size(), 5);
        assert_eq!(p.content_size(), 6);
        assert_eq!(p.node_size(), 8);
        assert_eq!(Node::paragraph(vec![]).node_size(), 2);
    }

    #[test]
    fn slice_chars_handles_multibyte() {
        assert_eq!(slice_chars("naïve café", 2, 5), "ïve");
        assert_eq!(slice_chars("abc", 1, 10), "bc");
        assert_eq!(slice_chars("abc", 3, 3), "");
    }

    #[test]
    fn heading_level_default() {
        let mut heading = Node::heading(2, vec![]);
        assert_eq!(heading.level(), Some(2));
        heading.attrs.level = None;
        assert_eq!(heading.level(), Some(1));
        assert_eq!(Node::paragraph(vec![]).level(), None);
    }

    #[test]
    fn normalize_joins_equal_marks() {
        let bold = MarkSet::from_iter([Mark::Strong]);
        let merged = normalize_inline(vec![
            Node::text("a"),
            Node::text("b"),
            Node::text(""),
            Node::marked_text("c", bold.clone()),
            Node::marked_text("d", bold.clone()),
        ]);
        assert_eq!(
            merged,
            vec![Node::text("ab"), Node::marked_text("cd", bold)]
        );
    }

    #[test]
    fn cut_content_splits_text() {
        let p = Node::paragraph(vec![
            Node::text("Hello "),
            Node::marked_text("world", MarkSet::from_iter([Mark::Emphasis])),
        ]);
        let cut = p.cut_content(3, 8);
        assert_eq!(
            cut,
            vec![
                Node::text("lo "),
                Node::marked_text("wo", MarkSet::from_iter([Mark::Emphasis])),
            ]
        );
    }

    #[test]
    fn text_content_concatenates_leaves() {
        let doc = Node::doc(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::paragraph(vec![Node::text("Body")]),
        ]);
        assert_eq!(doc.text_content(), "TitleBody");
    }
}
