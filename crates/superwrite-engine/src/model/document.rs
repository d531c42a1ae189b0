use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::editing::{Patch, Selection, Transaction, TransactionError};
use crate::model::node::normalize;
use crate::model::resolve::{PositionError, ResolvedPos, resolve};
use crate::model::{MarkKind, Node};
use crate::schema::{self, NodeKind, SchemaError};

/// A version of the document: the root node plus a version counter.
///
/// A `Document` never changes after construction. Applying a transaction
/// returns the next version and leaves this one as it was, which is what
/// lets readers hold on to an `Arc<Document>` while edits go on.
///
/// Deserializing goes through [`Document::new`], so a stored document is
/// normalized and checked against the schema like any other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredDocument")]
pub struct Document {
    root: Node,
    version: u64,
}

#[derive(Deserialize)]
struct StoredDocument {
    root: Node,
    #[serde(default)]
    version: u64,
}

impl TryFrom<StoredDocument> for Document {
    type Error = SchemaError;

    fn try_from(stored: StoredDocument) -> Result<Self, Self::Error> {
        let mut doc = Document::new(stored.root)?;
        doc.version = stored.version;
        Ok(doc)
    }
}

impl Document {
    /// Build a document from a root node, checking it against the schema.
    ///
    /// The tree is normalized first, so adjacent text leaves with equal
    /// marks end up as one leaf.
    pub fn new(root: Node) -> Result<Self, SchemaError> {
        let root = normalize(&root);
        if root.kind() != NodeKind::Doc {
            return Err(SchemaError::InvalidContent {
                kind: NodeKind::Doc,
                found: vec![root.kind()],
            });
        }
        schema::validate_node(&root)?;
        Ok(Self { root, version: 0 })
    }

    pub fn from_blocks(blocks: Vec<Node>) -> Result<Self, SchemaError> {
        Self::new(Node::doc(blocks))
    }

    /// A document holding a single empty paragraph.
    pub fn create_empty() -> Self {
        Self {
            root: Node::doc(vec![Node::paragraph(vec![])]),
            version: 0,
        }
    }

    /// Next version with a new root. Only the transaction engine calls this,
    /// after it has checked the root.
    pub(crate) fn next_version(&self, root: Node) -> Self {
        Self {
            root,
            version: self.version + 1,
        }
    }

    /// Same version with a different root, for derived views such as the
    /// clean export.
    pub(crate) fn derive(&self, root: Node) -> Self {
        Self {
            root,
            version: self.version,
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn blocks(&self) -> &[Node] {
        self.root.content()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Largest valid position.
    pub fn content_size(&self) -> usize {
        self.root.content_size()
    }

    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos<'_>, PositionError> {
        resolve(&self.root, pos)
    }

    pub(crate) fn check_range(&self, from: usize, to: usize) -> Result<(), PositionError> {
        let size = self.content_size();
        for pos in [from, to] {
            if pos > size {
                return Err(PositionError::OutOfRange { pos, size });
            }
        }
        Ok(())
    }

    /// Call `f` for every node overlapping `from..to` with its absolute
    /// start position. Returning `false` skips the node's children.
    pub fn nodes_between<F>(&self, from: usize, to: usize, mut f: F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        visit_between(&self.root, 0, from, to, &mut f);
    }

    /// Text of the leaves in `from..to`, with `block_separator` inserted
    /// between text-bearing blocks.
    pub fn text_between(
        &self,
        from: usize,
        to: usize,
        block_separator: &str,
    ) -> Result<String, PositionError> {
        self.check_range(from, to)?;
        let mut text = String::new();
        let mut first = true;
        self.nodes_between(from, to, |node, pos| {
            if node.is_textblock() {
                if first {
                    first = false;
                } else {
                    text.push_str(block_separator);
                }
            } else if node.is_text() {
                let start = from.saturating_sub(pos);
                let end = (to - pos).min(node.node_size());
                text.push_str(crate::model::node::slice_chars(node.leaf_text(), start, end));
            }
            true
        });
        Ok(text)
    }

    /// All text of the document, blocks joined by `block_separator`.
    pub fn text_content(&self, block_separator: &str) -> String {
        self.text_between(0, self.content_size(), block_separator)
            .unwrap_or_default()
    }

    /// Whether any text in `from..to` carries a mark of `kind`.
    pub fn range_has_mark(&self, from: usize, to: usize, kind: MarkKind) -> bool {
        let mut found = false;
        self.nodes_between(from, to, |node, _| {
            if node.is_text() && node.has_mark(kind) {
                found = true;
            }
            !found
        });
        found
    }

    /// Ranges of text carrying a mark of `kind`, adjacent runs merged.
    pub fn mark_ranges(&self, kind: MarkKind) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = Vec::new();
        self.nodes_between(0, self.content_size(), |node, pos| {
            if node.is_text() && node.has_mark(kind) {
                let end = pos + node.node_size();
                match ranges.last_mut() {
                    Some(last) if last.end == pos => last.end = end,
                    _ => ranges.push(pos..end),
                }
            }
            true
        });
        ranges
    }

    /// Position range of the first occurrence of `needle` inside a single
    /// text-bearing block.
    pub fn find_text(&self, needle: &str) -> Option<Range<usize>> {
        if needle.is_empty() {
            return None;
        }
        let mut pos = 0;
        for block in self.blocks() {
            let text = block.text_content();
            if let Some(byte) = text.find(needle) {
                let start = pos + 1 + text[..byte].chars().count();
                return Some(start..start + needle.chars().count());
            }
            pos += block.node_size();
        }
        None
    }

    /// Apply a transaction, producing the next version.
    ///
    /// See [`crate::editing::transaction::apply`].
    pub fn apply(
        &self,
        selection: Selection,
        transaction: &Transaction,
    ) -> Result<(Document, Patch), TransactionError> {
        crate::editing::transaction::apply(self, selection, transaction)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::create_empty()
    }
}

fn visit_between<F>(node: &Node, content_start: usize, from: usize, to: usize, f: &mut F)
where
    F: FnMut(&Node, usize) -> bool,
{
    let mut pos = content_start;
    for child in node.content() {
        if pos >= to {
            break;
        }
        let end = pos + child.node_size();
        if end > from && f(child, pos) && !child.is_text() {
            visit_between(child, pos + 1, from, to, f);
        }
        pos = end;
    }
}
