//! # Schema
//!
//! The closed set of node kinds and mark kinds, and the constraints a
//! document must satisfy. Every other module asks the schema before it
//! builds a tree; nothing else decides what is valid.
//!
//! ## Content rules
//!
//! | kind        | group  | content    | attributes      |
//! |-------------|--------|------------|-----------------|
//! | `doc`       | -      | `block+`   | -               |
//! | `paragraph` | block  | `inline*`  | -               |
//! | `heading`   | block  | `inline*`  | `level` (1..=6) |
//! | `text`      | inline | leaf       | -               |
//!
//! Marks only ever sit on text leaves. `link` carries a required, non-empty
//! `href`; every other mark is attribute-free.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Mark, Node};

/// Node kinds known to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    Text,
}

/// Grouping used by content expressions (`block+`, `inline*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeGroup {
    Block,
    Inline,
}

/// A content expression: children must all belong to `group`, and there
/// must be at least `at_least` of them. A rule without a group admits no
/// children at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRule {
    pub group: Option<NodeGroup>,
    pub at_least: usize,
}

/// Declaration of a node attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrSpec {
    pub name: &'static str,
    /// Value used when the attribute is not given. `None` means required.
    pub default: Option<u8>,
    pub min: u8,
    pub max: u8,
}

const HEADING_ATTRS: &[AttrSpec] = &[AttrSpec {
    name: "level",
    default: Some(1),
    min: 1,
    max: 6,
}];

impl NodeKind {
    /// Name used in markup, logs and the rewrite service wire format.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::Text => "text",
        }
    }

    pub fn group(self) -> Option<NodeGroup> {
        match self {
            NodeKind::Doc => None,
            NodeKind::Paragraph | NodeKind::Heading => Some(NodeGroup::Block),
            NodeKind::Text => Some(NodeGroup::Inline),
        }
    }

    pub fn content_rule(self) -> ContentRule {
        match self {
            NodeKind::Doc => ContentRule {
                group: Some(NodeGroup::Block),
                at_least: 1,
            },
            NodeKind::Paragraph | NodeKind::Heading => ContentRule {
                group: Some(NodeGroup::Inline),
                at_least: 0,
            },
            NodeKind::Text => ContentRule {
                group: None,
                at_least: 0,
            },
        }
    }

    /// Whether this is a block whose content is inline text.
    pub fn is_textblock(self) -> bool {
        matches!(self, NodeKind::Paragraph | NodeKind::Heading)
    }

    pub fn is_block(self) -> bool {
        self.group() == Some(NodeGroup::Block)
    }

    /// Text children of this kind may carry marks.
    pub fn allows_marks(self) -> bool {
        self.is_textblock()
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("invalid content for {kind}: {found:?}")]
    InvalidContent { kind: NodeKind, found: Vec<NodeKind> },

    #[error("text nodes must not be empty")]
    EmptyText,

    #[error("{kind} cannot carry text")]
    UnexpectedText { kind: NodeKind },

    #[error("attribute `{name}` of {kind} must be within {min}..={max}, got {value}")]
    AttributeOutOfRange {
        kind: NodeKind,
        name: &'static str,
        value: u8,
        min: u8,
        max: u8,
    },

    #[error("{kind} has no attribute `{name}`")]
    UnknownAttribute { kind: NodeKind, name: &'static str },

    #[error("link mark requires a non-empty href")]
    EmptyHref,

    #[error("marks are not allowed on {kind}")]
    MarksNotAllowed { kind: NodeKind },
}

/// Attribute declarations for a node kind.
pub fn attributes_for(kind: NodeKind) -> &'static [AttrSpec] {
    match kind {
        NodeKind::Heading => HEADING_ATTRS,
        NodeKind::Doc | NodeKind::Paragraph | NodeKind::Text => &[],
    }
}

/// Check a sequence of child kinds against the content rule of `kind`.
pub fn validate_content(kind: NodeKind, child_kinds: &[NodeKind]) -> bool {
    let rule = kind.content_rule();
    match rule.group {
        None => child_kinds.is_empty(),
        Some(group) => {
            child_kinds.len() >= rule.at_least
                && child_kinds.iter().all(|child| child.group() == Some(group))
        }
    }
}

/// Like [`validate_content`] but reports what was found.
pub fn check_content(kind: NodeKind, child_kinds: &[NodeKind]) -> Result<(), SchemaError> {
    if validate_content(kind, child_kinds) {
        Ok(())
    } else {
        Err(SchemaError::InvalidContent {
            kind,
            found: child_kinds.to_vec(),
        })
    }
}

/// Validate mark attributes.
pub fn check_mark(mark: &Mark) -> Result<(), SchemaError> {
    match mark {
        Mark::Link { href } if href.is_empty() => Err(SchemaError::EmptyHref),
        _ => Ok(()),
    }
}

fn check_attrs(node: &Node) -> Result<(), SchemaError> {
    let Some(level) = node.attrs().level else {
        return Ok(());
    };
    match attributes_for(node.kind()).iter().find(|spec| spec.name == "level") {
        Some(spec) if (spec.min..=spec.max).contains(&level) => Ok(()),
        Some(spec) => Err(SchemaError::AttributeOutOfRange {
            kind: node.kind(),
            name: spec.name,
            value: level,
            min: spec.min,
            max: spec.max,
        }),
        None => Err(SchemaError::UnknownAttribute {
            kind: node.kind(),
            name: "level",
        }),
    }
}

/// Validate a whole subtree: attributes, marks, text and content rules.
pub fn validate_node(node: &Node) -> Result<(), SchemaError> {
    check_attrs(node)?;

    if node.is_text() {
        if node.leaf_text().is_empty() {
            return Err(SchemaError::EmptyText);
        }
        let kinds: Vec<NodeKind> = node.content().iter().map(Node::kind).collect();
        check_content(NodeKind::Text, &kinds)?;
        for mark in node.marks().iter() {
            check_mark(mark)?;
        }
        return Ok(());
    }

    if !node.leaf_text().is_empty() {
        return Err(SchemaError::UnexpectedText { kind: node.kind() });
    }
    if !node.marks().is_empty() {
        return Err(SchemaError::MarksNotAllowed { kind: node.kind() });
    }

    let kinds: Vec<NodeKind> = node.content().iter().map(Node::kind).collect();
    check_content(node.kind(), &kinds)?;

    for child in node.content() {
        if child.is_text() && !child.marks().is_empty() && !node.kind().allows_marks() {
            return Err(SchemaError::MarksNotAllowed { kind: node.kind() });
        }
        validate_node(child)?;
    }
    Ok(())
}

/// Default heading level when none is given.
pub fn default_heading_level() -> u8 {
    HEADING_ATTRS[0].default.unwrap_or(1)
}
