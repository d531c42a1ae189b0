use crate::model::{Document, Mark, Node};
use crate::schema::NodeKind;

/// Canonical markup for a document.
///
/// Marks nest in rank order, outermost first, and a mark shared by
/// neighbouring leaves stays open across them.
pub fn to_markup(doc: &Document) -> String {
    let mut out = String::new();
    for block in doc.blocks() {
        write_block(&mut out, block);
    }
    out
}

/// A standalone HTML page around the markup of `doc`.
pub fn to_html_page(doc: &Document) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"><title>Document</title></head><body>{}</body></html>",
        to_markup(doc)
    )
}

fn write_block(out: &mut String, block: &Node) {
    let tag = match block.kind() {
        NodeKind::Heading => format!("h{}", block.level().unwrap_or(1)),
        _ => "p".to_string(),
    };
    out.push('<');
    out.push_str(&tag);
    out.push('>');

    let mut open: Vec<&Mark> = Vec::new();
    for leaf in block.content() {
        let marks = leaf.marks().as_slice();
        let shared = open
            .iter()
            .zip(marks)
            .take_while(|(a, b)| **a == *b)
            .count();
        while open.len() > shared {
            if let Some(mark) = open.pop() {
                close_mark(out, mark);
            }
        }
        for mark in &marks[shared..] {
            open_mark(out, mark);
            open.push(mark);
        }
        out.push_str(&html_escape::encode_text(leaf.leaf_text()));
    }
    while let Some(mark) = open.pop() {
        close_mark(out, mark);
    }

    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

fn open_mark(out: &mut String, mark: &Mark) {
    match mark {
        Mark::Comment => out.push_str("<span class=\"comment\">"),
        Mark::Strong => out.push_str("<strong>"),
        Mark::Emphasis => out.push_str("<em>"),
        Mark::Underline => out.push_str("<u>"),
        Mark::Link { href } => {
            out.push_str("<a href=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(href));
            out.push_str("\">");
        }
        Mark::Inserted => out.push_str("<span class=\"insert\">"),
        Mark::Deleted => out.push_str("<span class=\"delete\">"),
    }
}

fn close_mark(out: &mut String, mark: &Mark) {
    out.push_str(match mark {
        Mark::Strong => "</strong>",
        Mark::Emphasis => "</em>",
        Mark::Underline => "</u>",
        Mark::Link { .. } => "</a>",
        Mark::Comment | Mark::Inserted | Mark::Deleted => "</span>",
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_markup;
    use crate::model::MarkSet;
    use insta::assert_snapshot;

    fn marks(list: &[Mark]) -> MarkSet {
        list.iter().cloned().collect()
    }

    #[test]
    fn serializes_blocks() {
        let doc = Document::from_blocks(vec![
            Node::heading(2, vec![Node::text("Title")]),
            Node::paragraph(vec![Node::text("a < b & c")]),
            Node::paragraph(vec![]),
        ])
        .unwrap();
        assert_snapshot!(to_markup(&doc), @"<h2>Title</h2><p>a &lt; b &amp; c</p><p></p>");
    }

    #[test]
    fn shared_marks_stay_open() {
        let doc = Document::from_blocks(vec![Node::paragraph(vec![
            Node::marked_text("bold ", marks(&[Mark::Strong])),
            Node::marked_text("both", marks(&[Mark::Strong, Mark::Emphasis])),
            Node::text(" plain"),
        ])])
        .unwrap();
        assert_snapshot!(to_markup(&doc), @"<p><strong>bold <em>both</em></strong> plain</p>");
    }

    #[test]
    fn tracked_change_markup() {
        let doc = Document::from_blocks(vec![Node::paragraph(vec![
            Node::marked_text("old", marks(&[Mark::Deleted])),
            Node::marked_text("new", marks(&[Mark::Inserted])),
            Node::marked_text("link", marks(&[Mark::link("https://x.test/?q=\"1\"")])),
        ])])
        .unwrap();
        assert_snapshot!(
            to_markup(&doc),
            @r#"<p><span class="delete">old</span><span class="insert">new</span><a href="https://x.test/?q=&quot;1&quot;">link</a></p>"#
        );
    }

    #[test]
    fn html_page_wraps_markup() {
        let doc = parse_markup("<p>Hi</p>").unwrap();
        assert_snapshot!(
            to_html_page(&doc),
            @r#"<!DOCTYPE html><html><head><meta charset="UTF-8"><title>Document</title></head><body><p>Hi</p></body></html>"#
        );
    }

    #[test]
    fn markup_parses_back_to_the_same_document() {
        let source = r#"<h1>Title</h1><p>This <u>is</u> <span class="comment"><strong>very</strong></span> <em>good</em>.</p>"#;
        let doc = parse_markup(source).unwrap();
        assert_eq!(to_markup(&doc), source);
        assert_eq!(parse_markup(&to_markup(&doc)).unwrap(), doc);
    }
}
