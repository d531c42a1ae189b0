use std::sync::LazyLock;

use regex::Regex;

use crate::markup::MarkupError;
use crate::markup::lexer::{Token, TokenKind, lex};
use crate::model::node::normalize_inline;
use crate::model::{Document, Mark, MarkSet, Node};

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("Invalid attribute regex")
});

/// Elements whose content never reaches the document.
const SKIPPED: &[&str] = &["head", "title", "style", "script", "template"];

/// Elements without content or closing tag.
const VOID: &[&str] = &["br", "hr", "img", "meta", "link", "input", "wbr"];

/// Unknown containers that still separate blocks of loose text.
const BLOCK_BOUNDARIES: &[&str] = &[
    "div",
    "section",
    "article",
    "header",
    "footer",
    "blockquote",
    "li",
    "ul",
    "ol",
    "pre",
    "table",
    "tr",
    "hr",
];

/// Parse markup into a document.
///
/// Only the tags the schema knows produce structure; any other tag is
/// dropped and its text kept. Inline text outside a block is wrapped in a
/// paragraph. Empty input is the empty document.
pub fn parse_markup(input: &str) -> Result<Document, MarkupError> {
    let tokens = lex(input)?;
    let mut parser = Parser::default();
    for token in &tokens {
        parser.token(token);
    }
    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockStart {
    Paragraph,
    Heading(u8),
}

#[derive(Debug)]
struct OpenBlock {
    start: BlockStart,
    content: Vec<Node>,
    /// Opened by a tag rather than by loose text.
    explicit: bool,
}

#[derive(Debug, Default)]
struct Parser {
    blocks: Vec<Node>,
    block: Option<OpenBlock>,
    /// Open inline elements, by tag name, with the mark each one adds.
    inline: Vec<(String, Option<Mark>)>,
    /// Name and nesting depth of a skipped element we are inside of.
    skipping: Option<(String, usize)>,
}

impl Parser {
    fn token(&mut self, token: &Token<'_>) {
        match token.kind {
            TokenKind::Comment | TokenKind::Declaration => {}
            TokenKind::OpenTag => self.open_tag(token.text),
            TokenKind::CloseTag => self.close_tag(token.text),
            TokenKind::Text => {
                if self.skipping.is_none() {
                    self.text(token.text);
                }
            }
        }
    }

    fn open_tag(&mut self, raw: &str) {
        let (name, attrs) = split_tag(raw);
        if let Some((skipped, depth)) = &mut self.skipping {
            if *skipped == name {
                *depth += 1;
            }
            return;
        }
        if SKIPPED.contains(&name.as_str()) {
            if !raw.ends_with("/>") {
                self.skipping = Some((name, 1));
            }
            return;
        }

        if let Some(start) = block_start(&name) {
            self.finish_block();
            self.block = Some(OpenBlock {
                start,
                content: Vec::new(),
                explicit: true,
            });
            return;
        }
        if BLOCK_BOUNDARIES.contains(&name.as_str()) {
            self.finish_block();
            return;
        }
        if name == "br" {
            self.text(" ");
            return;
        }
        if VOID.contains(&name.as_str()) || raw.ends_with("/>") {
            return;
        }
        let mark = tag_mark(&name, &attrs);
        self.inline.push((name, mark));
    }

    fn close_tag(&mut self, raw: &str) {
        let name = tag_name(raw.trim_start_matches("</"));
        if let Some((skipped, depth)) = &mut self.skipping {
            if *skipped == name {
                *depth -= 1;
                if *depth == 0 {
                    self.skipping = None;
                }
            }
            return;
        }
        if block_start(&name).is_some() || BLOCK_BOUNDARIES.contains(&name.as_str()) {
            self.finish_block();
            return;
        }
        if let Some(index) = self.inline.iter().rposition(|(open, _)| *open == name) {
            self.inline.remove(index);
        }
    }

    fn text(&mut self, raw: &str) {
        let mut collapsed = collapse_whitespace(raw);
        let at_line_start = self.block.as_ref().is_none_or(|block| {
            block
                .content
                .last()
                .is_none_or(|last| last.leaf_text().ends_with(' '))
        });
        if at_line_start && collapsed.starts_with(' ') {
            collapsed.remove(0);
        }
        if collapsed.is_empty() {
            return;
        }

        let marks: MarkSet = self
            .inline
            .iter()
            .filter_map(|(_, mark)| mark.clone())
            .collect();
        let text = html_escape::decode_html_entities(&collapsed).into_owned();
        let block = self.block.get_or_insert_with(|| OpenBlock {
            start: BlockStart::Paragraph,
            content: Vec::new(),
            explicit: false,
        });
        block.content.push(Node::marked_text(text, marks));
    }

    fn finish_block(&mut self) {
        let Some(mut block) = self.block.take() else {
            return;
        };
        trim_trailing_space(&mut block.content);
        if !block.explicit && block.content.is_empty() {
            return;
        }
        let content = normalize_inline(block.content);
        self.blocks.push(match block.start {
            BlockStart::Paragraph => Node::paragraph(content),
            BlockStart::Heading(level) => Node::heading(level, content),
        });
    }

    fn finish(mut self) -> Result<Document, MarkupError> {
        self.finish_block();
        if self.blocks.is_empty() {
            return Ok(Document::create_empty());
        }
        Ok(Document::from_blocks(self.blocks)?)
    }
}

fn block_start(name: &str) -> Option<BlockStart> {
    match name {
        "p" => Some(BlockStart::Paragraph),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => name[1..].parse().ok().map(BlockStart::Heading),
        _ => None,
    }
}

fn tag_mark(name: &str, attrs: &[(String, String)]) -> Option<Mark> {
    let attr = |wanted: &str| {
        attrs
            .iter()
            .find(|(key, _)| key == wanted)
            .map(|(_, value)| value.as_str())
    };
    match name {
        "strong" | "b" => Some(Mark::Strong),
        "em" | "i" => Some(Mark::Emphasis),
        "u" => Some(Mark::Underline),
        "a" => attr("href")
            .filter(|href| !href.is_empty())
            .map(|href| Mark::link(html_escape::decode_html_entities(href))),
        "span" => attr("class")?
            .split_ascii_whitespace()
            .find_map(|class| match class {
                "comment" => Some(Mark::Comment),
                "insert" => Some(Mark::Inserted),
                "delete" => Some(Mark::Deleted),
                _ => None,
            }),
        _ => None,
    }
}

fn tag_name(raw: &str) -> String {
    raw.trim_start_matches('<')
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Lowercased tag name and attributes of an opening tag.
fn split_tag(raw: &str) -> (String, Vec<(String, String)>) {
    let name = tag_name(raw);
    let body = raw
        .trim_start_matches('<')
        .get(name.len()..)
        .unwrap_or_default()
        .trim_end_matches('>')
        .trim_end_matches('/');
    let attrs = ATTRIBUTE
        .captures_iter(body)
        .map(|caps| {
            let key = caps[1].to_ascii_lowercase();
            let value = [2, 3, 4]
                .into_iter()
                .find_map(|group| caps.get(group))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (key, value)
        })
        .collect();
    (name, attrs)
}

fn collapse_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn trim_trailing_space(content: &mut Vec<Node>) {
    while let Some(last) = content.last() {
        let text = last.leaf_text();
        if !text.ends_with(' ') {
            break;
        }
        let trimmed = text.trim_end_matches(' ');
        if trimmed.is_empty() {
            content.pop();
        } else {
            let keep = trimmed.chars().count();
            let cut = last.cut_text(0, keep);
            if let Some(slot) = content.last_mut() {
                *slot = cut;
            }
            break;
        }
    }
}
