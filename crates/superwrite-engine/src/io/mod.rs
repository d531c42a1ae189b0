use std::fs;
use std::path::{Path, PathBuf};

use crate::markup::{MarkupError, parse_markup, to_html_page, to_markup};
use crate::model::{Document, Node};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid markup in {path}: {source}")]
    Markup {
        path: PathBuf,
        #[source]
        source: MarkupError,
    },
}

/// Load a document from disk.
///
/// `.txt` files become one paragraph per non-blank line; anything else is
/// read as markup.
pub fn read_document(path: &Path) -> Result<Document, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(IoError::Io)?;
    if is_plain_text(path) {
        return Ok(document_from_plain_text(&content));
    }
    parse_markup(&content).map_err(|source| IoError::Markup {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the canonical markup of `doc`
pub fn write_markup(path: &Path, doc: &Document) -> Result<(), IoError> {
    write(path, &to_markup(doc))
}

/// Write `doc` as a standalone HTML page
pub fn write_html_page(path: &Path, doc: &Document) -> Result<(), IoError> {
    write(path, &to_html_page(doc))
}

fn write(path: &Path, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }
    fs::write(path, content).map_err(IoError::Io)
}

fn is_plain_text(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

/// One paragraph per non-blank line, text taken literally.
pub fn document_from_plain_text(text: &str) -> Document {
    let blocks: Vec<Node> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Node::paragraph(vec![Node::text(line)]))
        .collect();
    Document::from_blocks(blocks).unwrap_or_default()
}
