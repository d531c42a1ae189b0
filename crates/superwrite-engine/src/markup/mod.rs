//! # Markup
//!
//! The interchange format of the editor: the small HTML subset the schema
//! can express. Import adapters produce it, [`parse_markup`] turns it into a
//! [`Document`](crate::model::Document), and [`to_markup`] writes it back.
//!
//! | markup                       | model                 |
//! |------------------------------|-----------------------|
//! | `<p>`                        | paragraph             |
//! | `<h1>` .. `<h6>`             | heading, `level` 1..6 |
//! | `<strong>`, `<b>`            | strong                |
//! | `<em>`, `<i>`                | emphasis              |
//! | `<u>`                        | underline             |
//! | `<a href="..">`              | link                  |
//! | `<span class="comment">`     | comment               |
//! | `<span class="insert">`      | inserted              |
//! | `<span class="delete">`      | deleted               |

use thiserror::Error;

use crate::schema::SchemaError;

pub mod lexer;
pub mod parser;
pub mod serializer;

pub use parser::parse_markup;
pub use serializer::{to_html_page, to_markup};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unterminated tag at byte {offset}")]
    UnterminatedTag { offset: usize },

    #[error("markup does not fit the schema: {0}")]
    Schema(#[from] SchemaError),
}
