//! # Document Model
//!
//! Immutable tree of [`Node`]s addressed by integer positions.
//!
//! ## Position space
//!
//! Text counts one unit per character. Every node below the root adds one
//! unit for its opening and one for its closing boundary:
//!
//! ```text
//!  <h1> T i t l e </h1> <p> B o d y </p>
//! 0    1         6     7   8       12   13
//! ```
//!
//! Position 0 sits before the first block and `content_size()` after the
//! last one. [`resolve`] maps a position to the node that contains it.

pub mod document;
pub mod mark;
pub mod node;
pub mod resolve;

pub use document::Document;
pub use mark::{Mark, MarkKind, MarkSet};
pub use node::{Node, NodeAttrs};
pub use resolve::{PositionError, ResolvedPos, resolve};
