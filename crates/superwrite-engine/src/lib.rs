pub mod editing;
pub mod export;
pub mod io;
pub mod markup;
pub mod model;
pub mod rewrite;
pub mod schema;
pub mod session;

// Re-export key types for easier usage
pub use editing::{
    BlockType, Edit, EditError, Patch, Selection, Transaction, TransactionError,
};
pub use export::clean_document;
pub use io::IoError;
pub use markup::{MarkupError, parse_markup, to_html_page, to_markup};
pub use model::{Document, Mark, MarkKind, MarkSet, Node, PositionError};
pub use rewrite::{
    InvalidReason, MockRewriteService, RewriteIntent, RewriteMode, RewriteRequest,
    RewriteResponse, RewriteService, SelectionInfo, ValidSelection, get_selection_info,
};
pub use schema::{NodeKind, SchemaError};
pub use session::{EditorSession, PendingRewrite, RewriteOutcome, SessionError};
