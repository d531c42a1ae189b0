//! # Editor Session
//!
//! Owns the live document and selection and is the only place that swaps
//! one document version for the next. Readers take `Arc<Document>` clones
//! and keep a consistent view however long they hold on to them.
//!
//! A rewrite is a two-step exchange: [`EditorSession::begin_rewrite`] hands
//! out a [`PendingRewrite`] ticket and [`EditorSession::complete_rewrite`]
//! lands the service's answer. Between the two the document may have moved
//! on; the answer is only applied if the live selection still holds the
//! same text in the same kind of block.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::editing::{
    BlockType, Patch, Selection, Transaction, TransactionError, set_block_type, toggle_mark,
};
use crate::export::clean_document;
use crate::markup::{MarkupError, parse_markup, to_html_page, to_markup};
use crate::model::{Document, Mark, PositionError};
use crate::rewrite::{
    DEFAULT_BLOCK_SEPARATOR, InvalidReason, RewriteIntent, RewriteMode, RewriteRequest,
    RewriteResponse, RewriteService, SelectionInfo, accept_all_transaction,
    get_selection_info_with_separator, reject_all_transaction, request_rewrite,
    rewrite_transaction,
};
use crate::schema::NodeKind;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("selection cannot be rewritten: {0}")]
    SelectionUnavailable(InvalidReason),

    #[error("a rewrite is already in flight")]
    RewriteInFlight,

    #[error("no rewrite in flight with id {0}")]
    UnknownRewrite(Uuid),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error(transparent)]
    Markup(#[from] MarkupError),
}

/// Ticket for a rewrite sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRewrite {
    pub id: Uuid,
    /// Document version the selection was taken from.
    pub version: u64,
    pub from: usize,
    pub to: usize,
    pub block_kind: NodeKind,
    pub request: RewriteRequest,
}

impl PendingRewrite {
    pub fn original_text(&self) -> &str {
        &self.request.text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The service returned the text unchanged; nothing was dispatched.
    Unchanged,
    Applied(Patch),
    /// The document moved on and the selection no longer matches.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    document: Arc<Document>,
    selection: Selection,
    mode: RewriteMode,
    block_separator: String,
    in_flight: Option<Uuid>,
}

impl EditorSession {
    pub fn new(document: Document) -> Self {
        Self {
            document: Arc::new(document),
            selection: Selection::caret(1),
            mode: RewriteMode::default(),
            block_separator: DEFAULT_BLOCK_SEPARATOR.to_string(),
            in_flight: None,
        }
    }

    pub fn with_mode(mut self, mode: RewriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_block_separator(mut self, separator: impl Into<String>) -> Self {
        self.block_separator = separator.into();
        self
    }

    /// The current version. Cheap to clone and never changes under the
    /// holder.
    pub fn document(&self) -> Arc<Document> {
        Arc::clone(&self.document)
    }

    pub fn version(&self) -> u64 {
        self.document.version()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn mode(&self) -> RewriteMode {
        self.mode
    }

    /// Move the selection. Does not create a new document version.
    pub fn set_selection(&mut self, selection: Selection) -> Result<(), SessionError> {
        let size = self.document.content_size();
        if let Some(pos) = [selection.anchor, selection.head]
            .into_iter()
            .find(|pos| *pos > size)
        {
            return Err(PositionError::OutOfRange { pos, size }.into());
        }
        self.selection = selection;
        Ok(())
    }

    /// Apply a transaction to the live document.
    ///
    /// A transaction that only sets the selection moves the selection and
    /// keeps the current version.
    pub fn dispatch(&mut self, transaction: &Transaction) -> Result<Patch, SessionError> {
        let (next, mut patch) = self.document.apply(self.selection, transaction)?;
        self.selection = patch.new_selection;
        if transaction.changes_document() {
            self.document = Arc::new(next);
        } else {
            patch.version = self.document.version();
        }
        Ok(patch)
    }

    pub fn selection_info(&self) -> SelectionInfo {
        get_selection_info_with_separator(&self.document, self.selection, &self.block_separator)
    }

    pub fn can_rewrite(&self) -> bool {
        self.in_flight.is_none() && self.selection_info().is_valid()
    }

    pub fn rewrite_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Check the live selection and issue a ticket for a rewrite of it.
    pub fn begin_rewrite(&mut self, intent: RewriteIntent) -> Result<PendingRewrite, SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::RewriteInFlight);
        }
        let valid = match self.selection_info() {
            SelectionInfo::Valid(valid) => valid,
            SelectionInfo::Invalid { reason } => {
                log::warn!("rewrite ({intent}) requested on invalid selection: {reason}");
                return Err(SessionError::SelectionUnavailable(reason));
            }
        };

        let pending = PendingRewrite {
            id: Uuid::new_v4(),
            version: self.version(),
            from: valid.from,
            to: valid.to,
            block_kind: valid.block_kind,
            request: RewriteRequest {
                text: valid.text,
                node_type: valid.block_kind.name().to_string(),
                intent,
            },
        };
        self.in_flight = Some(pending.id);
        log::debug!(
            "rewrite {} ({intent}) started for {}..{} at version {}",
            pending.id,
            pending.from,
            pending.to,
            pending.version
        );
        Ok(pending)
    }

    /// Land the service's answer for `pending`.
    ///
    /// The in-flight slot is freed whatever the outcome.
    pub fn complete_rewrite(
        &mut self,
        pending: &PendingRewrite,
        response: &RewriteResponse,
    ) -> Result<RewriteOutcome, SessionError> {
        if self.in_flight != Some(pending.id) {
            return Err(SessionError::UnknownRewrite(pending.id));
        }
        self.in_flight = None;

        if response.is_noop() || response.rewritten_text == pending.original_text() {
            return Ok(RewriteOutcome::Unchanged);
        }

        let Some((from, to)) = self.target_range(pending) else {
            log::info!(
                "discarding stale rewrite {} from version {} (now {})",
                pending.id,
                pending.version,
                self.version()
            );
            return Ok(RewriteOutcome::Discarded);
        };

        let Some(tx) = rewrite_transaction(
            from,
            to,
            pending.original_text(),
            &response.rewritten_text,
            self.mode,
        ) else {
            return Ok(RewriteOutcome::Unchanged);
        };
        self.dispatch(&tx).map(RewriteOutcome::Applied)
    }

    /// Where a rewrite may still land: its own range while the version is
    /// unchanged, otherwise the live selection if it re-validates to the
    /// same text in the same kind of block.
    fn target_range(&self, pending: &PendingRewrite) -> Option<(usize, usize)> {
        if pending.version == self.version() {
            return Some((pending.from, pending.to));
        }
        let live = self.selection_info();
        let valid = live.valid()?;
        (valid.text == pending.original_text() && valid.block_kind == pending.block_kind)
            .then_some((valid.from, valid.to))
    }

    /// Begin a rewrite, ask `service`, and land the answer.
    ///
    /// Blocks on the service. Interactive callers run the request themselves
    /// between [`Self::begin_rewrite`] and [`Self::complete_rewrite`].
    pub fn rewrite_with<S: RewriteService + ?Sized>(
        &mut self,
        service: &S,
        intent: RewriteIntent,
    ) -> Result<RewriteOutcome, SessionError> {
        let pending = self.begin_rewrite(intent)?;
        let response = request_rewrite(service, &pending.request);
        self.complete_rewrite(&pending, &response)
    }

    /// Toggle a formatting mark over the selection. `None` on a caret.
    pub fn toggle_mark(&mut self, mark: Mark) -> Result<Option<Patch>, SessionError> {
        let (from, to) = (self.selection.from(), self.selection.to());
        match toggle_mark(&self.document, from, to, mark) {
            Some(tx) => self.dispatch(&tx).map(Some),
            None => Ok(None),
        }
    }

    pub fn set_block_type(&mut self, block_type: BlockType) -> Result<Option<Patch>, SessionError> {
        match set_block_type(&self.document, self.selection, block_type) {
            Some(tx) => self.dispatch(&tx).map(Some),
            None => Ok(None),
        }
    }

    /// Keep every tracked rewrite. `None` when there was nothing to resolve.
    pub fn accept_all_changes(&mut self) -> Result<Option<Patch>, SessionError> {
        match accept_all_transaction(&self.document) {
            Some(tx) => self.dispatch(&tx).map(Some),
            None => Ok(None),
        }
    }

    /// Undo every tracked rewrite.
    pub fn reject_all_changes(&mut self) -> Result<Option<Patch>, SessionError> {
        match reject_all_transaction(&self.document) {
            Some(tx) => self.dispatch(&tx).map(Some),
            None => Ok(None),
        }
    }

    pub fn clean_export(&self) -> Document {
        clean_document(&self.document)
    }

    pub fn export_markup(&self) -> String {
        to_markup(&self.clean_export())
    }

    pub fn export_html_page(&self) -> String {
        to_html_page(&self.clean_export())
    }

    /// Replace the whole document with parsed markup, as the next version.
    pub fn load_markup(&mut self, markup: &str) -> Result<(), SessionError> {
        let parsed = parse_markup(markup)?;
        self.load_document(parsed);
        Ok(())
    }

    /// Install `document` as the next version. Every way of building a
    /// [`Document`] checks it against the schema, so this cannot fail.
    pub fn load_document(&mut self, document: Document) {
        let next = self.document.next_version(document.root().clone());
        log::debug!("loaded document as version {}", next.version());
        self.document = Arc::new(next);
        self.selection = Selection::caret(1);
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(Document::create_empty())
    }
}
