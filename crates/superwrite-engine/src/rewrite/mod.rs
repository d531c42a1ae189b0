//! # Rewrites
//!
//! Gating a selection for a rewrite, talking to the rewrite service and
//! landing the answer as a tracked change.
//!
//! A rewrite never edits text in place in tracked mode: the selected range
//! gets the `deleted` mark and the rewritten text is inserted right after
//! it with the `inserted` mark. Both stay in the document until a review
//! pass ([`accept_all_transaction`], [`reject_all_transaction`]) or the
//! clean export resolves them.

pub mod selection_info;
pub mod service;
pub mod tracking;

pub use selection_info::{
    DEFAULT_BLOCK_SEPARATOR, InvalidReason, SelectionInfo, ValidSelection, get_selection_info,
    get_selection_info_with_separator,
};
pub use service::{
    MockRewriteService, RewriteIntent, RewriteRequest, RewriteResponse, RewriteService,
    ServiceError, UnknownIntent, request_rewrite,
};
pub use tracking::{
    RewriteMode, UnknownMode, accept_all_transaction, apply_change_tracking, apply_rewrite,
    reject_all_transaction, rewrite_transaction,
};
