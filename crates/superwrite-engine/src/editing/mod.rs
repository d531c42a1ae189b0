/*!
 * # Transaction Engine
 *
 * All document changes go through a [`Transaction`]: an ordered list of
 * [`Edit`]s applied against the immutable [`Document`](crate::model::Document).
 *
 * ## Flow
 *
 * 1. Build a transaction (`replace_range`, `insert`, `add_mark`, ...)
 * 2. `Document::apply(selection, &tx)` runs the edits one after another,
 *    each seeing the tree left by the previous one
 * 3. Every edit is checked against the schema; the first failure aborts
 *    the transaction and the input document stays current
 * 4. On success the caller gets the next document version and a [`Patch`]
 *    with changed ranges, the new selection and the position [`Mapping`]
 *
 * [`toggle_mark`] and [`set_block_type`] build the transactions behind the
 * toolbar's formatting buttons.
 *
 * Positions held outside the editor (pending rewrites, saved ranges) are
 * carried across versions with [`Mapping::map`].
 */

pub mod commands;
pub mod edit;
pub mod mapping;
pub mod patch;
pub mod selection;
pub mod transaction;

pub use commands::{BlockType, set_block_type, toggle_mark};
pub use edit::{Edit, EditError};
pub use mapping::{Assoc, MapResult, Mapping, StepMap};
pub use patch::Patch;
pub use selection::Selection;
pub use transaction::{Transaction, TransactionError};
