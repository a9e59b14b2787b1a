//! Reconciliation between an original and an edited snapshot
//!
//! [`DiffEngine`] finds changed cells; [`ChangeSetBuilder`] turns those
//! changes (or the whole edited table) into the rows to push.

pub mod changeset;
pub mod diff;

pub use changeset::{ChangeMode, ChangeSet, ChangeSetBuilder};
pub use diff::{CellChange, DiffEngine, DiffStrategy, RecordKey};
