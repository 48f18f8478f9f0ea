//! Error types for document primitives and edits.
//!
//! Every variant here signals a caller bug or a broken edit discipline rather
//! than a condition a user can recover from. User-facing "nothing to do" cases
//! are reported by the `can_*` predicates and never reach this type.

use thiserror::Error;

use crate::document::tree::StepId;

/// Errors raised by [`Document`](crate::document::tree::Document) primitives
/// and by [`Edit`](crate::edit::Edit) application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// An index was outside the valid range of an ordered list.
    #[error("index {index} out of bounds for {what} of length {len}")]
    IndexOutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A handle refers to a slot that was released or never existed.
    #[error("stale step handle {0}")]
    StaleHandle(StepId),

    /// `child` was expected under `parent` but is not there.
    #[error("step {child} is not a child of {parent}")]
    NotAChild { parent: StepId, child: StepId },

    /// Attempted to insert a step that already has a parent.
    #[error("step {0} is already attached")]
    AlreadyAttached(StepId),

    /// Inserting `child` under `parent` would make the tree cyclic.
    #[error("inserting {child} under {parent} would create a cycle")]
    WouldCycle { parent: StepId, child: StepId },

    /// The operation is not defined on the root step.
    #[error("the root step cannot be {0}")]
    RootStep(&'static str),

    /// A command was constructed although its `can_*` predicate is false.
    #[error("precondition failed: {0}")]
    Precondition(&'static str),

    /// Captured positions no longer match the document.
    #[error("document consistency check failed: {0}")]
    Consistency(String),
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, EditError>;
