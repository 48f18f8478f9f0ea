//! Linear undo/redo history.
//!
//! Unlike a branching undo tree, making a new edit after undoing discards the
//! undone edits for good. The history owns its edits; an edit that leaves the
//! history (truncated after an undo, or evicted by the size limit) releases any
//! detached steps that only it could have brought back.
//!
//! # Example
//!
//! ```
//! use stepquill::document::step::Step;
//! use stepquill::document::tree::Document;
//! use stepquill::edit::history::History;
//! use stepquill::edit::structure::AddField;
//! use stepquill::view::NullView;
//!
//! let mut doc = Document::default();
//! let mut view = NullView;
//! let mut history = History::new(10);
//!
//! let edit = AddField::new(&doc, &view, Step::named("Fix"));
//! history.applied(edit.into(), &mut doc, &mut view).unwrap();
//!
//! assert!(history.undo(&mut doc, &mut view).unwrap());
//! assert!(!history.undo(&mut doc, &mut view).unwrap());
//! assert_eq!(history.redo_label(), Some("Add Step"));
//! assert!(history.redo(&mut doc, &mut view).unwrap());
//! ```

use tracing::{debug, warn};

use super::Edit;
use crate::document::tree::Document;
use crate::error::Result;
use crate::view::ViewAdapter;

/// Default number of edits kept.
pub const DEFAULT_LIMIT: usize = 100;

/// Ordered list of executed edits with a cursor.
///
/// Edits before the cursor are applied; edits at or after it have been undone
/// and can be redone.
#[derive(Debug)]
pub struct History {
    edits: Vec<Edit>,
    cursor: usize,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl History {
    /// Creates an empty history keeping at most `limit` edits. A limit of 0
    /// keeps everything.
    pub fn new(limit: usize) -> Self {
        Self {
            edits: Vec::new(),
            cursor: 0,
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.edits.len()
    }

    /// Label of the edit the next [`undo`](Self::undo) would revert.
    pub fn undo_label(&self) -> Option<&'static str> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.edits.get(i))
            .map(Edit::label)
    }

    /// Label of the edit the next [`redo`](Self::redo) would re-apply.
    pub fn redo_label(&self) -> Option<&'static str> {
        self.edits.get(self.cursor).map(Edit::label)
    }

    /// Applies `edit` and records it.
    ///
    /// Undone edits after the cursor are discarded. If the edit fails, neither
    /// the document nor the history changes.
    pub fn applied(
        &mut self,
        mut edit: Edit,
        doc: &mut Document,
        view: &mut dyn ViewAdapter,
    ) -> Result<()> {
        if let Err(err) = edit.apply(doc, view) {
            warn!(label = edit.label(), error = %err, "edit rejected");
            return Err(err);
        }
        for undone in self.edits.drain(self.cursor..) {
            undone.discard(doc, false);
        }
        debug!(label = edit.label(), cursor = self.cursor + 1, "applied edit");
        self.edits.push(edit);
        self.cursor += 1;

        if self.limit > 0 && self.edits.len() > self.limit {
            let excess = self.edits.len() - self.limit;
            for evicted in self.edits.drain(..excess) {
                evicted.discard(doc, true);
            }
            self.cursor -= excess;
            debug!(evicted = excess, "history limit reached");
        }
        Ok(())
    }

    /// Reverts the edit before the cursor. Returns `Ok(false)` when there is
    /// nothing to undo.
    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<bool> {
        if self.cursor == 0 {
            return Ok(false);
        }
        let edit = &mut self.edits[self.cursor - 1];
        if let Err(err) = edit.undo(doc, view) {
            warn!(label = edit.label(), error = %err, "undo failed");
            return Err(err);
        }
        debug!(label = edit.label(), cursor = self.cursor - 1, "undid edit");
        self.cursor -= 1;
        Ok(true)
    }

    /// Re-applies the edit at the cursor. Returns `Ok(false)` when there is
    /// nothing to redo.
    pub fn redo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<bool> {
        if self.cursor == self.edits.len() {
            return Ok(false);
        }
        let edit = &mut self.edits[self.cursor];
        if let Err(err) = edit.redo(doc, view) {
            warn!(label = edit.label(), error = %err, "redo failed");
            return Err(err);
        }
        debug!(label = edit.label(), cursor = self.cursor + 1, "redid edit");
        self.cursor += 1;
        Ok(true)
    }

    /// Drops every edit, releasing whatever they exclusively held.
    pub fn clear(&mut self, doc: &mut Document) {
        let cursor = self.cursor;
        for (i, edit) in self.edits.drain(..).enumerate() {
            edit.discard(doc, i < cursor);
        }
        self.cursor = 0;
    }
}
