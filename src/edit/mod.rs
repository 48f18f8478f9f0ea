//! Reversible document edits.
//!
//! Every user-visible change to a [`Document`] is an [`Edit`]: a closed set of
//! variants, each storing exactly what it needs to invert itself. Edits hold
//! [`StepId`](crate::document::tree::StepId) handles rather than references, and
//! every `apply`/`undo` checks those handles and the captured positions before
//! touching the tree, so a failed edit never leaves the document half-changed.
//!
//! # Modules
//!
//! - `structure`: adding, splitting, indenting, moving and deleting steps
//! - `content`: replacing a step's body or a single content item
//! - `annotations`: notes and data references
//! - `values`: document-wide value clearing and value tables
//! - `experiment`: switching between a run and a template
//! - `history`: the linear undo/redo stack
//!
//! # Example
//!
//! ```
//! use stepquill::document::step::Step;
//! use stepquill::document::tree::Document;
//! use stepquill::edit::history::History;
//! use stepquill::edit::structure::AddField;
//! use stepquill::view::RecordingView;
//!
//! let mut doc = Document::default();
//! let mut view = RecordingView::new();
//! let mut history = History::default();
//!
//! let edit = AddField::new(&doc, &view, Step::named("Wash"));
//! history.applied(edit.into(), &mut doc, &mut view).unwrap();
//! assert_eq!(doc.children(doc.root()).unwrap().len(), 1);
//! assert_eq!(history.undo_label(), Some("Add Step"));
//!
//! history.undo(&mut doc, &mut view).unwrap();
//! assert!(doc.children(doc.root()).unwrap().is_empty());
//! ```

pub mod annotations;
pub mod content;
pub mod experiment;
pub mod history;
pub mod structure;
pub mod values;

use crate::document::tree::{Document, StepId};
use crate::error::{EditError, Result};
use crate::view::ViewAdapter;

use annotations::{AddDataRef, AddStepNote};
use content::{ChangeParam, FieldContentEdit};
use experiment::{AddExperimentInfo, RemoveExperimentInfo};
use structure::{AddField, DeleteSteps, FieldSplit, IndentLeft, IndentRight, MoveSteps};
use values::{ClearAllValues, ValueTableEdit};

/// A reversible, atomic document mutation.
#[derive(Debug, Clone)]
pub enum Edit {
    AddField(AddField),
    FieldSplit(FieldSplit),
    IndentRight(IndentRight),
    IndentLeft(IndentLeft),
    MoveSteps(MoveSteps),
    DeleteSteps(DeleteSteps),
    FieldContentEdit(FieldContentEdit),
    ChangeParam(ChangeParam),
    AddDataRef(AddDataRef),
    AddStepNote(AddStepNote),
    ClearAllValues(ClearAllValues),
    AddExperimentInfo(AddExperimentInfo),
    RemoveExperimentInfo(RemoveExperimentInfo),
    AttachValueTable(ValueTableEdit),
    DetachValueTable(ValueTableEdit),
}

macro_rules! dispatch {
    ($edit:expr, $inner:ident => $body:expr) => {
        match $edit {
            Edit::AddField($inner) => $body,
            Edit::FieldSplit($inner) => $body,
            Edit::IndentRight($inner) => $body,
            Edit::IndentLeft($inner) => $body,
            Edit::MoveSteps($inner) => $body,
            Edit::DeleteSteps($inner) => $body,
            Edit::FieldContentEdit($inner) => $body,
            Edit::ChangeParam($inner) => $body,
            Edit::AddDataRef($inner) => $body,
            Edit::AddStepNote($inner) => $body,
            Edit::ClearAllValues($inner) => $body,
            Edit::AddExperimentInfo($inner) => $body,
            Edit::RemoveExperimentInfo($inner) => $body,
            Edit::AttachValueTable($inner) => $body,
            Edit::DetachValueTable($inner) => $body,
        }
    };
}

impl Edit {
    /// Display label for "Undo <label>" / "Redo <label>" menu entries.
    pub fn label(&self) -> &'static str {
        dispatch!(self, e => e.label())
    }

    /// Performs the edit.
    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        dispatch!(self, e => e.apply(doc, view))
    }

    /// Reverts a previously applied edit.
    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        dispatch!(self, e => e.undo(doc, view))
    }

    /// Re-performs an undone edit. Identical to [`apply`](Self::apply): every
    /// edit caches whatever it computed on first application.
    pub fn redo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        self.apply(doc, view)
    }

    /// Constructed edits are always undoable.
    pub fn can_undo(&self) -> bool {
        true
    }

    /// Constructed edits are always redoable.
    pub fn can_redo(&self) -> bool {
        true
    }

    /// Drops the edit from history, releasing any steps only it can still
    /// reach. `applied` tells whether the edit's effect is in the document.
    pub(crate) fn discard(self, doc: &mut Document, applied: bool) {
        match self {
            Edit::AddField(e) => e.discard(doc, applied),
            Edit::FieldSplit(e) => e.discard(doc, applied),
            Edit::DeleteSteps(e) => e.discard(doc, applied),
            _ => {}
        }
    }
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Edit {
                fn from(edit: $ty) -> Self {
                    Edit::$variant(edit)
                }
            }
        )*
    };
}

impl_from!(
    AddField(AddField),
    FieldSplit(FieldSplit),
    IndentRight(IndentRight),
    IndentLeft(IndentLeft),
    MoveSteps(MoveSteps),
    DeleteSteps(DeleteSteps),
    FieldContentEdit(FieldContentEdit),
    ChangeParam(ChangeParam),
    AddDataRef(AddDataRef),
    AddStepNote(AddStepNote),
    ClearAllValues(ClearAllValues),
    AddExperimentInfo(AddExperimentInfo),
    RemoveExperimentInfo(RemoveExperimentInfo),
);

impl From<ValueTableEdit> for Edit {
    fn from(edit: ValueTableEdit) -> Self {
        if edit.attaches() {
            Edit::AttachValueTable(edit)
        } else {
            Edit::DetachValueTable(edit)
        }
    }
}

/// Fails with [`EditError::Precondition`] unless `step` is live and reachable
/// from the root.
pub(crate) fn ensure_attached(doc: &Document, step: StepId) -> Result<()> {
    doc.step(step)?;
    if doc.is_attached(step) {
        Ok(())
    } else {
        Err(EditError::Precondition("step is not part of the document"))
    }
}

pub(crate) fn consistency(message: impl Into<String>) -> EditError {
    EditError::Consistency(message.into())
}
