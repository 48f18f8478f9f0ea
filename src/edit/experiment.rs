//! Switching a document between a reusable template and a performed run.
//!
//! Experiment info lives on the root. Notes are run-only annotations, so
//! reverting to a template strips them from every step and undo puts each one
//! back on the step it came from.

use indexmap::IndexMap;

use super::consistency;
use crate::document::content::{ExperimentInfo, Note};
use crate::document::tree::{Document, StepId};
use crate::error::{EditError, Result};
use crate::view::ViewAdapter;

fn check_info(doc: &Document, expected: Option<&ExperimentInfo>) -> Result<()> {
    if doc.experiment_info() != expected {
        return Err(consistency("experiment info changed since the edit was made"));
    }
    Ok(())
}

/// Marks the document as a run by setting the root's experiment info.
#[derive(Debug, Clone)]
pub struct AddExperimentInfo {
    info: ExperimentInfo,
    previous: Option<ExperimentInfo>,
}

impl AddExperimentInfo {
    pub const LABEL: &'static str = "Add Experiment Info";

    pub fn new(doc: &Document, info: ExperimentInfo) -> Self {
        Self {
            info,
            previous: doc.experiment_info().cloned(),
        }
    }

    pub fn label(&self) -> &'static str {
        Self::LABEL
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        check_info(doc, self.previous.as_ref())?;
        doc.set_experiment_info(Some(self.info.clone()))?;
        view.notify_changed(doc.root());
        view.focus_and_edit(doc.root(), false);
        Ok(())
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        check_info(doc, Some(&self.info))?;
        doc.set_experiment_info(self.previous.clone())?;
        view.notify_changed(doc.root());
        view.focus_and_edit(doc.root(), false);
        Ok(())
    }
}

/// Turns a run back into a template: clears experiment info and every note.
#[derive(Debug, Clone)]
pub struct RemoveExperimentInfo {
    info: ExperimentInfo,
    notes: IndexMap<StepId, Vec<Note>>,
}

impl RemoveExperimentInfo {
    pub const LABEL: &'static str = "Remove Experiment Info";

    pub fn can_remove(doc: &Document) -> bool {
        doc.experiment_info().is_some()
    }

    /// Captures the info and, in document order, the notes of every step.
    pub fn new(doc: &Document) -> Result<Self> {
        let info = doc
            .experiment_info()
            .cloned()
            .ok_or(EditError::Precondition("document has no experiment info"))?;
        let notes = doc
            .traverse()
            .into_iter()
            .filter_map(|id| {
                let step = doc.get(id)?;
                (step.note_count() > 0).then(|| (id, step.notes().to_vec()))
            })
            .collect();
        Ok(Self { info, notes })
    }

    /// Removed notes keyed by their originating step.
    pub fn notes(&self) -> &IndexMap<StepId, Vec<Note>> {
        &self.notes
    }

    pub fn label(&self) -> &'static str {
        Self::LABEL
    }

    fn check_notes(&self, doc: &Document, present: bool) -> Result<()> {
        for (&id, notes) in &self.notes {
            let current = doc.step(id)?.notes();
            let expected: &[Note] = if present { notes } else { &[] };
            if current != expected {
                return Err(consistency(format!(
                    "notes of {} changed since the edit was made",
                    id
                )));
            }
        }
        Ok(())
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        check_info(doc, Some(&self.info))?;
        self.check_notes(doc, true)?;
        doc.set_experiment_info(None)?;
        for &id in self.notes.keys() {
            doc.step_mut(id)?.take_notes();
            view.notify_changed(id);
        }
        view.notify_changed(doc.root());
        view.focus_and_edit(doc.root(), false);
        Ok(())
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        check_info(doc, None)?;
        self.check_notes(doc, false)?;
        doc.set_experiment_info(Some(self.info.clone()))?;
        for (&id, notes) in &self.notes {
            let step = doc.step_mut(id)?;
            for note in notes {
                step.add_note(note.clone());
            }
            view.notify_changed(id);
        }
        view.notify_changed(doc.root());
        view.focus_and_edit(doc.root(), false);
        Ok(())
    }
}
