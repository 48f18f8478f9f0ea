//! Adding and removing notes and data references.
//!
//! Both follow the same shape, so one generic edit serves both lists: add at
//! the end, or remove a specific item and remember where it was.

use std::fmt::Debug;

use super::{consistency, ensure_attached};
use crate::document::content::{DataReference, Note};
use crate::document::step::Step;
use crate::document::tree::{Document, StepId};
use crate::error::{EditError, Result};
use crate::view::ViewAdapter;

/// An ordered per-step list an [`AnnotationEdit`] can work on.
pub trait Annotation: Clone + PartialEq + Debug {
    const WHAT: &'static str;
    const ADD_LABEL: &'static str;
    const REMOVE_LABEL: &'static str;

    fn list(step: &Step) -> &[Self];
    fn insert(step: &mut Step, index: usize, item: Self) -> Result<()>;
    fn remove(step: &mut Step, index: usize) -> Result<Self>;
}

impl Annotation for Note {
    const WHAT: &'static str = "notes";
    const ADD_LABEL: &'static str = "Add Note";
    const REMOVE_LABEL: &'static str = "Remove Note";

    fn list(step: &Step) -> &[Self] {
        step.notes()
    }

    fn insert(step: &mut Step, index: usize, item: Self) -> Result<()> {
        step.insert_note(index, item)
    }

    fn remove(step: &mut Step, index: usize) -> Result<Self> {
        step.remove_note(index)
    }
}

impl Annotation for DataReference {
    const WHAT: &'static str = "data references";
    const ADD_LABEL: &'static str = "Add Data Reference";
    const REMOVE_LABEL: &'static str = "Remove Data Reference";

    fn list(step: &Step) -> &[Self] {
        step.data_refs()
    }

    fn insert(step: &mut Step, index: usize, item: Self) -> Result<()> {
        step.insert_data_ref(index, item)
    }

    fn remove(step: &mut Step, index: usize) -> Result<Self> {
        step.remove_data_ref(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Add,
    Remove,
}

/// Adds or removes one annotation; undo performs the opposite at the same
/// index.
#[derive(Debug, Clone)]
pub struct AnnotationEdit<T: Annotation> {
    step: StepId,
    index: usize,
    item: T,
    mode: Mode,
}

pub type AddDataRef = AnnotationEdit<DataReference>;
pub type AddStepNote = AnnotationEdit<Note>;

impl<T: Annotation> AnnotationEdit<T> {
    /// Appends `item` after the step's existing annotations.
    pub fn add(doc: &Document, step: StepId, item: T) -> Result<Self> {
        ensure_attached(doc, step)?;
        let index = T::list(doc.step(step)?).len();
        Ok(Self {
            step,
            index,
            item,
            mode: Mode::Add,
        })
    }

    /// Removes the annotation currently at `index`.
    pub fn remove(doc: &Document, step: StepId, index: usize) -> Result<Self> {
        ensure_attached(doc, step)?;
        let list = T::list(doc.step(step)?);
        let item = list.get(index).cloned().ok_or(EditError::IndexOutOfBounds {
            what: T::WHAT,
            index,
            len: list.len(),
        })?;
        Ok(Self {
            step,
            index,
            item,
            mode: Mode::Remove,
        })
    }

    pub fn step(&self) -> StepId {
        self.step
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn item(&self) -> &T {
        &self.item
    }

    pub fn label(&self) -> &'static str {
        match self.mode {
            Mode::Add => T::ADD_LABEL,
            Mode::Remove => T::REMOVE_LABEL,
        }
    }

    fn insert_item(&self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        let target = doc.step_mut(self.step)?;
        let len = T::list(target).len();
        if self.index > len {
            return Err(consistency(format!(
                "{} index {} exceeds {} items of {}",
                T::WHAT,
                self.index,
                len,
                self.step
            )));
        }
        T::insert(target, self.index, self.item.clone())?;
        view.notify_changed(self.step);
        view.focus_and_edit(self.step, false);
        Ok(())
    }

    fn remove_item(&self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        let target = doc.step_mut(self.step)?;
        if T::list(target).get(self.index) != Some(&self.item) {
            return Err(consistency(format!(
                "{} {} of {} changed since the edit was made",
                T::WHAT,
                self.index,
                self.step
            )));
        }
        T::remove(target, self.index)?;
        view.notify_changed(self.step);
        view.focus_and_edit(self.step, false);
        Ok(())
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        match self.mode {
            Mode::Add => self.insert_item(doc, view),
            Mode::Remove => self.remove_item(doc, view),
        }
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        match self.mode {
            Mode::Add => self.remove_item(doc, view),
            Mode::Remove => self.insert_item(doc, view),
        }
    }
}
