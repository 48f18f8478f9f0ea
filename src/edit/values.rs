//! Document-wide value clearing and per-step value tables.

use super::{consistency, ensure_attached};
use crate::document::content::{ContentItem, ParamValue, Parameter, ValueTable};
use crate::document::tree::{Document, StepId};
use crate::error::{EditError, Result};
use crate::view::ViewAdapter;

/// Values one parameter held before clearing.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearedValues {
    pub step: StepId,
    pub index: usize,
    pub values: Vec<ParamValue>,
}

/// Empties every parameter in the document, turning a filled-in run back into
/// a blank form.
///
/// The snapshot grows with the total number of values in the document.
#[derive(Debug, Clone)]
pub struct ClearAllValues {
    cleared: Vec<ClearedValues>,
}

impl ClearAllValues {
    pub const LABEL: &'static str = "Clear All Values";

    /// Collects every parameter holding at least one value, in document
    /// order.
    pub fn new(doc: &Document) -> Self {
        let mut cleared = Vec::new();
        for id in doc.traverse() {
            let Some(step) = doc.get(id) else { continue };
            for (index, item) in step.content().iter().enumerate() {
                if let Some(param) = item.as_parameter().filter(|p| p.value_count() > 0) {
                    cleared.push(ClearedValues {
                        step: id,
                        index,
                        values: param.values().to_vec(),
                    });
                }
            }
        }
        Self { cleared }
    }

    /// True when no parameter had any values; such an edit is not worth
    /// recording.
    pub fn is_empty(&self) -> bool {
        self.cleared.is_empty()
    }

    pub fn cleared(&self) -> &[ClearedValues] {
        &self.cleared
    }

    pub fn label(&self) -> &'static str {
        Self::LABEL
    }

    fn check(&self, doc: &Document, filled: bool) -> Result<()> {
        for entry in &self.cleared {
            let param = doc
                .step(entry.step)?
                .content_at(entry.index)
                .and_then(ContentItem::as_parameter)
                .ok_or_else(|| {
                    consistency(format!(
                        "content {} of {} is no longer a parameter",
                        entry.index, entry.step
                    ))
                })?;
            let expected: &[ParamValue] = if filled { &entry.values } else { &[] };
            if param.values() != expected {
                return Err(consistency(format!(
                    "values of parameter {} in {} changed since the edit was made",
                    entry.index, entry.step
                )));
            }
        }
        Ok(())
    }

    fn notify(&self, view: &mut dyn ViewAdapter) {
        let mut last = None;
        for entry in &self.cleared {
            if last != Some(entry.step) {
                view.notify_changed(entry.step);
                last = Some(entry.step);
            }
        }
    }

    fn param_mut<'a>(
        doc: &'a mut Document,
        entry: &ClearedValues,
    ) -> Result<&'a mut Parameter> {
        doc.step_mut(entry.step)?
            .content_at_mut(entry.index)
            .and_then(ContentItem::as_parameter_mut)
            .ok_or_else(|| consistency("cleared parameter disappeared"))
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        self.check(doc, true)?;
        for entry in &self.cleared {
            let param = Self::param_mut(doc, entry)?;
            while param.value_count() > 0 {
                param.remove_value(0)?;
            }
        }
        self.notify(view);
        Ok(())
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        self.check(doc, false)?;
        for entry in &self.cleared {
            let param = Self::param_mut(doc, entry)?;
            for (i, value) in entry.values.iter().enumerate() {
                param.insert_value(i, value.clone())?;
            }
        }
        self.notify(view);
        Ok(())
    }
}

/// Attaches or detaches a step's value table.
#[derive(Debug, Clone)]
pub struct ValueTableEdit {
    step: StepId,
    new: Option<ValueTable>,
    previous: Option<ValueTable>,
}

impl ValueTableEdit {
    /// A table can be attached to a step with at least one atomic parameter
    /// and no table yet.
    pub fn can_attach(doc: &Document, step: StepId) -> bool {
        doc.is_attached(step)
            && doc
                .get(step)
                .is_some_and(|s| s.has_atomic_parameter() && s.value_table().is_none())
    }

    pub fn can_detach(doc: &Document, step: StepId) -> bool {
        doc.is_attached(step) && doc.get(step).is_some_and(|s| s.value_table().is_some())
    }

    pub fn attach(doc: &Document, step: StepId) -> Result<Self> {
        ensure_attached(doc, step)?;
        if !Self::can_attach(doc, step) {
            return Err(EditError::Precondition(
                "a table needs an atomic parameter and no existing table",
            ));
        }
        let target = doc.step(step)?;
        Ok(Self {
            step,
            new: Some(ValueTable::for_content(target.content())),
            previous: target.value_table().cloned(),
        })
    }

    pub fn detach(doc: &Document, step: StepId) -> Result<Self> {
        ensure_attached(doc, step)?;
        if !Self::can_detach(doc, step) {
            return Err(EditError::Precondition("step has no table to remove"));
        }
        Ok(Self {
            step,
            new: None,
            previous: doc.step(step)?.value_table().cloned(),
        })
    }

    /// True for an attaching edit.
    pub fn attaches(&self) -> bool {
        self.new.is_some()
    }

    pub fn step(&self) -> StepId {
        self.step
    }

    pub fn label(&self) -> &'static str {
        if self.attaches() {
            "Add Table"
        } else {
            "Remove Table"
        }
    }

    fn swap(
        &self,
        doc: &mut Document,
        view: &mut dyn ViewAdapter,
        expected: &Option<ValueTable>,
        replacement: &Option<ValueTable>,
    ) -> Result<()> {
        let target = doc.step_mut(self.step)?;
        if target.value_table() != expected.as_ref() {
            return Err(consistency(format!(
                "table of {} changed since the edit was made",
                self.step
            )));
        }
        target.set_value_table(replacement.clone());
        view.notify_changed(self.step);
        view.focus_and_edit(self.step, false);
        Ok(())
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        self.swap(doc, view, &self.previous, &self.new)
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        self.swap(doc, view, &self.new, &self.previous)
    }
}
