//! Edits that rewrite a step's body.

use super::{consistency, ensure_attached};
use crate::document::content::ContentItem;
use crate::document::tree::{Document, StepId};
use crate::error::{EditError, Result};
use crate::view::ViewAdapter;

/// Replaces a step's name and entire content list in one go.
#[derive(Debug, Clone)]
pub struct FieldContentEdit {
    step: StepId,
    new_name: Option<String>,
    new_content: Vec<ContentItem>,
    old_name: Option<String>,
    old_content: Vec<ContentItem>,
}

impl FieldContentEdit {
    pub const LABEL: &'static str = "Edit Step";

    pub fn new(
        doc: &Document,
        step: StepId,
        new_name: Option<String>,
        new_content: Vec<ContentItem>,
    ) -> Result<Self> {
        ensure_attached(doc, step)?;
        let target = doc.step(step)?;
        Ok(Self {
            step,
            new_name,
            new_content,
            old_name: target.name().map(str::to_string),
            old_content: target.content().to_vec(),
        })
    }

    /// Renames a step, keeping its body.
    pub fn rename(doc: &Document, step: StepId, name: Option<String>) -> Result<Self> {
        let content = doc.step(step)?.content().to_vec();
        Self::new(doc, step, name, content)
    }

    pub fn step(&self) -> StepId {
        self.step
    }

    pub fn label(&self) -> &'static str {
        Self::LABEL
    }

    fn write(
        &self,
        doc: &mut Document,
        view: &mut dyn ViewAdapter,
        name: &Option<String>,
        content: &[ContentItem],
    ) -> Result<()> {
        let target = doc.step_mut(self.step)?;
        target.replace_content(content.to_vec());
        target.set_name(name.clone());
        view.notify_changed(self.step);
        view.focus_and_edit(self.step, false);
        Ok(())
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        self.write(doc, view, &self.new_name, &self.new_content)
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        self.write(doc, view, &self.old_name, &self.old_content)
    }
}

/// Swaps, deletes or inserts a single content item at a fixed index.
#[derive(Debug, Clone)]
pub struct ChangeParam {
    step: StepId,
    index: usize,
    old: Option<ContentItem>,
    new: Option<ContentItem>,
}

impl ChangeParam {
    fn checked(doc: &Document, step: StepId, index: usize) -> Result<&ContentItem> {
        ensure_attached(doc, step)?;
        let target = doc.step(step)?;
        target
            .content_at(index)
            .ok_or(EditError::IndexOutOfBounds {
                what: "content",
                index,
                len: target.content_count(),
            })
    }

    /// Replaces the item at `index`. When the old item is a parameter, its
    /// name carries over to the new one.
    pub fn swap(doc: &Document, step: StepId, index: usize, mut new: ContentItem) -> Result<Self> {
        let old = Self::checked(doc, step, index)?.clone();
        if let ContentItem::Parameter(p) = &old {
            new.set_name(p.name().map(str::to_string));
        }
        Ok(Self {
            step,
            index,
            old: Some(old),
            new: Some(new),
        })
    }

    /// Removes the item at `index`.
    pub fn delete(doc: &Document, step: StepId, index: usize) -> Result<Self> {
        let old = Self::checked(doc, step, index)?.clone();
        Ok(Self {
            step,
            index,
            old: Some(old),
            new: None,
        })
    }

    /// Inserts `new` before the existing item at `index`.
    pub fn insert_at(doc: &Document, step: StepId, index: usize, new: ContentItem) -> Result<Self> {
        Self::checked(doc, step, index)?;
        Ok(Self {
            step,
            index,
            old: None,
            new: Some(new),
        })
    }

    /// Appends `new` after the last item.
    pub fn append(doc: &Document, step: StepId, new: ContentItem) -> Result<Self> {
        ensure_attached(doc, step)?;
        let index = doc.step(step)?.content_count();
        Ok(Self {
            step,
            index,
            old: None,
            new: Some(new),
        })
    }

    pub fn step(&self) -> StepId {
        self.step
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn label(&self) -> &'static str {
        match (&self.old, &self.new) {
            (None, _) => "Add Parameter",
            (Some(_), None) => "Delete Parameter",
            (Some(_), Some(_)) => "Change Parameter",
        }
    }

    fn replace(
        &self,
        doc: &mut Document,
        view: &mut dyn ViewAdapter,
        remove: &Option<ContentItem>,
        insert: &Option<ContentItem>,
    ) -> Result<()> {
        let target = doc.step(self.step)?;
        match remove {
            Some(expected) => {
                if target.content_at(self.index) != Some(expected) {
                    return Err(consistency(format!(
                        "content {} of {} changed since the edit was made",
                        self.index, self.step
                    )));
                }
            }
            None => {
                if self.index > target.content_count() {
                    return Err(consistency(format!(
                        "content index {} exceeds {} items of {}",
                        self.index,
                        target.content_count(),
                        self.step
                    )));
                }
            }
        }
        let target = doc.step_mut(self.step)?;
        if remove.is_some() {
            target.remove_content(self.index)?;
        }
        if let Some(item) = insert {
            target.insert_content(self.index, item.clone())?;
        }
        view.notify_changed(self.step);
        view.focus_and_edit(self.step, false);
        Ok(())
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        self.replace(doc, view, &self.old, &self.new)
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        self.replace(doc, view, &self.new, &self.old)
    }
}
