//! The protocol step node.
//!
//! A [`Step`] owns its attributes, body, notes, data references and optional
//! value table. Its children and parent are stored as [`StepId`] handles into
//! the owning [`Document`](super::tree::Document); only the document may
//! change them, so the parent/child links always agree.

use indexmap::IndexMap;

use super::content::{ContentItem, DataReference, ExperimentInfo, Note, ValueTable};
use super::tree::StepId;
use crate::error::{EditError, Result};

/// Reserved attribute key holding the step's display name.
pub const NAME_KEY: &str = "name";

/// A node in the protocol document tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Step {
    attributes: IndexMap<String, String>,
    content: Vec<ContentItem>,
    notes: Vec<Note>,
    data_refs: Vec<DataReference>,
    value_table: Option<ValueTable>,
    experiment_info: Option<ExperimentInfo>,
    pub(crate) children: Vec<StepId>,
    pub(crate) parent: Option<StepId>,
}

fn out_of_bounds(what: &'static str, index: usize, len: usize) -> EditError {
    EditError::IndexOutOfBounds { what, index, len }
}

impl Step {
    /// Creates an unnamed, empty step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty step with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        let mut step = Self::new();
        step.set_name(Some(name.into()));
        step
    }

    /// Builder-style helper that appends content items.
    pub fn with_content(mut self, content: impl IntoIterator<Item = ContentItem>) -> Self {
        self.content.extend(content);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.attribute(NAME_KEY)
    }

    /// Sets or clears the name. `None` removes the key.
    pub fn set_name(&mut self, name: Option<String>) {
        self.set_attribute(NAME_KEY, name);
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Sets or clears an attribute. Clearing keeps the order of the others.
    pub fn set_attribute(&mut self, key: &str, value: Option<String>) {
        match value {
            Some(v) => {
                self.attributes.insert(key.to_string(), v);
            }
            None => {
                self.attributes.shift_remove(key);
            }
        }
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn children(&self) -> &[StepId] {
        &self.children
    }

    pub fn parent(&self) -> Option<StepId> {
        self.parent
    }

    // Content

    pub fn content(&self) -> &[ContentItem] {
        &self.content
    }

    pub fn content_count(&self) -> usize {
        self.content.len()
    }

    pub fn content_at(&self, index: usize) -> Option<&ContentItem> {
        self.content.get(index)
    }

    pub fn content_at_mut(&mut self, index: usize) -> Option<&mut ContentItem> {
        self.content.get_mut(index)
    }

    pub fn add_content(&mut self, item: ContentItem) {
        self.content.push(item);
    }

    pub fn insert_content(&mut self, index: usize, item: ContentItem) -> Result<()> {
        if index > self.content.len() {
            return Err(out_of_bounds("content", index, self.content.len()));
        }
        self.content.insert(index, item);
        Ok(())
    }

    pub fn remove_content(&mut self, index: usize) -> Result<ContentItem> {
        if index >= self.content.len() {
            return Err(out_of_bounds("content", index, self.content.len()));
        }
        Ok(self.content.remove(index))
    }

    /// Replaces the whole body, returning the previous one.
    pub fn replace_content(&mut self, content: Vec<ContentItem>) -> Vec<ContentItem> {
        std::mem::replace(&mut self.content, content)
    }

    /// Returns true if at least one content item is an atomic parameter.
    pub fn has_atomic_parameter(&self) -> bool {
        self.content.iter().any(ContentItem::is_atomic_parameter)
    }

    // Notes

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn note_at(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn insert_note(&mut self, index: usize, note: Note) -> Result<()> {
        if index > self.notes.len() {
            return Err(out_of_bounds("notes", index, self.notes.len()));
        }
        self.notes.insert(index, note);
        Ok(())
    }

    pub fn remove_note(&mut self, index: usize) -> Result<Note> {
        if index >= self.notes.len() {
            return Err(out_of_bounds("notes", index, self.notes.len()));
        }
        Ok(self.notes.remove(index))
    }

    /// Removes every note, returning them in order.
    pub fn take_notes(&mut self) -> Vec<Note> {
        std::mem::take(&mut self.notes)
    }

    // Data references

    pub fn data_refs(&self) -> &[DataReference] {
        &self.data_refs
    }

    pub fn data_ref_count(&self) -> usize {
        self.data_refs.len()
    }

    pub fn data_ref_at(&self, index: usize) -> Option<&DataReference> {
        self.data_refs.get(index)
    }

    pub fn add_data_ref(&mut self, data_ref: DataReference) {
        self.data_refs.push(data_ref);
    }

    pub fn insert_data_ref(&mut self, index: usize, data_ref: DataReference) -> Result<()> {
        if index > self.data_refs.len() {
            return Err(out_of_bounds("data references", index, self.data_refs.len()));
        }
        self.data_refs.insert(index, data_ref);
        Ok(())
    }

    pub fn remove_data_ref(&mut self, index: usize) -> Result<DataReference> {
        if index >= self.data_refs.len() {
            return Err(out_of_bounds("data references", index, self.data_refs.len()));
        }
        Ok(self.data_refs.remove(index))
    }

    // Overlays

    pub fn value_table(&self) -> Option<&ValueTable> {
        self.value_table.as_ref()
    }

    pub fn set_value_table(&mut self, table: Option<ValueTable>) -> Option<ValueTable> {
        std::mem::replace(&mut self.value_table, table)
    }

    pub fn experiment_info(&self) -> Option<&ExperimentInfo> {
        self.experiment_info.as_ref()
    }

    pub(crate) fn set_experiment_info(
        &mut self,
        info: Option<ExperimentInfo>,
    ) -> Option<ExperimentInfo> {
        std::mem::replace(&mut self.experiment_info, info)
    }
}
