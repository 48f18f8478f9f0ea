//! Editor session: the user-action layer over document, history and view.
//!
//! `EditorSession` is what a front end calls when the user does something. It
//! checks each action's precondition, builds the matching [`Edit`], and pushes
//! it through the [`History`]. Actions that make no sense in the current state
//! (empty selection, splitting the root, a step that is not in the document)
//! return `Ok(false)` without touching anything.
//!
//! # Example
//!
//! ```
//! use stepquill::config::Config;
//! use stepquill::document::tree::Document;
//! use stepquill::editor::session::EditorSession;
//! use stepquill::view::RecordingView;
//!
//! let mut session = EditorSession::new(Document::default(), RecordingView::new(), &Config::default());
//!
//! // Nothing selected: the step goes to the end of the root.
//! assert!(session.add_step(Some("Fix".to_string())).unwrap());
//! assert_eq!(session.undo_label(), Some("Add Step"));
//!
//! // The root cannot be split.
//! let root = session.document().root();
//! assert!(!session.split_step(root, 0, None).unwrap());
//!
//! assert!(session.undo().unwrap());
//! assert!(!session.undo().unwrap());
//! ```

use crate::config::Config;
use crate::document::content::{ContentItem, DataReference, ExperimentInfo, Note, Parameter};
use crate::document::step::Step;
use crate::document::tree::{Document, StepId};
use crate::edit::annotations::{AddDataRef, AddStepNote};
use crate::edit::content::{ChangeParam, FieldContentEdit};
use crate::edit::experiment::{AddExperimentInfo, RemoveExperimentInfo};
use crate::edit::history::History;
use crate::edit::structure::{
    AddField, DeleteSteps, Direction, FieldSplit, IndentLeft, IndentRight, MoveSteps,
};
use crate::edit::values::{ClearAllValues, ValueTableEdit};
use crate::edit::Edit;
use crate::error::Result;
use crate::view::{RecordingView, ViewAdapter};

/// One document being edited, with its history and view.
#[derive(Debug)]
pub struct EditorSession<V: ViewAdapter = RecordingView> {
    document: Document,
    history: History,
    view: V,
    edit_new_steps: bool,
    default_step_name: String,
}

impl<V: ViewAdapter> EditorSession<V> {
    pub fn new(document: Document, view: V, config: &Config) -> Self {
        Self {
            document,
            history: History::new(config.undo_limit),
            view,
            edit_new_steps: config.edit_new_steps,
            default_step_name: config.default_step_name.clone(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    fn push(&mut self, edit: impl Into<Edit>) -> Result<bool> {
        self.history
            .applied(edit.into(), &mut self.document, &mut self.view)?;
        Ok(true)
    }

    fn selection(&self) -> Vec<StepId> {
        self.view.selected_steps()
    }

    fn live(&self, step: StepId) -> bool {
        self.document.is_attached(step)
    }

    // History

    pub fn undo(&mut self) -> Result<bool> {
        self.history.undo(&mut self.document, &mut self.view)
    }

    pub fn redo(&mut self) -> Result<bool> {
        self.history.redo(&mut self.document, &mut self.view)
    }

    pub fn undo_label(&self) -> Option<&'static str> {
        self.history.undo_label()
    }

    pub fn redo_label(&self) -> Option<&'static str> {
        self.history.redo_label()
    }

    // Structure

    /// Adds a step after the selection, or at the end of the root.
    pub fn add_step(&mut self, name: Option<String>) -> Result<bool> {
        let name = name.unwrap_or_else(|| self.default_step_name.clone());
        let edit = AddField::new(&self.document, &self.view, Step::named(name))
            .with_editing(self.edit_new_steps);
        self.push(edit)
    }

    /// Splits `step` before content index `at`; the leading part becomes a
    /// new step named `new_name` placed before it.
    pub fn split_step(&mut self, step: StepId, at: usize, new_name: Option<String>) -> Result<bool> {
        if !FieldSplit::can_split(&self.document, step) {
            return Ok(false);
        }
        let edit = FieldSplit::at(&self.document, step, at, new_name)?;
        self.push(edit)
    }

    pub fn indent_right(&mut self) -> Result<bool> {
        let selected = self.selection();
        if !IndentRight::can_indent_right(&self.document, &selected) {
            return Ok(false);
        }
        let edit = IndentRight::from_steps(&self.document, &selected)?;
        self.push(edit)
    }

    pub fn indent_left(&mut self) -> Result<bool> {
        let selected = self.selection();
        if !IndentLeft::can_indent_left(&self.document, &selected) {
            return Ok(false);
        }
        let edit = IndentLeft::from_steps(&self.document, &selected)?;
        self.push(edit)
    }

    pub fn move_down(&mut self) -> Result<bool> {
        self.move_selection(Direction::Down)
    }

    pub fn move_up(&mut self) -> Result<bool> {
        self.move_selection(Direction::Up)
    }

    fn move_selection(&mut self, direction: Direction) -> Result<bool> {
        let selected = self.selection();
        if !MoveSteps::can_move(&self.document, &selected, direction) {
            return Ok(false);
        }
        let edit = MoveSteps::from_steps(&self.document, &selected, direction)?;
        self.push(edit)
    }

    pub fn delete_selected(&mut self) -> Result<bool> {
        let selected = self.selection();
        if !DeleteSteps::can_delete(&self.document, &selected) {
            return Ok(false);
        }
        let edit = DeleteSteps::from_steps(&self.document, &selected)?;
        self.push(edit)
    }

    // Content

    /// Replaces a step's name and body.
    pub fn edit_step(
        &mut self,
        step: StepId,
        name: Option<String>,
        content: Vec<ContentItem>,
    ) -> Result<bool> {
        if !self.live(step) {
            return Ok(false);
        }
        let edit = FieldContentEdit::new(&self.document, step, name, content)?;
        self.push(edit)
    }

    pub fn rename_step(&mut self, step: StepId, name: Option<String>) -> Result<bool> {
        if !self.live(step) {
            return Ok(false);
        }
        let edit = FieldContentEdit::rename(&self.document, step, name)?;
        self.push(edit)
    }

    pub fn add_text(&mut self, step: StepId, text: impl Into<String>) -> Result<bool> {
        self.append_content(step, ContentItem::text(text))
    }

    pub fn add_parameter(&mut self, step: StepId, parameter: Parameter) -> Result<bool> {
        self.append_content(step, ContentItem::Parameter(parameter))
    }

    fn append_content(&mut self, step: StepId, item: ContentItem) -> Result<bool> {
        if !self.live(step) {
            return Ok(false);
        }
        let edit = ChangeParam::append(&self.document, step, item)?;
        self.push(edit)
    }

    /// Replaces the content item at `index`, keeping the old item's name.
    pub fn replace_content(&mut self, step: StepId, index: usize, item: ContentItem) -> Result<bool> {
        if !self.live(step) {
            return Ok(false);
        }
        let edit = ChangeParam::swap(&self.document, step, index, item)?;
        self.push(edit)
    }

    pub fn remove_content(&mut self, step: StepId, index: usize) -> Result<bool> {
        if !self.live(step) {
            return Ok(false);
        }
        let edit = ChangeParam::delete(&self.document, step, index)?;
        self.push(edit)
    }

    // Annotations

    pub fn add_note(&mut self, step: StepId, note: Note) -> Result<bool> {
        if !self.live(step) {
            return Ok(false);
        }
        let edit = AddStepNote::add(&self.document, step, note)?;
        self.push(edit)
    }

    pub fn remove_note(&mut self, step: StepId, index: usize) -> Result<bool> {
        if !self.live(step) {
            return Ok(false);
        }
        let edit = AddStepNote::remove(&self.document, step, index)?;
        self.push(edit)
    }

    pub fn add_data_ref(&mut self, step: StepId, data_ref: DataReference) -> Result<bool> {
        if !self.live(step) {
            return Ok(false);
        }
        let edit = AddDataRef::add(&self.document, step, data_ref)?;
        self.push(edit)
    }

    pub fn remove_data_ref(&mut self, step: StepId, index: usize) -> Result<bool> {
        if !self.live(step) {
            return Ok(false);
        }
        let edit = AddDataRef::remove(&self.document, step, index)?;
        self.push(edit)
    }

    // Values and tables

    /// Clears every parameter value in the document. Nothing is recorded when
    /// no parameter holds a value.
    pub fn clear_all_values(&mut self) -> Result<bool> {
        let edit = ClearAllValues::new(&self.document);
        if edit.is_empty() {
            return Ok(false);
        }
        self.push(edit)
    }

    pub fn attach_value_table(&mut self, step: StepId) -> Result<bool> {
        if !ValueTableEdit::can_attach(&self.document, step) {
            return Ok(false);
        }
        let edit = ValueTableEdit::attach(&self.document, step)?;
        self.push(edit)
    }

    pub fn detach_value_table(&mut self, step: StepId) -> Result<bool> {
        if !ValueTableEdit::can_detach(&self.document, step) {
            return Ok(false);
        }
        let edit = ValueTableEdit::detach(&self.document, step)?;
        self.push(edit)
    }

    // Experiment

    pub fn add_experiment_info(&mut self, info: ExperimentInfo) -> Result<bool> {
        let edit = AddExperimentInfo::new(&self.document, info);
        self.push(edit)
    }

    /// Reverts a run to a template. A document without experiment info is
    /// already a template.
    pub fn remove_experiment_info(&mut self) -> Result<bool> {
        if !RemoveExperimentInfo::can_remove(&self.document) {
            return Ok(false);
        }
        let edit = RemoveExperimentInfo::new(&self.document)?;
        self.push(edit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewEvent;

    fn session() -> EditorSession {
        EditorSession::new(Document::default(), RecordingView::new(), &Config::default())
    }

    #[test]
    fn test_add_step_uses_default_name_and_requests_editing() {
        let mut session = session();
        assert!(session.add_step(None).unwrap());
        let root = session.document().root();
        let added = session.document().children(root).unwrap()[0];
        assert_eq!(session.document().step(added).unwrap().name(), Some("New Step"));
        assert_eq!(session.view().last_focus(), Some((added, true)));
    }

    #[test]
    fn test_editing_disabled_by_config() {
        let config = Config {
            edit_new_steps: false,
            ..Config::default()
        };
        let mut session = EditorSession::new(Document::default(), RecordingView::new(), &config);
        session.add_step(Some("Fix".to_string())).unwrap();
        assert!(matches!(
            session.view().events().last(),
            Some(ViewEvent::Focused { edit: false, .. })
        ));
    }

    #[test]
    fn test_noops_leave_history_empty() {
        let mut session = session();
        assert!(!session.indent_right().unwrap());
        assert!(!session.indent_left().unwrap());
        assert!(!session.move_down().unwrap());
        assert!(!session.move_up().unwrap());
        assert!(!session.delete_selected().unwrap());
        assert!(!session.clear_all_values().unwrap());
        assert!(!session.remove_experiment_info().unwrap());
        let root = session.document().root();
        assert!(!session.attach_value_table(root).unwrap());
        assert!(!session.detach_value_table(root).unwrap());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_edits_on_deleted_step_are_noops() {
        let mut session = session();
        session.add_step(Some("Fix".to_string())).unwrap();
        let root = session.document().root();
        let fix = session.document().children(root).unwrap()[0];
        session.view_mut().select([fix]);
        assert!(session.delete_selected().unwrap());
        assert!(!session.add_text(fix, "ignored").unwrap());
        assert!(!session.rename_step(fix, None).unwrap());
        assert_eq!(session.history().len(), 2);
    }
}
