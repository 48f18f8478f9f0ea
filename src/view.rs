//! The narrow contract between the edit engine and whatever displays the tree.
//!
//! Edits only ever ask the view for the current selection, tell it which step
//! changed, and ask it to focus a step. [`RecordingView`] keeps a settable
//! selection and logs every call, which is enough to drive the engine from the
//! command line and from tests.

use crate::document::tree::StepId;

/// Callbacks an edit makes into the presenting layer.
pub trait ViewAdapter {
    /// Currently highlighted steps, in display order.
    fn selected_steps(&self) -> Vec<StepId>;

    /// Structure or content at `step` changed and should be redrawn.
    fn notify_changed(&mut self, step: StepId);

    /// Select `step`; when `edit` is true also begin in-place editing of it.
    fn focus_and_edit(&mut self, step: StepId, edit: bool);
}

/// A view that has no selection and ignores notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl ViewAdapter for NullView {
    fn selected_steps(&self) -> Vec<StepId> {
        Vec::new()
    }

    fn notify_changed(&mut self, _step: StepId) {}

    fn focus_and_edit(&mut self, _step: StepId, _edit: bool) {}
}

/// A call received by a [`RecordingView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    Changed(StepId),
    Focused { step: StepId, edit: bool },
}

/// A view with an explicit selection that records every callback.
///
/// Focus requests replace the selection, the way a tree widget moves its
/// highlight to the focused row.
#[derive(Debug, Default, Clone)]
pub struct RecordingView {
    selection: Vec<StepId>,
    events: Vec<ViewEvent>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, steps: impl IntoIterator<Item = StepId>) {
        self.selection = steps.into_iter().collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn events(&self) -> &[ViewEvent] {
        &self.events
    }

    /// Returns and clears the recorded events.
    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    /// The most recent focus request, if any.
    pub fn last_focus(&self) -> Option<(StepId, bool)> {
        self.events.iter().rev().find_map(|event| match *event {
            ViewEvent::Focused { step, edit } => Some((step, edit)),
            ViewEvent::Changed(_) => None,
        })
    }
}

impl ViewAdapter for RecordingView {
    fn selected_steps(&self) -> Vec<StepId> {
        self.selection.clone()
    }

    fn notify_changed(&mut self, step: StepId) {
        self.events.push(ViewEvent::Changed(step));
    }

    fn focus_and_edit(&mut self, step: StepId, edit: bool) {
        self.selection = vec![step];
        self.events.push(ViewEvent::Focused { step, edit });
    }
}
