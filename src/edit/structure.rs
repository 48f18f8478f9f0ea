//! Edits that change the shape of the step tree.
//!
//! Structural edits capture positions as `(step, parent, index)` triples at
//! construction. Those captures are the only source of truth on undo: if the
//! tree no longer matches them the edit fails with
//! [`EditError::Consistency`] instead of guessing a new position.

use std::collections::{HashMap, HashSet};

use super::{consistency, ensure_attached};
use crate::document::content::ContentItem;
use crate::document::step::Step;
use crate::document::tree::{Document, StepId};
use crate::error::{EditError, Result};
use crate::view::ViewAdapter;

/// Where a step sat before an edit moved it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub step: StepId,
    pub parent: StepId,
    pub index: usize,
}

/// A contiguous run of siblings, in child order.
#[derive(Debug, Clone)]
struct SiblingRun {
    parent: StepId,
    first: usize,
    steps: Vec<StepId>,
}

impl SiblingRun {
    fn last(&self) -> usize {
        self.first + self.steps.len() - 1
    }

    fn placements(&self) -> Vec<Placement> {
        self.steps
            .iter()
            .enumerate()
            .map(|(k, &step)| Placement {
                step,
                parent: self.parent,
                index: self.first + k,
            })
            .collect()
    }
}

/// Groups `selected` into a run of adjacent siblings. Returns `None` if the
/// selection is empty, contains the root or a detached step, spans several
/// parents, or has gaps.
fn sibling_run(doc: &Document, selected: &[StepId]) -> Option<SiblingRun> {
    let first = *selected.first()?;
    let parent = doc.parent_of(first)?;
    if !doc.is_attached(parent) {
        return None;
    }
    let mut indexed = Vec::with_capacity(selected.len());
    for &step in selected {
        if doc.parent_of(step) != Some(parent) {
            return None;
        }
        indexed.push((doc.index_in_parent(step)?, step));
    }
    indexed.sort_unstable();
    indexed.dedup();
    let start = indexed[0].0;
    let contiguous = indexed
        .iter()
        .enumerate()
        .all(|(k, &(index, _))| index == start + k);
    if !contiguous {
        return None;
    }
    Some(SiblingRun {
        parent,
        first: start,
        steps: indexed.into_iter().map(|(_, step)| step).collect(),
    })
}

fn check_in_place(doc: &Document, placements: &[Placement]) -> Result<()> {
    for p in placements {
        doc.step(p.step)?;
        if doc.parent_of(p.step) != Some(p.parent) || doc.index_in_parent(p.step) != Some(p.index) {
            return Err(consistency(format!(
                "{} is no longer at index {} of {}",
                p.step, p.index, p.parent
            )));
        }
    }
    Ok(())
}

/// Verifies that detached `placements` can be reinserted in order at their
/// captured indices.
fn check_restorable(doc: &Document, placements: &[Placement]) -> Result<()> {
    let mut lengths: HashMap<StepId, usize> = HashMap::new();
    for p in placements {
        let len = match lengths.get(&p.parent) {
            Some(&len) => len,
            None => doc.children(p.parent)?.len(),
        };
        if p.index > len {
            return Err(consistency(format!(
                "cannot restore {} at index {} of {} with {} children",
                p.step, p.index, p.parent, len
            )));
        }
        lengths.insert(p.parent, len + 1);
    }
    Ok(())
}

fn restore(doc: &mut Document, placements: &[Placement]) -> Result<()> {
    for p in placements {
        doc.insert_child(p.parent, p.index, p.step)?;
    }
    Ok(())
}

fn focus_first(view: &mut dyn ViewAdapter, placements: &[Placement]) {
    if let Some(p) = placements.first() {
        view.focus_and_edit(p.step, false);
    }
}

/// Inserts a new step after the current selection.
#[derive(Debug, Clone)]
pub struct AddField {
    template: Step,
    parent: StepId,
    index: usize,
    created: Option<StepId>,
    edit_on_insert: bool,
    applied: bool,
}

impl AddField {
    pub const LABEL: &'static str = "Add Step";

    /// Resolves the insertion point from the view's selection.
    ///
    /// With nothing selected, or with the root as the last selected step, the
    /// new step becomes the root's last child. Otherwise it is inserted right
    /// after the last selected step.
    pub fn new(doc: &Document, view: &dyn ViewAdapter, step: Step) -> Self {
        let root = doc.root();
        let anchor = view
            .selected_steps()
            .last()
            .copied()
            .filter(|&last| last != root && doc.is_attached(last))
            .and_then(|last| Some((doc.parent_of(last)?, doc.index_in_parent(last)? + 1)));
        let (parent, index) = match anchor {
            Some(found) => found,
            None => (root, doc.step(root).map_or(0, |r| r.children().len())),
        };
        Self {
            template: step,
            parent,
            index,
            created: None,
            edit_on_insert: true,
            applied: false,
        }
    }

    /// Whether applying asks the view to begin in-place editing.
    pub fn with_editing(mut self, edit: bool) -> Self {
        self.edit_on_insert = edit;
        self
    }

    pub fn parent(&self) -> StepId {
        self.parent
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The inserted step, once applied.
    pub fn step(&self) -> Option<StepId> {
        self.created
    }

    pub fn label(&self) -> &'static str {
        Self::LABEL
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        let len = doc.children(self.parent)?.len();
        if self.index > len {
            return Err(consistency(format!(
                "insertion index {} exceeds {} children of {}",
                self.index, len, self.parent
            )));
        }
        let id = match self.created {
            Some(id) => {
                if doc.step(id)?.parent().is_some() {
                    return Err(EditError::AlreadyAttached(id));
                }
                id
            }
            None => {
                let id = doc.create_step(self.template.clone());
                self.created = Some(id);
                id
            }
        };
        doc.insert_child(self.parent, self.index, id)?;
        self.applied = true;
        view.notify_changed(self.parent);
        view.focus_and_edit(id, self.edit_on_insert);
        Ok(())
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        let id = self
            .created
            .ok_or_else(|| consistency("undo of a step that was never added"))?;
        check_in_place(
            doc,
            &[Placement {
                step: id,
                parent: self.parent,
                index: self.index,
            }],
        )?;
        doc.remove_child(self.parent, id)?;
        self.applied = false;
        view.notify_changed(self.parent);
        view.focus_and_edit(self.parent, false);
        Ok(())
    }

    pub(crate) fn discard(self, doc: &mut Document, applied: bool) {
        if let (Some(id), false) = (self.created, applied || self.applied) {
            doc.release_if_detached(id);
        }
    }
}

/// Splits one step into two: a new step holding the first part of the body is
/// inserted directly before the original, which keeps the rest.
#[derive(Debug, Clone)]
pub struct FieldSplit {
    step: StepId,
    first: Vec<ContentItem>,
    second: Vec<ContentItem>,
    new_name: Option<String>,
    old_name: Option<String>,
    old_content: Vec<ContentItem>,
    created: Option<StepId>,
    applied: bool,
}

impl FieldSplit {
    pub const LABEL: &'static str = "Split Step";

    /// The root has no parent to receive a sibling and cannot be split.
    pub fn can_split(doc: &Document, step: StepId) -> bool {
        step != doc.root() && doc.is_attached(step)
    }

    pub fn new(
        doc: &Document,
        step: StepId,
        first: Vec<ContentItem>,
        second: Vec<ContentItem>,
        new_name: Option<String>,
    ) -> Result<Self> {
        if step == doc.root() {
            return Err(EditError::RootStep("split"));
        }
        ensure_attached(doc, step)?;
        let target = doc.step(step)?;
        Ok(Self {
            step,
            first,
            second,
            new_name,
            old_name: target.name().map(str::to_string),
            old_content: target.content().to_vec(),
            created: None,
            applied: false,
        })
    }

    /// Splits the body before content index `at`.
    pub fn at(doc: &Document, step: StepId, at: usize, new_name: Option<String>) -> Result<Self> {
        let content = doc.step(step)?.content();
        if at > content.len() {
            return Err(EditError::IndexOutOfBounds {
                what: "content",
                index: at,
                len: content.len(),
            });
        }
        let (first, second) = content.split_at(at);
        Self::new(doc, step, first.to_vec(), second.to_vec(), new_name)
    }

    pub fn step(&self) -> StepId {
        self.step
    }

    /// The step holding the first part, once applied.
    pub fn created(&self) -> Option<StepId> {
        self.created
    }

    pub fn label(&self) -> &'static str {
        Self::LABEL
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        doc.step(self.step)?;
        let parent = doc
            .parent_of(self.step)
            .ok_or_else(|| consistency(format!("{} has no parent to split into", self.step)))?;
        // Recomputed every time: earlier edits may have shifted the step.
        let index = doc
            .index_in_parent(self.step)
            .ok_or_else(|| consistency(format!("{} is missing from its parent", self.step)))?;
        let created = match self.created {
            Some(id) => {
                if doc.step(id)?.parent().is_some() {
                    return Err(EditError::AlreadyAttached(id));
                }
                id
            }
            None => {
                let id = doc.create_step(Step::new());
                self.created = Some(id);
                id
            }
        };
        doc.insert_child(parent, index, created)?;

        let piece = doc.step_mut(created)?;
        piece.replace_content(self.first.clone());
        piece.set_name(self.new_name.clone());
        let original = doc.step_mut(self.step)?;
        original.replace_content(self.second.clone());
        original.set_name(None);

        self.applied = true;
        view.notify_changed(parent);
        view.focus_and_edit(created, false);
        Ok(())
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        let created = self
            .created
            .ok_or_else(|| consistency("undo of a split that was never applied"))?;
        doc.step(self.step)?;
        let parent = doc
            .parent_of(self.step)
            .ok_or_else(|| consistency(format!("{} has no parent", self.step)))?;
        let expected = doc.index_in_parent(self.step).and_then(|i| i.checked_sub(1));
        if doc.parent_of(created) != Some(parent) || doc.index_in_parent(created) != expected {
            return Err(consistency(format!(
                "{} no longer directly precedes {}",
                created, self.step
            )));
        }
        doc.remove_child(parent, created)?;
        let original = doc.step_mut(self.step)?;
        original.replace_content(self.old_content.clone());
        original.set_name(self.old_name.clone());

        self.applied = false;
        view.notify_changed(parent);
        view.focus_and_edit(self.step, false);
        Ok(())
    }

    pub(crate) fn discard(self, doc: &mut Document, applied: bool) {
        if let (Some(id), false) = (self.created, applied || self.applied) {
            doc.release_if_detached(id);
        }
    }
}

/// Moves a run of siblings under the sibling that precedes them.
#[derive(Debug, Clone)]
pub struct IndentRight {
    moved: Vec<Placement>,
    new_parent: StepId,
}

impl IndentRight {
    pub const LABEL: &'static str = "Indent Steps";

    /// True if `selected` is a run of siblings with a preceding sibling.
    pub fn can_indent_right(doc: &Document, selected: &[StepId]) -> bool {
        sibling_run(doc, selected).is_some_and(|run| run.first > 0)
    }

    /// Indents the view's current selection.
    pub fn new(doc: &Document, view: &dyn ViewAdapter) -> Result<Self> {
        Self::from_steps(doc, &view.selected_steps())
    }

    pub fn from_steps(doc: &Document, steps: &[StepId]) -> Result<Self> {
        let run = sibling_run(doc, steps)
            .filter(|run| run.first > 0)
            .ok_or(EditError::Precondition("indent needs siblings with a preceding step"))?;
        let new_parent = doc.children(run.parent)?[run.first - 1];
        Ok(Self {
            moved: run.placements(),
            new_parent,
        })
    }

    pub fn moved(&self) -> &[Placement] {
        &self.moved
    }

    pub fn new_parent(&self) -> StepId {
        self.new_parent
    }

    pub fn label(&self) -> &'static str {
        Self::LABEL
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        check_in_place(doc, &self.moved)?;
        let old_parent = self.moved[0].parent;
        if doc.next_sibling(self.new_parent) != Some(self.moved[0].step) {
            return Err(consistency(format!(
                "{} no longer precedes the indented steps",
                self.new_parent
            )));
        }
        for p in &self.moved {
            doc.remove_child(p.parent, p.step)?;
            doc.append_child(self.new_parent, p.step)?;
        }
        view.notify_changed(old_parent);
        view.notify_changed(self.new_parent);
        focus_first(view, &self.moved);
        Ok(())
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        let children = doc.children(self.new_parent)?;
        let count = self.moved.len();
        let trailing = children.len().checked_sub(count).map(|start| &children[start..]);
        let in_place = trailing.is_some_and(|tail| {
            tail.iter().zip(&self.moved).all(|(&child, p)| child == p.step)
        });
        if !in_place {
            return Err(consistency(format!(
                "indented steps are no longer the last children of {}",
                self.new_parent
            )));
        }
        let old_parent = self.moved[0].parent;
        let detached_len = doc.children(old_parent)?.len();
        if self.moved[0].index > detached_len {
            return Err(consistency(format!(
                "cannot restore indented steps at index {} of {}",
                self.moved[0].index, old_parent
            )));
        }
        for p in self.moved.iter().rev() {
            doc.remove_child(self.new_parent, p.step)?;
        }
        restore(doc, &self.moved)?;
        view.notify_changed(self.new_parent);
        view.notify_changed(old_parent);
        focus_first(view, &self.moved);
        Ok(())
    }
}

/// Moves a run of siblings out of their parent, placing them right after it.
#[derive(Debug, Clone)]
pub struct IndentLeft {
    moved: Vec<Placement>,
    grandparent: StepId,
    insert_at: usize,
}

impl IndentLeft {
    pub const LABEL: &'static str = "Outdent Steps";

    /// True if `selected` is a run of siblings below a non-root parent.
    pub fn can_indent_left(doc: &Document, selected: &[StepId]) -> bool {
        sibling_run(doc, selected).is_some_and(|run| run.parent != doc.root())
    }

    pub fn new(doc: &Document, view: &dyn ViewAdapter) -> Result<Self> {
        Self::from_steps(doc, &view.selected_steps())
    }

    pub fn from_steps(doc: &Document, steps: &[StepId]) -> Result<Self> {
        let run = sibling_run(doc, steps)
            .filter(|run| run.parent != doc.root())
            .ok_or(EditError::Precondition("outdent needs siblings below a nested step"))?;
        let grandparent = doc
            .parent_of(run.parent)
            .ok_or(EditError::Precondition("outdent needs siblings below a nested step"))?;
        let parent_index = doc
            .index_in_parent(run.parent)
            .ok_or_else(|| consistency(format!("{} is missing from its parent", run.parent)))?;
        Ok(Self {
            moved: run.placements(),
            grandparent,
            insert_at: parent_index + 1,
        })
    }

    pub fn moved(&self) -> &[Placement] {
        &self.moved
    }

    pub fn label(&self) -> &'static str {
        Self::LABEL
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        check_in_place(doc, &self.moved)?;
        let old_parent = self.moved[0].parent;
        if doc.parent_of(old_parent) != Some(self.grandparent)
            || doc.index_in_parent(old_parent) != Some(self.insert_at - 1)
        {
            return Err(consistency(format!(
                "{} is no longer at index {} of {}",
                old_parent,
                self.insert_at - 1,
                self.grandparent
            )));
        }
        for (k, p) in self.moved.iter().enumerate() {
            doc.remove_child(p.parent, p.step)?;
            doc.insert_child(self.grandparent, self.insert_at + k, p.step)?;
        }
        view.notify_changed(old_parent);
        view.notify_changed(self.grandparent);
        focus_first(view, &self.moved);
        Ok(())
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        let outdented: Vec<Placement> = self
            .moved
            .iter()
            .enumerate()
            .map(|(k, p)| Placement {
                step: p.step,
                parent: self.grandparent,
                index: self.insert_at + k,
            })
            .collect();
        check_in_place(doc, &outdented)?;
        let old_parent = self.moved[0].parent;
        let len = doc.children(old_parent)?.len();
        if self.moved[0].index > len {
            return Err(consistency(format!(
                "cannot restore outdented steps at index {} of {}",
                self.moved[0].index, old_parent
            )));
        }
        for p in outdented.iter().rev() {
            doc.remove_child(self.grandparent, p.step)?;
        }
        restore(doc, &self.moved)?;
        view.notify_changed(self.grandparent);
        view.notify_changed(old_parent);
        focus_first(view, &self.moved);
        Ok(())
    }
}

/// Direction of a [`MoveSteps`] edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Swaps a run of siblings with the sibling just below or above it.
///
/// Moving down and moving up are exact inverses on the same run, so the edit
/// stores nothing but the run itself.
#[derive(Debug, Clone)]
pub struct MoveSteps {
    steps: Vec<StepId>,
    direction: Direction,
}

impl MoveSteps {
    pub fn can_move(doc: &Document, selected: &[StepId], direction: Direction) -> bool {
        sibling_run(doc, selected).is_some_and(|run| Self::neighbour(doc, &run, direction).is_some())
    }

    pub fn can_move_down(doc: &Document, selected: &[StepId]) -> bool {
        Self::can_move(doc, selected, Direction::Down)
    }

    pub fn can_move_up(doc: &Document, selected: &[StepId]) -> bool {
        Self::can_move(doc, selected, Direction::Up)
    }

    pub fn down(doc: &Document, view: &dyn ViewAdapter) -> Result<Self> {
        Self::from_steps(doc, &view.selected_steps(), Direction::Down)
    }

    pub fn up(doc: &Document, view: &dyn ViewAdapter) -> Result<Self> {
        Self::from_steps(doc, &view.selected_steps(), Direction::Up)
    }

    pub fn from_steps(doc: &Document, steps: &[StepId], direction: Direction) -> Result<Self> {
        let run = sibling_run(doc, steps)
            .filter(|run| Self::neighbour(doc, run, direction).is_some())
            .ok_or(match direction {
                Direction::Down => EditError::Precondition("move down needs a following sibling"),
                Direction::Up => EditError::Precondition("move up needs a preceding sibling"),
            })?;
        Ok(Self {
            steps: run.steps,
            direction,
        })
    }

    fn neighbour(doc: &Document, run: &SiblingRun, direction: Direction) -> Option<StepId> {
        let children = doc.children(run.parent).ok()?;
        match direction {
            Direction::Down => children.get(run.last() + 1).copied(),
            Direction::Up => run.first.checked_sub(1).map(|i| children[i]),
        }
    }

    pub fn steps(&self) -> &[StepId] {
        &self.steps
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn label(&self) -> &'static str {
        match self.direction {
            Direction::Down => "Move Steps Down",
            Direction::Up => "Move Steps Up",
        }
    }

    fn shift(&self, doc: &mut Document, view: &mut dyn ViewAdapter, direction: Direction) -> Result<()> {
        let run = sibling_run(doc, &self.steps)
            .filter(|run| run.steps == self.steps)
            .ok_or_else(|| consistency("moved steps are no longer adjacent siblings"))?;
        let neighbour = Self::neighbour(doc, &run, direction)
            .ok_or_else(|| consistency("moved steps no longer have a sibling to swap with"))?;
        doc.remove_child(run.parent, neighbour)?;
        let target = match direction {
            Direction::Down => run.first,
            Direction::Up => run.last(),
        };
        doc.insert_child(run.parent, target, neighbour)?;
        view.notify_changed(run.parent);
        view.focus_and_edit(self.steps[0], false);
        Ok(())
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        self.shift(doc, view, self.direction)
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        self.shift(doc, view, self.direction.opposite())
    }
}

/// Detaches the selected steps together with their subtrees.
#[derive(Debug, Clone)]
pub struct DeleteSteps {
    removed: Vec<Placement>,
    applied: bool,
}

impl DeleteSteps {
    pub const LABEL: &'static str = "Delete Steps";

    pub fn can_delete(doc: &Document, selected: &[StepId]) -> bool {
        !Self::placements(doc, selected).is_empty()
    }

    pub fn new(doc: &Document, view: &dyn ViewAdapter) -> Result<Self> {
        Self::from_steps(doc, &view.selected_steps())
    }

    /// Steps nested under another selected step go along with it and are not
    /// captured separately.
    pub fn from_steps(doc: &Document, steps: &[StepId]) -> Result<Self> {
        let removed = Self::placements(doc, steps);
        if removed.is_empty() {
            return Err(EditError::Precondition("nothing deletable is selected"));
        }
        Ok(Self {
            removed,
            applied: false,
        })
    }

    fn placements(doc: &Document, steps: &[StepId]) -> Vec<Placement> {
        let root = doc.root();
        let selected: HashSet<StepId> = steps
            .iter()
            .copied()
            .filter(|&s| s != root && doc.is_attached(s))
            .collect();
        doc.traverse()
            .into_iter()
            .filter(|s| selected.contains(s))
            .filter(|&s| {
                let mut ancestor = doc.parent_of(s);
                while let Some(a) = ancestor {
                    if selected.contains(&a) {
                        return false;
                    }
                    ancestor = doc.parent_of(a);
                }
                true
            })
            .filter_map(|step| {
                Some(Placement {
                    step,
                    parent: doc.parent_of(step)?,
                    index: doc.index_in_parent(step)?,
                })
            })
            .collect()
    }

    pub fn removed(&self) -> &[Placement] {
        &self.removed
    }

    pub fn label(&self) -> &'static str {
        Self::LABEL
    }

    pub fn apply(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        check_in_place(doc, &self.removed)?;
        for p in self.removed.iter().rev() {
            doc.remove_child(p.parent, p.step)?;
        }
        self.applied = true;
        for p in &self.removed {
            view.notify_changed(p.parent);
        }
        view.focus_and_edit(self.removed[0].parent, false);
        Ok(())
    }

    pub fn undo(&mut self, doc: &mut Document, view: &mut dyn ViewAdapter) -> Result<()> {
        for p in &self.removed {
            if doc.step(p.step)?.parent().is_some() {
                return Err(EditError::AlreadyAttached(p.step));
            }
        }
        check_restorable(doc, &self.removed)?;
        restore(doc, &self.removed)?;
        self.applied = false;
        for p in &self.removed {
            view.notify_changed(p.parent);
        }
        focus_first(view, &self.removed);
        Ok(())
    }

    pub(crate) fn discard(self, doc: &mut Document, applied: bool) {
        if applied && self.applied {
            for p in &self.removed {
                doc.release_if_detached(p.step);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{NullView, RecordingView};

    fn doc_with(names: &[&str]) -> (Document, Vec<StepId>) {
        let mut doc = Document::default();
        let root = doc.root();
        let ids = names
            .iter()
            .map(|n| doc.append_new(root, Step::named(*n)).unwrap())
            .collect();
        (doc, ids)
    }

    #[test]
    fn test_sibling_run_sorts_and_rejects_gaps() {
        let (doc, ids) = doc_with(&["A", "B", "C", "D"]);
        let run = sibling_run(&doc, &[ids[2], ids[1]]).unwrap();
        assert_eq!(run.first, 1);
        assert_eq!(run.steps, vec![ids[1], ids[2]]);
        assert!(sibling_run(&doc, &[ids[0], ids[2]]).is_none());
        assert!(sibling_run(&doc, &[doc.root()]).is_none());
        assert!(sibling_run(&doc, &[]).is_none());
    }

    #[test]
    fn test_add_field_after_nested_selection() {
        let (mut doc, ids) = doc_with(&["A", "B"]);
        let inner = doc.append_new(ids[0], Step::named("A1")).unwrap();
        let mut view = RecordingView::new();
        view.select([inner]);

        let mut edit = AddField::new(&doc, &view, Step::named("A2")).with_editing(false);
        assert_eq!(edit.parent(), ids[0]);
        assert_eq!(edit.index(), 1);
        edit.apply(&mut doc, &mut view).unwrap();
        let created = edit.step().unwrap();
        assert_eq!(doc.children(ids[0]).unwrap(), &[inner, created]);
        assert_eq!(view.last_focus(), Some((created, false)));
    }

    #[test]
    fn test_add_field_redo_reuses_handle() {
        let (mut doc, _) = doc_with(&["A"]);
        let mut view = NullView;
        let mut edit = AddField::new(&doc, &view, Step::named("B"));
        edit.apply(&mut doc, &mut view).unwrap();
        let first = edit.step().unwrap();
        edit.undo(&mut doc, &mut view).unwrap();
        edit.apply(&mut doc, &mut view).unwrap();
        assert_eq!(edit.step(), Some(first));
    }

    #[test]
    fn test_add_field_undo_detects_moved_step() {
        let (mut doc, _) = doc_with(&["A"]);
        let root = doc.root();
        let mut view = NullView;
        let mut edit = AddField::new(&doc, &view, Step::named("B"));
        edit.apply(&mut doc, &mut view).unwrap();
        let outside = doc.create_step(Step::named("X"));
        doc.insert_child(root, 0, outside).unwrap();
        assert!(matches!(
            edit.undo(&mut doc, &mut view),
            Err(EditError::Consistency(_))
        ));
    }

    #[test]
    fn test_split_root_rejected() {
        let (doc, _) = doc_with(&[]);
        assert!(!FieldSplit::can_split(&doc, doc.root()));
        assert_eq!(
            FieldSplit::new(&doc, doc.root(), vec![], vec![], None).unwrap_err(),
            EditError::RootStep("split")
        );
    }

    #[test]
    fn test_split_at_beyond_content_fails() {
        let (doc, ids) = doc_with(&["A"]);
        assert!(matches!(
            FieldSplit::at(&doc, ids[0], 1, None),
            Err(EditError::IndexOutOfBounds { index: 1, len: 0, .. })
        ));
    }

    #[test]
    fn test_indent_requires_preceding_sibling() {
        let (doc, ids) = doc_with(&["A", "B"]);
        assert!(!IndentRight::can_indent_right(&doc, &[ids[0]]));
        assert!(IndentRight::can_indent_right(&doc, &[ids[1]]));
        assert!(IndentRight::from_steps(&doc, &[ids[0]]).is_err());
    }

    #[test]
    fn test_outdent_places_after_parent() {
        let (mut doc, ids) = doc_with(&["A", "B"]);
        let a1 = doc.append_new(ids[0], Step::named("A1")).unwrap();
        let a2 = doc.append_new(ids[0], Step::named("A2")).unwrap();
        let a3 = doc.append_new(ids[0], Step::named("A3")).unwrap();
        let root = doc.root();
        let before = doc.snapshot();

        assert!(!IndentLeft::can_indent_left(&doc, &[ids[0]]));
        let mut edit = IndentLeft::from_steps(&doc, &[a2, a3]).unwrap();
        let mut view = NullView;
        edit.apply(&mut doc, &mut view).unwrap();
        assert_eq!(doc.children(root).unwrap(), &[ids[0], a2, a3, ids[1]]);
        assert_eq!(doc.children(ids[0]).unwrap(), &[a1]);

        edit.undo(&mut doc, &mut view).unwrap();
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn test_move_down_then_up_is_identity() {
        let (mut doc, ids) = doc_with(&["A", "B", "C", "D"]);
        let root = doc.root();
        let mut view = NullView;
        assert!(!MoveSteps::can_move_down(&doc, &[ids[3]]));
        assert!(!MoveSteps::can_move_up(&doc, &[ids[0]]));

        let mut edit = MoveSteps::from_steps(&doc, &[ids[1], ids[2]], Direction::Down).unwrap();
        edit.apply(&mut doc, &mut view).unwrap();
        assert_eq!(doc.children(root).unwrap(), &[ids[0], ids[3], ids[1], ids[2]]);
        edit.undo(&mut doc, &mut view).unwrap();
        assert_eq!(doc.children(root).unwrap(), ids.as_slice());
    }

    #[test]
    fn test_move_up() {
        let (mut doc, ids) = doc_with(&["A", "B", "C"]);
        let root = doc.root();
        let mut view = NullView;
        let mut edit = MoveSteps::from_steps(&doc, &[ids[1], ids[2]], Direction::Up).unwrap();
        assert_eq!(edit.label(), "Move Steps Up");
        edit.apply(&mut doc, &mut view).unwrap();
        assert_eq!(doc.children(root).unwrap(), &[ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn test_delete_skips_selected_descendants() {
        let (mut doc, ids) = doc_with(&["A", "B"]);
        let a1 = doc.append_new(ids[0], Step::named("A1")).unwrap();
        let edit = DeleteSteps::from_steps(&doc, &[a1, ids[0], doc.root()]).unwrap();
        assert_eq!(edit.removed().len(), 1);
        assert_eq!(edit.removed()[0].step, ids[0]);
    }

    #[test]
    fn test_delete_restores_across_parents() {
        let (mut doc, ids) = doc_with(&["A", "B", "C"]);
        let a1 = doc.append_new(ids[0], Step::named("A1")).unwrap();
        let a2 = doc.append_new(ids[0], Step::named("A2")).unwrap();
        let before = doc.snapshot();
        let mut view = NullView;

        let mut edit = DeleteSteps::from_steps(&doc, &[ids[2], a1, a2, ids[1]]).unwrap();
        edit.apply(&mut doc, &mut view).unwrap();
        assert_eq!(doc.children(doc.root()).unwrap(), &[ids[0]]);
        assert!(doc.children(ids[0]).unwrap().is_empty());

        edit.undo(&mut doc, &mut view).unwrap();
        assert_eq!(doc.snapshot(), before);
    }
}
