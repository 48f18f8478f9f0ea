//! Arena-backed protocol document.
//!
//! [`Document`] owns every [`Step`] in a slot vector and hands out [`StepId`]
//! handles. A handle carries the slot's generation, so a handle to a released
//! step is detected instead of silently aliasing whatever reuses the slot.
//! Parent links are plain handles used for index lookups and reparenting;
//! ownership flows only through the arena.
//!
//! # Example
//!
//! ```
//! use stepquill::document::step::Step;
//! use stepquill::document::tree::Document;
//!
//! let mut doc = Document::new(Step::named("Immunostaining"));
//! let root = doc.root();
//! let fix = doc.append_new(root, Step::named("Fix")).unwrap();
//! let stain = doc.append_new(root, Step::named("Stain")).unwrap();
//!
//! assert_eq!(doc.children(root).unwrap(), &[fix, stain]);
//! assert_eq!(doc.index_in_parent(stain), Some(1));
//! assert_eq!(doc.previous_sibling(stain), Some(fix));
//!
//! let index = doc.remove_child(root, fix).unwrap();
//! assert_eq!(index, 0);
//! assert!(!doc.is_attached(fix));
//! ```

use indexmap::IndexMap;
use tracing::trace;

use super::content::{ContentItem, DataReference, ExperimentInfo, Note, ValueTable};
use super::step::Step;
use crate::error::{EditError, Result};

/// Stable handle to a step inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId {
    slot: u32,
    generation: u32,
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step#{}.{}", self.slot, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    step: Option<Step>,
}

/// The protocol document: an arena of steps rooted at a single step.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: StepId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Step::named("Protocol"))
    }
}

impl Document {
    /// Creates a document whose root is `root`. Any children or parent
    /// recorded on `root` are dropped.
    pub fn new(mut root: Step) -> Self {
        root.children.clear();
        root.parent = None;
        let root_id = StepId {
            slot: 0,
            generation: 0,
        };
        Self {
            slots: vec![Slot {
                generation: 0,
                step: Some(root),
            }],
            free: Vec::new(),
            root: root_id,
        }
    }

    pub fn root(&self) -> StepId {
        self.root
    }

    /// Returns true if `id` refers to a live step.
    pub fn contains(&self, id: StepId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: StepId) -> Option<&Step> {
        self.slots
            .get(id.slot as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.step.as_ref())
    }

    fn get_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.slots
            .get_mut(id.slot as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.step.as_mut())
    }

    pub fn step(&self, id: StepId) -> Result<&Step> {
        self.get(id).ok_or(EditError::StaleHandle(id))
    }

    /// Mutable access to a step's own data. Tree links stay private to the
    /// document.
    pub fn step_mut(&mut self, id: StepId) -> Result<&mut Step> {
        self.get_mut(id).ok_or(EditError::StaleHandle(id))
    }

    /// Number of live steps, attached or not.
    pub fn step_count(&self) -> usize {
        self.slots.iter().filter(|s| s.step.is_some()).count()
    }

    /// Allocates a detached step and returns its handle.
    pub fn create_step(&mut self, mut step: Step) -> StepId {
        step.children.clear();
        step.parent = None;
        let id = if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.step = Some(step);
            StepId {
                slot,
                generation: entry.generation,
            }
        } else {
            let slot = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                step: Some(step),
            });
            StepId {
                slot,
                generation: 0,
            }
        };
        trace!(%id, "allocated step");
        id
    }

    /// Allocates `step` and appends it as the last child of `parent`.
    pub fn append_new(&mut self, parent: StepId, step: Step) -> Result<StepId> {
        self.step(parent)?;
        let id = self.create_step(step);
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn children(&self, id: StepId) -> Result<&[StepId]> {
        Ok(self.step(id)?.children())
    }

    pub fn parent_of(&self, id: StepId) -> Option<StepId> {
        self.get(id).and_then(Step::parent)
    }

    pub fn index_in_parent(&self, id: StepId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.get(parent)?.children.iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: StepId) -> Option<StepId> {
        let parent = self.parent_of(id)?;
        let index = self.index_in_parent(id)?;
        let prev = index.checked_sub(1)?;
        self.get(parent)?.children.get(prev).copied()
    }

    pub fn next_sibling(&self, id: StepId) -> Option<StepId> {
        let parent = self.parent_of(id)?;
        let index = self.index_in_parent(id)?;
        self.get(parent)?.children.get(index + 1).copied()
    }

    /// Returns true if `ancestor` is `id` or lies on `id`'s parent chain.
    pub fn is_ancestor(&self, ancestor: StepId, id: StepId) -> bool {
        let mut current = Some(id);
        while let Some(step) = current {
            if step == ancestor {
                return true;
            }
            current = self.parent_of(step);
        }
        false
    }

    /// Returns true if `id` is live and reachable from the root.
    pub fn is_attached(&self, id: StepId) -> bool {
        self.contains(id) && self.is_ancestor(self.root, id)
    }

    /// Inserts a detached step at `index` among `parent`'s children.
    ///
    /// Fails with [`EditError::IndexOutOfBounds`] unless
    /// `0 <= index <= children.len()`.
    pub fn insert_child(&mut self, parent: StepId, index: usize, child: StepId) -> Result<()> {
        let len = self.step(parent)?.children.len();
        let child_step = self.step(child)?;
        if child == self.root {
            return Err(EditError::RootStep("reparented"));
        }
        if child_step.parent.is_some() {
            return Err(EditError::AlreadyAttached(child));
        }
        if self.is_ancestor(child, parent) {
            return Err(EditError::WouldCycle { parent, child });
        }
        if index > len {
            return Err(EditError::IndexOutOfBounds {
                what: "children",
                index,
                len,
            });
        }
        self.step_mut(child)?.parent = Some(parent);
        self.step_mut(parent)?.children.insert(index, child);
        Ok(())
    }

    pub fn append_child(&mut self, parent: StepId, child: StepId) -> Result<()> {
        let len = self.step(parent)?.children.len();
        self.insert_child(parent, len, child)
    }

    /// Detaches `child` from `parent` and returns the index it occupied.
    pub fn remove_child(&mut self, parent: StepId, child: StepId) -> Result<usize> {
        self.step(child)?;
        let index = self
            .step(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(EditError::NotAChild { parent, child })?;
        self.step_mut(parent)?.children.remove(index);
        self.step_mut(child)?.parent = None;
        Ok(index)
    }

    /// Frees a detached step and its whole subtree. Handles to any of them
    /// become stale.
    pub fn release(&mut self, id: StepId) -> Result<()> {
        if id == self.root {
            return Err(EditError::RootStep("released"));
        }
        if self.step(id)?.parent.is_some() {
            return Err(EditError::AlreadyAttached(id));
        }
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let slot = &mut self.slots[current.slot as usize];
            if let Some(step) = slot.step.take() {
                pending.extend(step.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.slot);
                trace!(id = %current, "released step");
            }
        }
        Ok(())
    }

    /// Releases `id` if it is live and detached; otherwise does nothing.
    pub(crate) fn release_if_detached(&mut self, id: StepId) {
        if id != self.root && self.get(id).is_some_and(|s| s.parent.is_none()) {
            // Live, detached, non-root: release cannot fail.
            let _ = self.release(id);
        }
    }

    /// All attached steps in document order (depth-first, pre-order).
    pub fn traverse(&self) -> Vec<StepId> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(step) = self.get(id) {
                stack.extend(step.children.iter().rev().copied());
            }
        }
        order
    }

    /// Resolves a path of child indices from the root.
    pub fn find_by_path(&self, path: &[usize]) -> Option<StepId> {
        let mut current = self.root;
        for &index in path {
            current = *self.get(current)?.children.get(index)?;
        }
        Some(current)
    }

    /// The child-index path from the root to `id`, if attached.
    pub fn path_of(&self, id: StepId) -> Option<Vec<usize>> {
        if !self.is_attached(id) {
            return None;
        }
        let mut path = Vec::new();
        let mut current = id;
        while let Some(index) = self.index_in_parent(current) {
            path.push(index);
            current = self.parent_of(current)?;
        }
        path.reverse();
        Some(path)
    }

    pub fn experiment_info(&self) -> Option<&ExperimentInfo> {
        self.get(self.root).and_then(Step::experiment_info)
    }

    /// Sets the root's experiment info, returning the previous value.
    pub fn set_experiment_info(
        &mut self,
        info: Option<ExperimentInfo>,
    ) -> Result<Option<ExperimentInfo>> {
        let root = self.root;
        Ok(self.step_mut(root)?.set_experiment_info(info))
    }

    /// Deep copy of the attached tree, for structural comparison.
    pub fn snapshot(&self) -> StepSnapshot {
        self.snapshot_of(self.root)
    }

    fn snapshot_of(&self, id: StepId) -> StepSnapshot {
        match self.get(id) {
            Some(step) => StepSnapshot {
                id,
                attributes: step.attributes().clone(),
                content: step.content().to_vec(),
                notes: step.notes().to_vec(),
                data_refs: step.data_refs().to_vec(),
                value_table: step.value_table().cloned(),
                experiment_info: step.experiment_info().cloned(),
                children: step
                    .children
                    .iter()
                    .map(|&child| self.snapshot_of(child))
                    .collect(),
            },
            None => StepSnapshot::stale(id),
        }
    }
}

/// Owned, recursive copy of a step subtree including handles.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSnapshot {
    pub id: StepId,
    pub attributes: IndexMap<String, String>,
    pub content: Vec<ContentItem>,
    pub notes: Vec<Note>,
    pub data_refs: Vec<DataReference>,
    pub value_table: Option<ValueTable>,
    pub experiment_info: Option<ExperimentInfo>,
    pub children: Vec<StepSnapshot>,
}

impl StepSnapshot {
    fn stale(id: StepId) -> Self {
        Self {
            id,
            attributes: IndexMap::new(),
            content: Vec::new(),
            notes: Vec::new(),
            data_refs: Vec::new(),
            value_table: None,
            experiment_info: None,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, StepId, StepId) {
        let mut doc = Document::default();
        let root = doc.root();
        let a = doc.append_new(root, Step::named("A")).unwrap();
        let b = doc.append_new(root, Step::named("B")).unwrap();
        (doc, a, b)
    }

    #[test]
    fn test_insert_child_rejects_index_past_end() {
        let (mut doc, _, _) = sample();
        let root = doc.root();
        let c = doc.create_step(Step::named("C"));
        assert_eq!(
            doc.insert_child(root, 3, c),
            Err(EditError::IndexOutOfBounds {
                what: "children",
                index: 3,
                len: 2
            })
        );
        doc.insert_child(root, 2, c).unwrap();
        assert_eq!(doc.index_in_parent(c), Some(2));
    }

    #[test]
    fn test_insert_attached_step_fails() {
        let (mut doc, a, b) = sample();
        assert_eq!(doc.insert_child(a, 0, b), Err(EditError::AlreadyAttached(b)));
    }

    #[test]
    fn test_insert_under_own_descendant_fails() {
        let (mut doc, a, _) = sample();
        let root = doc.root();
        let inner = doc.append_new(a, Step::named("inner")).unwrap();
        doc.remove_child(root, a).unwrap();
        assert_eq!(
            doc.insert_child(inner, 0, a),
            Err(EditError::WouldCycle {
                parent: inner,
                child: a
            })
        );
    }

    #[test]
    fn test_remove_child_reports_index() {
        let (mut doc, a, b) = sample();
        let root = doc.root();
        assert_eq!(doc.remove_child(root, b), Ok(1));
        assert_eq!(doc.parent_of(b), None);
        assert_eq!(
            doc.remove_child(root, b),
            Err(EditError::NotAChild { parent: root, child: b })
        );
        assert_eq!(doc.children(root).unwrap(), &[a]);
    }

    #[test]
    fn test_release_invalidates_subtree_handles() {
        let (mut doc, a, _) = sample();
        let root = doc.root();
        let inner = doc.append_new(a, Step::named("inner")).unwrap();
        doc.remove_child(root, a).unwrap();
        doc.release(a).unwrap();

        assert!(!doc.contains(a));
        assert!(!doc.contains(inner));
        assert_eq!(doc.step(inner).unwrap_err(), EditError::StaleHandle(inner));

        // Reused slots get fresh generations.
        let reused = doc.create_step(Step::named("D"));
        assert_ne!(reused, a);
        assert_ne!(reused, inner);
    }

    #[test]
    fn test_release_attached_step_fails() {
        let (mut doc, a, _) = sample();
        assert_eq!(doc.release(a), Err(EditError::AlreadyAttached(a)));
        assert_eq!(doc.release(doc.root()), Err(EditError::RootStep("released")));
    }

    #[test]
    fn test_traverse_is_preorder() {
        let (mut doc, a, b) = sample();
        let a1 = doc.append_new(a, Step::named("A1")).unwrap();
        let a2 = doc.append_new(a, Step::named("A2")).unwrap();
        assert_eq!(doc.traverse(), vec![doc.root(), a, a1, a2, b]);
    }

    #[test]
    fn test_paths_round_trip() {
        let (mut doc, a, _) = sample();
        let a1 = doc.append_new(a, Step::named("A1")).unwrap();
        assert_eq!(doc.path_of(a1), Some(vec![0, 0]));
        assert_eq!(doc.find_by_path(&[0, 0]), Some(a1));
        assert_eq!(doc.find_by_path(&[]), Some(doc.root()));
        assert_eq!(doc.find_by_path(&[5]), None);
    }

    #[test]
    fn test_snapshot_ignores_detached_steps() {
        let (mut doc, _, _) = sample();
        let before = doc.snapshot();
        doc.create_step(Step::named("floating"));
        assert_eq!(doc.snapshot(), before);
    }
}
