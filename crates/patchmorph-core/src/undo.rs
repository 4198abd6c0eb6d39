//! Undo batching and a bounded undo/redo stack.

use crate::hooks::UndoSink;
use crate::model::{Model, ModelSnapshot};
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

/// Scope during which `set_*` calls on the model do not push undo.
///
/// Created by [`Model::begin_batch`]. Batches nest; when the outermost one is
/// dropped, a single snapshot of the state at entry is pushed if the model
/// no longer matches it.
pub struct UndoBatch<'a> {
    model: &'a mut Model,
}

impl<'a> UndoBatch<'a> {
    pub(crate) fn new(model: &'a mut Model) -> Self {
        Self { model }
    }
}

impl Deref for UndoBatch<'_> {
    type Target = Model;

    fn deref(&self) -> &Model {
        self.model
    }
}

impl DerefMut for UndoBatch<'_> {
    fn deref_mut(&mut self) -> &mut Model {
        self.model
    }
}

impl Drop for UndoBatch<'_> {
    fn drop(&mut self) {
        self.model.end_batch();
    }
}

/// Bounded undo/redo history of model snapshots.
///
/// Install on a model with `model.set_undo_sink(Some(stack.clone()))`; the
/// model pushes pre-change states, and the editor calls [`undo`](Self::undo)
/// and [`redo`](Self::redo) with the current state.
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo: VecDeque<ModelSnapshot>,
    redo: Vec<ModelSnapshot>,
    depth: usize,
}

impl UndoStack {
    pub fn new(depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            depth: depth.max(1),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Snapshot to restore, with `current` moved onto the redo stack.
    pub fn undo(&mut self, current: ModelSnapshot) -> Option<ModelSnapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Snapshot to restore, with `current` moved back onto the undo stack.
    pub fn redo(&mut self, current: ModelSnapshot) -> Option<ModelSnapshot> {
        let next = self.redo.pop()?;
        self.push_bounded(current);
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn push_bounded(&mut self, snapshot: ModelSnapshot) {
        if self.undo.len() == self.depth {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(100)
    }
}

impl UndoSink for UndoStack {
    /// A fresh edit invalidates the redo history.
    fn push(&mut self, snapshot: ModelSnapshot) {
        if self.undo.back() == Some(&snapshot) {
            return;
        }
        self.redo.clear();
        self.push_bounded(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn model_with_stack() -> (Model, Rc<RefCell<UndoStack>>) {
        let mut model = Model::new();
        model.set_int("a", 0);
        model.set_bounds("a", 0, 10);
        model.set_int("b", 0);
        model.set_bounds("b", 0, 10);
        model.clear_last_key();
        let stack = Rc::new(RefCell::new(UndoStack::new(8)));
        model.set_undo_sink(Some(stack.clone()));
        (model, stack)
    }

    #[test]
    fn test_batch_pushes_once() {
        let (mut model, stack) = model_with_stack();
        {
            let mut batch = model.begin_batch();
            batch.set_int("a", 1);
            batch.set_int("b", 2);
            batch.set_int("a", 3);
            assert_eq!(stack.borrow().undo_len(), 0);
        }
        assert_eq!(stack.borrow().undo_len(), 1);
        let pushed = stack.borrow_mut().undo(model.snapshot()).unwrap();
        assert_eq!(pushed.get("a").unwrap().value.as_int(), Some(0));
        assert_eq!(pushed.get("b").unwrap().value.as_int(), Some(0));
    }

    #[test]
    fn test_unchanged_batch_pushes_nothing() {
        let (mut model, stack) = model_with_stack();
        {
            let mut batch = model.begin_batch();
            batch.set_int("a", 5);
            batch.set_int("a", 0);
        }
        assert_eq!(stack.borrow().undo_len(), 0);
    }

    #[test]
    fn test_nested_batches() {
        let (mut model, stack) = model_with_stack();
        {
            let mut outer = model.begin_batch();
            outer.set_int("a", 1);
            {
                let mut inner = outer.begin_batch();
                inner.set_int("b", 1);
            }
            assert_eq!(stack.borrow().undo_len(), 0);
            assert!(outer.is_batching());
        }
        assert!(!model.is_batching());
        assert_eq!(stack.borrow().undo_len(), 1);
    }

    #[test]
    fn test_undo_redo_cycle() {
        let (mut model, stack) = model_with_stack();
        model.set_int("a", 4);
        model.set_int("b", 7);
        assert_eq!(stack.borrow().undo_len(), 2);

        let prev = stack.borrow_mut().undo(model.snapshot()).unwrap();
        model.restore(&prev);
        assert_eq!(model.get_int("b", -1), 0);
        assert!(stack.borrow().can_redo());

        let next = stack.borrow_mut().redo(model.snapshot()).unwrap();
        model.restore(&next);
        assert_eq!(model.get_int("b", -1), 7);
        assert!(!stack.borrow().can_redo());
    }

    #[test]
    fn test_depth_bound() {
        let mut stack = UndoStack::new(2);
        for v in 0..5 {
            let mut m = Model::new();
            m.set_int("a", v);
            stack.push(m.snapshot());
        }
        assert_eq!(stack.undo_len(), 2);
    }
}
