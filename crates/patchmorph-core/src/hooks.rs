//! Collaborator interfaces the model calls out to.
//!
//! Listeners and fixers receive `&mut Model` and may call back into it.

use crate::model::{Model, ModelSnapshot};
use std::rc::Rc;

/// Notified synchronously after a key changes.
pub trait ParameterListener {
    fn on_update(&self, key: &str, model: &mut Model);
}

impl<F> ParameterListener for F
where
    F: Fn(&str, &mut Model),
{
    fn on_update(&self, key: &str, model: &mut Model) {
        self(key, model)
    }
}

/// Shared listener handle. Identity (pointer equality) is what `unregister` matches on.
pub type ListenerHandle = Rc<dyn ParameterListener>;

/// Wrap a closure as a [`ListenerHandle`].
pub fn listener<F>(f: F) -> ListenerHandle
where
    F: Fn(&str, &mut Model) + 'static,
{
    Rc::new(f)
}

/// Cross-parameter consistency hook, run after every set even when
/// listener notification is suppressed.
///
/// Typically revises bounds of other keys that depend on `key`.
pub trait Fixer {
    fn fix(&self, key: &str, model: &mut Model);
}

impl<F> Fixer for F
where
    F: Fn(&str, &mut Model),
{
    fn fix(&self, key: &str, model: &mut Model) {
        self(key, model)
    }
}

/// Snaps a value proposed by the mutation engine onto what the synth accepts.
pub trait ReviseHook {
    fn revise(&self, key: &str, old: i32, proposed: i32) -> i32;
}

impl<F> ReviseHook for F
where
    F: Fn(&str, i32, i32) -> i32,
{
    fn revise(&self, key: &str, old: i32, proposed: i32) -> i32 {
        self(key, old, proposed)
    }
}

/// Receives the pre-change state of a model for undo.
pub trait UndoSink {
    fn push(&mut self, snapshot: ModelSnapshot);
}
