//! The parameter store: an ordered key/value table with bounds, status and listeners.
//!
//! Every `set_*` call runs the same sequence:
//!
//! 1. push the pre-change state to the undo sink (outside a batch, only when the
//!    key differs from the last one set and the value actually changes)
//! 2. store the value and remember the key as [`Model::last_key`]
//! 3. run the fixer, if any (always, even with notification off)
//! 4. notify listeners registered on the key, then listeners registered on all keys
//!
//! Querying bounds that were never declared logs a warning and yields 0: a
//! badly wired editor must keep running.

use crate::hooks::{Fixer, ListenerHandle, ReviseHook, UndoSink};
use crate::parameter::Parameter;
use crate::undo::UndoBatch;
use crate::value::{Status, Value};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// Shared undo sink handle.
pub type UndoHandle = Rc<RefCell<dyn UndoSink>>;

/// Listener-free image of a model, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub entries: Vec<(String, Parameter)>,
}

impl ModelSnapshot {
    pub fn get(&self, key: &str) -> Option<&Parameter> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Same keys, values, bounds and status as `model`.
    pub fn matches(&self, model: &Model) -> bool {
        self.entries.len() == model.params.len()
            && self.entries.iter().all(|(key, p)| {
                model
                    .params
                    .get(key)
                    .is_some_and(|q| p.value == q.value && p.same_shape(q))
            })
    }
}

#[derive(Default)]
struct BatchState {
    depth: usize,
    snapshot: Option<ModelSnapshot>,
}

pub struct Model {
    order: Vec<String>,
    params: HashMap<String, Parameter>,
    listeners: HashMap<String, Vec<ListenerHandle>>,
    any_listeners: Vec<ListenerHandle>,
    last_key: Option<String>,
    undo: Option<UndoHandle>,
    fixer: Option<Rc<dyn Fixer>>,
    reviser: Option<Rc<dyn ReviseHook>>,
    update_listeners: bool,
    batch: BatchState,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            params: HashMap::new(),
            listeners: HashMap::new(),
            any_listeners: Vec::new(),
            last_key: None,
            undo: None,
            fixer: None,
            reviser: None,
            update_listeners: true,
            batch: BatchState::default(),
        }
    }

    // =========================================================================
    // Setters
    // =========================================================================

    pub fn set_int(&mut self, key: &str, value: i32) {
        self.set_value(key, Value::Int(value));
    }

    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.set_value(key, Value::Str(value.into()));
    }

    /// Like [`set_int`](Self::set_int) but clamps into `[min, max]` when both are declared.
    ///
    /// No-op on string keys.
    pub fn set_bounded(&mut self, key: &str, value: i32) {
        if self.is_string(key) {
            return;
        }
        let value = match self.params.get(key).and_then(Parameter::bounds) {
            Some((min, max)) if min <= max => value.clamp(min, max),
            _ => value,
        };
        self.set_int(key, value);
    }

    pub fn set_value(&mut self, key: &str, value: Value) {
        let changed = self.params.get(key).map_or(true, |p| p.value != value);
        if changed && self.batch.depth == 0 && self.last_key.as_deref() != Some(key) {
            self.push_undo();
        }

        match self.params.get_mut(key) {
            Some(param) => param.value = value,
            None => {
                self.order.push(key.to_string());
                self.params.insert(key.to_string(), Parameter::new(value));
            }
        }
        self.last_key = Some(key.to_string());

        self.fix(key);
        if self.update_listeners {
            self.notify(key);
        }
    }

    /// Whether `set_*` notifies listeners. The fixer runs regardless.
    pub fn set_update_listeners(&mut self, update: bool) {
        self.update_listeners = update;
    }

    pub fn update_listeners(&self) -> bool {
        self.update_listeners
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key).map(|p| &p.value)
    }

    /// Integer value of `key`, or `default` if absent or a string.
    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        self.get(key).and_then(Value::as_int).unwrap_or(default)
    }

    /// String value of `key`, or `default` if absent or an integer.
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    pub fn parameter(&self, key: &str) -> Option<&Parameter> {
        self.params.get(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn is_string(&self, key: &str) -> bool {
        self.get(key).is_some_and(Value::is_str)
    }

    pub fn is_integer(&self, key: &str) -> bool {
        self.get(key).is_some_and(Value::is_int)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Key most recently written through a `set_*` call.
    pub fn last_key(&self) -> Option<&str> {
        self.last_key.as_deref()
    }

    pub fn clear_last_key(&mut self) {
        self.last_key = None;
    }

    /// All keys except restricted ones, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|k| self.status(k) != Status::Restricted)
            .cloned()
            .collect()
    }

    /// All keys including restricted ones, in insertion order.
    pub fn keys_all(&self) -> &[String] {
        &self.order
    }

    /// Keys the mutation engine may change: free integers with a usable range.
    pub fn mutation_keys(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|k| self.mutable_bounds(k).is_some())
            .cloned()
            .collect()
    }

    pub fn remove(&mut self, key: &str) -> Option<Parameter> {
        let removed = self.params.remove(key)?;
        self.order.retain(|k| k != key);
        if self.last_key.as_deref() == Some(key) {
            self.last_key = None;
        }
        Some(removed)
    }

    // =========================================================================
    // Bounds and status
    // =========================================================================

    fn param_or_create(&mut self, key: &str, what: &str) -> &mut Parameter {
        if !self.params.contains_key(key) {
            warn!("Setting {} of nonexistent key '{}', creating it", what, key);
            self.order.push(key.to_string());
        }
        self.params
            .entry(key.to_string())
            .or_insert_with(|| Parameter::new(Value::Int(0)))
    }

    pub fn set_min(&mut self, key: &str, min: i32) {
        self.param_or_create(key, "min").min = Some(min);
    }

    pub fn set_max(&mut self, key: &str, max: i32) {
        self.param_or_create(key, "max").max = Some(max);
    }

    pub fn set_bounds(&mut self, key: &str, min: i32, max: i32) {
        let param = self.param_or_create(key, "bounds");
        param.min = Some(min);
        param.max = Some(max);
    }

    pub fn set_metric_min(&mut self, key: &str, metric_min: i32) {
        self.param_or_create(key, "metric min").metric_min = Some(metric_min);
    }

    pub fn set_metric_max(&mut self, key: &str, metric_max: i32) {
        self.param_or_create(key, "metric max").metric_max = Some(metric_max);
    }

    pub fn set_metric_bounds(&mut self, key: &str, metric_min: i32, metric_max: i32) {
        let param = self.param_or_create(key, "metric bounds");
        param.metric_min = Some(metric_min);
        param.metric_max = Some(metric_max);
    }

    /// Removes the metric range, making the key fully categorical.
    pub fn clear_metric_bounds(&mut self, key: &str) {
        if let Some(param) = self.params.get_mut(key) {
            param.metric_min = None;
            param.metric_max = None;
        }
    }

    pub fn set_status(&mut self, key: &str, status: Status) {
        self.param_or_create(key, "status").status = Some(status);
    }

    /// Effective status; missing keys read as immutable.
    pub fn status(&self, key: &str) -> Status {
        self.params
            .get(key)
            .map_or(Status::Immutable, Parameter::status)
    }

    fn bound(&self, key: &str, what: &str, pick: impl Fn(&Parameter) -> Option<i32>) -> i32 {
        match self.params.get(key).and_then(pick) {
            Some(v) => v,
            None => {
                warn!("No {} declared for key '{}'", what, key);
                0
            }
        }
    }

    pub fn min(&self, key: &str) -> i32 {
        self.bound(key, "min", |p| p.min)
    }

    pub fn max(&self, key: &str) -> i32 {
        self.bound(key, "max", |p| p.max)
    }

    pub fn metric_min(&self, key: &str) -> i32 {
        self.bound(key, "metric min", |p| p.metric_min)
    }

    pub fn metric_max(&self, key: &str) -> i32 {
        self.bound(key, "metric max", |p| p.metric_max)
    }

    pub fn min_exists(&self, key: &str) -> bool {
        self.params.get(key).is_some_and(|p| p.min.is_some())
    }

    pub fn max_exists(&self, key: &str) -> bool {
        self.params.get(key).is_some_and(|p| p.max.is_some())
    }

    pub fn metric_min_exists(&self, key: &str) -> bool {
        self.params.get(key).is_some_and(|p| p.metric_min.is_some())
    }

    pub fn metric_max_exists(&self, key: &str) -> bool {
        self.params.get(key).is_some_and(|p| p.metric_max.is_some())
    }

    /// `max - min + 1`, or 0 if unbounded. Saturates at `i32::MAX`.
    pub fn range(&self, key: &str) -> i32 {
        self.params.get(key).map_or(0, Parameter::range)
    }

    pub fn bounds(&self, key: &str) -> Option<(i32, i32)> {
        self.params.get(key).and_then(Parameter::bounds)
    }

    pub fn metric_bounds(&self, key: &str) -> Option<(i32, i32)> {
        self.params.get(key).and_then(Parameter::metric_bounds)
    }

    /// `(min, max)` if the mutation engine may touch `key`.
    pub fn mutable_bounds(&self, key: &str) -> Option<(i32, i32)> {
        self.params.get(key).and_then(Parameter::mutable_bounds)
    }

    /// True when `key` has a metric range and its current value is inside it.
    pub fn is_in_metric_range(&self, key: &str) -> bool {
        self.params.get(key).is_some_and(|p| match p.value {
            Value::Int(v) => p.is_metric_value(v),
            Value::Str(_) => false,
        })
    }

    // =========================================================================
    // Hooks
    // =========================================================================

    pub fn set_undo_sink(&mut self, sink: Option<UndoHandle>) {
        self.undo = sink;
    }

    pub fn undo_sink(&self) -> Option<&UndoHandle> {
        self.undo.as_ref()
    }

    pub fn set_fixer(&mut self, fixer: Option<Rc<dyn Fixer>>) {
        self.fixer = fixer;
    }

    pub fn set_revise_hook(&mut self, reviser: Option<Rc<dyn ReviseHook>>) {
        self.reviser = reviser;
    }

    /// Run the fixer for `key`, if one is installed.
    pub fn fix(&mut self, key: &str) {
        if let Some(fixer) = self.fixer.clone() {
            fixer.fix(key, self);
        }
    }

    /// Pass a mutated value through the revise hook. Identity without one.
    pub fn revise(&self, key: &str, old: i32, proposed: i32) -> i32 {
        match &self.reviser {
            Some(reviser) => reviser.revise(key, old, proposed),
            None => proposed,
        }
    }

    fn push_undo(&self) {
        if let Some(sink) = &self.undo {
            debug!("Pushing undo snapshot ({} keys)", self.order.len());
            sink.borrow_mut().push(self.snapshot());
        }
    }

    // =========================================================================
    // Undo batching
    // =========================================================================

    /// Open an undo batch. Sets inside the batch never push; when the
    /// outermost batch closes, one snapshot of the state at entry is pushed
    /// if anything changed.
    pub fn begin_batch(&mut self) -> UndoBatch<'_> {
        if self.batch.depth == 0 && self.undo.is_some() {
            self.batch.snapshot = Some(self.snapshot());
        }
        self.batch.depth += 1;
        UndoBatch::new(self)
    }

    pub(crate) fn end_batch(&mut self) {
        self.batch.depth = self.batch.depth.saturating_sub(1);
        if self.batch.depth > 0 {
            return;
        }
        if let Some(before) = self.batch.snapshot.take() {
            if !before.matches(self) {
                if let Some(sink) = &self.undo {
                    debug!("Pushing batched undo snapshot");
                    sink.borrow_mut().push(before);
                }
            }
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch.depth > 0
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn register(&mut self, key: &str, listener: ListenerHandle) {
        self.listeners
            .entry(key.to_string())
            .or_default()
            .push(listener);
    }

    /// Register a listener on every key.
    pub fn register_all(&mut self, listener: ListenerHandle) {
        self.any_listeners.push(listener);
    }

    /// Returns `false` (and logs) if `listener` was not registered on `key`.
    pub fn unregister(&mut self, key: &str, listener: &ListenerHandle) -> bool {
        let removed = self
            .listeners
            .get_mut(key)
            .is_some_and(|list| remove_listener(list, listener));
        if !removed {
            warn!("Unregistering a listener never registered on '{}'", key);
        }
        removed
    }

    pub fn unregister_all(&mut self, listener: &ListenerHandle) -> bool {
        let removed = remove_listener(&mut self.any_listeners, listener);
        if !removed {
            warn!("Unregistering an all-keys listener never registered");
        }
        removed
    }

    pub fn listener_count(&self, key: &str) -> usize {
        self.listeners.get(key).map_or(0, Vec::len)
    }

    pub fn any_listener_count(&self) -> usize {
        self.any_listeners.len()
    }

    /// Call listeners on `key`, then all-keys listeners.
    pub fn notify(&mut self, key: &str) {
        let mut targets: Vec<ListenerHandle> =
            self.listeners.get(key).cloned().unwrap_or_default();
        targets.extend(self.any_listeners.iter().cloned());
        for listener in targets {
            listener.on_update(key, self);
        }
    }

    /// One notification pass over `keys`.
    pub fn notify_keys(&mut self, keys: &[String]) {
        for key in keys {
            if self.exists(key) {
                self.notify(key);
            }
        }
    }

    // =========================================================================
    // Copies and snapshots
    // =========================================================================

    /// Independent copy of values, bounds, status and synth hooks.
    ///
    /// No listeners, no undo sink, no last key.
    pub fn copy(&self) -> Model {
        Model {
            order: self.order.clone(),
            params: self.params.clone(),
            listeners: HashMap::new(),
            any_listeners: Vec::new(),
            last_key: None,
            undo: None,
            fixer: self.fixer.clone(),
            reviser: self.reviser.clone(),
            update_listeners: true,
            batch: BatchState::default(),
        }
    }

    /// Copy values for `keys` (all keys when `None`) into `other`, then run
    /// one notification pass over the target.
    pub fn copy_values_to(&self, other: &mut Model, keys: Option<&[String]>) {
        let keys: Vec<String> = match keys {
            Some(keys) => keys.to_vec(),
            None => self.order.clone(),
        };

        let mut target = other.begin_batch();
        let notify = target.update_listeners;
        target.update_listeners = false;
        for key in &keys {
            if let Some(param) = self.params.get(key) {
                target.set_value(key, param.value.clone());
            }
        }
        target.update_listeners = notify;
        target.last_key = None;
        if notify {
            target.notify_keys(&keys);
        }
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            entries: self
                .order
                .iter()
                .filter_map(|k| self.params.get(k).map(|p| (k.clone(), p.clone())))
                .collect(),
        }
    }

    pub fn from_snapshot(snapshot: &ModelSnapshot) -> Model {
        let mut model = Model::new();
        model.load_snapshot(snapshot);
        model
    }

    /// Replace contents with `snapshot` without pushing undo, then notify every key.
    ///
    /// The undo sink stays detached while listeners run, so writes they make
    /// belong to the restored state and leave the redo history intact.
    pub fn restore(&mut self, snapshot: &ModelSnapshot) {
        self.load_snapshot(snapshot);
        if self.update_listeners {
            let sink = self.undo.take();
            let keys = self.order.clone();
            self.notify_keys(&keys);
            self.undo = sink;
            self.last_key = None;
        }
    }

    fn load_snapshot(&mut self, snapshot: &ModelSnapshot) {
        self.order.clear();
        self.params.clear();
        for (key, param) in &snapshot.entries {
            if self.params.insert(key.clone(), param.clone()).is_none() {
                self.order.push(key.clone());
            }
        }
        self.last_key = None;
    }

    // =========================================================================
    // Equality
    // =========================================================================

    /// Same key set and same values. Bounds, status and listeners are ignored.
    pub fn values_equal(&self, other: &Model) -> bool {
        self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .all(|(k, p)| other.params.get(k).is_some_and(|q| p.value == q.value))
    }

    /// Same key set, values, bounds and status. Listeners are ignored.
    pub fn key_equals(&self, other: &Model) -> bool {
        self.params.len() == other.params.len()
            && self.params.iter().all(|(k, p)| {
                other
                    .params
                    .get(k)
                    .is_some_and(|q| p.value == q.value && p.same_shape(q))
            })
    }
}

fn remove_listener(list: &mut Vec<ListenerHandle>, listener: &ListenerHandle) -> bool {
    match list
        .iter()
        .position(|l| std::ptr::addr_eq(Rc::as_ptr(l), Rc::as_ptr(listener)))
    {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}

/// Structural copy that keeps listener lists, undo sink and hooks.
impl Clone for Model {
    fn clone(&self) -> Self {
        Model {
            order: self.order.clone(),
            params: self.params.clone(),
            listeners: self.listeners.clone(),
            any_listeners: self.any_listeners.clone(),
            last_key: self.last_key.clone(),
            undo: self.undo.clone(),
            fixer: self.fixer.clone(),
            reviser: self.reviser.clone(),
            update_listeners: self.update_listeners,
            batch: BatchState::default(),
        }
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.values_equal(other)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("keys", &self.order.len())
            .field("last_key", &self.last_key)
            .field("listeners", &self.listeners.values().map(Vec::len).sum::<usize>())
            .field("any_listeners", &self.any_listeners.len())
            .finish()
    }
}
