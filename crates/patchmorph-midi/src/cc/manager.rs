//! CC binding manager with MIDI learn support.

use super::binding::{BindingId, CcBinding, CcValue, MidiChannel};
use super::event::{CcEvent, CcKind};
use crate::error::{Error, Result};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use patchmorph_core::Model;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CcProcessResult {
    /// Key updates in binding creation order.
    pub targets: Vec<(String, CcValue)>,
    pub learn_completed: Option<BindingId>,
}

impl CcProcessResult {
    /// Write every target into `model` through `set_bounded`.
    ///
    /// Keys missing from the model or holding strings are skipped. Returns
    /// the number of keys written.
    pub fn apply(&self, model: &mut Model) -> usize {
        let mut applied = 0;
        for (key, value) in &self.targets {
            if !model.is_integer(key) {
                warn!("CC binding targets missing or non-integer key '{}'", key);
                continue;
            }
            let current = model.get_int(key, 0);
            let resolved = value.resolve(current, model.bounds(key));
            model.set_bounded(key, resolved);
            applied += 1;
        }
        applied
    }
}

#[derive(Debug, Clone)]
struct LearnState {
    key: String,
    raw: bool,
    /// `None` = any channel.
    channel_filter: Option<MidiChannel>,
}

/// Thread-safe table of [`CcBinding`]s.
///
/// Bindings may be edited from a UI thread while the editor thread
/// processes events.
pub struct CcBindingManager {
    bindings: Arc<DashMap<BindingId, CcBinding>>,
    next_id: AtomicU64,
    learn_state: ArcSwap<Option<LearnState>>,
}

impl CcBindingManager {
    pub fn new() -> Self {
        Self {
            bindings: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
            learn_state: ArcSwap::new(Arc::new(None)),
        }
    }

    pub fn add_binding(&self, binding: CcBinding) -> Result<BindingId> {
        binding.validate()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.bindings.insert(id, binding);
        Ok(id)
    }

    /// Shorthand for a scaled binding.
    pub fn bind(
        &self,
        channel: Option<MidiChannel>,
        kind: CcKind,
        number: u16,
        key: &str,
    ) -> Result<BindingId> {
        self.add_binding(CcBinding::new(channel, kind, number, key))
    }

    pub fn remove_binding(&self, id: BindingId) -> Result<CcBinding> {
        self.bindings
            .remove(&id)
            .map(|(_, binding)| binding)
            .ok_or(Error::UnknownBinding(id))
    }

    pub fn get_binding(&self, id: BindingId) -> Option<CcBinding> {
        self.bindings.get(&id).map(|entry| entry.value().clone())
    }

    /// All bindings, ordered by id.
    pub fn get_all_bindings(&self) -> Vec<(BindingId, CcBinding)> {
        let mut all: Vec<_> = self
            .bindings
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        all.sort_by_key(|(id, _)| *id);
        all
    }

    /// Bindings that write `key`, ordered by id.
    pub fn bindings_for_key(&self, key: &str) -> Vec<(BindingId, CcBinding)> {
        self.get_all_bindings()
            .into_iter()
            .filter(|(_, binding)| binding.key == key)
            .collect()
    }

    pub fn set_binding_enabled(&self, id: BindingId, enabled: bool) -> Result<()> {
        let mut entry = self
            .bindings
            .get_mut(&id)
            .ok_or(Error::UnknownBinding(id))?;
        entry.enabled = enabled;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear_all(&self) {
        self.bindings.clear();
    }

    /// Bind the next event received (optionally only on `channel_filter`) to `key`.
    pub fn start_learn(&self, key: &str, raw: bool, channel_filter: Option<MidiChannel>) {
        let state = LearnState {
            key: key.to_string(),
            raw,
            channel_filter,
        };
        self.learn_state.store(Arc::new(Some(state)));
    }

    pub fn cancel_learn(&self) {
        self.learn_state.store(Arc::new(None));
    }

    pub fn is_learning(&self) -> bool {
        self.learn_state.load().is_some()
    }

    pub fn learn_key(&self) -> Option<String> {
        let guard = self.learn_state.load();
        guard.as_ref().as_ref().map(|state| state.key.clone())
    }

    /// Complete MIDI learn if active, otherwise route `event` to its bound keys.
    ///
    /// While learning, the learning event itself is not routed anywhere.
    pub fn process_event(&self, event: &CcEvent) -> CcProcessResult {
        let learn_guard = self.learn_state.load();
        if let Some(ref state) = **learn_guard {
            if state.channel_filter.is_none() || state.channel_filter == Some(event.channel) {
                let binding = CcBinding::new(Some(event.channel), event.kind, event.number, &state.key)
                    .with_raw(state.raw);
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Learned {:?} {} on channel {} for '{}'",
                    event.kind, event.number, event.channel, state.key
                );
                self.bindings.insert(id, binding);
                self.cancel_learn();

                return CcProcessResult {
                    targets: vec![],
                    learn_completed: Some(id),
                };
            }
            return CcProcessResult::default();
        }

        let mut matched: Vec<(BindingId, String, CcValue)> = self
            .bindings
            .iter()
            .filter(|entry| entry.value().matches(event))
            .map(|entry| {
                let binding = entry.value();
                (*entry.key(), binding.key.clone(), binding.value_for(event))
            })
            .collect();
        matched.sort_by_key(|(id, _, _)| *id);

        CcProcessResult {
            targets: matched.into_iter().map(|(_, key, value)| (key, value)).collect(),
            learn_completed: None,
        }
    }
}

impl Default for CcBindingManager {
    fn default() -> Self {
        Self::new()
    }
}
