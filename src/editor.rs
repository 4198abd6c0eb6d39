//! Editor session: one model plus everything that acts on it.

use crate::builder::PatchEditorBuilder;
use crate::config::EditorConfig;
use crate::Result;
use patchmorph_core::{
    crossover, mutate, opposite, recombine, HillClimb, Model, Morpher, SessionRng,
    SynthDescriptor, UndoStack,
};
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use tracing::debug;

#[cfg(feature = "midi")]
use patchmorph_midi::{CcBindingManager, CcEvent, CcInboxConsumer, CcInboxProducer, CcParser};
#[cfg(feature = "midi")]
use std::sync::Arc;

/// MIDI controller input owned by the editor thread.
#[cfg(feature = "midi")]
pub(crate) struct MidiInput {
    pub(crate) parser: CcParser,
    pub(crate) bindings: Arc<CcBindingManager>,
    pub(crate) consumer: CcInboxConsumer,
    pub(crate) producer: Option<CcInboxProducer>,
}

/// A patch editing session.
///
/// Owns the [`Model`] being edited, its undo history, the session RNG and
/// the exploration state (morph history, hill-climb generations). Mutation
/// operators run over [`mutation_keys`](Self::mutation_keys) and each one is
/// a single undo step.
///
/// Not `Send`: the session lives on the editor thread. MIDI input reaches it
/// through the inbox producer handed out by [`take_midi_producer`](Self::take_midi_producer).
pub struct PatchEditor {
    pub(crate) model: Model,
    pub(crate) undo: Rc<RefCell<UndoStack>>,
    pub(crate) rng: SessionRng,
    pub(crate) morpher: Morpher,
    pub(crate) climb: HillClimb,
    pub(crate) descriptor: Option<Rc<dyn SynthDescriptor>>,
    pub(crate) mutation_weight: f64,
    pub(crate) config: EditorConfig,

    #[cfg(feature = "midi")]
    pub(crate) midi: MidiInput,
}

impl PatchEditor {
    pub fn builder() -> PatchEditorBuilder {
        PatchEditorBuilder::default()
    }

    /// Editor over `model` with the default configuration.
    pub fn new(model: Model) -> Result<Self> {
        Self::builder().model(model).build()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Direct access for UI edits; `set_*` calls here push undo as usual.
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    /// Consume the editor, detaching the undo stack from the model.
    pub fn into_model(mut self) -> Model {
        self.model.set_undo_sink(None);
        self.model
    }

    pub fn rng_mut(&mut self) -> &mut SessionRng {
        &mut self.rng
    }

    pub fn descriptor(&self) -> Option<&Rc<dyn SynthDescriptor>> {
        self.descriptor.as_ref()
    }

    /// Keys the mutation operators work on: the descriptor's choice, or
    /// every free key with a usable range.
    pub fn mutation_keys(&self) -> Vec<String> {
        match &self.descriptor {
            Some(descriptor) => descriptor.mutation_keys(&self.model),
            None => self.model.mutation_keys(),
        }
    }

    pub fn mutation_weight(&self) -> f64 {
        self.mutation_weight
    }

    pub fn set_mutation_weight(&mut self, weight: f64) {
        self.mutation_weight = weight.clamp(0.0, 1.0);
    }

    // =========================================================================
    // Exploration
    // =========================================================================

    /// Mutate with the session weight.
    pub fn mutate(&mut self) {
        let weight = self.mutation_weight;
        self.mutate_with(weight);
    }

    pub fn mutate_with(&mut self, weight: f64) {
        let keys = self.mutation_keys();
        mutate(&mut self.model, &mut self.rng, &keys, weight);
    }

    pub fn opposite(&mut self, other: Option<&Model>, weight: f64, flee_if_same: bool) {
        let keys = self.mutation_keys();
        opposite(&mut self.model, &mut self.rng, other, &keys, weight, flee_if_same);
    }

    pub fn recombine(&mut self, other: &Model, weight: f64) {
        let keys = self.mutation_keys();
        recombine(&mut self.model, &mut self.rng, other, &keys, weight);
    }

    pub fn crossover(&mut self, other: &Model, weight: f64, post_coin_toss: bool) {
        let keys = self.mutation_keys();
        crossover(&mut self.model, &mut self.rng, other, &keys, weight, post_coin_toss);
    }

    /// One morph step toward the weighted blend of `models`.
    pub fn morph(
        &mut self,
        models: &[&Model],
        default_model: Option<&Model>,
        weights: &[f64],
    ) -> Result<()> {
        let keys = self.mutation_keys();
        self.morpher.morph(
            &mut self.model,
            &mut self.rng,
            models,
            default_model,
            &keys,
            weights,
        )?;
        Ok(())
    }

    pub fn morpher_mut(&mut self) -> &mut Morpher {
        &mut self.morpher
    }

    /// Breed the next hill-climb generation from the user's picks.
    ///
    /// Candidates are independent copies; the edited model is untouched.
    pub fn climb(&mut self, selected: &[&Model]) -> Vec<Model> {
        let keys = self.mutation_keys();
        self.climb
            .climb(&mut self.rng, selected, &keys, self.mutation_weight)
    }

    /// Parents of the previous generation, if there is one.
    pub fn back_up(&mut self) -> Option<Vec<Model>> {
        self.climb.back_up()
    }

    pub fn hill_climb(&self) -> &HillClimb {
        &self.climb
    }

    // =========================================================================
    // Undo
    // =========================================================================

    pub fn can_undo(&self) -> bool {
        self.undo.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.borrow().can_redo()
    }

    pub fn undo_stack(&self) -> Ref<'_, UndoStack> {
        self.undo.borrow()
    }

    /// Restore the state before the last change. Returns `false` with nothing to undo.
    pub fn undo(&mut self) -> bool {
        let current = self.model.snapshot();
        let previous = self.undo.borrow_mut().undo(current);
        match previous {
            Some(snapshot) => {
                self.model.restore(&snapshot);
                debug!("Undo ({} steps left)", self.undo.borrow().undo_len());
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.model.snapshot();
        let next = self.undo.borrow_mut().redo(current);
        match next {
            Some(snapshot) => {
                self.model.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    pub fn clear_undo(&mut self) {
        self.undo.borrow_mut().clear();
    }

    // =========================================================================
    // MIDI controller input
    // =========================================================================

    /// Producer half of the controller inbox, for the MIDI callback thread.
    ///
    /// Available once; `None` after it has been taken.
    #[cfg(feature = "midi")]
    pub fn take_midi_producer(&mut self) -> Option<CcInboxProducer> {
        self.midi.producer.take()
    }

    /// Shared binding table; may be edited from other threads.
    #[cfg(feature = "midi")]
    pub fn bindings(&self) -> &Arc<CcBindingManager> {
        &self.midi.bindings
    }

    /// Drain the inbox, parse each triple and apply bound values.
    ///
    /// Returns the number of key writes.
    #[cfg(feature = "midi")]
    pub fn process_midi(&mut self) -> usize {
        let mut applied = 0;
        while let Some(message) = self.midi.consumer.pop() {
            applied += self.handle_cc(message.channel, message.number, message.value);
        }
        applied
    }

    /// Feed one controller triple directly, bypassing the inbox.
    #[cfg(feature = "midi")]
    pub fn handle_cc(&mut self, channel: u8, number: u8, value: u8) -> usize {
        match self.midi.parser.parse(channel, number, value) {
            Some(event) => self.handle_event(&event),
            None => 0,
        }
    }

    #[cfg(feature = "midi")]
    pub fn handle_event(&mut self, event: &CcEvent) -> usize {
        let result = self.midi.bindings.process_event(event);
        if let Some(id) = result.learn_completed {
            debug!("MIDI learn completed: binding {}", id);
        }
        result.apply(&mut self.model)
    }
}

impl std::fmt::Debug for PatchEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchEditor")
            .field("model", &self.model)
            .field("config", &self.config)
            .field("mutation_weight", &self.mutation_weight)
            .field("descriptor", &self.descriptor.as_ref().map(|d| d.name().to_string()))
            .finish_non_exhaustive()
    }
}
