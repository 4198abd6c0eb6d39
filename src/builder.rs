//! Builder for configuring and constructing a `PatchEditor`.

use crate::config::EditorConfig;
use crate::{PatchEditor, Result};
use patchmorph_core::{
    attach_descriptor, create_entropy_rng, create_rng, CategoricalStrategy, Fixer, HillClimb,
    Model, Morpher, ReviseHook, SynthDescriptor, UndoStack,
};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

#[cfg(feature = "midi")]
use crate::editor::MidiInput;
#[cfg(feature = "midi")]
use patchmorph_midi::{cc_inbox_with_capacity, CcBindingManager, CcParser};
#[cfg(feature = "midi")]
use std::sync::Arc;

/// A descriptor installs its own revise and fix hooks; an explicit
/// `.fixer()` or `.revise_hook()` replaces the descriptor's.
///
/// # Example
///
/// ```
/// use patchmorph::prelude::*;
///
/// let mut model = Model::new();
/// model.set_int("cutoff", 64);
/// model.set_bounds("cutoff", 0, 127);
///
/// let mut editor = PatchEditor::builder()
///     .model(model)
///     .seed(42)
///     .mutation_weight(0.3)
///     .build()
///     .unwrap();
///
/// editor.mutate();
/// assert!((0..=127).contains(&editor.model().get_int("cutoff", 0)));
/// ```
#[derive(Default)]
pub struct PatchEditorBuilder {
    config: EditorConfig,
    model: Option<Model>,
    fixer: Option<Rc<dyn Fixer>>,
    reviser: Option<Rc<dyn ReviseHook>>,
    descriptor: Option<Rc<dyn SynthDescriptor>>,
    strategy: CategoricalStrategy,

    #[cfg(feature = "midi")]
    bindings: Option<Arc<CcBindingManager>>,
}

impl PatchEditorBuilder {
    /// Replace every config knob at once.
    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    /// Start from this model instead of an empty one.
    pub fn model(mut self, model: Model) -> Self {
        self.model = Some(model);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Default: 100
    pub fn undo_depth(mut self, depth: usize) -> Self {
        self.config.undo_depth = depth;
        self
    }

    /// Default: 16
    pub fn population_size(mut self, size: usize) -> Self {
        self.config.population_size = size;
        self
    }

    /// Default: 32
    pub fn history_depth(mut self, depth: usize) -> Self {
        self.config.history_depth = depth;
        self
    }

    /// Default: 256
    pub fn inbox_capacity(mut self, capacity: usize) -> Self {
        self.config.inbox_capacity = capacity;
        self
    }

    /// Default: 0.1
    pub fn mutation_weight(mut self, weight: f64) -> Self {
        self.config.default_mutation_weight = weight;
        self
    }

    pub fn fixer(mut self, fixer: Rc<dyn Fixer>) -> Self {
        self.fixer = Some(fixer);
        self
    }

    pub fn revise_hook(mut self, reviser: Rc<dyn ReviseHook>) -> Self {
        self.reviser = Some(reviser);
        self
    }

    pub fn descriptor(mut self, descriptor: Rc<dyn SynthDescriptor>) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// How `morph` treats categorical keys. Default: [`CategoricalStrategy::Morph`].
    pub fn categorical_strategy(mut self, strategy: CategoricalStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Share an existing binding table instead of starting with an empty one.
    #[cfg(feature = "midi")]
    pub fn bindings(mut self, bindings: Arc<CcBindingManager>) -> Self {
        self.bindings = Some(bindings);
        self
    }

    pub fn build(self) -> Result<PatchEditor> {
        self.config.validate()?;
        let config = self.config;

        let mut model = self.model.unwrap_or_default();
        if let Some(descriptor) = &self.descriptor {
            attach_descriptor(&mut model, descriptor.clone());
        }
        if let Some(fixer) = self.fixer {
            model.set_fixer(Some(fixer));
        }
        if let Some(reviser) = self.reviser {
            model.set_revise_hook(Some(reviser));
        }

        let undo = Rc::new(RefCell::new(UndoStack::new(config.undo_depth)));
        model.set_undo_sink(Some(undo.clone()));

        let rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_entropy_rng(),
        };

        #[cfg(feature = "midi")]
        let midi = {
            let (producer, consumer) = cc_inbox_with_capacity(config.inbox_capacity);
            MidiInput {
                parser: CcParser::new(),
                bindings: self.bindings.unwrap_or_default(),
                consumer,
                producer: Some(producer),
            }
        };

        debug!(
            "Patch editor ready: {} keys, seed {:?}, synth {:?}",
            model.len(),
            config.seed,
            self.descriptor.as_ref().map(|d| d.name().to_string())
        );

        Ok(PatchEditor {
            model,
            undo,
            rng,
            morpher: Morpher::new(self.strategy),
            climb: HillClimb::new(config.population_size, config.history_depth),
            descriptor: self.descriptor,
            mutation_weight: config.default_mutation_weight,
            config,
            #[cfg(feature = "midi")]
            midi,
        })
    }
}
