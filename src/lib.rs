//! # patchmorph - Synthesizer Patch Editor Engine
//!
//! Parameter model and genetic exploration for synthesizer patch editors.
//!
//! ## Architecture
//!
//! patchmorph is an umbrella crate that coordinates:
//! - **patchmorph-core** - Parameter model (bounds, metric ranges, listeners,
//!   undo), mutation operators (mutate, opposite, recombine, crossover,
//!   morph), synth descriptors and hill-climb populations
//! - **patchmorph-midi** - CC/NRPN/RPN parsing, CC bindings with MIDI learn,
//!   and the lock-free inbox from the MIDI callback thread
//!
//! [`PatchEditor`] ties one model to an undo stack, a seeded RNG and the
//! MIDI input path.
//!
//! ## Quick Start
//!
//! ```
//! use patchmorph::prelude::*;
//!
//! let mut model = Model::new();
//! model.set_int("cutoff", 64);
//! model.set_bounds("cutoff", 0, 127);
//! model.set_metric_bounds("cutoff", 0, 127);
//! model.set_int("wave", 0);
//! model.set_bounds("wave", 0, 3);
//!
//! let mut editor = PatchEditor::builder().model(model).seed(1).build()?;
//! editor.mutate_with(0.5);
//! if editor.can_undo() {
//!     editor.undo();
//! }
//! assert_eq!(editor.model().get_int("cutoff", 0), 64);
//! # Ok::<(), patchmorph::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - `midi`
//! - `midi` - MIDI controller input

/// Re-export of patchmorph-core for direct access
pub use patchmorph_core as core;

pub use patchmorph_core::{
    // Model
    Model,
    ModelSnapshot,
    Parameter,
    Status,
    Value,

    // Hooks
    listener,
    Fixer,
    ListenerHandle,
    ParameterListener,
    ReviseHook,
    UndoSink,

    // Undo
    UndoBatch,
    UndoStack,

    // Exploration
    CategoricalStrategy,
    HillClimb,
    Morpher,

    // Synths
    attach_descriptor,
    SynthDescriptor,
    SynthRegistry,

    // Randomness
    create_entropy_rng,
    create_rng,
    SessionRng,
};

/// MIDI controller input
#[cfg(feature = "midi")]
pub mod midi {
    pub use patchmorph_midi::*;
}

mod error;
pub use error::{Error, Result};

mod config;
pub use config::EditorConfig;

mod builder;
pub use builder::PatchEditorBuilder;

mod editor;
pub use editor::PatchEditor;

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        listener, CategoricalStrategy, EditorConfig, Error, Model, PatchEditor,
        PatchEditorBuilder, Result, Status, SynthDescriptor, SynthRegistry, Value,
    };

    #[cfg(feature = "midi")]
    pub use crate::midi::{CcBindingManager, CcEvent, CcKind, CcMessage};
}
