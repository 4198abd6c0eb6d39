//! Patch parameter model and genetic exploration engine.
//!
//! # Primary API
//!
//! - [`Model`]: ordered key/value parameter store with bounds, status, listeners and undo
//! - [`mutate`], [`opposite`], [`recombine`], [`crossover`], [`morph`]: patch exploration
//! - [`UndoStack`] / [`UndoBatch`]: undo history and single-step batching
//! - [`SynthDescriptor`] / [`SynthRegistry`]: per-synth hooks without global state
//! - [`HillClimb`]: population breeding with generation history
//!
//! # Example
//!
//! ```
//! use patchmorph_core::{create_rng, mutate, Model};
//!
//! let mut model = Model::new();
//! model.set_int("cutoff", 64);
//! model.set_bounds("cutoff", 0, 127);
//! model.set_metric_bounds("cutoff", 0, 127);
//!
//! let mut rng = create_rng(7);
//! let keys = model.mutation_keys();
//! mutate(&mut model, &mut rng, &keys, 0.25);
//! assert!((0..=127).contains(&model.get_int("cutoff", 0)));
//! ```
//!
//! Nothing here is thread-safe: a model and its listeners live on one thread.

pub mod error;
pub use error::{Error, Result};

mod value;
pub use value::{Status, Value};

mod parameter;
pub use parameter::Parameter;

pub mod hooks;
pub use hooks::{listener, Fixer, ListenerHandle, ParameterListener, ReviseHook, UndoSink};

mod model;
pub use model::{Model, ModelSnapshot, UndoHandle};

mod undo;
pub use undo::{UndoBatch, UndoStack};

pub mod rng;
pub use rng::{create_entropy_rng, create_rng, SessionRng};

pub mod mutation;
pub use mutation::{crossover, morph, mutate, opposite, recombine, CategoricalStrategy, Morpher};

pub mod synth;
pub use synth::{attach_descriptor, SynthDescriptor, SynthRegistry};

pub mod population;
pub use population::HillClimb;
