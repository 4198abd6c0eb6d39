//! Synthesizer descriptors and the registry that looks them up.
//!
//! A descriptor is what a concrete synth editor contributes to the core: its
//! name, how to recognize its sysex dumps, which keys are mutable, and the
//! revise/fix hooks the mutation engine calls.

use crate::error::{Error, Result};
use crate::hooks::{Fixer, ReviseHook};
use crate::model::Model;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

pub trait SynthDescriptor {
    fn name(&self) -> &str;

    /// Whether `data` is a patch dump for this synth.
    fn recognize(&self, data: &[u8]) -> bool;

    /// Number of sysex messages that make up one patch.
    fn num_dumps_per_patch(&self, _data: &[u8]) -> usize {
        1
    }

    /// Keys offered to the mutation engine.
    fn mutation_keys(&self, model: &Model) -> Vec<String> {
        model.mutation_keys()
    }

    /// Snap a mutated value onto what the synth accepts.
    fn revise_mutated_value(&self, _key: &str, _old: i32, proposed: i32) -> i32 {
        proposed
    }

    /// Adjust dependent keys after `key` changed.
    fn fix(&self, _key: &str, _model: &mut Model) {}
}

struct DescriptorReviser(Rc<dyn SynthDescriptor>);

impl ReviseHook for DescriptorReviser {
    fn revise(&self, key: &str, old: i32, proposed: i32) -> i32 {
        self.0.revise_mutated_value(key, old, proposed)
    }
}

struct DescriptorFixer(Rc<dyn SynthDescriptor>);

impl Fixer for DescriptorFixer {
    fn fix(&self, key: &str, model: &mut Model) {
        self.0.fix(key, model)
    }
}

/// Install `descriptor`'s revise and fix hooks on `model`.
pub fn attach_descriptor(model: &mut Model, descriptor: Rc<dyn SynthDescriptor>) {
    model.set_revise_hook(Some(Rc::new(DescriptorReviser(descriptor.clone()))));
    model.set_fixer(Some(Rc::new(DescriptorFixer(descriptor))));
}

/// Explicit registry of known synths, in registration order.
#[derive(Default)]
pub struct SynthRegistry {
    descriptors: Vec<Rc<dyn SynthDescriptor>>,
    by_name: HashMap<String, usize>,
}

impl SynthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: Rc<dyn SynthDescriptor>) -> Result<()> {
        let name = descriptor.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateSynth(name));
        }
        debug!("Registered synth: {}", name);
        self.by_name.insert(name, self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Rc<dyn SynthDescriptor>> {
        self.by_name
            .get(name)
            .map(|&i| self.descriptors[i].clone())
            .ok_or_else(|| Error::UnknownSynth(name.to_string()))
    }

    /// First registered synth that recognizes `data`.
    pub fn recognize(&self, data: &[u8]) -> Option<Rc<dyn SynthDescriptor>> {
        self.descriptors.iter().find(|d| d.recognize(data)).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sysex header match plus an even-only key and a dependent range.
    struct TestSynth {
        name: &'static str,
        manufacturer: u8,
    }

    impl SynthDescriptor for TestSynth {
        fn name(&self) -> &str {
            self.name
        }

        fn recognize(&self, data: &[u8]) -> bool {
            data.len() > 2 && data[0] == 0xF0 && data[1] == self.manufacturer
        }

        fn num_dumps_per_patch(&self, _data: &[u8]) -> usize {
            2
        }

        fn revise_mutated_value(&self, key: &str, _old: i32, proposed: i32) -> i32 {
            if key == "octave" {
                proposed & !1
            } else {
                proposed
            }
        }

        fn fix(&self, key: &str, model: &mut Model) {
            if key == "mode" {
                let top = if model.get_int("mode", 0) == 0 { 15 } else { 31 };
                model.set_max("voice", top);
            }
        }
    }

    fn registry() -> SynthRegistry {
        let mut registry = SynthRegistry::new();
        registry
            .register(Rc::new(TestSynth { name: "Alpha", manufacturer: 0x41 }))
            .unwrap();
        registry
            .register(Rc::new(TestSynth { name: "Beta", manufacturer: 0x42 }))
            .unwrap();
        registry
    }

    #[test]
    fn test_lookup_and_recognize() {
        let registry = registry();
        assert_eq!(registry.names(), vec!["Alpha", "Beta"]);
        assert_eq!(registry.get("Beta").unwrap().name(), "Beta");
        assert!(matches!(registry.get("Gamma"), Err(Error::UnknownSynth(_))));

        let found = registry.recognize(&[0xF0, 0x42, 0x00, 0xF7]).unwrap();
        assert_eq!(found.name(), "Beta");
        assert_eq!(found.num_dumps_per_patch(&[]), 2);
        assert!(registry.recognize(&[0xF0, 0x7E, 0x00, 0xF7]).is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = registry();
        let err = registry
            .register(Rc::new(TestSynth { name: "Alpha", manufacturer: 0x10 }))
            .unwrap_err();
        assert_eq!(err, Error::DuplicateSynth("Alpha".into()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_attached_hooks() {
        let descriptor = registry().get("Alpha").unwrap();
        let mut model = Model::new();
        model.set_int("mode", 1);
        model.set_int("voice", 0);
        model.set_bounds("voice", 0, 31);
        attach_descriptor(&mut model, descriptor);

        model.set_int("mode", 0);
        assert_eq!(model.max("voice"), 15);
        assert_eq!(model.revise("octave", 0, 5), 4);
        assert_eq!(model.revise("voice", 0, 5), 5);
    }
}
