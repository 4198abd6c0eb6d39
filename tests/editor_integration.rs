//! Editor session integration tests.
//!
//! Exercises the mutation operators, undo history, hooks and hill climbing
//! through `PatchEditor` rather than the free functions.
//!
//! Run with:
//! ```bash
//! cargo test -p patchmorph --test editor_integration
//! ```

use patchmorph::prelude::*;
use patchmorph::{Fixer, ReviseHook};
use std::cell::Cell;
use std::rc::Rc;

/// A small synth patch: two metric keys, a categorical waveform, a name.
fn test_patch() -> Model {
    let mut model = Model::new();
    model.set_string("name", "Init");
    model.set_int("cutoff", 64);
    model.set_bounds("cutoff", 0, 127);
    model.set_metric_bounds("cutoff", 0, 127);
    model.set_int("resonance", 10);
    model.set_bounds("resonance", 0, 127);
    model.set_metric_bounds("resonance", 0, 100);
    model.set_int("wave", 0);
    model.set_bounds("wave", 0, 7);
    model.set_int("mode", 0);
    model.set_bounds("mode", 0, 1);
    model.set_int("voice", 0);
    model.set_bounds("voice", 0, 31);
    model.clear_last_key();
    model
}

fn test_editor(seed: u64) -> PatchEditor {
    PatchEditor::builder()
        .model(test_patch())
        .seed(seed)
        .build()
        .expect("Failed to create test editor")
}

fn assert_in_bounds(model: &Model) {
    for key in model.mutation_keys() {
        let v = model.get_int(&key, i32::MIN);
        assert!(
            (model.min(&key)..=model.max(&key)).contains(&v),
            "{key}={v} out of bounds"
        );
    }
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_invalid_config_rejected() {
    let err = PatchEditor::builder()
        .population_size(1)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));

    let err = PatchEditor::builder()
        .mutation_weight(2.0)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn test_config_applied() {
    let config = EditorConfig {
        seed: Some(3),
        population_size: 4,
        default_mutation_weight: 0.5,
        ..Default::default()
    };
    let editor = PatchEditor::builder()
        .config(config.clone())
        .model(test_patch())
        .build()
        .unwrap();
    assert_eq!(editor.config(), &config);
    assert_eq!(editor.mutation_weight(), 0.5);
    assert_eq!(editor.hill_climb().population_size(), 4);
}

#[test]
fn test_same_seed_same_result() {
    let mut a = test_editor(99);
    let mut b = test_editor(99);
    for _ in 0..20 {
        a.mutate_with(0.6);
        b.mutate_with(0.6);
    }
    assert!(a.model().key_equals(b.model()));
}

// =============================================================================
// Exploration
// =============================================================================

#[test]
fn test_mutate_keeps_bounds_and_strings() {
    let mut editor = test_editor(1);
    for _ in 0..50 {
        editor.mutate_with(1.0);
        assert_in_bounds(editor.model());
    }
    assert_eq!(editor.model().get_string("name", ""), "Init");
}

#[test]
fn test_immutable_key_untouched() {
    let mut editor = test_editor(2);
    editor.model_mut().set_status("cutoff", Status::Immutable);
    for _ in 0..20 {
        editor.mutate_with(1.0);
    }
    assert_eq!(editor.model().get_int("cutoff", -1), 64);
    assert!(!editor.mutation_keys().contains(&"cutoff".to_string()));
}

#[test]
fn test_recombine_and_crossover() {
    let mut editor = test_editor(3);
    let mut other = test_patch();
    other.set_int("cutoff", 100);
    other.set_int("wave", 5);

    editor.crossover(&other, 1.0, false);
    assert!(editor.model().key_equals(&other));

    editor.model_mut().set_int("cutoff", 20);
    editor.recombine(&other, 0.5);
    let cutoff = editor.model().get_int("cutoff", -1);
    assert!((20..=60).contains(&cutoff), "cutoff {cutoff}");
}

#[test]
fn test_opposite_moves_away() {
    let mut editor = test_editor(4);
    let mut other = test_patch();
    other.set_int("cutoff", 80);
    editor.opposite(Some(&other), 1.0, false);
    assert!(editor.model().get_int("cutoff", -1) <= 64);
    assert_in_bounds(editor.model());
}

#[test]
fn test_morph_full_weight() {
    let mut editor = test_editor(5);
    let mut a = test_patch();
    a.set_int("cutoff", 10);
    a.set_int("wave", 3);
    let mut b = test_patch();
    b.set_int("cutoff", 120);
    b.set_int("wave", 6);

    editor.morph(&[&a, &b], None, &[0.0, 1.0]).unwrap();
    assert_eq!(editor.model().get_int("cutoff", -1), 120);
    assert_eq!(editor.model().get_int("wave", -1), 6);

    let err = editor.morph(&[&a, &b], None, &[1.0]).unwrap_err();
    assert!(matches!(err, Error::Core(_)));
}

#[test]
fn test_hill_climb_generations() {
    let mut editor = PatchEditor::builder()
        .model(test_patch())
        .seed(6)
        .population_size(6)
        .mutation_weight(0.4)
        .build()
        .unwrap();
    let parent = editor.model().copy();
    let first = editor.climb(&[&parent]);
    assert_eq!(first.len(), 6);
    for child in &first {
        assert_in_bounds(child);
    }
    let second = editor.climb(&[&first[0], &first[1], &first[2]]);
    assert_eq!(second.len(), 6);

    let back = editor.back_up().expect("one generation to return to");
    assert_eq!(back.len(), 1);
    assert!(back[0].key_equals(&parent));
    // the edited model is never touched by climbing
    assert!(editor.model().key_equals(&parent));
}

// =============================================================================
// Undo
// =============================================================================

#[test]
fn test_operator_is_one_undo_step() {
    let mut editor = test_editor(7);
    let before = editor.model().copy();
    editor.mutate_with(1.0);
    assert!(!editor.model().key_equals(&before));
    assert_eq!(editor.undo_stack().undo_len(), 1);

    assert!(editor.undo());
    assert!(editor.model().key_equals(&before));
    assert!(!editor.can_undo());

    let mutated = {
        assert!(editor.redo());
        editor.model().copy()
    };
    assert!(!mutated.key_equals(&before));
    assert!(editor.undo());
    assert!(!editor.undo());
}

#[test]
fn test_same_key_edits_coalesce() {
    let mut editor = test_editor(8);
    for v in 0..10 {
        editor.model_mut().set_int("cutoff", v);
    }
    assert_eq!(editor.undo_stack().undo_len(), 1);
    editor.model_mut().set_int("wave", 2);
    assert_eq!(editor.undo_stack().undo_len(), 2);

    editor.undo();
    editor.undo();
    assert_eq!(editor.model().get_int("cutoff", -1), 64);
    assert_eq!(editor.model().get_int("wave", -1), 0);
}

#[test]
fn test_new_edit_clears_redo() {
    let mut editor = test_editor(9);
    editor.model_mut().set_int("cutoff", 1);
    editor.undo();
    assert!(editor.can_redo());
    editor.model_mut().set_int("wave", 1);
    assert!(!editor.can_redo());
}

#[test]
fn test_undo_notifies_listeners() {
    let mut editor = test_editor(10);
    let hits = Rc::new(Cell::new(0));
    let seen = hits.clone();
    editor
        .model_mut()
        .register("cutoff", listener(move |_: &str, _: &mut Model| seen.set(seen.get() + 1)));

    editor.model_mut().set_int("cutoff", 5);
    assert_eq!(hits.get(), 1);
    editor.undo();
    assert_eq!(hits.get(), 2);
    assert_eq!(editor.model().get_int("cutoff", -1), 64);
}

#[test]
fn test_listener_writes_during_undo_keep_redo() {
    let mut editor = test_editor(13);
    // cutoff follows wave
    editor.model_mut().register(
        "wave",
        listener(|_: &str, m: &mut Model| {
            let wave = m.get_int("wave", 0);
            m.set_int("cutoff", wave * 10);
        }),
    );

    editor.model_mut().set_int("wave", 4);
    assert_eq!(editor.model().get_int("cutoff", -1), 40);

    assert!(editor.undo());
    assert!(editor.can_redo());
    assert!(editor.redo());
    assert_eq!(editor.model().get_int("wave", -1), 4);
    assert_eq!(editor.model().get_int("cutoff", -1), 40);
}

// =============================================================================
// Synth hooks
// =============================================================================

struct EvenSynth;

impl SynthDescriptor for EvenSynth {
    fn name(&self) -> &str {
        "Even"
    }

    fn recognize(&self, data: &[u8]) -> bool {
        data.starts_with(&[0xF0, 0x7D])
    }

    fn mutation_keys(&self, model: &Model) -> Vec<String> {
        model
            .mutation_keys()
            .into_iter()
            .filter(|k| k != "mode")
            .collect()
    }

    fn revise_mutated_value(&self, key: &str, _old: i32, proposed: i32) -> i32 {
        if key == "voice" {
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

#[test]
fn test_descriptor_hooks() {
    let mut editor = PatchEditor::builder()
        .model(test_patch())
        .descriptor(Rc::new(EvenSynth))
        .seed(11)
        .build()
        .unwrap();
    assert!(!editor.mutation_keys().contains(&"mode".to_string()));

    for _ in 0..30 {
        editor.mutate_with(1.0);
        assert_eq!(editor.model().get_int("voice", -1) % 2, 0);
        assert_eq!(editor.model().get_int("mode", -1), 0);
    }

    editor.model_mut().set_int("mode", 1);
    assert_eq!(editor.model().max("voice"), 31);
    editor.model_mut().set_int("mode", 0);
    assert_eq!(editor.model().max("voice"), 15);
}

#[test]
fn test_explicit_hooks_override_descriptor() {
    let revised = Rc::new(Cell::new(0));
    let count = revised.clone();
    let reviser: Rc<dyn ReviseHook> = Rc::new(move |_: &str, _: i32, proposed: i32| {
        count.set(count.get() + 1);
        proposed
    });
    let fixer: Rc<dyn Fixer> = Rc::new(|_: &str, _: &mut Model| {});

    let mut editor = PatchEditor::builder()
        .model(test_patch())
        .descriptor(Rc::new(EvenSynth))
        .revise_hook(reviser)
        .fixer(fixer)
        .seed(12)
        .build()
        .unwrap();
    editor.mutate_with(1.0);
    assert!(revised.get() > 0);

    // descriptor fixer replaced: mode no longer rescales voice
    editor.model_mut().set_int("mode", 1);
    assert_eq!(editor.model().max("voice"), 31);
    editor.model_mut().set_int("mode", 0);
    assert_eq!(editor.model().max("voice"), 31);
}

#[test]
fn test_registry_lookup() {
    let mut registry = SynthRegistry::new();
    registry.register(Rc::new(EvenSynth)).unwrap();
    let found = registry.recognize(&[0xF0, 0x7D, 0x01, 0xF7]).unwrap();
    assert_eq!(found.name(), "Even");
    assert!(matches!(
        registry.get("Odd"),
        Err(patchmorph::core::Error::UnknownSynth(_))
    ));
}
