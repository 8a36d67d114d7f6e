use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::settings::EngineSettings;

use super::engine::ShortcutEngine;
use super::persistence::{Customization, ShortcutCustomizations};
use super::registry::{BindingInfo, BindingOptions};
use super::types::{KeyInputEvent, Modifiers};

/// Test clock advanced by hand, shared between test and engine.
#[derive(Clone)]
struct ManualClock(Rc<Cell<Instant>>);

impl ManualClock {
    fn new() -> Self {
        Self(Rc::new(Cell::new(Instant::now())))
    }

    fn advance(&self, d: Duration) {
        self.0.set(self.0.get() + d);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.0.get()
    }
}

fn counting_engine<C: Clock>(
    engine: &mut ShortcutEngine<C>,
    spec: &str,
    options: BindingOptions,
) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    engine
        .register(
            spec,
            move |_: &KeyInputEvent, _: &str, _: &BindingInfo| {
                c.set(c.get() + 1);
                Ok(())
            },
            options,
        )
        .unwrap();
    count
}

fn ctrl(key: &str) -> KeyInputEvent {
    KeyInputEvent::new(key, Modifiers::ctrl())
}

#[test]
fn direct_match_fires_exactly_once_and_updates_counters() {
    let mut engine = ShortcutEngine::new();
    let count = counting_engine(&mut engine, "ctrl+shift+d", BindingOptions::default());

    let response = engine.process_input(&KeyInputEvent::new("D", Modifiers::ctrl_shift()));
    assert!(response.handled);
    assert_eq!(count.get(), 1);
    assert_eq!(engine.stats().total_executed, 1);

    engine.unregister("ctrl+shift+d");
    let response = engine.process_input(&KeyInputEvent::new("D", Modifiers::ctrl_shift()));
    assert!(!response.handled);
    assert_eq!(count.get(), 1);
    assert_eq!(engine.stats().total_executed, 1);
}

#[test]
fn unmatched_input_is_an_in_band_non_error() {
    let mut engine = ShortcutEngine::new();
    let response = engine.process_input(&ctrl("q"));
    assert!(!response.handled);
    assert!(!response.prevent_default);
    assert!(engine.stats() == Default::default());
}

#[test]
fn response_carries_prevent_and_stop_flags_from_the_binding() {
    let mut engine = ShortcutEngine::new();
    counting_engine(&mut engine, "ctrl+k", BindingOptions::default());

    let response = engine.process_input(&ctrl("k"));
    assert!(response.handled);
    // Defaults: prevent falls back to the engine setting, stop is per binding.
    assert!(response.prevent_default);
    assert!(response.stop_propagation);
}

#[test]
fn binding_prevent_default_overrides_the_engine_setting() {
    let mut engine = ShortcutEngine::new();
    let options = BindingOptions {
        prevent_default: Some(false),
        stop_propagation: false,
        ..Default::default()
    };
    counting_engine(&mut engine, "ctrl+k", options);

    let response = engine.process_input(&ctrl("k"));
    assert!(response.handled);
    assert!(!response.prevent_default);
    assert!(!response.stop_propagation);
}

#[test]
fn per_binding_stats_track_executions() {
    let mut engine = ShortcutEngine::new();
    counting_engine(&mut engine, "ctrl+k", BindingOptions::default());

    engine.process_input(&ctrl("k"));
    engine.process_input(&ctrl("k"));

    let info = engine.binding("ctrl+k").unwrap();
    assert_eq!(info.stats.execution_count, 2);
    assert!(info.stats.last_executed.is_some());
}

// ---- sequences -------------------------------------------------------------

#[test]
fn sequence_completes_within_the_timeout() {
    let clock = ManualClock::new();
    let mut engine = ShortcutEngine::with_clock(clock.clone());
    let count = counting_engine(&mut engine, "ctrl+d>ctrl+s", BindingOptions::default());

    assert!(engine.process_input(&ctrl("d")).handled);
    assert!(engine.is_awaiting_sequence());

    clock.advance(Duration::from_millis(1999));
    assert!(engine.process_input(&ctrl("s")).handled);
    assert!(!engine.is_awaiting_sequence());
    assert_eq!(count.get(), 1);
    assert_eq!(engine.stats().sequences_completed, 1);
}

#[test]
fn sequence_times_out_without_a_second_token() {
    let clock = ManualClock::new();
    let mut engine = ShortcutEngine::with_clock(clock.clone());
    let count = counting_engine(&mut engine, "ctrl+d>ctrl+s", BindingOptions::default());

    engine.process_input(&ctrl("d"));
    clock.advance(Duration::from_millis(2000));
    assert!(engine.poll_timeout());
    assert!(!engine.is_awaiting_sequence());
    assert_eq!(count.get(), 0);

    // The second stage on its own matches nothing.
    assert!(!engine.process_input(&ctrl("s")).handled);
    assert_eq!(count.get(), 0);
}

#[test]
fn expired_deadline_is_applied_before_the_next_token() {
    let clock = ManualClock::new();
    let mut engine = ShortcutEngine::with_clock(clock.clone());
    let count = counting_engine(&mut engine, "ctrl+d>ctrl+s", BindingOptions::default());

    engine.process_input(&ctrl("d"));
    clock.advance(Duration::from_millis(2500));
    // No timer fired, but the deadline has passed: the sequence is dead.
    assert!(!engine.process_input(&ctrl("s")).handled);
    assert_eq!(count.get(), 0);
    assert!(!engine.is_awaiting_sequence());
}

#[test]
fn stale_poll_after_completion_is_a_no_op() {
    let clock = ManualClock::new();
    let mut engine = ShortcutEngine::with_clock(clock.clone());
    let count = counting_engine(&mut engine, "ctrl+d>ctrl+s", BindingOptions::default());

    engine.process_input(&ctrl("d"));
    engine.process_input(&ctrl("s"));
    assert_eq!(count.get(), 1);

    clock.advance(Duration::from_secs(10));
    assert!(!engine.poll_timeout());
    assert_eq!(count.get(), 1);
}

#[test]
fn each_stage_rearms_the_timeout() {
    let clock = ManualClock::new();
    let mut engine = ShortcutEngine::with_clock(clock.clone());
    let count = counting_engine(&mut engine, "ctrl+a>ctrl+b>ctrl+c", BindingOptions::default());

    engine.process_input(&ctrl("a"));
    clock.advance(Duration::from_millis(1500));
    assert!(engine.process_input(&ctrl("b")).handled);
    assert!(engine.is_awaiting_sequence());

    // 1500ms from the first stage would have expired an un-rearmed timer.
    clock.advance(Duration::from_millis(1500));
    assert!(engine.process_input(&ctrl("c")).handled);
    assert_eq!(count.get(), 1);
}

#[test]
fn dead_end_token_is_dropped_not_reevaluated() {
    // The token that kills a partial sequence is discarded even when it
    // would have been a direct match on its own. Deliberate: changing
    // this requires changing this test first.
    let mut engine = ShortcutEngine::new();
    let seq_count = counting_engine(&mut engine, "ctrl+d>ctrl+s", BindingOptions::default());
    let direct_count = counting_engine(&mut engine, "ctrl+k", BindingOptions::default());

    engine.process_input(&ctrl("d"));
    assert!(engine.is_awaiting_sequence());

    let response = engine.process_input(&ctrl("k"));
    assert!(!response.handled);
    assert!(!engine.is_awaiting_sequence());
    assert_eq!(seq_count.get(), 0);
    assert_eq!(direct_count.get(), 0);

    // Fresh idle press now matches directly.
    assert!(engine.process_input(&ctrl("k")).handled);
    assert_eq!(direct_count.get(), 1);
}

#[test]
fn direct_match_wins_over_sequence_start() {
    let mut engine = ShortcutEngine::new();
    let direct_count = counting_engine(&mut engine, "ctrl+d", BindingOptions::default());
    let seq_count = counting_engine(&mut engine, "ctrl+d>ctrl+s", BindingOptions::default());

    assert!(engine.process_input(&ctrl("d")).handled);
    assert_eq!(direct_count.get(), 1);
    assert_eq!(seq_count.get(), 0);
    assert!(!engine.is_awaiting_sequence());
}

#[test]
fn disabling_sequences_stops_sequence_starts() {
    let mut engine = ShortcutEngine::with_settings(EngineSettings {
        enable_sequences: false,
        ..Default::default()
    });
    let count = counting_engine(&mut engine, "ctrl+d>ctrl+s", BindingOptions::default());

    assert!(!engine.process_input(&ctrl("d")).handled);
    assert!(!engine.is_awaiting_sequence());
    engine.process_input(&ctrl("s"));
    assert_eq!(count.get(), 0);
}

// ---- contexts --------------------------------------------------------------

#[test]
fn context_bound_binding_is_silent_in_other_contexts() {
    let mut engine = ShortcutEngine::new();
    let count = counting_engine(
        &mut engine,
        "ctrl+l",
        BindingOptions::default().context("console"),
    );

    engine.switch_context("performance");
    assert!(!engine.process_input(&ctrl("l")).handled);
    assert_eq!(count.get(), 0);

    engine.switch_context("console");
    assert!(engine.process_input(&ctrl("l")).handled);
    assert_eq!(count.get(), 1);
    assert_eq!(engine.stats().context_switches, 2);
}

#[test]
fn global_bindings_fire_from_any_context() {
    let mut engine = ShortcutEngine::new();
    let count = counting_engine(&mut engine, "ctrl+g", BindingOptions::default());

    engine.switch_context("errors");
    assert!(engine.process_input(&ctrl("g")).handled);
    assert_eq!(count.get(), 1);
}

#[test]
fn disabling_contexts_flattens_the_partitions() {
    let mut engine = ShortcutEngine::with_settings(EngineSettings {
        enable_contexts: false,
        ..Default::default()
    });
    let count = counting_engine(
        &mut engine,
        "ctrl+l",
        BindingOptions::default().context("console"),
    );

    engine.switch_context("performance");
    assert!(engine.process_input(&ctrl("l")).handled);
    assert_eq!(count.get(), 1);
}

// ---- state gates -----------------------------------------------------------

#[test]
fn disabled_engine_drops_input() {
    let mut engine = ShortcutEngine::new();
    let count = counting_engine(&mut engine, "ctrl+k", BindingOptions::default());

    engine.set_enabled(false);
    assert!(!engine.process_input(&ctrl("k")).handled);
    assert_eq!(count.get(), 0);

    engine.set_enabled(true);
    assert!(engine.process_input(&ctrl("k")).handled);
    assert_eq!(count.get(), 1);
}

#[test]
fn suspend_resets_in_flight_sequences() {
    let mut engine = ShortcutEngine::new();
    let count = counting_engine(&mut engine, "ctrl+d>ctrl+s", BindingOptions::default());

    engine.process_input(&ctrl("d"));
    assert!(engine.is_awaiting_sequence());

    engine.set_suspended(true);
    assert!(!engine.is_awaiting_sequence());
    assert!(!engine.process_input(&ctrl("s")).handled);

    engine.set_suspended(false);
    assert!(!engine.process_input(&ctrl("s")).handled);
    assert_eq!(count.get(), 0);
}

#[test]
fn disabled_binding_does_not_match() {
    let mut engine = ShortcutEngine::new();
    let count = counting_engine(
        &mut engine,
        "ctrl+k",
        BindingOptions {
            enabled: false,
            ..Default::default()
        },
    );

    assert!(!engine.process_input(&ctrl("k")).handled);
    assert_eq!(count.get(), 0);
}

// ---- failure semantics -----------------------------------------------------

#[test]
fn callback_error_is_contained_and_state_recovers() {
    let mut engine = ShortcutEngine::new();
    let attempts = Rc::new(Cell::new(0u32));
    let a = Rc::clone(&attempts);
    engine
        .register(
            "ctrl+k",
            move |_, _, _| {
                a.set(a.get() + 1);
                if a.get() == 1 {
                    anyhow::bail!("panel wiring not ready");
                }
                Ok(())
            },
            BindingOptions::default(),
        )
        .unwrap();

    let response = engine.process_input(&ctrl("k"));
    assert!(!response.handled);
    assert_eq!(engine.stats().total_executed, 0);
    let info = engine.binding("ctrl+k").unwrap();
    assert_eq!(info.stats.execution_count, 0);

    // Engine state is intact: the next press dispatches normally.
    let response = engine.process_input(&ctrl("k"));
    assert!(response.handled);
    assert_eq!(engine.stats().total_executed, 1);
}

#[test]
fn failing_sequence_callback_still_returns_engine_to_idle() {
    let mut engine = ShortcutEngine::new();
    engine
        .register(
            "ctrl+d>ctrl+s",
            |_, _, _| anyhow::bail!("boom"),
            BindingOptions::default(),
        )
        .unwrap();

    engine.process_input(&ctrl("d"));
    let response = engine.process_input(&ctrl("s"));
    assert!(!response.handled);
    assert!(!engine.is_awaiting_sequence());
    assert_eq!(engine.stats().sequences_completed, 0);
}

// ---- customizations --------------------------------------------------------

#[test]
fn customizations_disable_and_rebind_shortcuts() {
    let mut engine = ShortcutEngine::new();
    let toggle_count = counting_engine(&mut engine, "ctrl+shift+d", BindingOptions::default());
    counting_engine(&mut engine, "ctrl+k", BindingOptions::default());

    let mut doc = ShortcutCustomizations::default();
    doc.set("ctrl+shift+d", Customization::replacement("ctrl+alt+d"));
    doc.set("ctrl+k", Customization::disabled());

    let errors = engine.apply_customizations(&doc);
    assert!(errors.is_empty());
    assert_eq!(engine.stats().customizations_applied, 2);

    assert!(!engine
        .process_input(&KeyInputEvent::new("d", Modifiers::ctrl_shift()))
        .handled);
    let alt_ctrl_d = KeyInputEvent::new(
        "d",
        Modifiers {
            ctrl: true,
            alt: true,
            ..Default::default()
        },
    );
    assert!(engine.process_input(&alt_ctrl_d).handled);
    assert_eq!(toggle_count.get(), 1);
    assert!(!engine.process_input(&ctrl("k")).handled);
}

#[test]
fn invalid_customization_is_collected_but_valid_ones_apply() {
    let mut engine = ShortcutEngine::new();
    counting_engine(&mut engine, "ctrl+a", BindingOptions::default());
    counting_engine(&mut engine, "ctrl+b", BindingOptions::default());

    let mut doc = ShortcutCustomizations::default();
    doc.set("ctrl+a", Customization::replacement("ctrl+"));
    doc.set("ctrl+b", Customization::disabled());

    let errors = engine.apply_customizations(&doc);
    assert_eq!(errors.len(), 1);
    assert_eq!(engine.stats().customizations_applied, 1);
    // The invalid replacement left its binding untouched.
    assert!(engine.process_input(&ctrl("a")).handled);
    assert!(!engine.process_input(&ctrl("b")).handled);
}

#[test]
fn chord_flagged_binding_counts_chord_executions() {
    let mut engine = ShortcutEngine::new();
    // Space in the raw spec flags a chord; matching semantics stay plain.
    let count = counting_engine(&mut engine, "ctrl + k", BindingOptions::default());

    assert!(engine.process_input(&ctrl("k")).handled);
    assert_eq!(count.get(), 1);
    assert_eq!(engine.stats().chords_executed, 1);

    let info = engine.binding("ctrl+k").unwrap();
    assert!(info.is_chord);
    assert!(!info.is_sequence);
}
