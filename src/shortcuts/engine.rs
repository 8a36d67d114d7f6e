//! The match engine: one input event in, at most one dispatch out.
//!
//! The engine is an explicit instance holding all of its state; independent
//! instances never interfere. It is single-threaded by design (keyboard
//! input is serial), so bindings are shared with plain `Rc` and no locking
//! exists anywhere on the input path.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::clock::{Clock, SystemClock};
use crate::debug_panic;
use crate::error::ResultExt;
use crate::settings::EngineSettings;

use super::canonical::{is_chord, is_sequence, Canonicalizer, SEQUENCE_SEPARATOR};
use super::persistence::{Customization, PersistenceError, ShortcutCustomizations};
use super::registry::{
    Binding, BindingInfo, BindingOptions, ConflictRecord, ConflictStrategy, InsertOutcome,
    RegistryError, ShortcutCallback, ShortcutRegistry, GLOBAL_CONTEXT,
};
use super::stats::{BindingStats, EngineStats};
use super::types::{KeyInputEvent, ShortcutParseError};

/// What the adapter should do with the native event after a call to
/// [`ShortcutEngine::process_input`].
///
/// `prevent_default` / `stop_propagation` are the engine-side rendition of
/// the DOM-level calls; the adapter applies them to whatever event type it
/// owns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputResponse {
    pub handled: bool,
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl InputResponse {
    pub fn unhandled() -> Self {
        Self::default()
    }

    fn handled() -> Self {
        Self {
            handled: true,
            prevent_default: false,
            stop_propagation: false,
        }
    }
}

/// Partial-match state: the stages seen so far and the deadline by which
/// the next stage must arrive. At most one exists per engine.
struct SequenceState {
    stages: Vec<String>,
    deadline: Instant,
}

/// Keyboard shortcut matching engine.
///
/// Feed it [`KeyInputEvent`]s; it canonicalizes each one, matches against
/// the registry scoped to the active context (falling back to global), and
/// drives a timeout-bounded sequence state machine for multi-stage
/// bindings.
pub struct ShortcutEngine<C: Clock = SystemClock> {
    registry: ShortcutRegistry,
    settings: EngineSettings,
    stats: EngineStats,
    sequence: Option<SequenceState>,
    active_context: String,
    enabled: bool,
    suspended: bool,
    clock: C,
}

impl ShortcutEngine<SystemClock> {
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        Self::with_clock_and_settings(SystemClock, settings)
    }
}

impl Default for ShortcutEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ShortcutEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self::with_clock_and_settings(clock, EngineSettings::default())
    }

    pub fn with_clock_and_settings(clock: C, settings: EngineSettings) -> Self {
        Self {
            registry: ShortcutRegistry::new(),
            settings,
            stats: EngineStats::default(),
            sequence: None,
            active_context: GLOBAL_CONTEXT.to_string(),
            enabled: true,
            suspended: false,
            clock,
        }
    }

    // ---- registration -----------------------------------------------------

    /// Register a shortcut. Returns `Ok(true)` when the binding is live,
    /// `Ok(false)` when the active conflict strategy rejected it, and
    /// `Err` for invalid specs or a conflict under the `Error` strategy.
    pub fn register<F>(
        &mut self,
        spec: &str,
        callback: F,
        options: BindingOptions,
    ) -> Result<bool, RegistryError>
    where
        F: Fn(&KeyInputEvent, &str, &BindingInfo) -> anyhow::Result<()> + 'static,
    {
        self.register_callback(spec, Rc::new(callback), options)
    }

    fn register_callback(
        &mut self,
        spec: &str,
        callback: ShortcutCallback,
        options: BindingOptions,
    ) -> Result<bool, RegistryError> {
        let canonical = self.canonicalizer().canonicalize(spec)?;

        self.registry.ensure_context(&options.context);
        let binding = Binding {
            spec: spec.trim().to_string(),
            canonical: canonical.clone(),
            callback,
            is_sequence: is_sequence(&canonical),
            is_chord: self.settings.enable_chords && is_chord(spec),
            options,
            stats: BindingStats::new(self.clock.now()),
        };

        match self.registry.insert(binding)? {
            InsertOutcome::Inserted | InsertOutcome::Replaced => {
                self.stats.total_registered += 1;
                debug!(spec = spec, canonical = %canonical, "shortcut registered");
                Ok(true)
            }
            InsertOutcome::Merged => {
                debug!(canonical = %canonical, "shortcut merged into existing binding");
                Ok(true)
            }
            InsertOutcome::RejectedConflict => {
                self.stats.conflicts_detected += 1;
                Ok(false)
            }
            InsertOutcome::RejectedPriority => Ok(false),
        }
    }

    /// Remove a binding. Returns `false` when the spec is invalid or not
    /// registered.
    pub fn unregister(&mut self, spec: &str) -> bool {
        let Ok(canonical) = self.canonicalizer().canonicalize(spec) else {
            return false;
        };
        let removed = self.registry.remove(&canonical);
        if removed {
            debug!(spec = spec, canonical = %canonical, "shortcut unregistered");
        }
        removed
    }

    /// Move an existing binding to a new spec, keeping its callback. Used
    /// when applying persisted customizations. The original binding is
    /// restored if the replacement cannot be registered.
    pub fn rebind(
        &mut self,
        spec: &str,
        replacement: &str,
        options: Option<BindingOptions>,
    ) -> Result<bool, RegistryError> {
        let canonical = self.canonicalizer().canonicalize(spec)?;
        // Validate the replacement before touching the registry.
        self.canonicalizer().canonicalize(replacement)?;

        let Some(binding) = self.registry.get(&canonical) else {
            return Ok(false);
        };
        let callback = Rc::clone(&binding.callback);
        let restore_options = binding.options.clone();
        let restore_spec = binding.spec.clone();
        let options = options.unwrap_or_else(|| restore_options.clone());

        self.registry.remove(&canonical);
        match self.register_callback(replacement, Rc::clone(&callback), options) {
            Ok(true) => Ok(true),
            outcome => {
                // Rejected or conflicting: put the original back.
                self.register_callback(&restore_spec, callback, restore_options)
                    .log_err();
                outcome
            }
        }
    }

    // ---- event processing -------------------------------------------------

    /// Process one input event to completion.
    pub fn process_input(&mut self, event: &KeyInputEvent) -> InputResponse {
        if !self.enabled || self.suspended {
            return InputResponse::unhandled();
        }

        // A deadline that elapsed between events is identical to the timer
        // having fired: the pending sequence is gone before this token is
        // interpreted.
        self.expire_sequence_if_due();

        let Some(token) = self.canonicalizer().event_token(event) else {
            return InputResponse::unhandled();
        };

        if self.settings.enable_sequences && self.sequence.is_some() {
            return self.continue_sequence(event, token);
        }

        if let Some(canonical) = self.find_match(&token) {
            return self.dispatch(event, &canonical);
        }

        if self.settings.enable_sequences && self.registry.has_sequence_prefix(&token) {
            return self.start_sequence(token);
        }

        InputResponse::unhandled()
    }

    /// Expire a pending sequence whose deadline has passed. Returns `true`
    /// if a sequence was cleared. Embedders with a timer call this when the
    /// timer fires; a stale timer is a no-op because clearing the sequence
    /// also drops the deadline it would have checked.
    pub fn poll_timeout(&mut self) -> bool {
        self.expire_sequence_if_due()
    }

    fn expire_sequence_if_due(&mut self) -> bool {
        let due = self
            .sequence
            .as_ref()
            .is_some_and(|s| self.clock.now() >= s.deadline);
        if due {
            self.reset_sequence("timeout");
        }
        due
    }

    fn start_sequence(&mut self, token: String) -> InputResponse {
        debug!(
            token = %token,
            timeout_ms = self.settings.sequence_timeout_ms,
            "sequence started"
        );
        self.sequence = Some(SequenceState {
            stages: vec![token],
            deadline: self.clock.now() + self.settings.sequence_timeout(),
        });
        InputResponse::handled()
    }

    fn continue_sequence(&mut self, event: &KeyInputEvent, token: String) -> InputResponse {
        let Some(sequence) = self.sequence.as_mut() else {
            debug_panic!("continue_sequence called with no sequence armed");
            return InputResponse::unhandled();
        };
        sequence.stages.push(token);
        let candidate = sequence.stages.join(&SEQUENCE_SEPARATOR.to_string());

        if self.find_match(&candidate).is_some() {
            // Sequence complete. State is cleared before the callback runs.
            self.sequence = None;
            return self.dispatch(event, &candidate);
        }

        if self.registry.has_sequence_prefix(&candidate) {
            // Still a viable prefix: re-arm the deadline, replacing the
            // previous one.
            let deadline = self.clock.now() + self.settings.sequence_timeout();
            if let Some(sequence) = self.sequence.as_mut() {
                sequence.deadline = deadline;
            }
            debug!(candidate = %candidate, "sequence extended");
            return InputResponse::handled();
        }

        // Dead end. The triggering token is dropped, not re-evaluated as a
        // fresh idle lookup.
        self.reset_sequence("no matching continuation");
        InputResponse::unhandled()
    }

    fn reset_sequence(&mut self, reason: &str) {
        if self.sequence.take().is_some() {
            debug!(reason = reason, "sequence reset");
        }
    }

    /// Resolve a canonical token against the active context, falling back
    /// to global only when the active context has no entry for it at all.
    fn find_match(&self, canonical: &str) -> Option<String> {
        if !self.settings.enable_contexts {
            return self
                .registry
                .find_anywhere(canonical)
                .map(|b| b.canonical.clone());
        }

        if let Some(binding) = self.registry.find_in_context(&self.active_context, canonical) {
            return Some(binding.canonical.clone());
        }
        if self.active_context != GLOBAL_CONTEXT {
            if let Some(binding) = self.registry.find_in_context(GLOBAL_CONTEXT, canonical) {
                return Some(binding.canonical.clone());
            }
        }
        None
    }

    fn dispatch(&mut self, event: &KeyInputEvent, canonical: &str) -> InputResponse {
        let Some(binding) = self.registry.get(canonical) else {
            debug_panic!("matched canonical '{}' missing from registry", canonical);
            return InputResponse::unhandled();
        };

        let callback = Rc::clone(&binding.callback);
        let info = binding.info();
        let prevent_default = binding
            .options
            .prevent_default
            .unwrap_or(self.settings.prevent_default_on_match);
        let stop_propagation = binding.options.stop_propagation;
        let is_sequence = binding.is_sequence;
        let is_chord = binding.is_chord;

        let started = self.clock.now();
        let result = callback(event, canonical, &info);
        let finished = self.clock.now();

        if let Err(err) = result {
            error!(
                canonical = %canonical,
                key = %event.key,
                error = ?err,
                "shortcut callback failed"
            );
            return InputResponse {
                handled: false,
                prevent_default,
                stop_propagation,
            };
        }

        if let Some(binding) = self.registry.get_mut(canonical) {
            binding
                .stats
                .record_execution(finished, finished - started);
        }
        self.stats.total_executed += 1;
        if is_sequence {
            self.stats.sequences_completed += 1;
        }
        if is_chord {
            self.stats.chords_executed += 1;
        }
        debug!(
            canonical = %canonical,
            duration_us = (finished - started).as_micros() as u64,
            "shortcut executed"
        );

        InputResponse {
            handled: true,
            prevent_default,
            stop_propagation,
        }
    }

    // ---- contexts and state gates -----------------------------------------

    /// Switch the active context, creating it on first use.
    pub fn switch_context(&mut self, name: &str) {
        if self.active_context == name {
            return;
        }
        self.registry.ensure_context(name);
        self.active_context = name.to_string();
        self.stats.context_switches += 1;
        debug!(context = name, "context switched");
    }

    pub fn active_context(&self) -> &str {
        &self.active_context
    }

    /// Pre-create a context partition without switching to it.
    pub fn ensure_context(&mut self, name: &str) {
        self.registry.ensure_context(name);
    }

    pub fn set_conflict_strategy(&mut self, strategy: ConflictStrategy) {
        self.registry.set_strategy(strategy);
    }

    pub fn conflict_strategy(&self) -> ConflictStrategy {
        self.registry.strategy()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Suspend or resume input processing. Suspending drops any in-flight
    /// sequence; no partial match survives a suspend.
    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
        if suspended {
            self.reset_sequence("suspended");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// True while the engine waits for the next stage of a sequence.
    pub fn is_awaiting_sequence(&self) -> bool {
        self.sequence.is_some()
    }

    // ---- settings ---------------------------------------------------------

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn update_settings(&mut self, settings: EngineSettings) {
        if !settings.enable_sequences {
            self.reset_sequence("sequences disabled");
        }
        self.settings = settings;
    }

    // ---- introspection ----------------------------------------------------

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn bindings(&self) -> Vec<BindingInfo> {
        self.registry.all()
    }

    pub fn bindings_by_group(&self, group: &str) -> Vec<BindingInfo> {
        self.registry.by_group(group)
    }

    pub fn bindings_by_context(&self, context: &str) -> Vec<BindingInfo> {
        self.registry.by_context(context)
    }

    pub fn binding(&self, spec: &str) -> Option<BindingInfo> {
        let canonical = self.canonicalizer().canonicalize(spec).ok()?;
        self.registry.get(&canonical).map(Binding::info)
    }

    pub fn conflicts(&self) -> &HashMap<String, ConflictRecord> {
        self.registry.conflicts()
    }

    pub fn binding_count(&self) -> usize {
        self.registry.len()
    }

    /// Canonicalize a spec with the engine's settings.
    pub fn canonicalize(&self, spec: &str) -> Result<String, ShortcutParseError> {
        self.canonicalizer().canonicalize(spec)
    }

    /// Validate a spec without registering it.
    pub fn validate(&self, spec: &str) -> bool {
        self.canonicalizer().validate(spec)
    }

    // ---- persisted customizations -----------------------------------------

    /// Apply persisted user customizations: disabled entries unregister,
    /// replacements rebind the existing callback under the new spec.
    /// Invalid entries are collected and returned; valid ones still apply.
    pub fn apply_customizations(
        &mut self,
        customizations: &ShortcutCustomizations,
    ) -> Vec<PersistenceError> {
        if !self.settings.save_customizations {
            return Vec::new();
        }

        let mut errors = Vec::new();
        let mut applied = 0u64;
        for (spec, customization) in customizations.iter() {
            match customization {
                Customization { disabled: true, .. } => {
                    if self.unregister(spec) {
                        applied += 1;
                    }
                }
                Customization {
                    replacement: Some(replacement),
                    options,
                    ..
                } => match self.rebind(spec, replacement, options.clone()) {
                    Ok(true) => applied += 1,
                    Ok(false) => {
                        debug!(spec = %spec, replacement = %replacement, "customization skipped");
                    }
                    Err(err) => errors.push(PersistenceError::Customization {
                        spec: spec.clone(),
                        source: err,
                    }),
                },
                _ => {}
            }
        }

        self.stats.customizations_applied += applied;
        if applied > 0 {
            info!(applied = applied, "shortcut customizations applied");
        }
        errors
    }

    fn canonicalizer(&self) -> Canonicalizer {
        Canonicalizer::new(self.settings.case_sensitive)
    }
}
