//! Binding table with secondary indices and conflict resolution.
//!
//! The registry owns every [`Binding`] exclusively. Three structures are
//! kept in lockstep: the canonical-form table plus group and context
//! indices. Any mutation updates all three, so no orphaned index entries
//! can survive a register/unregister interleaving.

use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::canonical::SEQUENCE_SEPARATOR;
use super::stats::BindingStats;
use super::types::{KeyInputEvent, ShortcutParseError};

/// The context every engine starts in and falls back to.
pub const GLOBAL_CONTEXT: &str = "global";

/// Callback invoked when a binding fires. Errors are caught at the dispatch
/// boundary and logged; they never propagate to the event source.
pub type ShortcutCallback = Rc<dyn Fn(&KeyInputEvent, &str, &BindingInfo) -> anyhow::Result<()>>;

/// What happens when a new binding's canonical form collides with an
/// existing one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConflictStrategy {
    /// Reject the new binding and keep a record of the competing pair.
    #[default]
    Warn,
    /// Fail the registration loudly.
    Error,
    /// Replace the existing binding unconditionally.
    Override,
    /// Higher priority wins; equal priority runs both callbacks in
    /// registration order.
    Merge,
}

/// Registration-time options for a binding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingOptions {
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default = "default_context")]
    pub context: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub repeatable: bool,
    /// `None` falls back to the engine's `prevent_default_on_match` setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevent_default: Option<bool>,
    #[serde(default = "default_true")]
    pub stop_propagation: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_group() -> String {
    "default".to_string()
}
fn default_context() -> String {
    GLOBAL_CONTEXT.to_string()
}
fn default_true() -> bool {
    true
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            description: String::new(),
            group: default_group(),
            context: default_context(),
            priority: 0,
            repeatable: false,
            prevent_default: None,
            stop_propagation: true,
            enabled: true,
        }
    }
}

impl BindingOptions {
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// A registered shortcut. Owned by the registry; callers only ever see
/// [`BindingInfo`] snapshots.
pub(crate) struct Binding {
    pub spec: String,
    pub canonical: String,
    pub callback: ShortcutCallback,
    pub options: BindingOptions,
    pub is_sequence: bool,
    pub is_chord: bool,
    pub stats: BindingStats,
}

impl Binding {
    pub fn info(&self) -> BindingInfo {
        BindingInfo {
            spec: self.spec.clone(),
            canonical: self.canonical.clone(),
            options: self.options.clone(),
            is_sequence: self.is_sequence,
            is_chord: self.is_chord,
            stats: self.stats,
        }
    }
}

/// Read-only view of a binding, safe to hand to callbacks and UI.
#[derive(Clone, Debug)]
pub struct BindingInfo {
    pub spec: String,
    pub canonical: String,
    pub options: BindingOptions,
    pub is_sequence: bool,
    pub is_chord: bool,
    pub stats: BindingStats,
}

/// The competing pair recorded for one canonical form under the `Warn`
/// strategy. Cleared when the canonical form is unregistered.
#[derive(Clone, Debug)]
pub struct ConflictRecord {
    pub existing: BindingInfo,
    pub rejected: BindingInfo,
}

/// Registration failure surfaced to the caller. A failed registration
/// leaves the registry exactly as it was.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid shortcut spec: {0}")]
    InvalidSpec(#[from] ShortcutParseError),
    #[error("shortcut '{0}' is already registered")]
    Conflict(String),
}

/// How an insert was resolved; the engine maps this to its return value
/// and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InsertOutcome {
    Inserted,
    Replaced,
    Merged,
    RejectedConflict,
    RejectedPriority,
}

pub(crate) struct ShortcutRegistry {
    bindings: HashMap<String, Binding>,
    groups: HashMap<String, BTreeSet<String>>,
    contexts: HashMap<String, BTreeSet<String>>,
    conflicts: HashMap<String, ConflictRecord>,
    strategy: ConflictStrategy,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        let mut contexts = HashMap::new();
        contexts.insert(GLOBAL_CONTEXT.to_string(), BTreeSet::new());
        Self {
            bindings: HashMap::new(),
            groups: HashMap::new(),
            contexts,
            conflicts: HashMap::new(),
            strategy: ConflictStrategy::default(),
        }
    }

    pub fn strategy(&self) -> ConflictStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: ConflictStrategy) {
        self.strategy = strategy;
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Insert a binding, resolving any collision per the active strategy.
    pub fn insert(&mut self, binding: Binding) -> Result<InsertOutcome, RegistryError> {
        let canonical = binding.canonical.clone();
        if !self.bindings.contains_key(&canonical) {
            self.index(&binding);
            self.bindings.insert(canonical, binding);
            return Ok(InsertOutcome::Inserted);
        }

        match self.strategy {
            ConflictStrategy::Error => Err(RegistryError::Conflict(canonical)),
            ConflictStrategy::Override => {
                warn!(canonical = %canonical, "shortcut overridden");
                self.replace(binding);
                Ok(InsertOutcome::Replaced)
            }
            ConflictStrategy::Merge => self.merge(binding),
            ConflictStrategy::Warn => {
                let existing = self.bindings[&canonical].info();
                warn!(canonical = %canonical, "shortcut conflict detected");
                self.conflicts.insert(
                    canonical,
                    ConflictRecord {
                        existing,
                        rejected: binding.info(),
                    },
                );
                Ok(InsertOutcome::RejectedConflict)
            }
        }
    }

    /// Remove a canonical form from the table, both indices, and any
    /// pending conflict record.
    pub fn remove(&mut self, canonical: &str) -> bool {
        let Some(binding) = self.bindings.remove(canonical) else {
            return false;
        };
        self.unindex(&binding);
        self.conflicts.remove(canonical);
        true
    }

    pub fn get(&self, canonical: &str) -> Option<&Binding> {
        self.bindings.get(canonical)
    }

    pub fn get_mut(&mut self, canonical: &str) -> Option<&mut Binding> {
        self.bindings.get_mut(canonical)
    }

    /// Look up an enabled binding within one context partition.
    pub fn find_in_context(&self, context: &str, canonical: &str) -> Option<&Binding> {
        let members = self.contexts.get(context)?;
        if !members.contains(canonical) {
            return None;
        }
        self.bindings.get(canonical).filter(|b| b.options.enabled)
    }

    /// Look up an enabled binding ignoring context partitions.
    pub fn find_anywhere(&self, canonical: &str) -> Option<&Binding> {
        self.bindings.get(canonical).filter(|b| b.options.enabled)
    }

    /// True when some registered canonical form continues past `prefix`
    /// with another sequence stage.
    pub fn has_sequence_prefix(&self, prefix: &str) -> bool {
        let wanted = format!("{prefix}{SEQUENCE_SEPARATOR}");
        self.bindings.keys().any(|c| c.starts_with(&wanted))
    }

    pub fn ensure_context(&mut self, name: &str) {
        self.contexts.entry(name.to_string()).or_default();
    }

    pub fn all(&self) -> Vec<BindingInfo> {
        let mut infos: Vec<_> = self.bindings.values().map(Binding::info).collect();
        infos.sort_by(|a, b| a.canonical.cmp(&b.canonical));
        infos
    }

    pub fn by_group(&self, group: &str) -> Vec<BindingInfo> {
        self.members_to_infos(self.groups.get(group))
    }

    pub fn by_context(&self, context: &str) -> Vec<BindingInfo> {
        self.members_to_infos(self.contexts.get(context))
    }

    pub fn conflicts(&self) -> &HashMap<String, ConflictRecord> {
        &self.conflicts
    }

    fn members_to_infos(&self, members: Option<&BTreeSet<String>>) -> Vec<BindingInfo> {
        members
            .into_iter()
            .flatten()
            .filter_map(|c| self.bindings.get(c))
            .map(Binding::info)
            .collect()
    }

    fn merge(&mut self, new: Binding) -> Result<InsertOutcome, RegistryError> {
        let Some(existing_priority) = self
            .bindings
            .get(&new.canonical)
            .map(|b| b.options.priority)
        else {
            self.index(&new);
            self.bindings.insert(new.canonical.clone(), new);
            return Ok(InsertOutcome::Inserted);
        };

        if new.options.priority > existing_priority {
            self.replace(new);
            return Ok(InsertOutcome::Replaced);
        }
        if new.options.priority < existing_priority {
            return Ok(InsertOutcome::RejectedPriority);
        }

        // Equal priority: chain both callbacks, registration order first.
        if let Some(existing) = self.bindings.get_mut(&new.canonical) {
            let first = Rc::clone(&existing.callback);
            let second = new.callback;
            existing.callback = Rc::new(move |event, canonical, info| {
                first(event, canonical, info)?;
                second(event, canonical, info)
            });
        }
        Ok(InsertOutcome::Merged)
    }

    fn replace(&mut self, binding: Binding) {
        if let Some(old) = self.bindings.remove(&binding.canonical) {
            self.unindex(&old);
        }
        self.index(&binding);
        self.bindings.insert(binding.canonical.clone(), binding);
    }

    fn index(&mut self, binding: &Binding) {
        self.groups
            .entry(binding.options.group.clone())
            .or_default()
            .insert(binding.canonical.clone());
        self.contexts
            .entry(binding.options.context.clone())
            .or_default()
            .insert(binding.canonical.clone());
    }

    fn unindex(&mut self, binding: &Binding) {
        if let Some(members) = self.groups.get_mut(&binding.options.group) {
            members.remove(&binding.canonical);
            if members.is_empty() {
                self.groups.remove(&binding.options.group);
            }
        }
        if let Some(members) = self.contexts.get_mut(&binding.options.context) {
            members.remove(&binding.canonical);
            if members.is_empty() && binding.options.context != GLOBAL_CONTEXT {
                self.contexts.remove(&binding.options.context);
            }
        }
    }
}
