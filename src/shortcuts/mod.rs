//! Keyboard shortcut matching.
//!
//! This module provides:
//! - Canonicalization of human-written shortcut strings
//! - A registry with group and context indices plus conflict resolution
//! - A timeout-driven state machine for multi-stage sequences
//! - Persisted user customization support
//!
//! # Architecture
//!
//! One [`ShortcutEngine`] instance owns all state. An adapter translates
//! its native key events into [`KeyInputEvent`] and feeds them to
//! [`ShortcutEngine::process_input`]; the returned [`InputResponse`] tells
//! the adapter whether to suppress the native default action.
//!
//! # Example
//!
//! ```ignore
//! use shortcut_engine::shortcuts::{BindingOptions, KeyInputEvent, Modifiers, ShortcutEngine};
//!
//! let mut engine = ShortcutEngine::new();
//! engine.register("ctrl+shift+d", |_, _, _| Ok(()), BindingOptions::default())?;
//! engine.process_input(&KeyInputEvent::new("d", Modifiers::ctrl_shift()));
//! ```

mod canonical;
mod console;
mod engine;
mod persistence;
mod registry;
mod stats;
mod types;

#[cfg(test)]
#[path = "canonical_tests.rs"]
mod canonical_tests;


#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;

pub use canonical::{is_chord, is_sequence, Canonicalizer, SEQUENCE_SEPARATOR};
pub use console::{install_default_bindings, DebugConsole, STOCK_CONTEXTS};
pub use engine::{InputResponse, ShortcutEngine};
pub use persistence::{
    load_from_dir, Customization, JsonFileStore, PersistenceError, SettingsStore,
    ShortcutCustomizations, CUSTOMIZATIONS_KEY,
};
pub use registry::{
    BindingInfo, BindingOptions, ConflictRecord, ConflictStrategy, RegistryError,
    ShortcutCallback, GLOBAL_CONTEXT,
};
pub use stats::{BindingStats, EngineStats};
pub use types::{canonicalize_key, KeyInputEvent, Modifiers, ShortcutParseError};
