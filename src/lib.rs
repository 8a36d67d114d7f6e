//! Shortcut Engine - keyboard shortcut matching for the debug console
//!
//! This library turns raw key input events into registered actions. It owns
//! shortcut string canonicalization, a timeout-driven sequence state machine,
//! and deterministic conflict resolution between overlapping bindings.
//!
//! The surrounding debug tooling (panel UI, command handlers, storage) talks
//! to the engine through narrow interfaces: [`shortcuts::KeyInputEvent`] on
//! the way in, callbacks on the way out, and [`shortcuts::SettingsStore`]
//! for persisted user customizations.

pub mod clock;
pub mod error;
pub mod logging;
pub mod settings;
pub mod shortcuts;
