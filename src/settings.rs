//! Engine configuration.
//!
//! Mirrors the settings surface the debug console exposes to users. All
//! fields have serde defaults so a partial JSON document deserializes into
//! a fully-populated struct.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_CASE_SENSITIVE: bool = false;
const DEFAULT_PREVENT_DEFAULT_ON_MATCH: bool = true;
const DEFAULT_ENABLE_SEQUENCES: bool = true;
const DEFAULT_SEQUENCE_TIMEOUT_MS: u64 = 2000;
const DEFAULT_ENABLE_CHORDS: bool = true;
const DEFAULT_MAX_CHORD_LENGTH: usize = 3;
const DEFAULT_ENABLE_CONTEXTS: bool = true;
const DEFAULT_SAVE_CUSTOMIZATIONS: bool = true;

/// Tunable behavior of a [`crate::shortcuts::ShortcutEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Treat single-character keys as case sensitive (default: false)
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
    /// Ask the adapter to suppress the native default action on match
    /// unless the binding says otherwise (default: true)
    #[serde(default = "default_prevent_default_on_match")]
    pub prevent_default_on_match: bool,
    /// Allow multi-stage `a>b` sequences (default: true)
    #[serde(default = "default_enable_sequences")]
    pub enable_sequences: bool,
    /// How long a partial sequence waits for its next stage (default: 2000)
    #[serde(default = "default_sequence_timeout_ms")]
    pub sequence_timeout_ms: u64,
    /// Flag space-separated specs as chords (default: true).
    /// Chords are an extension point: flagged and counted, never matched
    /// as simultaneous key groups.
    #[serde(default = "default_enable_chords")]
    pub enable_chords: bool,
    /// Upper bound on chord group size, reserved for chord matching (default: 3)
    #[serde(default = "default_max_chord_length")]
    pub max_chord_length: usize,
    /// Partition bindings by named context with global fallback (default: true)
    #[serde(default = "default_enable_contexts")]
    pub enable_contexts: bool,
    /// Apply persisted user customizations at startup (default: true)
    #[serde(default = "default_save_customizations")]
    pub save_customizations: bool,
}

fn default_case_sensitive() -> bool {
    DEFAULT_CASE_SENSITIVE
}
fn default_prevent_default_on_match() -> bool {
    DEFAULT_PREVENT_DEFAULT_ON_MATCH
}
fn default_enable_sequences() -> bool {
    DEFAULT_ENABLE_SEQUENCES
}
fn default_sequence_timeout_ms() -> u64 {
    DEFAULT_SEQUENCE_TIMEOUT_MS
}
fn default_enable_chords() -> bool {
    DEFAULT_ENABLE_CHORDS
}
fn default_max_chord_length() -> usize {
    DEFAULT_MAX_CHORD_LENGTH
}
fn default_enable_contexts() -> bool {
    DEFAULT_ENABLE_CONTEXTS
}
fn default_save_customizations() -> bool {
    DEFAULT_SAVE_CUSTOMIZATIONS
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            case_sensitive: DEFAULT_CASE_SENSITIVE,
            prevent_default_on_match: DEFAULT_PREVENT_DEFAULT_ON_MATCH,
            enable_sequences: DEFAULT_ENABLE_SEQUENCES,
            sequence_timeout_ms: DEFAULT_SEQUENCE_TIMEOUT_MS,
            enable_chords: DEFAULT_ENABLE_CHORDS,
            max_chord_length: DEFAULT_MAX_CHORD_LENGTH,
            enable_contexts: DEFAULT_ENABLE_CONTEXTS,
            save_customizations: DEFAULT_SAVE_CUSTOMIZATIONS,
        }
    }
}

impl EngineSettings {
    pub fn sequence_timeout(&self) -> Duration {
        Duration::from_millis(self.sequence_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stable() {
        let s = EngineSettings::default();
        assert!(!s.case_sensitive);
        assert!(s.prevent_default_on_match);
        assert!(s.enable_sequences);
        assert_eq!(s.sequence_timeout_ms, 2000);
        assert!(s.enable_contexts);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: EngineSettings = serde_json::from_str(r#"{"sequenceTimeoutMs": 500}"#).unwrap();
        assert_eq!(s.sequence_timeout(), Duration::from_millis(500));
        assert!(s.enable_sequences);
        assert!(!s.case_sensitive);
    }
}
