//! Shortcut string canonicalization and validation.
//!
//! Every spec string is reduced to one canonical form before it touches the
//! registry: lowercased tokens joined by `+`, modifiers ordered
//! `ctrl, alt, shift, meta` ahead of the key, sequence stages joined by `>`.
//! Two specs that differ only in modifier order or casing canonicalize
//! identically, and canonicalizing a canonical form is a no-op.

use super::types::{
    canonicalize_key, is_modifier_key_name, KeyInputEvent, Modifiers, ShortcutParseError,
};

/// Separator between the stages of a timed sequence.
pub const SEQUENCE_SEPARATOR: char = '>';

/// True when the spec describes a multi-stage sequence.
pub fn is_sequence(spec: &str) -> bool {
    spec.contains(SEQUENCE_SEPARATOR)
}

/// True when the spec carries the chord marker (a space between tokens).
///
/// Chord support is an extension point: the flag is recorded and counted,
/// but no simultaneous-multi-key matching is performed.
pub fn is_chord(spec: &str) -> bool {
    spec.trim().contains(' ')
}

/// Pure, deterministic translator from spec strings and input events to
/// canonical token strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct Canonicalizer {
    case_sensitive: bool,
}

impl Canonicalizer {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    /// Canonicalize a full spec, stage by stage.
    pub fn canonicalize(&self, spec: &str) -> Result<String, ShortcutParseError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(ShortcutParseError::Empty);
        }

        let mut stages = Vec::new();
        for (index, stage) in spec.split(SEQUENCE_SEPARATOR).enumerate() {
            if stage.trim().is_empty() {
                return Err(ShortcutParseError::EmptyStage(index));
            }
            stages.push(self.canonicalize_stage(stage)?);
        }

        Ok(stages.join(&SEQUENCE_SEPARATOR.to_string()))
    }

    /// Validate a spec without keeping the canonical form.
    pub fn validate(&self, spec: &str) -> bool {
        self.canonicalize(spec).is_ok()
    }

    /// Build the canonical token for one input event, or `None` when the
    /// event is a bare modifier press.
    pub fn event_token(&self, event: &KeyInputEvent) -> Option<String> {
        let raw = event.key.as_str();
        if raw.is_empty() || is_modifier_key_name(&raw.to_lowercase()) {
            return None;
        }

        let key = self.canonical_key(raw);
        Some(render_stage(&event.modifiers, &key))
    }

    fn canonicalize_stage(&self, stage: &str) -> Result<String, ShortcutParseError> {
        let mut modifiers = Modifiers::default();
        let mut key: Option<String> = None;

        for part in stage.split('+') {
            // Whitespace inside a token is stripped, not significant; the
            // chord marker is detected on the raw spec before this point.
            let part: String = part.chars().filter(|c| !c.is_whitespace()).collect();
            if part.is_empty() {
                return Err(ShortcutParseError::EmptyToken(stage.trim().to_string()));
            }

            match part.to_lowercase().as_str() {
                "ctrl" | "control" | "ctl" => modifiers.ctrl = true,
                "alt" | "opt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" | "command" | "super" | "win" => modifiers.meta = true,
                _ => {
                    if key.is_some() {
                        return Err(ShortcutParseError::TrailingKey(part));
                    }
                    key = Some(self.canonical_key(&part));
                }
            }
        }

        let key = key.ok_or_else(|| ShortcutParseError::MissingKey(stage.trim().to_string()))?;
        Ok(render_stage(&modifiers, &key))
    }

    fn canonical_key(&self, raw: &str) -> String {
        if self.case_sensitive && raw.chars().count() == 1 {
            return canonicalize_key(raw);
        }
        canonicalize_key(&raw.to_lowercase())
    }
}

fn render_stage(modifiers: &Modifiers, key: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if modifiers.ctrl {
        parts.push("ctrl");
    }
    if modifiers.alt {
        parts.push("alt");
    }
    if modifiers.shift {
        parts.push("shift");
    }
    if modifiers.meta {
        parts.push("meta");
    }
    parts.push(key);
    parts.join("+")
}
