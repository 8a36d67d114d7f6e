//! Core shortcut types: modifier flags, the input event contract, and
//! key name normalization.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing a shortcut spec string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortcutParseError {
    #[error("shortcut string is empty")]
    Empty,
    #[error("sequence stage {0} is empty")]
    EmptyStage(usize),
    #[error("empty token in stage '{0}'")]
    EmptyToken(String),
    #[error("stage '{0}' has no key, only modifiers")]
    MissingKey(String),
    #[error("unexpected token '{0}' after key")]
    TrailingKey(String),
}

/// Modifier keys for a shortcut stage.
///
/// Canonical order is `ctrl, alt, shift, meta`, always ahead of the key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Default::default()
        }
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Default::default()
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Default::default()
        }
    }

    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta
    }

    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// One physical key press, decoupled from any concrete input API.
///
/// The DOM/terminal adapter translates its native event into this shape and
/// hands it to [`crate::shortcuts::ShortcutEngine::process_input`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyInputEvent {
    pub key: String,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyInputEvent {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }

    /// A key press with no modifiers held.
    pub fn plain(key: impl Into<String>) -> Self {
        Self::new(key, Modifiers::default())
    }
}

impl fmt::Display for KeyInputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl {
            write!(f, "ctrl+")?;
        }
        if self.modifiers.alt {
            write!(f, "alt+")?;
        }
        if self.modifiers.shift {
            write!(f, "shift+")?;
        }
        if self.modifiers.meta {
            write!(f, "meta+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// True for key names that are themselves modifier presses. Events carrying
/// only a modifier never form a token.
pub(crate) fn is_modifier_key_name(key: &str) -> bool {
    matches!(
        key,
        "ctrl" | "control" | "alt" | "option" | "shift" | "meta" | "cmd" | "command" | "super"
    )
}

/// Canonicalize a key name to the fixed lowercase vocabulary, so physically
/// distinct representations of the same key always canonicalize identically.
///
/// Expects its input already lowercased except for the single space key.
pub fn canonicalize_key(key: &str) -> String {
    match key {
        " " => "space",
        "arrowup" | "uparrow" => "up",
        "arrowdown" | "downarrow" => "down",
        "arrowleft" | "leftarrow" => "left",
        "arrowright" | "rightarrow" => "right",
        "return" => "enter",
        "esc" => "escape",
        "back" => "backspace",
        "del" => "delete",
        "pgup" => "pageup",
        "pgdn" | "pgdown" => "pagedown",
        "/" | "forwardslash" => "slash",
        "\\" => "backslash",
        ";" => "semicolon",
        "'" | "apostrophe" => "quote",
        "," => "comma",
        "." | "dot" => "period",
        "[" | "leftbracket" => "bracketleft",
        "]" | "rightbracket" => "bracketright",
        "-" | "dash" | "hyphen" => "minus",
        "=" | "equals" => "equal",
        "`" | "backtick" | "grave" => "backquote",
        k => return k.to_string(),
    }
    .to_string()
}
