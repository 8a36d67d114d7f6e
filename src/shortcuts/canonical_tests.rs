use super::canonical::{is_chord, is_sequence, Canonicalizer};
use super::types::{KeyInputEvent, Modifiers, ShortcutParseError};

fn canon(spec: &str) -> String {
    Canonicalizer::new(false).canonicalize(spec).unwrap()
}

#[test]
fn modifiers_are_reordered_before_the_key() {
    assert_eq!(canon("shift+ctrl+d"), "ctrl+shift+d");
    assert_eq!(canon("meta+alt+x"), "alt+meta+x");
    assert_eq!(canon("d"), "d");
}

#[test]
fn casing_is_ignored_by_default() {
    assert_eq!(canon("Ctrl+D"), "ctrl+d");
    assert_eq!(canon("CTRL+SHIFT+D"), canon("ctrl+shift+d"));
}

#[test]
fn canonicalization_is_idempotent() {
    for spec in [
        "shift+ctrl+d",
        "Ctrl+Shift+D",
        "ctrl+d>ctrl+s",
        "Escape",
        "meta+ArrowUp",
        "alt+space",
    ] {
        let once = canon(spec);
        assert_eq!(canon(&once), once, "not idempotent for {spec:?}");
    }
}

#[test]
fn key_aliases_map_to_fixed_vocabulary() {
    assert_eq!(canon("Esc"), "escape");
    assert_eq!(canon("Return"), "enter");
    assert_eq!(canon("ArrowUp"), "up");
    assert_eq!(canon("ctrl+PgUp"), "ctrl+pageup");
    assert_eq!(canon("shift+/"), "shift+slash");
    assert_eq!(canon("F1"), "f1");
}

#[test]
fn modifier_aliases_are_accepted() {
    assert_eq!(canon("control+d"), "ctrl+d");
    assert_eq!(canon("option+d"), "alt+d");
    assert_eq!(canon("cmd+d"), "meta+d");
    assert_eq!(canon("super+d"), "meta+d");
}

#[test]
fn sequence_stages_canonicalize_independently() {
    assert_eq!(canon("shift+ctrl+d>CTRL+s"), "ctrl+shift+d>ctrl+s");
    assert!(is_sequence("ctrl+d>ctrl+s"));
    assert!(!is_sequence("ctrl+d"));
}

#[test]
fn empty_spec_is_rejected() {
    let c = Canonicalizer::new(false);
    assert_eq!(c.canonicalize(""), Err(ShortcutParseError::Empty));
    assert_eq!(c.canonicalize("   "), Err(ShortcutParseError::Empty));
    assert!(!c.validate(""));
}

#[test]
fn modifier_only_stages_are_rejected() {
    let c = Canonicalizer::new(false);
    assert!(matches!(
        c.canonicalize("ctrl+shift"),
        Err(ShortcutParseError::MissingKey(_))
    ));
    assert!(matches!(
        c.canonicalize("ctrl"),
        Err(ShortcutParseError::MissingKey(_))
    ));
}

#[test]
fn empty_stages_and_tokens_are_rejected() {
    let c = Canonicalizer::new(false);
    assert!(matches!(
        c.canonicalize("ctrl+d>"),
        Err(ShortcutParseError::EmptyStage(1))
    ));
    assert!(matches!(
        c.canonicalize(">ctrl+d"),
        Err(ShortcutParseError::EmptyStage(0))
    ));
    assert!(matches!(
        c.canonicalize("ctrl++d"),
        Err(ShortcutParseError::EmptyToken(_))
    ));
}

#[test]
fn second_key_token_is_rejected() {
    let c = Canonicalizer::new(false);
    assert!(matches!(
        c.canonicalize("ctrl+a+b"),
        Err(ShortcutParseError::TrailingKey(_))
    ));
}

#[test]
fn sequence_is_valid_only_if_every_stage_is() {
    let c = Canonicalizer::new(false);
    assert!(c.validate("ctrl+d>ctrl+s"));
    assert!(!c.validate("ctrl+d>ctrl"));
    assert!(!c.validate("ctrl>d"));
}

#[test]
fn event_token_combines_modifier_flags_and_key() {
    let c = Canonicalizer::new(false);
    let event = KeyInputEvent::new("D", Modifiers::ctrl_shift());
    assert_eq!(c.event_token(&event).as_deref(), Some("ctrl+shift+d"));

    let event = KeyInputEvent::plain("Escape");
    assert_eq!(c.event_token(&event).as_deref(), Some("escape"));

    let event = KeyInputEvent::new(" ", Modifiers::default());
    assert_eq!(c.event_token(&event).as_deref(), Some("space"));
}

#[test]
fn bare_modifier_press_produces_no_token() {
    let c = Canonicalizer::new(false);
    for key in ["Control", "Shift", "Alt", "Meta", ""] {
        let event = KeyInputEvent::new(key, Modifiers::ctrl());
        assert_eq!(c.event_token(&event), None, "expected no token for {key:?}");
    }
}

#[test]
fn case_sensitive_mode_preserves_single_character_keys() {
    let c = Canonicalizer::new(true);
    assert_eq!(c.canonicalize("ctrl+D").unwrap(), "ctrl+D");
    assert_eq!(c.canonicalize("ctrl+d").unwrap(), "ctrl+d");
    // Named keys still normalize regardless of case mode.
    assert_eq!(c.canonicalize("Escape").unwrap(), "escape");
}

#[test]
fn chord_marker_is_detected_on_the_raw_spec() {
    assert!(is_chord("ctrl+a b"));
    assert!(!is_chord("ctrl+a"));
    assert!(!is_chord("  ctrl+a  "));
}
