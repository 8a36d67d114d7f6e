//! Stock debug-console bindings.
//!
//! The console UI owns visibility and panel state; the engine only sees it
//! through this narrow trait. `install_default_bindings` wires up the stock
//! shortcut set against any implementation.

use std::rc::Rc;

use crate::clock::Clock;

use super::engine::ShortcutEngine;
use super::registry::{BindingOptions, RegistryError};

/// Stock contexts pre-created next to `global`.
pub const STOCK_CONTEXTS: [&str; 3] = ["console", "performance", "errors"];

/// Boundary to the debug console UI. Implementations own their interior
/// mutability; the engine never holds a mutable reference to the console.
pub trait DebugConsole {
    fn is_visible(&self) -> bool;
    fn toggle(&self);
    fn hide(&self);
    fn switch_panel(&self, panel: &str);
    fn show_settings(&self);
}

/// Register the stock debug-console shortcut set.
pub fn install_default_bindings<C: Clock>(
    engine: &mut ShortcutEngine<C>,
    console: Rc<dyn DebugConsole>,
) -> Result<(), RegistryError> {
    for context in STOCK_CONTEXTS {
        engine.ensure_context(context);
    }

    let c = Rc::clone(&console);
    engine.register(
        "ctrl+shift+d",
        move |_, _, _| {
            c.toggle();
            Ok(())
        },
        BindingOptions::default()
            .description("Toggle debug console")
            .group("interface")
            .priority(100),
    )?;

    let panels = [
        ("ctrl+shift+o", "overview"),
        ("ctrl+shift+p", "performance"),
        ("ctrl+shift+c", "console"),
        ("ctrl+shift+e", "errors"),
        ("ctrl+shift+t", "tests"),
    ];
    for (spec, panel) in panels {
        let c = Rc::clone(&console);
        engine.register(
            spec,
            move |_, _, _| {
                c.switch_panel(panel);
                Ok(())
            },
            BindingOptions::default()
                .description(format!("Switch to {panel} panel"))
                .group("panels"),
        )?;
    }

    let c = Rc::clone(&console);
    engine.register(
        "escape",
        move |_, _, _| {
            if c.is_visible() {
                c.hide();
            }
            Ok(())
        },
        BindingOptions::default()
            .description("Hide debug console")
            .group("interface"),
    )?;

    let c = Rc::clone(&console);
    engine.register(
        "ctrl+d>ctrl+s",
        move |_, _, _| {
            c.show_settings();
            Ok(())
        },
        BindingOptions::default()
            .description("Show debug settings")
            .group("advanced"),
    )?;

    Ok(())
}
