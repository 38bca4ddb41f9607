//! Declarative key binding table.
//!
//! Each binding pairs a key with a predicate over the current [`InputContext`] and the
//! [`Action`] it triggers. Bindings are consulted in order and the first match wins.

use crate::application::PackageFilter;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Esc,
    Enter,
}

impl Key {
    /// Parses legend slugs such as `q`, `ctrl+u` or `esc`.
    pub fn parse(slug: &str) -> Option<Key> {
        let slug = slug.trim().to_ascii_lowercase();
        match slug.as_str() {
            "esc" => Some(Key::Esc),
            "enter" => Some(Key::Enter),
            _ => {
                if let Some(rest) = slug.strip_prefix("ctrl+") {
                    let mut chars = rest.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Some(Key::Ctrl(c)),
                        _ => None,
                    }
                } else {
                    let mut chars = slug.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Some(Key::Char(c)),
                        _ => None,
                    }
                }
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Ctrl(c) => write!(f, "ctrl+{}", c),
            Key::Esc => write!(f, "esc"),
            Key::Enter => write!(f, "enter"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FocusSearch,
    ToggleFilter(PackageFilter),
    Install,
    Update,
    Remove,
    UpdateAll,
    InstallAll,
    RemoveAll,
    Help,
    Back,
    Quit,
}

/// What the dispatcher needs to know about the screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputContext {
    pub search_focused: bool,
    pub brewfile_mode: bool,
}

pub struct KeyBinding {
    pub key: Key,
    pub name: &'static str,
    pub action: Action,
    pub hidden: bool,
    pub enabled: fn(&InputContext) -> bool,
}

fn always(_: &InputContext) -> bool {
    true
}

fn brewfile_only(ctx: &InputContext) -> bool {
    ctx.brewfile_mode
}

impl KeyBinding {
    fn new(key: Key, name: &'static str, action: Action) -> Self {
        Self {
            key,
            name,
            action,
            hidden: false,
            enabled: always,
        }
    }

    fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    fn when(mut self, enabled: fn(&InputContext) -> bool) -> Self {
        self.enabled = enabled;
        self
    }
}

pub struct Keymap {
    bindings: Vec<KeyBinding>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

impl Keymap {
    pub fn new() -> Self {
        use Action::*;
        let bindings = vec![
            KeyBinding::new(Key::Char('/'), "Search", FocusSearch),
            KeyBinding::new(Key::Char('f'), "Installed", ToggleFilter(PackageFilter::Installed)),
            KeyBinding::new(Key::Char('o'), "Outdated", ToggleFilter(PackageFilter::Outdated)).hidden(),
            KeyBinding::new(Key::Char('l'), "Leaves", ToggleFilter(PackageFilter::Leaves)).hidden(),
            KeyBinding::new(Key::Char('c'), "Casks", ToggleFilter(PackageFilter::Casks)).hidden(),
            KeyBinding::new(Key::Char('i'), "Install", Install),
            KeyBinding::new(Key::Char('u'), "Update", Update),
            KeyBinding::new(Key::Char('r'), "Remove", Remove),
            KeyBinding::new(Key::Ctrl('u'), "Update All", UpdateAll).hidden(),
            KeyBinding::new(Key::Ctrl('a'), "Install All (Brewfile)", InstallAll).when(brewfile_only),
            KeyBinding::new(Key::Ctrl('r'), "Remove All (Brewfile)", RemoveAll).when(brewfile_only),
            KeyBinding::new(Key::Char('?'), "Help", Help),
            KeyBinding::new(Key::Esc, "Back to Table", Back).hidden(),
            KeyBinding::new(Key::Char('q'), "Quit", Quit).hidden(),
        ];
        Self { bindings }
    }

    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }

    /// First enabled binding for `key`. A focused search field consumes everything but `esc`.
    pub fn dispatch(&self, key: Key, ctx: &InputContext) -> Option<Action> {
        if ctx.search_focused && key != Key::Esc && key != Key::Enter {
            return None;
        }
        if ctx.search_focused {
            return Some(Action::Back);
        }

        self.bindings
            .iter()
            .find(|binding| binding.key == key && (binding.enabled)(ctx))
            .map(|binding| binding.action)
    }

    /// `(key, name)` pairs for the legend bar.
    pub fn legend(&self, ctx: &InputContext) -> Vec<(String, &'static str)> {
        self.bindings
            .iter()
            .filter(|binding| !binding.hidden && (binding.enabled)(ctx))
            .map(|binding| (binding.key.to_string(), binding.name))
            .collect()
    }

    pub fn legend_line(&self, ctx: &InputContext) -> String {
        self.legend(ctx)
            .into_iter()
            .map(|(key, name)| format!("[{}] {}", key, name))
            .collect::<Vec<_>>()
            .join("  ")
    }
}
