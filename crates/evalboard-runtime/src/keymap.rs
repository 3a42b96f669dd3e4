#![forbid(unsafe_code)]

//! Keyboard dispatch registry.
//!
//! One registry serves the whole console. Components register a *scope*
//! (a named list of bindings) while they are mounted and unregister it when
//! they go away; the registry itself is the single logical key listener and
//! reports itself as listening while at least one scope is registered.
//!
//! # Matching
//!
//! - Character keys compare case-insensitively.
//! - `ctrl` / `shift` are tri-state: `Some(true)` requires the modifier,
//!   `Some(false)` or `None` require it to be released.
//! - For non-alphabetic characters the shift state is ignored: the character
//!   itself already encodes it (`?` is Shift+`/` on most layouts, and not
//!   every terminal reports SHIFT alongside it).
//! - Alt and Super are never part of a binding; chords holding them do not match.
//! - While a text field is being edited only `allow_in_input` bindings fire.
//! - Release events never fire.
//!
//! # Precedence
//!
//! When several scopes bind the same chord, the scope registered first wins,
//! then the binding listed first within that scope. Layout-level shortcuts
//! are registered before any page mounts, so a page cannot shadow them.
//!
//! # Re-entrancy
//!
//! [`DispatchRegistry::dispatch`] only *returns* the bound message. The
//! caller feeds it through `update` after the dispatch call has finished,
//! so an action can never trigger another dispatch mid-flight.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use evalboard_core::event::{KeyCode, KeyEvent};

/// The key part of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKey {
    /// A character, compared case-insensitively.
    Char(char),
    /// A named key such as Enter or Escape.
    Code(KeyCode),
}

impl BindingKey {
    fn matches(self, code: KeyCode) -> bool {
        match (self, code) {
            (BindingKey::Char(want), KeyCode::Char(got)) => chars_equal_ignore_case(want, got),
            (BindingKey::Code(want), got) => want == got,
            _ => false,
        }
    }

    fn is_alphabetic(self) -> bool {
        matches!(self, BindingKey::Char(c) if c.is_alphabetic())
    }
}

fn chars_equal_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKey::Char(' ') => f.write_str("Space"),
            BindingKey::Char(c) => write!(f, "{c}"),
            BindingKey::Code(KeyCode::Enter) => f.write_str("Enter"),
            BindingKey::Code(KeyCode::Escape) => f.write_str("Esc"),
            BindingKey::Code(KeyCode::Up) => f.write_str("↑"),
            BindingKey::Code(KeyCode::Down) => f.write_str("↓"),
            BindingKey::Code(KeyCode::Left) => f.write_str("←"),
            BindingKey::Code(KeyCode::Right) => f.write_str("→"),
            BindingKey::Code(KeyCode::F(n)) => write!(f, "F{n}"),
            BindingKey::Code(code) => write!(f, "{code:?}"),
        }
    }
}

type Action<M> = Arc<dyn Fn() -> M + Send + Sync>;

/// One shortcut: a chord, a description for the help overlay, and the
/// message it produces.
pub struct KeyBinding<M> {
    pub key: BindingKey,
    pub ctrl: Option<bool>,
    pub shift: Option<bool>,
    pub allow_in_input: bool,
    pub description: String,
    action: Action<M>,
}

impl<M> Clone for KeyBinding<M> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            ctrl: self.ctrl,
            shift: self.shift,
            allow_in_input: self.allow_in_input,
            description: self.description.clone(),
            action: Arc::clone(&self.action),
        }
    }
}

impl<M> fmt::Debug for KeyBinding<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBinding")
            .field("key", &self.key)
            .field("ctrl", &self.ctrl)
            .field("shift", &self.shift)
            .field("allow_in_input", &self.allow_in_input)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<M> KeyBinding<M> {
    pub fn new(
        key: BindingKey,
        description: impl Into<String>,
        action: impl Fn() -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            key,
            ctrl: None,
            shift: None,
            allow_in_input: false,
            description: description.into(),
            action: Arc::new(action),
        }
    }

    /// Binding on a plain character.
    pub fn char(
        c: char,
        description: impl Into<String>,
        action: impl Fn() -> M + Send + Sync + 'static,
    ) -> Self {
        Self::new(BindingKey::Char(c), description, action)
    }

    #[must_use]
    pub fn ctrl(mut self, held: bool) -> Self {
        self.ctrl = Some(held);
        self
    }

    #[must_use]
    pub fn shift(mut self, held: bool) -> Self {
        self.shift = Some(held);
        self
    }

    /// Also fire while a text field is focused.
    #[must_use]
    pub fn allow_in_input(mut self) -> Self {
        self.allow_in_input = true;
        self
    }

    /// Whether this binding accepts `key`, ignoring input context.
    #[must_use]
    pub fn matches(&self, key: &KeyEvent) -> bool {
        if !key.is_activation() || !self.key.matches(key.code) {
            return false;
        }
        if key.alt() || key.modifiers.contains(evalboard_core::Modifiers::SUPER) {
            return false;
        }
        if self.ctrl.unwrap_or(false) != key.ctrl() {
            return false;
        }
        match self.key {
            BindingKey::Char(_) if !self.key.is_alphabetic() => true,
            _ => self.shift.unwrap_or(false) == key.shift(),
        }
    }

    /// Label such as `Ctrl+C` or `Shift+?`.
    #[must_use]
    pub fn chord_label(&self) -> String {
        let mut label = String::new();
        if self.ctrl == Some(true) {
            label.push_str("Ctrl+");
        }
        if self.shift == Some(true) {
            label.push_str("Shift+");
        }
        label.push_str(&self.key.to_string());
        label
    }

    fn fire(&self) -> M {
        (self.action)()
    }
}

/// Input context at the moment of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchContext {
    /// A text field currently owns keystrokes.
    pub editing: bool,
}

impl DispatchContext {
    pub const IDLE: Self = Self { editing: false };
    pub const EDITING: Self = Self { editing: true };
}

/// Handle for a registered scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

struct Scope<M> {
    id: ScopeId,
    name: String,
    bindings: Vec<KeyBinding<M>>,
}

/// A help-overlay row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutEntry {
    pub scope: String,
    pub chord: String,
    pub description: String,
}

/// The table of active bindings.
pub struct DispatchRegistry<M> {
    scopes: Vec<Scope<M>>,
    next_id: u64,
}

impl<M> Default for DispatchRegistry<M> {
    fn default() -> Self {
        Self {
            scopes: Vec::new(),
            next_id: 1,
        }
    }
}

impl<M> fmt::Debug for DispatchRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRegistry")
            .field(
                "scopes",
                &self.scopes.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<M> DispatchRegistry<M> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a scope. Scopes registered earlier take precedence.
    pub fn register(&mut self, name: impl Into<String>, bindings: Vec<KeyBinding<M>>) -> ScopeId {
        let id = ScopeId(self.next_id);
        self.next_id += 1;
        let name = name.into();
        if self.scopes.is_empty() {
            tracing::debug!(target: "evalboard.keymap", "key listener installed");
        }
        tracing::debug!(
            target: "evalboard.keymap",
            scope = %name,
            bindings = bindings.len(),
            "scope registered"
        );
        self.scopes.push(Scope { id, name, bindings });
        id
    }

    /// Remove a scope. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: ScopeId) -> bool {
        let Some(pos) = self.scopes.iter().position(|s| s.id == id) else {
            return false;
        };
        let scope = self.scopes.remove(pos);
        tracing::debug!(target: "evalboard.keymap", scope = %scope.name, "scope unregistered");
        if self.scopes.is_empty() {
            tracing::debug!(target: "evalboard.keymap", "key listener removed");
        }
        true
    }

    /// Resolve a key press to the message of the first matching binding.
    pub fn dispatch(&self, key: &KeyEvent, ctx: DispatchContext) -> Option<M> {
        let binding = self
            .scopes
            .iter()
            .flat_map(|scope| scope.bindings.iter().map(move |b| (scope, b)))
            .filter(|(_, b)| !ctx.editing || b.allow_in_input)
            .find(|(_, b)| b.matches(key));
        binding.map(|(scope, b)| {
            tracing::trace!(
                target: "evalboard.keymap",
                scope = %scope.name,
                chord = %b.chord_label(),
                "binding fired"
            );
            b.fire()
        })
    }

    /// True while at least one scope is registered.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        !self.scopes.is_empty()
    }

    /// Number of physical listeners: zero or one.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        usize::from(self.is_listening())
    }

    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    #[must_use]
    pub fn is_registered(&self, id: ScopeId) -> bool {
        self.scopes.iter().any(|s| s.id == id)
    }

    /// Every active binding, in precedence order.
    #[must_use]
    pub fn entries(&self) -> Vec<ShortcutEntry> {
        self.scopes
            .iter()
            .flat_map(|scope| {
                scope.bindings.iter().map(|b| ShortcutEntry {
                    scope: scope.name.clone(),
                    chord: b.chord_label(),
                    description: b.description.clone(),
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Shared handle with scoped registration
// ---------------------------------------------------------------------------

type Shared<M> = Arc<Mutex<DispatchRegistry<M>>>;

fn lock<M>(inner: &Mutex<DispatchRegistry<M>>) -> MutexGuard<'_, DispatchRegistry<M>> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable handle to one registry, shared by the shell and its pages.
pub struct SharedRegistry<M> {
    inner: Shared<M>,
}

impl<M> Clone for SharedRegistry<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> Default for SharedRegistry<M> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(DispatchRegistry::new())),
        }
    }
}

impl<M> fmt::Debug for SharedRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*lock(&self.inner), f)
    }
}

impl<M> SharedRegistry<M> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scope that lives as long as the returned guard.
    #[must_use = "the scope is unregistered as soon as the guard is dropped"]
    pub fn scope(&self, name: impl Into<String>, bindings: Vec<KeyBinding<M>>) -> ScopeGuard<M> {
        let id = lock(&self.inner).register(name, bindings);
        ScopeGuard {
            registry: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn dispatch(&self, key: &KeyEvent, ctx: DispatchContext) -> Option<M> {
        lock(&self.inner).dispatch(key, ctx)
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        lock(&self.inner).is_listening()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listener_count()
    }

    #[must_use]
    pub fn scope_count(&self) -> usize {
        lock(&self.inner).scope_count()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<ShortcutEntry> {
        lock(&self.inner).entries()
    }
}

/// Unregisters its scope on drop.
pub struct ScopeGuard<M> {
    registry: Weak<Mutex<DispatchRegistry<M>>>,
    id: ScopeId,
}

impl<M> ScopeGuard<M> {
    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.id
    }
}

impl<M> fmt::Debug for ScopeGuard<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard").field("id", &self.id).finish()
    }
}

impl<M> Drop for ScopeGuard<M> {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            lock(&inner).unregister(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_core::event::{KeyEventKind, Modifiers};
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Msg {
        Palette,
        NewEval,
        Help,
        Quit,
        PageK,
        Confirm,
    }

    fn layout_bindings() -> Vec<KeyBinding<Msg>> {
        vec![
            KeyBinding::char('k', "Open command palette", || Msg::Palette),
            KeyBinding::char('n', "New evaluation", || Msg::NewEval),
            KeyBinding::char('?', "Keyboard shortcuts", || Msg::Help).shift(true),
            KeyBinding::char('c', "Quit", || Msg::Quit)
                .ctrl(true)
                .allow_in_input(),
        ]
    }

    fn press(c: char) -> KeyEvent {
        KeyEvent::char(c)
    }

    #[test]
    fn plain_key_fires_outside_input() {
        let mut reg = DispatchRegistry::new();
        reg.register("layout", layout_bindings());
        assert_eq!(reg.dispatch(&press('k'), DispatchContext::IDLE), Some(Msg::Palette));
        assert_eq!(reg.dispatch(&press('n'), DispatchContext::IDLE), Some(Msg::NewEval));
        assert_eq!(reg.dispatch(&press('x'), DispatchContext::IDLE), None);
    }

    #[test]
    fn plain_key_suppressed_while_editing() {
        let mut reg = DispatchRegistry::new();
        reg.register("layout", layout_bindings());
        assert_eq!(reg.dispatch(&press('k'), DispatchContext::EDITING), None);
    }

    #[test]
    fn exempt_binding_fires_while_editing() {
        let mut reg = DispatchRegistry::new();
        reg.register("layout", layout_bindings());
        let ctrl_c = press('c').with_modifiers(Modifiers::CTRL);
        assert_eq!(reg.dispatch(&ctrl_c, DispatchContext::EDITING), Some(Msg::Quit));
    }

    #[test]
    fn letters_match_case_insensitively_but_respect_shift() {
        let mut reg = DispatchRegistry::new();
        reg.register("layout", layout_bindings());
        // Caps lock: uppercase char without SHIFT.
        assert_eq!(reg.dispatch(&press('K'), DispatchContext::IDLE), Some(Msg::Palette));
        // Shift+K is a different chord.
        let shift_k = press('K').with_modifiers(Modifiers::SHIFT);
        assert_eq!(reg.dispatch(&shift_k, DispatchContext::IDLE), None);
    }

    #[test]
    fn question_mark_matches_with_or_without_reported_shift() {
        let mut reg = DispatchRegistry::new();
        reg.register("layout", layout_bindings());
        assert_eq!(reg.dispatch(&press('?'), DispatchContext::IDLE), Some(Msg::Help));
        let shifted = press('?').with_modifiers(Modifiers::SHIFT);
        assert_eq!(reg.dispatch(&shifted, DispatchContext::IDLE), Some(Msg::Help));
    }

    #[test]
    fn ctrl_must_match_exactly() {
        let mut reg = DispatchRegistry::new();
        reg.register("layout", layout_bindings());
        let ctrl_k = press('k').with_modifiers(Modifiers::CTRL);
        assert_eq!(reg.dispatch(&ctrl_k, DispatchContext::IDLE), None);
        assert_eq!(reg.dispatch(&press('c'), DispatchContext::IDLE), None);
    }

    #[test]
    fn alt_chords_never_match() {
        let mut reg = DispatchRegistry::new();
        reg.register("layout", layout_bindings());
        let alt_k = press('k').with_modifiers(Modifiers::ALT);
        assert_eq!(reg.dispatch(&alt_k, DispatchContext::IDLE), None);
    }

    #[test]
    fn release_events_are_ignored() {
        let mut reg = DispatchRegistry::new();
        reg.register("layout", layout_bindings());
        let release = press('k').with_kind(KeyEventKind::Release);
        assert_eq!(reg.dispatch(&release, DispatchContext::IDLE), None);
    }

    #[test]
    fn named_keys_match_by_code() {
        let mut reg = DispatchRegistry::new();
        reg.register(
            "dialog",
            vec![KeyBinding::new(BindingKey::Code(KeyCode::Enter), "Confirm", || {
                Msg::Confirm
            })],
        );
        assert_eq!(
            reg.dispatch(&KeyEvent::new(KeyCode::Enter), DispatchContext::IDLE),
            Some(Msg::Confirm)
        );
        assert_eq!(
            reg.dispatch(&KeyEvent::new(KeyCode::Escape), DispatchContext::IDLE),
            None
        );
    }

    #[test]
    fn first_registered_scope_wins() {
        let mut reg = DispatchRegistry::new();
        reg.register("layout", layout_bindings());
        reg.register(
            "evaluations",
            vec![KeyBinding::char('k', "Page k", || Msg::PageK)],
        );
        assert_eq!(reg.dispatch(&press('k'), DispatchContext::IDLE), Some(Msg::Palette));
    }

    #[test]
    fn later_scope_takes_over_after_earlier_unregisters() {
        let mut reg = DispatchRegistry::new();
        let layout = reg.register("layout", layout_bindings());
        reg.register(
            "evaluations",
            vec![KeyBinding::char('k', "Page k", || Msg::PageK)],
        );
        assert!(reg.unregister(layout));
        assert_eq!(reg.dispatch(&press('k'), DispatchContext::IDLE), Some(Msg::PageK));
    }

    #[test]
    fn single_listener_regardless_of_scope_count() {
        let mut reg = DispatchRegistry::<Msg>::new();
        assert_eq!(reg.listener_count(), 0);
        let a = reg.register("a", layout_bindings());
        let b = reg.register("b", layout_bindings());
        assert_eq!(reg.scope_count(), 2);
        assert_eq!(reg.listener_count(), 1);
        reg.unregister(a);
        assert!(reg.is_listening());
        reg.unregister(b);
        assert!(!reg.is_listening());
        assert!(!reg.unregister(b));
    }

    #[test]
    fn unregistered_bindings_never_fire() {
        let mut reg = DispatchRegistry::new();
        let id = reg.register("layout", layout_bindings());
        reg.unregister(id);
        assert_eq!(reg.dispatch(&press('k'), DispatchContext::IDLE), None);
    }

    #[test]
    fn scope_guard_unregisters_on_drop() {
        let shared = SharedRegistry::new();
        {
            let _guard = shared.scope("page", layout_bindings());
            assert_eq!(shared.scope_count(), 1);
            assert_eq!(
                shared.dispatch(&press('n'), DispatchContext::IDLE),
                Some(Msg::NewEval)
            );
        }
        assert_eq!(shared.scope_count(), 0);
        assert_eq!(shared.dispatch(&press('n'), DispatchContext::IDLE), None);
    }

    #[test]
    fn guard_outliving_registry_is_harmless() {
        let guard = {
            let shared = SharedRegistry::new();
            shared.scope("page", layout_bindings())
        };
        drop(guard);
    }

    #[test]
    fn help_entries_list_chords_in_precedence_order() {
        let mut reg = DispatchRegistry::new();
        reg.register("layout", layout_bindings());
        let entries = reg.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].chord, "k");
        assert_eq!(entries[2].chord, "Shift+?");
        assert_eq!(entries[3].chord, "Ctrl+c");
        assert_eq!(entries[3].scope, "layout");
    }

    proptest! {
        #[test]
        fn editing_suppresses_every_plain_binding(c in proptest::char::range('a', 'z')) {
            let mut reg = DispatchRegistry::new();
            reg.register("layout", vec![KeyBinding::char(c, "any", move || c)]);
            prop_assert_eq!(reg.dispatch(&press(c), DispatchContext::EDITING), None);
            prop_assert_eq!(reg.dispatch(&press(c), DispatchContext::IDLE), Some(c));
        }
    }
}
